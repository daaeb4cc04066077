pub mod auth;
pub mod cache;
pub mod completions;
pub mod config;
pub mod ls;
pub mod nav;
pub mod watch;
pub mod whoami;

use anyhow::Result;
use clap::Subcommand;

use crate::state::State;

#[derive(Debug, Subcommand)]
pub enum Commands {
    Auth(auth::Options),
    #[clap(alias = "info")]
    Whoami(whoami::Options),
    #[clap(alias = "navigation")]
    Nav(nav::Options),
    #[clap(name = "ls", alias = "list")]
    Ls(ls::Options),
    Cache(cache::Options),
    Watch(watch::Options),
    Config(config::Options),
    Completions(completions::Options),
}

pub async fn handle_command(command: Commands, mut state: State) -> Result<()> {
    match command {
        Commands::Auth(options) => auth::handle(options, state).await,
        Commands::Config(options) => config::handle(options, state).await,
        Commands::Cache(options) => cache::handle(options).await,
        Commands::Completions(options) => {
            completions::handle(options, state);
            Ok(())
        }

        authorized_command => {
            // login so these commands can run
            let session = state.login().await?;

            match authorized_command {
                Commands::Auth(_)
                | Commands::Config(_)
                | Commands::Cache(_)
                | Commands::Completions(_) => unreachable!(),
                Commands::Whoami(options) => whoami::handle(&options, &session),
                Commands::Nav(options) => nav::handle(&options, &session),
                Commands::Ls(options) => ls::handle(options, &session, state).await,
                Commands::Watch(options) => watch::handle(options, state).await,
            }
        }
    }
}
