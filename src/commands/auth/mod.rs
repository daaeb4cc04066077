mod login;
mod logout;
mod refresh;
mod status;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::state::State;

#[derive(Debug, Subcommand)]
pub enum Commands {
    Login(login::Options),
    Logout(logout::Options),
    Refresh(refresh::Options),
    Status(status::Options),
}

#[derive(Debug, Parser)]
#[clap(about = "Authenticate with VendaPlus")]
pub struct Options {
    #[clap(subcommand)]
    pub commands: Commands,
}

pub async fn handle(options: Options, state: State) -> Result<()> {
    match options.commands {
        Commands::Login(options) => login::handle(options, state).await,
        Commands::Logout(options) => logout::handle(options, state).await,
        Commands::Refresh(options) => refresh::handle(options, state).await,
        Commands::Status(options) => status::handle(&options, &state),
    }
}
