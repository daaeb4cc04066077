use anyhow::Result;
use clap::Parser;

use crate::config::EXEC_NAME;
use crate::state::State;
use crate::store::cache::Caches;
use crate::store::Store;

#[derive(Debug, Parser)]
#[clap(about = "Logout the current user")]
pub struct Options {
    #[clap(long, help = "Keep the cached resources")]
    pub keep_cache: bool,
}

pub async fn handle(options: Options, state: State) -> Result<()> {
    if state.session.current().is_none() {
        log::info!("You are not logged in, run `{EXEC_NAME} auth login` to login");
    }

    // clears the stored tokens even when the session already expired
    state.session.sign_out().await;

    if !options.keep_cache {
        Caches::default().save().await?;
    }

    log::info!("You have been logged out");

    Ok(())
}
