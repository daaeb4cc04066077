use anyhow::{bail, ensure, Result};
use clap::Parser;

use crate::config::EXEC_NAME;
use crate::session::Refresh;
use crate::state::State;
use crate::utils::relative_time;

#[derive(Debug, Parser)]
#[clap(about = "Exchange the refresh token for a new session")]
pub struct Options {}

pub async fn handle(_options: Options, state: State) -> Result<()> {
    ensure!(
        state.session.current().is_some(),
        "You are not logged in. Please run `{EXEC_NAME} auth login` first."
    );

    match state.session.refresh().await {
        Refresh::Refreshed(session) => {
            log::info!("Session refreshed, expires {}", relative_time(session.expires_at));

            Ok(())
        }

        Refresh::InFlight => {
            log::info!("A refresh is already running");

            Ok(())
        }

        Refresh::SignedOut => bail!(
            "Could not refresh the session, you have been logged out. Run `{EXEC_NAME} auth login` to login again."
        ),
    }
}
