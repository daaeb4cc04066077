use anyhow::Result;
use clap::Parser;

use crate::session::SessionState;
use crate::state::State;
use crate::utils::relative_time;

#[derive(Debug, Parser)]
#[clap(about = "Show the state of the stored session")]
pub struct Options {
    #[clap(short, long, help = "Only print the status")]
    pub quiet: bool,
}

pub fn handle(options: &Options, state: &State) -> Result<()> {
    let current = state.session.state();

    if options.quiet {
        println!("{}", current.status());

        return Ok(());
    }

    println!("Status: {}", current.status());

    if let SessionState::Authenticated(session) = current {
        println!("User: {} ({})", session.user.name, session.user.id);
        println!("Role: {}", session.role);
        println!(
            "Expires: {} ({})",
            session.expires_at.to_rfc3339(),
            relative_time(session.expires_at)
        );

        if session.roles.is_empty() {
            println!("Permissions: none");
        } else {
            println!("Permissions: {}", session.roles.join(", "));
        }
    }

    Ok(())
}
