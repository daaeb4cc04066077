use anyhow::Result;
use clap::Parser;

use crate::permissions::{guard, Permission};
use crate::session::Session;
use crate::utils::relative_time;

#[derive(Debug, Parser)]
#[clap(about = "Get information about the current user")]
pub struct Options {}

pub fn handle(_options: &Options, session: &Session) -> Result<()> {
    println!(
        "You are logged in as `{}` ({})",
        session.user.name,
        session.user.email.as_deref().unwrap_or(&session.user.id)
    );
    println!("Role: {}", session.role);
    println!("Session expires {}", relative_time(session.expires_at));

    if let Some(notice) = guard(
        &session.roles,
        Permission::ManageUsers,
        || "You can manage users and their roles".to_string(),
        None,
    ) {
        println!("{notice}");
    }

    Ok(())
}
