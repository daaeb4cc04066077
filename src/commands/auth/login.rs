use anyhow::{ensure, Result};
use clap::Parser;

use crate::state::State;

#[derive(Debug, Parser, Default, PartialEq, Eq)]
#[clap(about = "Login to VendaPlus")]
pub struct Options {
    #[clap(short, long, help = "Username or email", env = "VENDAPLUS_USERNAME")]
    pub username: Option<String>,
    #[clap(
        long,
        help = "Password",
        long_help = "Password, prompted for when omitted",
        env = "VENDAPLUS_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,
}

pub async fn handle(options: Options, mut state: State) -> Result<()> {
    let username = match options.username {
        Some(username) => username,
        None => dialoguer::Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };

    let password = match options.password {
        Some(password) => password,
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()?,
    };

    ensure!(!username.trim().is_empty(), "Username cannot be empty");

    let session = state.session.login(username.trim(), &password).await?;

    state.update_http_token(Some(&session.access_token))?;

    log::info!(
        "Logged in as: `{}` ({}) with role {}",
        session.user.name,
        session.user.email.as_deref().unwrap_or(&session.user.id),
        session.role
    );

    Ok(())
}
