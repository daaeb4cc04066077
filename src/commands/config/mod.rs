use anyhow::Result;
use clap::Parser;

use crate::state::State;
use crate::store::Store;
use crate::utils::urlify;

#[derive(Debug, Parser)]
#[clap(about = "Show or change where the client connects to")]
pub struct Options {
    #[clap(long, help = "Identity provider base URL")]
    pub issuer: Option<String>,
    #[clap(long, help = "Identity provider realm")]
    pub realm: Option<String>,
    #[clap(long, help = "Client id whose roles are used")]
    pub client_id: Option<String>,
    #[clap(long, help = "Backend API URL")]
    pub api_url: Option<String>,
}

impl Options {
    fn is_empty(&self) -> bool {
        self.issuer.is_none()
            && self.realm.is_none()
            && self.client_id.is_none()
            && self.api_url.is_none()
    }
}

pub async fn handle(options: Options, mut state: State) -> Result<()> {
    if !options.is_empty() {
        let ctx = &mut state.ctx;

        ctx.issuer = options.issuer.or(ctx.issuer.take());
        ctx.realm = options.realm.or(ctx.realm.take());
        ctx.client_id = options.client_id.or(ctx.client_id.take());
        ctx.api_url = options.api_url.or(ctx.api_url.take());

        ctx.save().await?;

        log::info!("Saved configuration, it applies from the next command");
    }

    println!("Issuer: {}", urlify(&state.ctx.issuer()));
    println!("Realm: {}", state.ctx.realm());
    println!("Client: {}", state.ctx.client_id());
    println!("API: {}", urlify(&state.ctx.api_url()));

    Ok(())
}
