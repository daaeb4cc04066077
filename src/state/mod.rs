pub mod http;
pub mod ws;

use std::sync::Arc;

use anyhow::{Context as _, Result};

use self::http::HttpClient;
use crate::config::EXEC_NAME;
use crate::session::identity::OpenIdClient;
use crate::session::storage::FileStorage;
use crate::session::{ExpiryAction, Session, SessionManager, SessionOptions};
use crate::store::context::Context;
use crate::store::Store;

pub type ClientSession = SessionManager<FileStorage, OpenIdClient>;

pub struct State {
    pub ctx: Context,
    pub session: Arc<ClientSession>,
    pub http: HttpClient,
}

pub struct StateOptions {
    pub override_api_url: Option<String>,
}

impl State {
    pub async fn new(options: StateOptions) -> Result<Self> {
        let mut ctx = Context::new().await?;

        if options.override_api_url.is_some() {
            ctx.api_url = options.override_api_url;
        }

        let provider = OpenIdClient::new(&ctx.issuer(), &ctx.realm(), &ctx.client_id())
            .context("Failed to create the identity provider client")?;

        let session = Arc::new(SessionManager::new(
            FileStorage,
            provider,
            SessionOptions {
                client_id: ctx.client_id(),
                ..SessionOptions::default()
            },
        ));

        let state = session.load().await;

        log::debug!("Session status: {}", state.status());

        let http = HttpClient::new(
            state.session().map(|session| session.access_token.as_str()),
            &ctx.api_url(),
        )?;

        Ok(State { ctx, session, http })
    }

    /// Makes sure there is a usable session, refreshing it first when it is
    /// close to expiring, and points the http client at its token.
    pub async fn login(&mut self) -> Result<Session> {
        if self.session.check_expiry().await == ExpiryAction::Refreshed {
            log::debug!("Refreshed the session before running the command");
        }

        let session = self.session.current().with_context(|| {
            format!("You are not logged in. Please run `{EXEC_NAME} auth login` first.")
        })?;

        self.update_http_token(Some(&session.access_token))?;

        Ok(session)
    }

    /// Rebuilds the http client with the given auth token.
    pub fn update_http_token(&mut self, token: Option<&str>) -> Result<()> {
        self.http = HttpClient::new(token, &self.ctx.api_url())?;

        Ok(())
    }
}
