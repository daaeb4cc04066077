pub mod identity;
pub mod storage;
pub mod token;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::{watch, Mutex};
use tokio::time::{interval, Duration as StdDuration, MissedTickBehavior};

use self::identity::{IdentityProvider, TokenResponse};
use self::storage::TokenStorage;
use crate::config::{
    DEFAULT_CLIENT_ID, KEEPER_INTERVAL_SECS, REFRESH_WINDOW_SECS, STORAGE_POLL_SECS,
};
use crate::permissions::{has_permission, Permission};
use crate::store::tokens::Tokens;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoarseRole {
    Admin,
    Manager,
    Seller,
}

impl CoarseRole {
    pub fn from_roles<R: AsRef<str>>(roles: &[R]) -> Self {
        if has_permission(roles, Permission::ManageUsers) {
            Self::Admin
        } else if has_permission(roles, Permission::ManageTeams) {
            Self::Manager
        } else {
            Self::Seller
        }
    }
}

impl fmt::Display for CoarseRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Seller => "seller",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    pub id_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub roles: Vec<String>,
    pub role: CoarseRole,
}

impl Session {
    pub fn has_permission<P: AsRef<str>>(&self, required: P) -> bool {
        has_permission(&self.roles, required)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    pub fn status(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    Refreshed(Session),
    /// Another refresh was already running, nothing was sent.
    InFlight,
    /// The refresh failed and the session was signed out.
    SignedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryAction {
    Idle,
    Refreshed,
    SignedOut,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Client whose roles are read from `resource_access`.
    pub client_id: String,
    pub keeper_interval: StdDuration,
    pub refresh_window: Duration,
    pub storage_poll: StdDuration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            keeper_interval: StdDuration::from_secs(KEEPER_INTERVAL_SECS),
            refresh_window: Duration::seconds(REFRESH_WINDOW_SECS),
            storage_poll: StdDuration::from_secs(STORAGE_POLL_SECS),
        }
    }
}

/// Clears the in-flight flag on every exit path of a refresh.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Owns the client's belief about authentication and keeps the token fresh.
///
/// Create one per process and hand it (usually behind an `Arc`) to whatever
/// needs the session; consumers follow changes through [`subscribe`].
///
/// [`subscribe`]: SessionManager::subscribe
pub struct SessionManager<S, P> {
    storage: S,
    provider: P,
    options: SessionOptions,
    state: watch::Sender<SessionState>,
    refreshing: AtomicBool,
    snapshot: Mutex<Tokens>,
}

impl<S, P> SessionManager<S, P>
where
    S: TokenStorage,
    P: IdentityProvider,
{
    pub fn new(storage: S, provider: P, options: SessionOptions) -> Self {
        let (state, _) = watch::channel(SessionState::Loading);

        Self {
            storage,
            provider,
            options,
            state,
            refreshing: AtomicBool::new(false),
            snapshot: Mutex::new(Tokens::default()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    /// Rebuilds the session from storage and publishes it.
    pub async fn load(&self) -> SessionState {
        let tokens = match self.storage.read().await {
            Ok(tokens) => tokens,
            Err(why) => {
                log::warn!("[Session] Failed to read token storage: {why:#}");

                // an unreadable file is not a logout, keep what we already know
                let current = self.state();

                if current != SessionState::Loading {
                    return current;
                }

                self.state.send_replace(SessionState::Unauthenticated);

                return SessionState::Unauthenticated;
            }
        };

        *self.snapshot.lock().await = tokens.clone();

        let state = match self.session_from(&tokens) {
            Ok(session) if session.remaining(Utc::now()) <= Duration::zero() => {
                log::debug!("[Session] Stored session expired at {}", session.expires_at);

                SessionState::Unauthenticated
            }

            Ok(session) => SessionState::Authenticated(session),

            Err(why) => {
                log::debug!("[Session] No usable session: {why:#}");

                SessionState::Unauthenticated
            }
        };

        self.state.send_replace(state.clone());

        state
    }

    fn session_from(&self, tokens: &Tokens) -> Result<Session> {
        let access_token = tokens
            .access_token
            .clone()
            .context("No access token stored")?;
        let refresh_token = tokens
            .refresh_token
            .clone()
            .context("No refresh token stored")?;

        let claims = token::decode(&access_token)?;

        let stored = tokens
            .expires_at
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single());

        // whichever comes first, a stale cache never outlives the token
        let expires_at = match (stored, claims.expires_at()) {
            (Some(stored), Some(exp)) => stored.min(exp),
            (stored, exp) => stored.or(exp).context("Token has no usable expiry")?,
        };

        let roles = claims.roles(&self.options.client_id);
        let role = CoarseRole::from_roles(&roles);

        Ok(Session {
            user: User {
                id: claims.sub.clone(),
                email: claims.email.clone(),
                name: claims.display_name(),
            },
            access_token,
            refresh_token,
            id_token: tokens.id_token.clone(),
            expires_at,
            roles,
            role,
        })
    }

    async fn persist(&self, response: TokenResponse, previous_refresh: Option<String>) -> Result<()> {
        let expires_at = Utc::now() + Duration::seconds(response.expires_in);

        let tokens = Tokens {
            access_token: Some(response.access_token),
            refresh_token: response.refresh_token.or(previous_refresh),
            id_token: response.id_token,
            expires_at: Some(expires_at.timestamp_millis()),
        };

        self.storage.write(&tokens).await
    }

    async fn authenticated(&self) -> Result<Session> {
        match self.load().await {
            SessionState::Authenticated(session) => Ok(session),
            _ => bail!("The identity provider returned an unusable token"),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Session> {
        let response = self.provider.password_grant(username, password).await?;

        self.persist(response, None).await?;

        self.authenticated().await
    }

    /// Exchanges the refresh token for a new pair. Concurrent calls collapse
    /// into the one already in flight; a failure signs the session out.
    pub async fn refresh(&self) -> Refresh {
        if self
            .refreshing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("[Session] Refresh already in flight");

            return Refresh::InFlight;
        }

        let _guard = InFlightGuard(&self.refreshing);

        match self.try_refresh().await {
            Ok(session) => {
                log::debug!("[Session] Refreshed, expires at {}", session.expires_at);

                Refresh::Refreshed(session)
            }

            Err(why) => {
                log::warn!("[Session] Refresh failed: {why:#}");

                self.sign_out().await;

                Refresh::SignedOut
            }
        }
    }

    async fn try_refresh(&self) -> Result<Session> {
        let tokens = self.storage.read().await?;

        let refresh_token = tokens.refresh_token.context("No refresh token stored")?;

        let response = self.provider.refresh_grant(&refresh_token).await?;

        self.persist(response, Some(refresh_token)).await?;

        self.authenticated().await
    }

    /// Clears stored tokens and publishes the unauthenticated state.
    pub async fn sign_out(&self) {
        let tokens = self.storage.read().await.unwrap_or_default();

        if let Err(why) = self.storage.clear().await {
            log::warn!("[Session] Failed to clear token storage: {why:#}");
        }

        if let Some(refresh_token) = tokens.refresh_token {
            if let Err(why) = self.provider.logout(&refresh_token).await {
                log::debug!("[Session] Logout request failed: {why:#}");
            }
        }

        *self.snapshot.lock().await = Tokens::default();

        self.state.send_replace(SessionState::Unauthenticated);
    }

    /// One step of the keeper timer.
    pub async fn check_expiry(&self) -> ExpiryAction {
        let expires_at = match self.state.borrow().session() {
            Some(session) => session.expires_at,
            None => return ExpiryAction::Idle,
        };

        let remaining = expires_at - Utc::now();

        if remaining <= Duration::zero() {
            log::info!("Your session expired");

            self.sign_out().await;

            return ExpiryAction::SignedOut;
        }

        if remaining > self.options.refresh_window {
            return ExpiryAction::Idle;
        }

        match self.refresh().await {
            Refresh::Refreshed(_) => ExpiryAction::Refreshed,
            Refresh::InFlight => ExpiryAction::Idle,
            Refresh::SignedOut => ExpiryAction::SignedOut,
        }
    }

    /// Runs [`check_expiry`](Self::check_expiry) on a fixed interval until the
    /// session is gone.
    pub async fn run_keeper(&self) {
        let mut ticker = interval(self.options.keeper_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if self.check_expiry().await == ExpiryAction::SignedOut
                || !self.state.borrow().is_authenticated()
            {
                log::debug!("[Session] Keeper stopped");

                return;
            }
        }
    }

    /// Reloads when another instance changes the stored tokens, until the
    /// session is gone.
    pub async fn watch_storage(&self) {
        let mut ticker = interval(self.options.storage_poll);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if self.storage_changed().await {
                log::info!("Session changed in another instance, reloading");

                self.load().await;
            }

            if !self.state.borrow().is_authenticated() {
                log::debug!("[Session] Storage watcher stopped");

                return;
            }
        }
    }

    async fn storage_changed(&self) -> bool {
        match self.storage.read().await {
            Ok(tokens) => *self.snapshot.lock().await != tokens,
            Err(why) => {
                log::debug!("[Session] Failed to poll token storage: {why:#}");

                false
            }
        }
    }
}
