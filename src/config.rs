pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(not(windows))]
pub const EXEC_NAME: &str = "vendaplus";
#[cfg(windows)]
pub const EXEC_NAME: &str = "vendaplus.exe";

pub const DEFAULT_ISSUER: &str = "https://auth.vendaplus.com.br";
pub const DEFAULT_REALM: &str = "vendaplus";
pub const DEFAULT_CLIENT_ID: &str = "vendaplus";
pub const DEFAULT_API_URL: &str = "https://api.vendaplus.com.br";

pub const ENV_ISSUER: &str = "VENDAPLUS_ISSUER";
pub const ENV_REALM: &str = "VENDAPLUS_REALM";
pub const ENV_CLIENT_ID: &str = "VENDAPLUS_CLIENT_ID";
pub const ENV_API_URL: &str = "VENDAPLUS_API_URL";

pub const SESSION_STORE_PATH: &str = ".vendaplus/session.json";
pub const CACHE_STORE_PATH: &str = ".vendaplus/cache.json";
pub const CONTEXT_STORE_PATH: &str = ".vendaplus/context.json";

/// How often the session keeper checks the remaining lifetime of the token.
pub const KEEPER_INTERVAL_SECS: u64 = 30;
/// Trailing window before expiry in which the token gets refreshed.
pub const REFRESH_WINDOW_SECS: i64 = 60;
/// How often other instances' writes to the token store are picked up.
pub const STORAGE_POLL_SECS: u64 = 2;

pub const RECONNECT_BASE_MS: u64 = 1_000;
pub const RECONNECT_MAX_MS: u64 = 30_000;
pub const RECONNECT_MAX_ATTEMPTS: u32 = 10;
