use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::utils::home_path;
use super::Storable;
use crate::config::{
    CONTEXT_STORE_PATH, DEFAULT_API_URL, DEFAULT_CLIENT_ID, DEFAULT_ISSUER, DEFAULT_REALM,
    ENV_API_URL, ENV_CLIENT_ID, ENV_ISSUER, ENV_REALM,
};
use crate::impl_store;

/// Saved overrides for where the client talks to.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Context {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl Context {
    pub fn issuer(&self) -> String {
        resolve(ENV_ISSUER, &self.issuer, DEFAULT_ISSUER)
    }

    pub fn realm(&self) -> String {
        resolve(ENV_REALM, &self.realm, DEFAULT_REALM)
    }

    pub fn client_id(&self) -> String {
        resolve(ENV_CLIENT_ID, &self.client_id, DEFAULT_CLIENT_ID)
    }

    pub fn api_url(&self) -> String {
        resolve(ENV_API_URL, &self.api_url, DEFAULT_API_URL)
    }
}

// environment wins over the saved context, which wins over the default
fn resolve(env: &str, saved: &Option<String>, default: &str) -> String {
    std::env::var(env)
        .ok()
        .filter(|value| !value.is_empty())
        .or_else(|| saved.clone())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

impl Storable for Context {
    fn path() -> Result<PathBuf> {
        home_path(CONTEXT_STORE_PATH)
    }
}

impl_store!(Context);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_resolve_order() {
        let saved = Some("https://saved.example/".to_string());

        assert_eq!(
            resolve("VENDAPLUS_TEST_UNSET_VAR", &saved, "https://default.example"),
            "https://saved.example"
        );
        assert_eq!(
            resolve("VENDAPLUS_TEST_UNSET_VAR", &None, "https://default.example"),
            "https://default.example"
        );
    }
}
