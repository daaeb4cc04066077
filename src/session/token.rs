use std::collections::HashMap;

use anyhow::{anyhow, ensure, Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// The parts of the access token payload the client cares about.
///
/// Signatures are not verified here, the backend does that on every request.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    /// Seconds since the unix epoch.
    pub exp: i64,
    #[serde(default)]
    pub resource_access: HashMap<String, ResourceAccess>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ResourceAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Role names granted for `client_id`, i.e. `resource_access.<client_id>.roles`.
    pub fn roles(&self, client_id: &str) -> Vec<String> {
        self.resource_access
            .get(client_id)
            .map(|access| access.roles.clone())
            .unwrap_or_default()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.preferred_username.clone())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.sub.clone())
    }
}

pub fn decode(token: &str) -> Result<Claims> {
    let mut parts = token.split('.');

    let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(anyhow!("Token is not a JWT")),
    };

    ensure!(!payload.is_empty(), "Token has an empty payload");

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .context("Token payload is not base64url")?;

    serde_json::from_slice(&bytes).context("Token payload is not a valid claim set")
}

#[cfg(test)]
pub(crate) mod test {
    use serde_json::{json, Value};

    use super::*;

    pub(crate) fn unsigned(payload: &Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());

        format!("{header}.{payload}.c2lnbmF0dXJl")
    }

    #[test]
    fn test_decode_roles() {
        let token = unsigned(&json!({
            "sub": "6a1f",
            "email": "ana@vendaplus.com.br",
            "preferred_username": "ana",
            "exp": 1_900_000_000,
            "resource_access": {
                "vendaplus": { "roles": ["manageTeams", "manageSellers"] },
                "account": { "roles": ["view-profile"] }
            }
        }));

        let claims = decode(&token).unwrap();

        assert_eq!(claims.roles("vendaplus"), vec!["manageTeams", "manageSellers"]);
        assert_eq!(claims.roles("missing"), Vec::<String>::new());
        assert_eq!(claims.display_name(), "ana");
        assert_eq!(claims.expires_at().unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(decode("").is_err());
        assert!(decode("only.two").is_err());
        assert!(decode("a.b.c.d").is_err());
        assert!(decode("a.!!!.c").is_err());
        assert!(decode(&format!("a.{}.c", URL_SAFE_NO_PAD.encode("not json"))).is_err());
        // no exp
        assert!(decode(&unsigned(&json!({ "sub": "x" }))).is_err());
    }
}
