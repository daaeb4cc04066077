use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client as AsyncClient, StatusCode};
use serde::Deserialize;

use crate::config::VERSION;

/// Token endpoint response, extra fields are ignored.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenError {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn password_grant(&self, username: &str, password: &str) -> Result<TokenResponse>;
    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse>;
    async fn logout(&self, refresh_token: &str) -> Result<()>;
}

/// OpenID Connect client for a realm on the identity provider.
#[derive(Debug, Clone)]
pub struct OpenIdClient {
    client: AsyncClient,
    base_url: String,
    client_id: String,
}

impl OpenIdClient {
    pub fn new(issuer: &str, realm: &str, client_id: &str) -> Result<Self> {
        let client = AsyncClient::builder()
            .user_agent(format!("vendaplus_cli/{VERSION}"))
            .build()?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/realms/{realm}/protocol/openid-connect",
                issuer.trim_end_matches('/')
            ),
            client_id: client_id.to_string(),
        })
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }

    async fn token(&self, form: &[(&str, &str)]) -> Result<TokenResponse> {
        let grant = form
            .iter()
            .find(|(key, _)| *key == "grant_type")
            .map_or("unknown", |(_, value)| *value);

        log::debug!("[Session] POST token ({grant} grant)");

        let response = self
            .client
            .post(self.endpoint("token"))
            .form(form)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            return Err(Self::error(response, status).await);
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| anyhow!("Invalid token response: {e}"))
    }

    async fn error(response: reqwest::Response, status: StatusCode) -> anyhow::Error {
        match response.json::<TokenError>().await {
            Ok(TokenError {
                error_description: Some(description),
                ..
            }) => anyhow!("{description}"),
            Ok(TokenError { error, .. }) => anyhow!("{error}"),
            Err(err) => {
                log::debug!("Error deserialize message: {:#?}", err);

                anyhow!("Error: HTTP {status}")
            }
        }
    }
}

#[async_trait]
impl IdentityProvider for OpenIdClient {
    async fn password_grant(&self, username: &str, password: &str) -> Result<TokenResponse> {
        self.token(&[
            ("grant_type", "password"),
            ("client_id", self.client_id.as_str()),
            ("username", username),
            ("password", password),
            ("scope", "openid"),
        ])
        .await
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenResponse> {
        self.token(&[
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ])
        .await
    }

    async fn logout(&self, refresh_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            return Err(Self::error(response, status).await);
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_endpoints() {
        let client = OpenIdClient::new("https://auth.example/", "crm", "vendaplus").unwrap();

        assert_eq!(
            client.endpoint("token"),
            "https://auth.example/realms/crm/protocol/openid-connect/token"
        );
        assert_eq!(
            client.endpoint("logout"),
            "https://auth.example/realms/crm/protocol/openid-connect/logout"
        );
    }

    #[test]
    fn test_token_response_extra_fields() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":300,"token_type":"Bearer","not-before-policy":0}"#,
        )
        .unwrap();

        assert_eq!(response.expires_in, 300);
        assert!(response.id_token.is_none());
    }
}
