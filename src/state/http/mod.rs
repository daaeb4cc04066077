mod types;

use anyhow::{anyhow, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client as AsyncClient, StatusCode};

use self::types::ErrorResponse;
use crate::config::VERSION;

/// Backend REST client, authenticated with the session's bearer token.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: AsyncClient,
    base_url: String,
}

impl HttpClient {
    pub fn new(token: Option<&str>, api_url: &str) -> Result<Self> {
        let ua = format!(
            "vendaplus_cli/{VERSION} on {}",
            sys_info::os_type().unwrap_or_else(|_| "unknown".to_string())
        );

        Ok(Self {
            client: AsyncClient::builder()
                .user_agent(ua)
                .default_headers(default_headers(token)?)
                .build()?,
            base_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn handle_response<T>(&self, response: reqwest::Response) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = match response.status() {
            StatusCode::CREATED | StatusCode::NO_CONTENT => return Ok(None),
            status => {
                if !status.is_success() {
                    return Err(self.handle_error(response, status).await);
                }

                response
            }
        };

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| anyhow!(e))
    }

    async fn handle_error(&self, response: reqwest::Response, status: StatusCode) -> anyhow::Error {
        match response.json::<ErrorResponse>().await.map(ErrorResponse::into_message) {
            Ok(Some(message)) => anyhow!("{message}"),
            Ok(None) => anyhow!("Error: HTTP {status}"),
            Err(err) => {
                log::debug!("Error deserialize message: {:#?}", err);

                anyhow!("Error: HTTP {status}")
            }
        }
    }

    pub async fn request<T>(&self, method: &str, path: &str) -> Result<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let request = self
            .client
            .request(method.parse()?, self.url(path))
            .build()?;

        log::debug!("request: {} {}", method, path);

        #[cfg(debug_assertions)]
        let now = tokio::time::Instant::now();

        let response = self.client.execute(request).await?;

        #[cfg(debug_assertions)]
        log::debug!("response in: {:#?}", now.elapsed());

        self.handle_response(response).await
    }
}

fn default_headers(token: Option<&str>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();

    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))?;
        value.set_sensitive(true);

        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}
