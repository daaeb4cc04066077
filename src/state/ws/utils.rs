use async_tungstenite::tokio::{connect_async, ConnectStream};
use async_tungstenite::WebSocketStream;
use reqwest::Url;

use super::error::{RelayError, Result};

pub type WsStream = WebSocketStream<ConnectStream>;

pub async fn connect(url: &str) -> Result<WsStream> {
    let (stream, _) = connect_async(url).await?;

    Ok(stream)
}

/// `https://api.host/v1` becomes `wss://api.host/ws`.
pub fn ws_url(api_url: &str) -> Result<String> {
    let invalid = || RelayError::InvalidUrl(api_url.to_string());

    let mut url = Url::parse(api_url).map_err(|_| invalid())?;

    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        _ => return Err(invalid().into()),
    };

    url.set_scheme(scheme).map_err(|()| invalid())?;
    url.set_path("/ws");
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}
