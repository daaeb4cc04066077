use std::error::Error as StdError;
use std::fmt;

use async_tungstenite::tungstenite::error::Error as TungsteniteError;
use async_tungstenite::tungstenite::protocol::CloseFrame;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    Relay(RelayError),
    Tungstenite(TungsteniteError),
}

#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum RelayError {
    Closed(Option<CloseFrame<'static>>),
    InvalidUrl(String),
    ReconnectFailure,
}

impl From<RelayError> for Error {
    fn from(e: RelayError) -> Self {
        Self::Relay(e)
    }
}

impl From<TungsteniteError> for Error {
    fn from(e: TungsteniteError) -> Self {
        Self::Tungstenite(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tungstenite(inner) => fmt::Display::fmt(&inner, f),
            Self::Relay(inner) => fmt::Display::fmt(&inner, f),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Tungstenite(inner) => Some(inner),
            Self::Relay(inner) => Some(inner),
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed(Some(frame)) => write!(f, "Connection closed ({})", u16::from(frame.code)),
            Self::Closed(None) => f.write_str("Connection closed"),
            Self::InvalidUrl(url) => write!(f, "Invalid websocket url: {url}"),
            Self::ReconnectFailure => f.write_str("Failed to reconnect"),
        }
    }
}

impl StdError for RelayError {}
