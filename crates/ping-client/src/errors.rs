//! Error types for the API client.

use ping_crypto::SignerError;
use thiserror::Error;

/// Errors returned by [`crate::PingClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server answered with a non-2xx status
    #[error("{message} (HTTP {status})")]
    Api { status: u16, message: String },

    /// Transport failure: connect, timeout, TLS, body read
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not registered: call register() or set an agent id first")]
    NotRegistered,

    #[error("no signing keys: generate or set keys first")]
    KeysRequired,

    #[error(transparent)]
    Signer(#[from] SignerError),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Response body did not match the expected shape
    #[error("bad response: {0}")]
    Decode(String),
}

/// Payload or body serialization failures surface as signer errors.
impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Signer(err.into())
    }
}

impl ClientError {
    /// HTTP status for API errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the server could not be reached or did not answer in time.
    pub fn is_connection(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_connect() || e.is_timeout())
    }

    /// Whether a local precondition failed before any request was made.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ClientError::NotRegistered
                | ClientError::KeysRequired
                | ClientError::Signer(SignerError::KeyNotConfigured)
        )
    }
}
