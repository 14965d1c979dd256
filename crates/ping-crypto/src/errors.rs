//! Error types for the signer and envelope builder.
//!
//! All failures are local and synchronous. Nothing here is retried.

use thiserror::Error;

/// Errors raised while building, signing or verifying envelopes.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Signing attempted before an identity was generated or loaded
    #[error("signing key not configured: generate or load an identity first")]
    KeyNotConfigured,

    /// Supplied private key is not hex or has the wrong length
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// Payload could not be represented as JSON
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("message type must not be empty")]
    EmptyMessageType,

    #[error("invalid public key")]
    InvalidPublicKey,

    /// Signature is not 64 bytes of hex
    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("signature verification failed")]
    BadSignature,
}
