//! PING Crypto - signing and canonical encoding for agent messages.
//!
//! This crate implements:
//! - Ed25519 identity handling (generate, load, hex encoding)
//! - Canonical JSON encoding of message content
//! - Envelope construction, detached signing and verification

#![forbid(unsafe_code)]

pub mod canonical;
pub mod envelope;
pub mod errors;
pub mod keys;
pub mod signer;

#[cfg(test)]
mod proptests;

pub use envelope::{MessageEnvelope, SignedEnvelope, CONTENT_FIELDS};
pub use errors::SignerError;
pub use signer::{GeneratedIdentity, Signer};
