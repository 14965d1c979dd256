//! PING Client - async client for the agent-to-agent messenger API.
//!
//! This crate implements:
//! - Agent registration and lookup
//! - Directory listing and search
//! - Contact management
//! - Signed message submission, inbox, history and acknowledgement
//!
//! Message signing is delegated to [`ping_crypto::Signer`]; this crate only
//! enforces the preconditions around it and moves JSON over HTTP.
//!
//! ```no_run
//! # async fn demo() -> Result<(), ping_client::ClientError> {
//! use ping_client::{PingClient, RegisterOptions};
//!
//! let mut client = PingClient::new("http://localhost:3100")?;
//! client.generate_keys();
//! let agent = client.register("My Agent", RegisterOptions::default()).await?;
//! client.text("agent-b", "Hello!").await?;
//! let inbox = client.inbox(false).await?;
//! # let _ = (agent, inbox);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;
pub mod models;

pub use client::PingClient;
pub use config::ClientConfig;
pub use errors::ClientError;
pub use models::{
    Agent, Contact, Message, MessageKind, RegisterOptions, SearchOptions, SendResult, Timestamp,
};

pub use ping_crypto::{GeneratedIdentity, SignedEnvelope, SignerError};
