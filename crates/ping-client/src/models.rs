//! Wire models for the PING API.
//!
//! Field names are camelCase on the wire. Response models default every field
//! except ids so that servers returning a subset still decode.

use chrono::DateTime;
use ping_crypto::{MessageEnvelope, SignedEnvelope};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Provider reported at registration when none is given.
pub const DEFAULT_PROVIDER: &str = "rust";

/// A registered agent as returned by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub created_at: String,
}

/// Message timestamp as stored by the server.
///
/// Some deployments echo the signed integer milliseconds, others return an
/// RFC 3339 string. A few round-trip numbers through a float, so `1.7e12`
/// is accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Float(f64),
    Text(String),
}

impl Timestamp {
    /// Milliseconds since the Unix epoch, if the value can be read as such.
    pub fn as_millis(&self) -> Option<i64> {
        match self {
            Timestamp::Millis(ms) => Some(*ms),
            Timestamp::Float(ms) => float_millis(*ms),
            Timestamp::Text(text) => text.parse::<i64>().ok().or_else(|| {
                DateTime::parse_from_rfc3339(text)
                    .ok()
                    .map(|dt| dt.timestamp_millis())
            }),
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Timestamp::Millis(ms) => match DateTime::from_timestamp_millis(*ms) {
                Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                None => write!(f, "{ms}"),
            },
            Timestamp::Float(ms) => {
                match float_millis(*ms).and_then(DateTime::from_timestamp_millis) {
                    Some(dt) => write!(f, "{}", dt.to_rfc3339()),
                    None => write!(f, "{ms}"),
                }
            }
            Timestamp::Text(text) => f.write_str(text),
        }
    }
}

/// Whole milliseconds only; a fractional value cannot match a signed integer.
fn float_millis(ms: f64) -> Option<i64> {
    const LIMIT: f64 = 9_007_199_254_740_992.0; // 2^53
    if ms.is_finite() && ms.fract() == 0.0 && ms.abs() <= LIMIT {
        Some(ms as i64)
    } else {
        None
    }
}

/// A stored message from an inbox or history listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default)]
    pub acknowledged: bool,
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

impl Message {
    /// Rebuild the signed envelope this message was submitted as.
    ///
    /// Returns `None` when the stored timestamp cannot be read back as
    /// milliseconds, in which case the signed bytes are unrecoverable.
    pub fn signed_envelope(&self) -> Option<SignedEnvelope> {
        let timestamp = self.timestamp.as_ref()?.as_millis()?;
        let payload = match &self.payload {
            Value::Null => empty_payload(),
            other => other.clone(),
        };
        Some(SignedEnvelope {
            envelope: MessageEnvelope {
                message_type: self.message_type.clone(),
                from: self.from.clone(),
                to: self.to.clone(),
                payload,
                reply_to: self.reply_to.clone(),
                timestamp,
            },
            signature: self.signature.clone(),
        })
    }

    /// `payload.text` for text messages.
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(Value::as_str)
    }
}

/// Result of submitting a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResult {
    pub id: String,
    #[serde(default)]
    pub delivered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<String>,
}

/// An entry in an agent's contact list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub contact_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub added_at: String,
    /// Directory entry of the contact, when the server embeds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<Value>,
}

/// Message types the convenience senders produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Text,
    Ping,
    Pong,
    Request,
    Response,
    Proposal,
    Signature,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Ping => "ping",
            MessageKind::Pong => "pong",
            MessageKind::Request => "request",
            MessageKind::Response => "response",
            MessageKind::Proposal => "proposal",
            MessageKind::Signature => "signature",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`crate::PingClient::register`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterOptions {
    pub provider: String,
    pub capabilities: Vec<String>,
    pub webhook_url: Option<String>,
    pub is_public: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            capabilities: Vec::new(),
            webhook_url: None,
            is_public: false,
        }
    }
}

impl RegisterOptions {
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }
}

/// Filters for [`crate::PingClient::search`]. Unset filters are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchOptions {
    pub query: Option<String>,
    pub capability: Option<String>,
    pub provider: Option<String>,
}

impl SearchOptions {
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Query pairs in wire order, skipping unset filters.
    pub(crate) fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("q", self.query.as_deref()),
            ("capability", self.capability.as_deref()),
            ("provider", self.provider.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect()
    }
}

/// Body of `POST /agents`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterRequest<'a> {
    pub public_key: &'a str,
    pub name: &'a str,
    pub provider: &'a str,
    pub capabilities: &'a [String],
    pub webhook_url: Option<&'a str>,
    pub is_public: bool,
}

/// Body of `POST /agents/{id}/contacts`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddContactRequest<'a> {
    pub contact_id: &'a str,
    pub alias: Option<&'a str>,
    pub notes: Option<&'a str>,
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|message| !message.is_empty())
    }
}
