//! Message envelopes and their signed wire form.
//!
//! The signed content is the canonical JSON object of the six content fields
//! in [`CONTENT_FIELDS`] order. The `signature` field is appended afterwards
//! and never takes part in the bytes it covers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::canonical;
use crate::errors::SignerError;
use crate::keys;

/// Content fields in signing order.
pub const CONTENT_FIELDS: [&str; 6] = ["type", "from", "to", "payload", "replyTo", "timestamp"];

/// A message before signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type")]
    pub message_type: String,
    pub from: String,
    pub to: String,
    #[serde(default = "empty_payload")]
    pub payload: Value,
    #[serde(rename = "replyTo", default)]
    pub reply_to: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

impl MessageEnvelope {
    /// Build an envelope from caller-supplied fields.
    ///
    /// `from` and `to` are opaque and not validated here. A payload that
    /// serializes to `null` becomes an empty mapping. NaN and infinite
    /// numbers anywhere in the payload are rejected.
    pub fn new<P: Serialize + ?Sized>(
        message_type: &str,
        from: &str,
        to: &str,
        payload: &P,
        reply_to: Option<&str>,
        timestamp: i64,
    ) -> Result<Self, SignerError> {
        if message_type.is_empty() {
            return Err(SignerError::EmptyMessageType);
        }

        let payload = match canonical::to_value(payload)? {
            Value::Null => empty_payload(),
            value => value,
        };

        Ok(Self {
            message_type: message_type.to_string(),
            from: from.to_string(),
            to: to.to_string(),
            payload,
            reply_to: reply_to.map(str::to_string),
            timestamp,
        })
    }

    /// Exact bytes covered by the signature.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, SignerError> {
        let message_type = Value::String(self.message_type.clone());
        let from = Value::String(self.from.clone());
        let to = Value::String(self.to.clone());
        let reply_to = self
            .reply_to
            .as_ref()
            .map(|id| Value::String(id.clone()))
            .unwrap_or(Value::Null);
        let timestamp = Value::from(self.timestamp);

        let [f_type, f_from, f_to, f_payload, f_reply, f_ts] = CONTENT_FIELDS;
        let mut out = Vec::with_capacity(256);
        canonical::write_ordered_object(
            &mut out,
            &[
                (f_type, &message_type),
                (f_from, &from),
                (f_to, &to),
                (f_payload, &self.payload),
                (f_reply, &reply_to),
                (f_ts, &timestamp),
            ],
        )?;
        Ok(out)
    }

    /// Attach an already computed signature.
    pub fn with_signature(self, signature: &[u8]) -> SignedEnvelope {
        SignedEnvelope {
            envelope: self,
            signature: keys::encode_hex(signature),
        }
    }
}

/// Envelope plus its hex-encoded detached signature. This is the unit sent
/// to the message-submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    #[serde(flatten)]
    pub envelope: MessageEnvelope,
    pub signature: String,
}

impl SignedEnvelope {
    /// Bytes the signature was computed over.
    pub fn content_bytes(&self) -> Result<Vec<u8>, SignerError> {
        self.envelope.canonical_bytes()
    }

    /// Verify the signature against a hex-encoded Ed25519 public key.
    pub fn verify(&self, public_key_hex: &str) -> Result<(), SignerError> {
        let public_key = keys::decode_public_key(public_key_hex)?;
        let signature = keys::decode_signature(&self.signature)?;
        let content = self.content_bytes()?;
        keys::verify_signature(&public_key, &content, &signature)
    }

    /// Drop the signature and return the content.
    pub fn into_envelope(self) -> MessageEnvelope {
        self.envelope
    }
}
