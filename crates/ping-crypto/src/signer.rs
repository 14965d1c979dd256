//! Signer / envelope builder.
//!
//! Holds at most one Ed25519 signing key. The key is either unset or set and
//! only changes through [`Signer::generate_identity`] or
//! [`Signer::load_identity`]. Both take `&mut self`, so a signer shared between
//! threads has to sit behind a lock for those calls while signing only needs
//! shared access.

use std::fmt;

use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde::Serialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::envelope::{MessageEnvelope, SignedEnvelope};
use crate::errors::SignerError;
use crate::keys;

/// Hex-encoded keypair returned by [`Signer::generate_identity`].
///
/// The private key string is wiped when this value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct GeneratedIdentity {
    /// 32-byte private seed, hex
    pub private_key: String,
    /// 32-byte public key, hex
    pub public_key: String,
}

impl fmt::Debug for GeneratedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedIdentity")
            .field("private_key", &"<redacted>")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// Owns the signing key and produces signed envelopes.
#[derive(Clone, Default)]
pub struct Signer {
    // SigningKey zeroizes itself on drop
    key: Option<SigningKey>,
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("public_key", &self.public_key())
            .finish()
    }
}

impl Signer {
    /// Signer with no key loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signer loaded from a hex private key.
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, SignerError> {
        let mut signer = Self::new();
        signer.load_identity(private_key_hex)?;
        Ok(signer)
    }

    /// Generate a fresh keypair from the OS random source and hold it,
    /// replacing any previous key.
    pub fn generate_identity(&mut self) -> GeneratedIdentity {
        let key = SigningKey::generate(&mut OsRng);
        let identity = GeneratedIdentity {
            private_key: keys::encode_hex(&key.to_bytes()),
            public_key: keys::encode_hex(key.verifying_key().as_bytes()),
        };
        self.key = Some(key);
        identity
    }

    /// Load a hex private key and return the derived public key (hex).
    ///
    /// On error the previously held key, if any, is kept.
    pub fn load_identity(&mut self, private_key_hex: &str) -> Result<String, SignerError> {
        let key = keys::decode_signing_key(private_key_hex)?;
        let public_key = keys::encode_hex(key.verifying_key().as_bytes());
        self.key = Some(key);
        Ok(public_key)
    }

    /// Whether a key is held.
    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    /// Hex public key, if a key is held.
    pub fn public_key(&self) -> Option<String> {
        self.verifying_key()
            .map(|vk| keys::encode_hex(vk.as_bytes()))
    }

    pub fn verifying_key(&self) -> Option<VerifyingKey> {
        self.key.as_ref().map(SigningKey::verifying_key)
    }

    /// Short fingerprint of the public key for display.
    pub fn fingerprint(&self) -> Option<String> {
        self.verifying_key().map(|vk| keys::fingerprint(&vk))
    }

    /// Detached signature over raw bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; keys::SIGNATURE_LENGTH], SignerError> {
        let key = self.key.as_ref().ok_or(SignerError::KeyNotConfigured)?;
        Ok(key.sign(message).to_bytes())
    }

    /// Sign an already built envelope.
    pub fn sign_envelope(&self, envelope: MessageEnvelope) -> Result<SignedEnvelope, SignerError> {
        let key = self.key.as_ref().ok_or(SignerError::KeyNotConfigured)?;
        let content = envelope.canonical_bytes()?;
        let signature = key.sign(&content);
        Ok(envelope.with_signature(&signature.to_bytes()))
    }

    /// Build the canonical envelope from its fields and sign it.
    ///
    /// Fails with [`SignerError::KeyNotConfigured`] before looking at the
    /// fields when no key is held.
    pub fn build_and_sign<P: Serialize + ?Sized>(
        &self,
        message_type: &str,
        from: &str,
        to: &str,
        payload: &P,
        reply_to: Option<&str>,
        timestamp: i64,
    ) -> Result<SignedEnvelope, SignerError> {
        if !self.is_configured() {
            return Err(SignerError::KeyNotConfigured);
        }
        let envelope = MessageEnvelope::new(message_type, from, to, payload, reply_to, timestamp)?;
        self.sign_envelope(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_starts_unset() {
        let signer = Signer::new();
        assert!(!signer.is_configured());
        assert!(signer.public_key().is_none());
        assert!(signer.fingerprint().is_none());
    }

    #[test]
    fn test_sign_without_key_fails() {
        let signer = Signer::new();
        let result = signer.build_and_sign("text", "agent-A", "agent-B", &json!({}), None, 1);
        assert!(matches!(result, Err(SignerError::KeyNotConfigured)));
        assert!(matches!(signer.sign(b"x"), Err(SignerError::KeyNotConfigured)));
    }

    #[test]
    fn test_key_check_precedes_field_validation() {
        let signer = Signer::new();
        let result = signer.build_and_sign("", "a", "b", &json!({}), None, 1);
        assert!(matches!(result, Err(SignerError::KeyNotConfigured)));
    }

    #[test]
    fn test_generate_identity_sets_key() {
        let mut signer = Signer::new();
        let identity = signer.generate_identity();

        assert!(signer.is_configured());
        assert_eq!(identity.private_key.len(), 64);
        assert_eq!(identity.public_key.len(), 64);
        assert_eq!(signer.public_key().as_deref(), Some(identity.public_key.as_str()));
    }

    #[test]
    fn test_generate_replaces_key() {
        let mut signer = Signer::new();
        let first = signer.generate_identity();
        let second = signer.generate_identity();
        assert_ne!(first.public_key, second.public_key);
        assert_eq!(signer.public_key().unwrap(), second.public_key);
    }

    #[test]
    fn test_load_identity_round_trip() {
        let mut original = Signer::new();
        let identity = original.generate_identity();

        let mut loaded = Signer::new();
        let public_key = loaded.load_identity(&identity.private_key).unwrap();
        assert_eq!(public_key, identity.public_key);

        let a = original.sign(b"same bytes").unwrap();
        let b = loaded.sign(b"same bytes").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_failed_load_keeps_previous_key() {
        let mut signer = Signer::new();
        let identity = signer.generate_identity();

        assert!(matches!(
            signer.load_identity("not-hex"),
            Err(SignerError::InvalidKeyFormat(_))
        ));
        assert_eq!(signer.public_key().unwrap(), identity.public_key);
    }

    #[test]
    fn test_example_scenario() {
        let mut signer = Signer::new();
        let identity = signer.generate_identity();

        let signed = signer
            .build_and_sign(
                "text",
                "agent-A",
                "agent-B",
                &json!({"text": "Hello!"}),
                None,
                1_700_000_000_000,
            )
            .unwrap();
        assert_eq!(signed.signature.len(), 128);
        assert!(signed.verify(&identity.public_key).is_ok());

        let mut tampered = signed.clone();
        tampered.envelope.payload = json!({"text": "Hello?"});
        assert!(matches!(
            tampered.verify(&identity.public_key),
            Err(SignerError::BadSignature)
        ));
    }

    #[test]
    fn test_non_finite_payload_is_not_signed() {
        let mut signer = Signer::new();
        signer.generate_identity();

        let nested = signer.build_and_sign("text", "a", "b", &json!({"ok": 1}), None, 1);
        assert!(nested.is_ok());

        let mut reading = std::collections::HashMap::new();
        reading.insert("reading", f64::NAN);
        let result = signer.build_and_sign("text", "a", "b", &reading, None, 1);
        assert!(matches!(result, Err(SignerError::Serialization(_))));

        let result = signer.build_and_sign("text", "a", "b", &f64::INFINITY, None, 1);
        assert!(matches!(result, Err(SignerError::Serialization(_))));
    }

    #[test]
    fn test_from_private_key() {
        let mut original = Signer::new();
        let identity = original.generate_identity();

        let signer = Signer::from_private_key(&identity.private_key).unwrap();
        assert_eq!(signer.public_key().unwrap(), identity.public_key);
        assert!(matches!(
            Signer::from_private_key("abcd"),
            Err(SignerError::InvalidKeyFormat(_))
        ));
    }

    #[test]
    fn test_wrong_key_fails_verification() {
        let mut alice = Signer::new();
        alice.generate_identity();
        let mut mallory = Signer::new();
        let other = mallory.generate_identity();

        let signed = alice
            .build_and_sign("ping", "alice", "bob", &json!({}), None, 42)
            .unwrap();
        assert!(signed.verify(&other.public_key).is_err());
    }

    #[test]
    fn test_debug_does_not_leak_private_key() {
        let mut signer = Signer::new();
        let identity = signer.generate_identity();
        let rendered = format!("{identity:?} {signer:?}");
        assert!(!rendered.contains(&identity.private_key));
        assert!(rendered.contains("<redacted>"));
    }
}
