//! Key material encoding for Ed25519 identities.
//!
//! Keys travel as lowercase hex of their raw bytes: 32-byte private seeds and
//! public keys (64 characters) and 64-byte detached signatures (128 characters).

use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::errors::SignerError;

/// Length of an Ed25519 private seed in bytes.
pub const SECRET_KEY_LENGTH: usize = ed25519_dalek::SECRET_KEY_LENGTH;
/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LENGTH: usize = ed25519_dalek::PUBLIC_KEY_LENGTH;
/// Length of a detached Ed25519 signature in bytes.
pub const SIGNATURE_LENGTH: usize = ed25519_dalek::SIGNATURE_LENGTH;

// seed || public, as emitted by libraries that store the expanded form
const KEYPAIR_LENGTH: usize = ed25519_dalek::KEYPAIR_LENGTH;

/// Lowercase hex encoding.
pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex private key into a signing key.
///
/// Accepts the 32-byte seed or the 64-byte `seed || public` form. In the
/// expanded form the public half must match the one derived from the seed.
pub fn decode_signing_key(private_key_hex: &str) -> Result<SigningKey, SignerError> {
    let bytes = Zeroizing::new(
        hex::decode(private_key_hex.trim())
            .map_err(|e| SignerError::InvalidKeyFormat(format!("not hex: {e}")))?,
    );

    match bytes.len() {
        SECRET_KEY_LENGTH => {
            let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
            seed.copy_from_slice(&bytes);
            Ok(SigningKey::from_bytes(&seed))
        }
        KEYPAIR_LENGTH => {
            let mut pair = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
            pair.copy_from_slice(&bytes);
            SigningKey::from_keypair_bytes(&pair).map_err(|_| {
                SignerError::InvalidKeyFormat("public key half does not match seed".to_string())
            })
        }
        got => Err(SignerError::InvalidKeyFormat(format!(
            "expected {SECRET_KEY_LENGTH} or {KEYPAIR_LENGTH} bytes, got {got}"
        ))),
    }
}

/// Decode a hex public key.
pub fn decode_public_key(public_key_hex: &str) -> Result<VerifyingKey, SignerError> {
    let bytes = hex::decode(public_key_hex.trim()).map_err(|_| SignerError::InvalidPublicKey)?;
    let arr: [u8; PUBLIC_KEY_LENGTH] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| SignerError::InvalidPublicKey)?;
    VerifyingKey::from_bytes(&arr).map_err(|_| SignerError::InvalidPublicKey)
}

/// Decode a hex detached signature.
pub fn decode_signature(signature_hex: &str) -> Result<Signature, SignerError> {
    let bytes = hex::decode(signature_hex.trim())
        .map_err(|e| SignerError::InvalidSignature(format!("not hex: {e}")))?;
    let arr: [u8; SIGNATURE_LENGTH] = bytes.as_slice().try_into().map_err(|_| {
        SignerError::InvalidSignature(format!(
            "expected {SIGNATURE_LENGTH} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(Signature::from_bytes(&arr))
}

/// Verify an Ed25519 signature.
///
/// # Arguments
/// * `public_key` - The signer's public key
/// * `message` - The exact bytes that were signed
/// * `signature` - The detached signature
pub fn verify_signature(
    public_key: &VerifyingKey,
    message: &[u8],
    signature: &Signature,
) -> Result<(), SignerError> {
    public_key
        .verify_strict(message, signature)
        .map_err(|_| SignerError::BadSignature)
}

/// Short display fingerprint: first 8 bytes of SHA-256(public key), hex.
pub fn fingerprint(public_key: &VerifyingKey) -> String {
    let mut hasher = Sha256::new();
    hasher.update(public_key.as_bytes());
    let hash = hasher.finalize();
    hex::encode(&hash[..8])
}
