//! Request authentication for interaction webhooks.
//!
//! The platform signs `timestamp || raw_body` with the application's ed25519 key. The
//! body must be the exact bytes received; a re-serialized payload will not verify.

use ed25519_dalek::{Signature, VerifyingKey, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "x-signature-ed25519";
pub const TIMESTAMP_HEADER: &str = "x-signature-timestamp";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("verification key is not a valid ed25519 public key")]
    MalformedKey,
    #[error("signature is not 64 hex-encoded bytes")]
    MalformedSignature,
    #[error("signature does not match the request")]
    Mismatch,
}

/// Decodes a hex public key, rejecting anything that is not a valid curve point.
pub fn parse_key(key_hex: &str) -> Result<VerifyingKey, SignatureError> {
    let bytes: [u8; PUBLIC_KEY_LENGTH] = hex::decode(key_hex.trim())
        .ok()
        .and_then(|raw| raw.try_into().ok())
        .ok_or(SignatureError::MalformedKey)?;

    VerifyingKey::from_bytes(&bytes).map_err(|_| SignatureError::MalformedKey)
}

fn parse_signature(signature_hex: &str) -> Result<Signature, SignatureError> {
    let bytes: [u8; SIGNATURE_LENGTH] = hex::decode(signature_hex.trim())
        .ok()
        .and_then(|raw| raw.try_into().ok())
        .ok_or(SignatureError::MalformedSignature)?;

    Ok(Signature::from_bytes(&bytes))
}

pub fn verify(
    body: &[u8],
    timestamp: &str,
    signature_hex: &str,
    key_hex: &str,
) -> Result<(), SignatureError> {
    let key = parse_key(key_hex)?;
    let signature = parse_signature(signature_hex)?;

    let mut message = Vec::with_capacity(timestamp.len() + body.len());
    message.extend_from_slice(timestamp.as_bytes());
    message.extend_from_slice(body);

    key.verify_strict(&message, &signature).map_err(|_| SignatureError::Mismatch)
}

/// Boolean form used by the gateway: every failure mode is simply "not authentic".
pub fn authenticate(body: &[u8], timestamp: &str, signature_hex: &str, key_hex: &str) -> bool {
    verify(body, timestamp, signature_hex, key_hex).is_ok()
}
