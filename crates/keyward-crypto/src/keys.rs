//! SSH public key handling
//!
//! Directories store key material in one of two shapes:
//! - the raw SSH wire-format key blob, base64 encoded
//! - a full authorized-keys line (`[options] algorithm base64 [comment]`)
//!
//! The blob form is tried first; the authorized-keys form is the fallback.

use base64::{engine::general_purpose::STANDARD, Engine};
use signature::Verifier;
use ssh_key::{authorized_keys::Entry, public::KeyData, HashAlg, PublicKey, Signature};
use std::str::FromStr;
use thiserror::Error;

/// Key parsing errors
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Key material is empty")]
    Empty,

    #[error("Not a base64 key blob or authorized-keys line: {0}")]
    Unparseable(String),
}

/// Parse key material stored in a directory attribute or keys file
pub fn parse_public_key(material: &str) -> Result<PublicKey, KeyError> {
    let material = material.trim();
    if material.is_empty() {
        return Err(KeyError::Empty);
    }

    if let Some(key) = decode_key_blob(material) {
        return Ok(key);
    }

    Entry::from_str(material)
        .map(|entry| entry.public_key().clone())
        .map_err(|e| KeyError::Unparseable(e.to_string()))
}

fn decode_key_blob(material: &str) -> Option<PublicKey> {
    let bytes = STANDARD.decode(material).ok()?;
    PublicKey::from_bytes(&bytes).ok()
}

/// Check `signature` over `challenge` under `key`
pub fn verify_signature(key: &PublicKey, challenge: &[u8], signature: &Signature) -> bool {
    <KeyData as Verifier<Signature>>::verify(key.key_data(), challenge, signature).is_ok()
}

/// SHA256 fingerprint in the `SHA256:...` form used by OpenSSH
pub fn fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

/// Encode a key as the base64 wire blob accepted by [`parse_public_key`]
pub fn encode_key_blob(key: &PublicKey) -> Result<String, KeyError> {
    key.to_bytes()
        .map(|bytes| STANDARD.encode(bytes))
        .map_err(|e| KeyError::Unparseable(e.to_string()))
}
