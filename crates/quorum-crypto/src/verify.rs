//! Compact signature verification

use crate::keys::GuardianKey;
use base64::{engine::general_purpose, Engine as _};
use p256::ecdsa::Signature;
use sha2::{Digest, Sha256};
use signature::DigestVerifier;
use thiserror::Error;

/// `r || s`, 32 bytes each
pub const COMPACT_SIGNATURE_LEN: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("invalid base64:: {0}")]
    InvalidBase64(String),

    #[error("invalid signature length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("signature scalars out of range")]
    InvalidEncoding,

    #[error("verification failed")]
    VerificationFailed,
}

impl SignatureError {
    /// The signature could not be decoded at all, as opposed to not matching
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, SignatureError::VerificationFailed)
    }
}

/// Decode a base64 compact signature
pub fn decode_signature(encoded: &str) -> Result<Signature, SignatureError> {
    let bytes = general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| SignatureError::InvalidBase64(e.to_string()))?;

    if bytes.len() != COMPACT_SIGNATURE_LEN {
        return Err(SignatureError::InvalidLength {
            expected: COMPACT_SIGNATURE_LEN,
            actual: bytes.len(),
        });
    }

    Signature::from_slice(&bytes).map_err(|_| SignatureError::InvalidEncoding)
}

/// Verify an ECDSA P-256/SHA-256 signature over `message`
pub fn verify_signature(
    key: &GuardianKey,
    message: &[u8],
    encoded: &str,
) -> Result<(), SignatureError> {
    let sig = decode_signature(encoded)?;
    if verify_decoded(key, message, &sig) {
        Ok(())
    } else {
        Err(SignatureError::VerificationFailed)
    }
}

/// Check an already decoded signature, for callers trying several messages
/// against one signature
pub fn verify_decoded(key: &GuardianKey, message: &[u8], sig: &Signature) -> bool {
    key.verifying_key()
        .verify_digest(Sha256::new_with_prefix(message), sig)
        .is_ok()
}

/// Boolean form of [`verify_signature`]. Undecodable input is simply `false`.
pub fn verify_compact(key: &GuardianKey, message: &[u8], encoded: &str) -> bool {
    verify_signature(key, message, encoded).is_ok()
}
