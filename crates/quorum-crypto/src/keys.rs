//! Guardian key representations
//!
//! Guardians publish their P-256 keys as hex-encoded SEC1 uncompressed points.
//! Only verification handles are produced from them; signing keys exist for
//! fixtures and local tooling.

use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use signature::DigestSigner;
use thiserror::Error;

/// Length of a SEC1 uncompressed P-256 point
pub const UNCOMPRESSED_KEY_LEN: usize = 65;

/// SEC1 tag byte for an uncompressed point
pub const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("invalid hex:: {0}")]
    InvalidHex(String),

    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid key prefix: expected 0x04, got {0:#04x}")]
    InvalidPrefix(u8),

    #[error("key is not a point on P-256")]
    InvalidPoint,
}

/// Verification-only guardian public key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardianKey(VerifyingKey);

impl GuardianKey {
    /// Parse a hex string, with or without a `0x` prefix
    pub fn from_hex(encoded: &str) -> Result<Self, KeyError> {
        let trimmed = encoded.trim();
        let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(digits).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_uncompressed(&bytes)
    }

    /// Import raw SEC1 bytes. Compressed and identity encodings are rejected.
    pub fn from_uncompressed(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != UNCOMPRESSED_KEY_LEN {
            return Err(KeyError::InvalidLength {
                expected: UNCOMPRESSED_KEY_LEN,
                actual: bytes.len(),
            });
        }
        if bytes[0] != UNCOMPRESSED_POINT_TAG {
            return Err(KeyError::InvalidPrefix(bytes[0]));
        }

        let key = VerifyingKey::from_sec1_bytes(bytes).map_err(|_| KeyError::InvalidPoint)?;
        Ok(Self(key))
    }

    /// SEC1 uncompressed encoding
    pub fn to_uncompressed(&self) -> Vec<u8> {
        self.0.to_encoded_point(false).as_bytes().to_vec()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_uncompressed())
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.0
    }
}

/// P-256 signing key, used to produce guardian-style attestations
#[derive(Clone, Debug)]
pub struct PrivateKey(SigningKey);

impl PrivateKey {
    pub fn generate() -> Self {
        Self(SigningKey::random(&mut OsRng))
    }

    pub fn public_key(&self) -> GuardianKey {
        GuardianKey(*self.0.verifying_key())
    }

    /// ECDSA over SHA-256 of `message`, as a 64-byte `r || s` compact signature
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        let sig: Signature = self.0.sign_digest(Sha256::new_with_prefix(message));
        sig.to_bytes().to_vec()
    }

    /// Compact signature, base64 encoded the way guardians ship it
    pub fn sign_base64(&self, message: &[u8]) -> String {
        use base64::{engine::general_purpose, Engine as _};
        general_purpose::STANDARD.encode(self.sign(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let key = PrivateKey::generate().public_key();
        let hex = key.to_hex();
        assert_eq!(hex.len(), UNCOMPRESSED_KEY_LEN * 2);
        assert!(hex.starts_with("04"));

        assert_eq!(GuardianKey::from_hex(&hex).unwrap(), key);
        assert_eq!(GuardianKey::from_hex(&format!("0x{hex}")).unwrap(), key);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let key = PrivateKey::generate().public_key();
        let bytes = key.to_uncompressed();

        assert_eq!(
            GuardianKey::from_uncompressed(&bytes[..64]),
            Err(KeyError::InvalidLength {
                expected: 65,
                actual: 64
            })
        );

        let mut longer = bytes.clone();
        longer.push(0);
        assert!(matches!(
            GuardianKey::from_uncompressed(&longer),
            Err(KeyError::InvalidLength { actual: 66, .. })
        ));
    }

    #[test]
    fn test_rejects_compressed_key() {
        let key = PrivateKey::generate().public_key();
        let compressed = key.verifying_key().to_encoded_point(true);
        assert!(matches!(
            GuardianKey::from_uncompressed(compressed.as_bytes()),
            Err(KeyError::InvalidLength { actual: 33, .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_prefix() {
        let mut bytes = PrivateKey::generate().public_key().to_uncompressed();
        bytes[0] = 0x02;
        assert_eq!(
            GuardianKey::from_uncompressed(&bytes),
            Err(KeyError::InvalidPrefix(0x02))
        );
    }

    #[test]
    fn test_rejects_point_off_curve() {
        let mut bytes = vec![UNCOMPRESSED_POINT_TAG];
        bytes.extend_from_slice(&[0x11; 64]);
        assert_eq!(
            GuardianKey::from_uncompressed(&bytes),
            Err(KeyError::InvalidPoint)
        );
    }

    #[test]
    fn test_rejects_bad_hex() {
        assert!(matches!(
            GuardianKey::from_hex("04zz"),
            Err(KeyError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_signature_is_compact() {
        let key = PrivateKey::generate();
        assert_eq!(key.sign(b"payload").len(), 64);
    }
}
