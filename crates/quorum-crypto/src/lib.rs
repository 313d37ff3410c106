//! Cryptographic primitives for quorum
//!
//! This crate provides guardian key parsing, the canonical payloads guardians
//! sign, and ECDSA P-256 verification using the RustCrypto implementations.

pub mod keys;
pub mod payload;
pub mod verify;

pub use keys::{GuardianKey, KeyError, PrivateKey};
pub use payload::PayloadFormat;
pub use p256::ecdsa::Signature;
pub use verify::{
    decode_signature, verify_compact, verify_decoded, verify_signature, SignatureError,
};
