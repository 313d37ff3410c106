//! Threshold verification of guardian-attested deposit addresses
//!
//! A custodial service hands out a deposit address together with one signature
//! per guardian. Funds may only be sent there once at least `threshold`
//! guardians are shown to have signed that exact address. Callers must treat
//! `success == false` as a hard stop.

pub mod engine;
pub mod error;
pub mod registry;

pub use engine::{verify_deposit_address, ConsensusEngine};
pub use error::ConfigError;
pub use registry::{GuardianRegistry, KeyPolicy, KeyStatus, RegisteredGuardian};
