//! Core data model for guardian deposit-address attestation
//!
//! These types describe what a set of guardians was asked to attest to and the
//! outcome of checking their signatures. Request and result wire names are
//! camelCase to match the custodial service's JSON.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Coin type whose guardians only ever signed the `user-` payload
pub const ETHEREUM_COIN_TYPE: &str = "ethereum";

/// A configured guardian: its identifier and hex-encoded uncompressed public key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianNode {
    /// Identifier the custodial service uses for this guardian
    #[serde(alias = "nodeId")]
    pub node_id: String,
    /// Hex-encoded 65-byte SEC1 uncompressed point
    #[serde(alias = "publicKey")]
    pub public_key: String,
}

impl GuardianNode {
    pub fn new(node_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            public_key: public_key.into(),
        }
    }
}

/// The deposit address the guardians attest to, with the context it was generated for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositProposal {
    pub destination_address: String,
    pub destination_chain: String,
    pub asset: String,
    /// Candidate deposit address
    pub address: String,
    pub source_chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_type: Option<String>,
}

impl DepositProposal {
    /// Whether this proposal was produced for an EVM chain
    pub fn is_ethereum(&self) -> bool {
        self.coin_type.as_deref() == Some(ETHEREUM_COIN_TYPE)
    }
}

/// Base64 compact signatures keyed by guardian node id. Untrusted input.
pub type SignatureSet = HashMap<String, String>;

/// Everything a caller received from the custodial service for one bridging attempt
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRequest {
    pub proposal: DepositProposal,
    #[serde(default)]
    pub signatures: SignatureSet,
}

/// Outcome of a threshold verification
///
/// `verified_count` always equals the number of `true` entries in
/// `per_node_result`, and `success` is `verified_count >= threshold`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub success: bool,
    pub verified_count: usize,
    pub per_node_result: BTreeMap<String, bool>,
    pub errors: Vec<String>,
}

impl VerificationResult {
    /// Aggregate per-node outcomes against a threshold
    pub fn from_node_results(
        threshold: usize,
        per_node_result: BTreeMap<String, bool>,
        errors: Vec<String>,
    ) -> Self {
        let verified_count = per_node_result.values().filter(|ok| **ok).count();
        Self {
            success: verified_count >= threshold,
            verified_count,
            per_node_result,
            errors,
        }
    }

    /// A failed result where no node could be checked at all
    pub fn rejected<I, S>(node_ids: I, errors: Vec<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            success: false,
            verified_count: 0,
            per_node_result: node_ids.into_iter().map(|id| (id.into(), false)).collect(),
            errors,
        }
    }
}
