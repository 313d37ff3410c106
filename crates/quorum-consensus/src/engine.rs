//! Threshold consensus over guardian attestations
//!
//! Every guardian is checked independently on the Tokio blocking pool. Results
//! are collected in registry order once all checks finish, so no state is
//! shared between checks beyond the read-only keys. Outside a Tokio runtime the
//! checks run inline on the polling thread.

use crate::error::ConfigError;
use crate::registry::{GuardianRegistry, KeyPolicy, KeyStatus};
use quorum_crypto::{decode_signature, verify_decoded, GuardianKey, PayloadFormat};
use quorum_types::{DepositProposal, GuardianNode, SignatureSet, VerificationResult};
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

/// Decides whether enough guardians attest to a deposit address
#[derive(Clone, Debug)]
pub struct ConsensusEngine {
    registry: Arc<GuardianRegistry>,
    threshold: usize,
}

/// Per-guardian signature check: node id, key, base64 signature, proposal
type GuardianCheck = fn(&str, &GuardianKey, &str, &DepositProposal) -> bool;

enum Check {
    Settled(bool),
    Spawned(JoinHandle<bool>),
    Failed(String),
}

impl ConsensusEngine {
    /// Threshold must be between 1 and the number of configured guardians
    pub fn new(registry: Arc<GuardianRegistry>, threshold: usize) -> Result<Self, ConfigError> {
        if threshold == 0 || threshold > registry.len() {
            return Err(ConfigError::InvalidThreshold {
                threshold,
                guardians: registry.len(),
            });
        }

        if threshold > registry.active_count() {
            warn!(
                threshold,
                active = registry.active_count(),
                "threshold exceeds usable guardian keys, every verification will fail"
            );
        }

        Ok(Self {
            registry,
            threshold,
        })
    }

    pub fn from_nodes(
        nodes: &[GuardianNode],
        threshold: usize,
        policy: KeyPolicy,
    ) -> Result<Self, ConfigError> {
        let registry = GuardianRegistry::from_nodes(nodes, policy)?;
        Self::new(Arc::new(registry), threshold)
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn registry(&self) -> &GuardianRegistry {
        &self.registry
    }

    /// Check every guardian's signature over `proposal` and compare the count
    /// of valid ones against the threshold. Never fails; problems with
    /// individual guardians are reported in `errors`.
    #[instrument(skip_all, fields(address = %proposal.address, threshold = self.threshold))]
    pub async fn verify(
        &self,
        signatures: &SignatureSet,
        proposal: &DepositProposal,
    ) -> VerificationResult {
        self.run_checks(signatures, proposal, verify_guardian).await
    }

    async fn run_checks(
        &self,
        signatures: &SignatureSet,
        proposal: &DepositProposal,
        check_guardian: GuardianCheck,
    ) -> VerificationResult {
        for node_id in signatures.keys() {
            if !self.registry.contains(node_id) {
                debug!(%node_id, "ignoring signature from unknown guardian");
            }
        }

        let runtime = Handle::try_current().ok();
        if runtime.is_none() {
            debug!("no tokio runtime, checking guardians inline");
        }

        let proposal = Arc::new(proposal.clone());
        let mut errors = Vec::new();
        let mut checks = Vec::with_capacity(self.registry.len());

        for guardian in self.registry.iter() {
            let check = match &guardian.status {
                KeyStatus::Disabled(err) => {
                    errors.push(format!("{}: unusable public key: {}", guardian.node_id, err));
                    Check::Settled(false)
                }
                KeyStatus::Active(key) => match signatures.get(&guardian.node_id) {
                    None => {
                        debug!(node_id = %guardian.node_id, "no signature from guardian");
                        Check::Settled(false)
                    }
                    Some(signature) => match &runtime {
                        Some(handle) => {
                            let node_id = guardian.node_id.clone();
                            let key = key.clone();
                            let signature = signature.clone();
                            let proposal = Arc::clone(&proposal);
                            Check::Spawned(handle.spawn_blocking(move || {
                                check_guardian(&node_id, &key, &signature, &proposal)
                            }))
                        }
                        None => match panic::catch_unwind(AssertUnwindSafe(|| {
                            check_guardian(&guardian.node_id, key, signature, &proposal)
                        })) {
                            Ok(verified) => Check::Settled(verified),
                            Err(_) => Check::Failed("check panicked".to_string()),
                        },
                    },
                },
            };
            checks.push((guardian.node_id.clone(), check));
        }

        let mut per_node_result = BTreeMap::new();
        for (node_id, check) in checks {
            let outcome = match check {
                Check::Settled(verified) => Ok(verified),
                Check::Spawned(handle) => handle.await.map_err(|e| e.to_string()),
                Check::Failed(reason) => Err(reason),
            };
            let verified = outcome.unwrap_or_else(|reason| {
                error!(%node_id, error = %reason, "guardian verification task failed");
                errors.push(format!("{node_id}: verification failed: {reason}"));
                false
            });
            per_node_result.insert(node_id, verified);
        }

        let result = VerificationResult::from_node_results(self.threshold, per_node_result, errors);
        info!(
            verified_count = result.verified_count,
            guardians = self.registry.len(),
            success = result.success,
            "guardian verification complete"
        );
        result
    }
}

/// One-shot verification straight from configuration. A configuration that
/// cannot be used yields a failed result rather than an error.
pub async fn verify_deposit_address(
    nodes: &[GuardianNode],
    threshold: usize,
    policy: KeyPolicy,
    signatures: &SignatureSet,
    proposal: &DepositProposal,
) -> VerificationResult {
    match ConsensusEngine::from_nodes(nodes, threshold, policy) {
        Ok(engine) => engine.verify(signatures, proposal).await,
        Err(e) => {
            error!(error = %e, "guardian configuration rejected");
            VerificationResult::rejected(
                nodes.iter().map(|node| node.node_id.clone()),
                vec![format!("guardian configuration rejected: {e}")],
            )
        }
    }
}

/// Try each payload layout the proposal allows until one verifies. The
/// signature is decoded once and checked against every candidate payload.
fn verify_guardian(
    node_id: &str,
    key: &GuardianKey,
    signature: &str,
    proposal: &DepositProposal,
) -> bool {
    let sig = match decode_signature(signature) {
        Ok(sig) => sig,
        Err(e) => {
            warn!(%node_id, error = %e, "undecodable guardian signature");
            return false;
        }
    };

    for &format in PayloadFormat::attempt_order(proposal) {
        let Some(payload) = format.canonical_payload(node_id, proposal) else {
            debug!(%node_id, %format, "payload layout not applicable");
            continue;
        };

        if verify_decoded(key, &payload, &sig) {
            debug!(%node_id, %format, "guardian signature verified");
            return true;
        }
    }

    debug!(%node_id, "guardian signature does not match proposal");
    false
}
