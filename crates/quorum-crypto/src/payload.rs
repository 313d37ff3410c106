//! Canonical payloads guardians sign over
//!
//! Two historical layouts are in circulation. Both prefix the guardian's own
//! node id so a signature from one guardian cannot be replayed as another's.

use quorum_types::DepositProposal;
use std::fmt;

/// Payload layouts a guardian may have signed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadFormat {
    /// `{node}:{dest}-{destChain}-{asset}-{address}-{srcChain}-deposit`
    Legacy,
    /// `{node}:user-{coinType}-{destChain}-{dest}-{address}`
    User,
}

const NON_EVM_ORDER: &[PayloadFormat] = &[PayloadFormat::Legacy, PayloadFormat::User];
const EVM_ORDER: &[PayloadFormat] = &[PayloadFormat::User];

impl PayloadFormat {
    /// Formats to try for a proposal, in order. EVM guardians never signed the
    /// legacy layout.
    pub fn attempt_order(proposal: &DepositProposal) -> &'static [PayloadFormat] {
        if proposal.is_ethereum() {
            EVM_ORDER
        } else {
            NON_EVM_ORDER
        }
    }

    /// Bytes for this layout, or `None` when the proposal lacks a field the
    /// layout embeds
    pub fn canonical_payload(self, node_id: &str, proposal: &DepositProposal) -> Option<Vec<u8>> {
        match self {
            PayloadFormat::Legacy => Some(legacy_payload(node_id, proposal)),
            PayloadFormat::User => user_payload(node_id, proposal),
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            PayloadFormat::Legacy => "legacy",
            PayloadFormat::User => "user",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn legacy_payload(node_id: &str, proposal: &DepositProposal) -> Vec<u8> {
    format!(
        "{}:{}-{}-{}-{}-{}-deposit",
        node_id,
        proposal.destination_address,
        proposal.destination_chain,
        proposal.asset,
        proposal.address,
        proposal.source_chain,
    )
    .into_bytes()
}

pub fn user_payload(node_id: &str, proposal: &DepositProposal) -> Option<Vec<u8>> {
    let coin_type = proposal.coin_type.as_deref()?;
    Some(
        format!(
            "{}:user-{}-{}-{}-{}",
            node_id,
            coin_type,
            proposal.destination_chain,
            proposal.destination_address,
            proposal.address,
        )
        .into_bytes(),
    )
}
