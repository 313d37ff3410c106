//! Guardian key registry
//!
//! Keys are parsed once per configuration and shared read-only by every
//! verification that follows.

use crate::error::ConfigError;
use quorum_crypto::{GuardianKey, KeyError};
use quorum_types::GuardianNode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

/// What to do when a configured guardian key does not parse
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicy {
    /// Reject the whole guardian set; nothing verifies until it is fixed
    #[default]
    FailClosed,
    /// Keep the guardian as permanently unverified and let the others reach threshold
    DisableNode,
}

impl KeyPolicy {
    /// Name as written in configuration files
    pub const fn as_str(self) -> &'static str {
        match self {
            KeyPolicy::FailClosed => "fail-closed",
            KeyPolicy::DisableNode => "disable-node",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyStatus {
    Active(GuardianKey),
    Disabled(KeyError),
}

#[derive(Clone, Debug)]
pub struct RegisteredGuardian {
    pub node_id: String,
    pub status: KeyStatus,
}

impl RegisteredGuardian {
    pub fn key(&self) -> Option<&GuardianKey> {
        match &self.status {
            KeyStatus::Active(key) => Some(key),
            KeyStatus::Disabled(_) => None,
        }
    }
}

/// Parsed guardian set, in configuration order
#[derive(Clone, Debug)]
pub struct GuardianRegistry {
    guardians: Vec<RegisteredGuardian>,
    policy: KeyPolicy,
}

impl GuardianRegistry {
    pub fn from_nodes(nodes: &[GuardianNode], policy: KeyPolicy) -> Result<Self, ConfigError> {
        if nodes.is_empty() {
            return Err(ConfigError::NoGuardians);
        }

        let mut seen = HashSet::with_capacity(nodes.len());
        let mut guardians = Vec::with_capacity(nodes.len());

        for node in nodes {
            if !seen.insert(node.node_id.as_str()) {
                return Err(ConfigError::DuplicateNode(node.node_id.clone()));
            }

            let status = match GuardianKey::from_hex(&node.public_key) {
                Ok(key) => KeyStatus::Active(key),
                Err(source) => match policy {
                    KeyPolicy::FailClosed => {
                        return Err(ConfigError::InvalidKey {
                            node_id: node.node_id.clone(),
                            source,
                        })
                    }
                    KeyPolicy::DisableNode => {
                        warn!(node_id = %node.node_id, error = %source, "disabling guardian with unusable key");
                        KeyStatus::Disabled(source)
                    }
                },
            };

            guardians.push(RegisteredGuardian {
                node_id: node.node_id.clone(),
                status,
            });
        }

        Ok(Self { guardians, policy })
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.guardians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guardians.is_empty()
    }

    /// Guardians whose key parsed
    pub fn active_count(&self) -> usize {
        self.guardians.iter().filter(|g| g.key().is_some()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredGuardian> {
        self.guardians.iter()
    }

    pub fn get(&self, node_id: &str) -> Option<&RegisteredGuardian> {
        self.guardians.iter().find(|g| g.node_id == node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.get(node_id).is_some()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.guardians.iter().map(|g| g.node_id.as_str())
    }
}
