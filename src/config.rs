//! Guardian set configuration for the quorum CLI

use quorum_consensus::{ConsensusEngine, KeyPolicy};
use quorum_types::GuardianNode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration file error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error
    #[error("io error:: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml parsing error:: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("toml serialization error:: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// The guardian set itself is unusable
    #[error("invalid guardian set:: {0}")]
    GuardianSet(#[from] quorum_consensus::ConfigError),
}

/// Guardian set and verification policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuorumConfig {
    /// Minimum number of guardians that must attest
    pub threshold: usize,
    /// Handling of guardians whose key does not parse
    #[serde(default)]
    pub key_policy: KeyPolicy,
    /// Deadline for a whole verification, in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub guardians: Vec<GuardianNode>,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            threshold: 1,
            key_policy: KeyPolicy::default(),
            timeout_ms: None,
            guardians: Vec::new(),
        }
    }
}

impl QuorumConfig {
    /// Load configuration from file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: QuorumConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration directory
    pub fn default_config_dir() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            home.join(".quorum")
        } else {
            PathBuf::from(".quorum")
        }
    }

    /// Get default configuration file path
    pub fn default_config_file() -> PathBuf {
        Self::default_config_dir().join("guardians.toml")
    }

    /// Load configuration from default location or fall back to an empty set
    pub fn load_or_default() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_file();

        if config_path.exists() {
            Self::load_from_file(config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the commented template to `path`, keeping an existing file unless
    /// `overwrite` is set. Returns whether a file was written.
    pub fn init<P: AsRef<Path>>(path: P, overwrite: bool) -> Result<bool, ConfigError> {
        let path = path.as_ref();
        if path.exists() && !overwrite {
            return Ok(false);
        }

        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(path, Self::template())?;
        Ok(true)
    }

    pub fn template() -> &'static str {
        r#"# Guardian set used to check custodial deposit addresses.
# A deposit address is trusted only when at least `threshold` guardians
# have signed it.
threshold = 2

# "fail-closed": one unusable guardian key rejects every verification.
# "disable-node": the guardian is never counted, the others still can be.
key_policy = "fail-closed"

# Optional deadline for one verification, in milliseconds.
# timeout_ms = 5000

# [[guardians]]
# node_id = "guardian-1"
# public_key = "04..."   # 65-byte uncompressed P-256 point, hex
"#
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.guardians.iter().map(|g| g.node_id.as_str())
    }

    /// Parse every guardian key and check the threshold
    pub fn engine(&self) -> Result<ConsensusEngine, ConfigError> {
        Ok(ConsensusEngine::from_nodes(
            &self.guardians,
            self.threshold,
            self.key_policy,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_crypto::PrivateKey;
    use tempfile::tempdir;

    fn guardian(id: &str) -> GuardianNode {
        GuardianNode::new(id, PrivateKey::generate().public_key().to_hex())
    }

    #[test]
    fn test_default_config() {
        let config = QuorumConfig::default();
        assert_eq!(config.threshold, 1);
        assert_eq!(config.key_policy, KeyPolicy::FailClosed);
        assert_eq!(config.timeout(), None);
        assert!(config.guardians.is_empty());
        assert!(config.engine().is_err());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("guardians.toml");

        let original = QuorumConfig {
            threshold: 2,
            key_policy: KeyPolicy::DisableNode,
            timeout_ms: Some(1500),
            guardians: vec![guardian("guardian-1"), guardian("guardian-2")],
        };

        original.save_to_file(&config_path).unwrap();
        let loaded = QuorumConfig::load_from_file(&config_path).unwrap();

        assert_eq!(loaded.threshold, 2);
        assert_eq!(loaded.key_policy, KeyPolicy::DisableNode);
        assert_eq!(loaded.timeout(), Some(Duration::from_millis(1500)));
        assert_eq!(loaded.guardians, original.guardians);
        assert_eq!(
            loaded.node_ids().collect::<Vec<_>>(),
            vec!["guardian-1", "guardian-2"]
        );
    }

    #[test]
    fn test_parse_handwritten_config() {
        let key = PrivateKey::generate().public_key().to_hex();
        let content = format!(
            r#"
threshold = 1
key_policy = "disable-node"

[[guardians]]
node_id = "guardian-1"
public_key = "0x{key}"
"#
        );

        let config: QuorumConfig = toml::from_str(&content).unwrap();
        assert_eq!(config.key_policy, KeyPolicy::DisableNode);
        let engine = config.engine().unwrap();
        assert_eq!(engine.threshold(), 1);
        assert_eq!(engine.registry().active_count(), 1);
    }

    #[test]
    fn test_template_parses() {
        let config: QuorumConfig = toml::from_str(QuorumConfig::template()).unwrap();
        assert_eq!(config.threshold, 2);
        assert_eq!(config.key_policy, KeyPolicy::FailClosed);
        assert!(config.guardians.is_empty());
    }

    #[test]
    fn test_init_respects_existing_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("guardians.toml");

        assert!(QuorumConfig::init(&path, false).unwrap());
        fs::write(&path, "threshold = 3\n").unwrap();

        assert!(!QuorumConfig::init(&path, false).unwrap());
        assert_eq!(QuorumConfig::load_from_file(&path).unwrap().threshold, 3);

        assert!(QuorumConfig::init(&path, true).unwrap());
        assert_eq!(QuorumConfig::load_from_file(&path).unwrap().threshold, 2);
    }

    #[test]
    fn test_invalid_threshold_is_reported() {
        let config = QuorumConfig {
            threshold: 3,
            guardians: vec![guardian("guardian-1")],
            ..QuorumConfig::default()
        };
        assert!(matches!(
            config.engine(),
            Err(ConfigError::GuardianSet(
                quorum_consensus::ConfigError::InvalidThreshold { threshold: 3, guardians: 1 }
            ))
        ));
    }
}
