//! Errors that make a guardian configuration unusable

use quorum_crypto::KeyError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no guardians configured")]
    NoGuardians,

    #[error("duplicate guardian node id:: {0}")]
    DuplicateNode(String),

    #[error("invalid threshold {threshold} for {guardians} guardians")]
    InvalidThreshold { threshold: usize, guardians: usize },

    #[error("invalid public key for guardian {node_id}:: {source}")]
    InvalidKey {
        node_id: String,
        #[source]
        source: KeyError,
    },
}
