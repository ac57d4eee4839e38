//! # Verifier Configuration
//!
//! Loaded from YAML by the CLI, or built in code. The trusted oracle key set
//! is fixed for the lifetime of a deployed verifier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gt_crypto::Ed25519PublicKey;
use gt_fhe::{AttestationError, TrustedOracleSet};

fn default_attestation_threshold() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Hex-encoded Ed25519 keys of the decryption oracle nodes.
    pub trusted_oracle_keys: Vec<Ed25519PublicKey>,

    /// Distinct trusted signers required on every callback.
    #[serde(default = "default_attestation_threshold")]
    pub attestation_threshold: usize,

    /// Seconds after which a request with no callback may be reclaimed.
    /// `None` keeps pending requests forever.
    #[serde(default)]
    pub pending_ttl_secs: Option<u64>,

    /// Reject a new request while the same requester already has one in
    /// flight for the same event.
    #[serde(default)]
    pub single_attempt_per_event: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid oracle key set: {0}")]
    OracleKeys(String),

    #[error("pending_ttl_secs must be greater than zero")]
    ZeroTtl,
}

impl From<AttestationError> for ConfigError {
    fn from(e: AttestationError) -> Self {
        Self::OracleKeys(e.to_string())
    }
}

impl VerifierConfig {
    /// One trusted key per node, threshold 1, no expiry, duplicates allowed.
    pub fn new(trusted_oracle_keys: Vec<Ed25519PublicKey>) -> Self {
        Self {
            trusted_oracle_keys,
            attestation_threshold: default_attestation_threshold(),
            pending_ttl_secs: None,
            single_attempt_per_event: false,
        }
    }

    /// Check the config and build the key set callbacks are verified
    /// against.
    pub fn validate(&self) -> Result<TrustedOracleSet, ConfigError> {
        if self.pending_ttl_secs == Some(0) {
            return Err(ConfigError::ZeroTtl);
        }
        Ok(TrustedOracleSet::new(
            self.trusted_oracle_keys.clone(),
            self.attestation_threshold,
        )?)
    }
}
