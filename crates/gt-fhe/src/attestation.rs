//! # Oracle Attestations
//!
//! A disclosure callback is trusted only if enough configured oracle keys
//! signed exactly `(request_id, callback, cleartext)`. The signed bytes are the
//! canonical form of [`DisclosurePayload`], which carries a fixed domain tag
//! so a signature made for any other purpose never verifies here.

use std::collections::BTreeSet;

use gt_core::{Address, CanonicalBytes, RequestId};
use gt_crypto::{verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::traits::Cleartext;

/// Domain tag bound into every disclosure signature.
pub const DISCLOSURE_DOMAIN: &str = "gt-disclosure-v1";

/// The exact statement an oracle node signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosurePayload {
    pub domain: String,
    pub request_id: RequestId,
    /// The verifier whose callback this disclosure answers.
    pub callback: Address,
    /// Hex of the cleartext bytes.
    pub cleartext: String,
}

impl DisclosurePayload {
    pub fn new(request_id: RequestId, callback: Address, cleartext: &Cleartext) -> Self {
        Self {
            domain: DISCLOSURE_DOMAIN.to_string(),
            request_id,
            callback,
            cleartext: cleartext.to_hex(),
        }
    }

    pub fn canonical_bytes(&self) -> Result<CanonicalBytes, AttestationError> {
        CanonicalBytes::new(self).map_err(|e| AttestationError::Encoding(e.to_string()))
    }
}

/// One oracle node's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationSignature {
    pub signer: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

/// The signatures accompanying a disclosure callback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub signatures: Vec<AttestationSignature>,
}

impl Attestation {
    /// Sign `(request_id, callback, cleartext)` with each of `signers`.
    pub fn sign(
        request_id: RequestId,
        callback: Address,
        cleartext: &Cleartext,
        signers: &[Ed25519KeyPair],
    ) -> Result<Self, AttestationError> {
        let bytes = DisclosurePayload::new(request_id, callback, cleartext).canonical_bytes()?;
        let signatures = signers
            .iter()
            .map(|kp| AttestationSignature {
                signer: kp.public_key(),
                signature: kp.sign(&bytes),
            })
            .collect();
        Ok(Self { signatures })
    }
}

/// Errors from building a trusted key set or checking an attestation.
#[derive(Error, Debug)]
pub enum AttestationError {
    #[error("trusted oracle key set is empty")]
    EmptyKeySet,

    #[error("trusted oracle key {0} listed twice")]
    DuplicateKey(String),

    #[error("signer threshold {threshold} must be between 1 and {keys}")]
    InvalidThreshold { threshold: usize, keys: usize },

    /// Fewer distinct trusted signers verified than the threshold requires.
    #[error("attestation has {valid} valid trusted signatures, {required} required")]
    InsufficientSignatures { valid: usize, required: usize },

    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

/// The fixed oracle key set a verifier trusts, and how many of them must
/// sign each disclosure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustedOracleSet {
    keys: BTreeSet<Ed25519PublicKey>,
    threshold: usize,
}

impl TrustedOracleSet {
    pub fn new(keys: Vec<Ed25519PublicKey>, threshold: usize) -> Result<Self, AttestationError> {
        if keys.is_empty() {
            return Err(AttestationError::EmptyKeySet);
        }
        let mut set = BTreeSet::new();
        for key in keys {
            if !set.insert(key) {
                return Err(AttestationError::DuplicateKey(key.to_hex()));
            }
        }
        if threshold == 0 || threshold > set.len() {
            return Err(AttestationError::InvalidThreshold {
                threshold,
                keys: set.len(),
            });
        }
        Ok(Self { keys: set, threshold })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn keys(&self) -> impl Iterator<Item = &Ed25519PublicKey> {
        self.keys.iter()
    }

    pub fn contains(&self, key: &Ed25519PublicKey) -> bool {
        self.keys.contains(key)
    }

    /// Count distinct trusted signers whose signature over
    /// `(request_id, callback, cleartext)` verifies. Signatures from unknown keys and
    /// signatures that fail verification are ignored, and a signer is
    /// counted once however many times it appears.
    pub fn verify(
        &self,
        request_id: RequestId,
        callback: Address,
        cleartext: &Cleartext,
        attestation: &Attestation,
    ) -> Result<usize, AttestationError> {
        let bytes = DisclosurePayload::new(request_id, callback, cleartext).canonical_bytes()?;
        let mut valid = BTreeSet::new();
        for entry in &attestation.signatures {
            if !self.keys.contains(&entry.signer) || valid.contains(&entry.signer) {
                continue;
            }
            if verify_with_public_key(&bytes, &entry.signature, &entry.signer).is_ok() {
                valid.insert(entry.signer);
            }
        }
        if valid.len() < self.threshold {
            return Err(AttestationError::InsufficientSignatures {
                valid: valid.len(),
                required: self.threshold,
            });
        }
        Ok(valid.len())
    }
}
