//! # Confidential Compute Interfaces
//!
//! Types and traits at the boundary between the verifier and the
//! encryption/oracle collaborators.
//!
//! ## Security Invariant
//!
//! The only value that ever crosses back from encrypted to clear is the
//! boolean produced by [`ConfidentialCompute::ge_threshold`]. There is no
//! method that discloses an [`EncryptedU32`].

use gt_core::{Address, RequestId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attestation::Attestation;

/// Opaque reference to a ciphertext held by the compute network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CiphertextHandle(pub [u8; 32]);

impl CiphertextHandle {
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// An encrypted unsigned 32-bit integer (a balance in the event's base unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedU32(pub CiphertextHandle);

/// An encrypted boolean (a comparison outcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EncryptedBool(pub CiphertextHandle);

/// Proof that a ciphertext was produced by `user` for `contract`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputProof(pub Vec<u8>);

/// The `{contract, user}` pair an encrypted input is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputContext {
    /// The component that will consume the ciphertext.
    pub contract: Address,
    /// The participant who encrypted it.
    pub user: Address,
}

/// ABI-style cleartext: one 32-byte big-endian word per disclosed value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cleartext(pub Vec<u8>);

impl Cleartext {
    pub fn from_bool(value: bool) -> Self {
        let mut word = vec![0u8; 32];
        word[31] = u8::from(value);
        Self(word)
    }

    /// Decode a single boolean word. Anything other than exactly 32 bytes
    /// of `0..=0` or `0..=1` is malformed.
    pub fn decode_bool(&self) -> Result<bool, FheError> {
        let bytes = &self.0;
        if bytes.len() != 32 {
            return Err(FheError::MalformedCleartext(format!(
                "expected a 32-byte boolean word, got {} bytes",
                bytes.len()
            )));
        }
        if let Some(at) = bytes[..31].iter().position(|b| *b != 0) {
            return Err(FheError::MalformedCleartext(format!(
                "boolean word has non-zero high byte at offset {at}"
            )));
        }
        match bytes[31] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(FheError::MalformedCleartext(format!(
                "boolean word must end in 0 or 1, got {other}"
            ))),
        }
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// A signed disclosure on its way back to the requesting component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisclosureResponse {
    pub request_id: RequestId,
    /// The component whose callback entrypoint should receive this.
    pub callback: Address,
    pub cleartext: Cleartext,
    pub attestation: Attestation,
}

/// Errors raised by the confidential-compute collaborator.
#[derive(Error, Debug)]
pub enum FheError {
    /// No ciphertext is registered under this handle.
    #[error("unknown ciphertext handle {0}")]
    UnknownHandle(String),

    /// The handle refers to a ciphertext of a different type.
    #[error("ciphertext {handle} is not a {expected}")]
    TypeMismatch {
        handle: String,
        expected: &'static str,
    },

    /// The input proof does not bind this ciphertext to the context.
    #[error("input proof rejected: {0}")]
    InvalidInputProof(String),

    /// The contract is not on the access list for this ciphertext.
    #[error("contract {contract} may not use ciphertext {handle}")]
    NotAllowed { contract: Address, handle: String },

    /// The cleartext bytes do not decode as the expected type.
    #[error("malformed cleartext: {0}")]
    MalformedCleartext(String),

    /// Canonical encoding of a handle or request id failed.
    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Synchronous operations the verifier performs inside a ledger call.
///
/// Implementations must be `Send + Sync`; the ledger host and the oracle
/// share one instance.
pub trait ConfidentialCompute: Send + Sync {
    /// Accept iff `proof` binds `value` to `context`. On success the
    /// ciphertext becomes usable by `context.contract`.
    fn verify_input_proof(
        &self,
        value: &EncryptedU32,
        proof: &InputProof,
        context: &InputContext,
    ) -> Result<(), FheError>;

    /// Homomorphic `value >= threshold`. The result is usable only by
    /// `contract`.
    fn ge_threshold(
        &self,
        contract: &Address,
        value: &EncryptedU32,
        threshold: u32,
    ) -> Result<EncryptedBool, FheError>;

    /// Queue `value` for attested disclosure back to `contract`. Returns the
    /// correlation id the eventual callback will carry.
    fn request_disclosure(
        &self,
        contract: &Address,
        value: &EncryptedBool,
    ) -> Result<RequestId, FheError>;
}

/// The asynchronous side: produce signed callbacks for queued disclosures.
pub trait DisclosureOracle {
    /// Decrypt and sign every queued disclosure, emptying the queue.
    fn fulfil_pending(&self) -> Result<Vec<DisclosureResponse>, FheError>;
}
