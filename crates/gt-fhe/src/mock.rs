//! # Mock Confidential Compute Network
//!
//! A deterministic, transparent stand-in for an FHE coprocessor plus
//! decryption network. Ciphertexts are plaintexts stored behind
//! SHA-256-derived handles; what the mock does enforce is the protocol
//! surface a real backend exposes:
//!
//! - **Input binding.** `encrypt_input` records the `{contract, user}` pair
//!   and returns a proof `SHA256(canonical{handle, contract, user})`.
//!   `verify_input_proof` accepts only the recorded pair with the matching
//!   proof, so a handle lifted from another participant is rejected.
//! - **Access lists.** A ciphertext is usable only by contracts on its
//!   access list. Verifying an input proof grants the consuming contract;
//!   comparison results are granted to the comparing contract only.
//! - **Disclosure queue.** `request_disclosure` returns a fresh correlation
//!   id and queues the boolean for the oracle. Nothing is decrypted until
//!   [`crate::MockOracle`] drains the queue.
//!
//! ## Security Warning
//!
//! **NOT PRIVATE.** Anyone holding the network can read every plaintext.

use std::collections::{BTreeSet, HashMap};

use gt_core::{sha256_digest, Address, CanonicalBytes, ContentDigest, RequestId};
use parking_lot::Mutex;
use serde::Serialize;

use crate::traits::{
    CiphertextHandle, Cleartext, ConfidentialCompute, EncryptedBool, EncryptedU32, FheError,
    InputContext, InputProof,
};

#[derive(Debug, Clone, Copy)]
enum Plaintext {
    U32(u32),
    Bool(bool),
}

#[derive(Debug)]
struct CiphertextRecord {
    plaintext: Plaintext,
    allowed: BTreeSet<Address>,
    binding: Option<InputContext>,
}

#[derive(Debug, Clone)]
pub(crate) struct QueuedDisclosure {
    pub request_id: RequestId,
    pub callback: Address,
    pub handle: CiphertextHandle,
}

#[derive(Debug, Default)]
struct NetworkState {
    ciphertexts: HashMap<CiphertextHandle, CiphertextRecord>,
    queue: Vec<QueuedDisclosure>,
    nonce: u64,
}

impl NetworkState {
    fn next_nonce(&mut self) -> u64 {
        self.nonce += 1;
        self.nonce
    }

    fn record(&self, handle: &CiphertextHandle) -> Result<&CiphertextRecord, FheError> {
        self.ciphertexts
            .get(handle)
            .ok_or_else(|| FheError::UnknownHandle(handle.to_hex()))
    }

    fn require_allowed(&self, contract: &Address, handle: &CiphertextHandle) -> Result<&CiphertextRecord, FheError> {
        let record = self.record(handle)?;
        if !record.allowed.contains(contract) {
            return Err(FheError::NotAllowed {
                contract: *contract,
                handle: handle.to_hex(),
            });
        }
        Ok(record)
    }
}

/// Transparent mock of the encryption collaborator. See module docs.
#[derive(Debug, Default)]
pub struct MockFheNetwork {
    state: Mutex<NetworkState>,
}

impl MockFheNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client-side encryption of a balance for `context`.
    ///
    /// Returns the ciphertext handle and the input proof the participant
    /// submits alongside it.
    pub fn encrypt_input(
        &self,
        context: InputContext,
        value: u32,
    ) -> Result<(EncryptedU32, InputProof), FheError> {
        let mut state = self.state.lock();
        let nonce = state.next_nonce();
        let handle = CiphertextHandle(
            digest(&serde_json::json!({
                "kind": "input",
                "nonce": nonce,
                "contract": context.contract,
                "user": context.user,
            }))?
            .0,
        );
        let proof = input_proof(&handle, &context)?;
        state.ciphertexts.insert(
            handle,
            CiphertextRecord {
                plaintext: Plaintext::U32(value),
                allowed: BTreeSet::new(),
                binding: Some(context),
            },
        );
        Ok((EncryptedU32(handle), proof))
    }

    /// Number of disclosures waiting for the oracle.
    pub fn pending_disclosures(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Remove and return every queued disclosure.
    pub(crate) fn drain_queue(&self) -> Vec<QueuedDisclosure> {
        std::mem::take(&mut self.state.lock().queue)
    }

    /// Decrypt a queued boolean. Only the oracle calls this.
    pub(crate) fn reveal_bool(&self, handle: &CiphertextHandle) -> Result<Cleartext, FheError> {
        let state = self.state.lock();
        match state.record(handle)?.plaintext {
            Plaintext::Bool(b) => Ok(Cleartext::from_bool(b)),
            Plaintext::U32(_) => Err(FheError::TypeMismatch {
                handle: handle.to_hex(),
                expected: "ebool",
            }),
        }
    }
}

impl ConfidentialCompute for MockFheNetwork {
    fn verify_input_proof(
        &self,
        value: &EncryptedU32,
        proof: &InputProof,
        context: &InputContext,
    ) -> Result<(), FheError> {
        let mut state = self.state.lock();
        let handle = value.0;
        let record = state.record(&handle)?;
        if record.binding.as_ref() != Some(context) {
            return Err(FheError::InvalidInputProof(format!(
                "ciphertext {} is not bound to user {} for contract {}",
                handle.to_hex(),
                context.user,
                context.contract
            )));
        }
        if input_proof(&handle, context)? != *proof {
            return Err(FheError::InvalidInputProof("proof bytes do not match".to_string()));
        }
        if let Some(record) = state.ciphertexts.get_mut(&handle) {
            record.allowed.insert(context.contract);
        }
        Ok(())
    }

    fn ge_threshold(
        &self,
        contract: &Address,
        value: &EncryptedU32,
        threshold: u32,
    ) -> Result<EncryptedBool, FheError> {
        let mut state = self.state.lock();
        let balance = match state.require_allowed(contract, &value.0)?.plaintext {
            Plaintext::U32(v) => v,
            Plaintext::Bool(_) => {
                return Err(FheError::TypeMismatch {
                    handle: value.0.to_hex(),
                    expected: "euint32",
                })
            }
        };
        let nonce = state.next_nonce();
        let handle = CiphertextHandle(
            digest(&serde_json::json!({
                "kind": "ge",
                "nonce": nonce,
                "input": value.0.to_hex(),
                "threshold": threshold,
            }))?
            .0,
        );
        state.ciphertexts.insert(
            handle,
            CiphertextRecord {
                plaintext: Plaintext::Bool(balance >= threshold),
                allowed: BTreeSet::from([*contract]),
                binding: None,
            },
        );
        Ok(EncryptedBool(handle))
    }

    fn request_disclosure(
        &self,
        contract: &Address,
        value: &EncryptedBool,
    ) -> Result<RequestId, FheError> {
        let mut state = self.state.lock();
        if let Plaintext::U32(_) = state.require_allowed(contract, &value.0)?.plaintext {
            return Err(FheError::TypeMismatch {
                handle: value.0.to_hex(),
                expected: "ebool",
            });
        }
        let nonce = state.next_nonce();
        let request_id = RequestId::from_digest(digest(&serde_json::json!({
            "kind": "disclosure",
            "nonce": nonce,
            "callback": contract,
            "handle": value.0.to_hex(),
        }))?);
        state.queue.push(QueuedDisclosure {
            request_id,
            callback: *contract,
            handle: value.0,
        });
        tracing::debug!(%request_id, callback = %contract, "disclosure queued");
        Ok(request_id)
    }
}

fn digest(value: &impl Serialize) -> Result<ContentDigest, FheError> {
    let cb = CanonicalBytes::new(value).map_err(|e| FheError::Encoding(e.to_string()))?;
    Ok(sha256_digest(&cb))
}

fn input_proof(handle: &CiphertextHandle, context: &InputContext) -> Result<InputProof, FheError> {
    let d = digest(&serde_json::json!({
        "handle": handle.to_hex(),
        "contract": context.contract,
        "user": context.user,
    }))?;
    Ok(InputProof(d.0.to_vec()))
}
