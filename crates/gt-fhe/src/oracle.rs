//! # Mock Decryption Oracle
//!
//! Drains the [`MockFheNetwork`] disclosure queue, decrypts each queued
//! boolean and signs `(request_id, callback, cleartext)` with every node
//! key. The resulting [`DisclosureResponse`]s are what a relayer would
//! deliver to the verifier's callback entrypoint.

use std::sync::Arc;

use gt_crypto::{Ed25519KeyPair, Ed25519PublicKey};

use crate::attestation::Attestation;
use crate::mock::MockFheNetwork;
use crate::traits::{DisclosureOracle, DisclosureResponse, FheError};

#[derive(Debug)]
pub struct MockOracle {
    network: Arc<MockFheNetwork>,
    signers: Vec<Ed25519KeyPair>,
}

impl MockOracle {
    pub fn new(network: Arc<MockFheNetwork>, signers: Vec<Ed25519KeyPair>) -> Self {
        Self { network, signers }
    }

    /// Public keys of the signing nodes, for building a verifier config.
    pub fn public_keys(&self) -> Vec<Ed25519PublicKey> {
        self.signers.iter().map(|kp| kp.public_key()).collect()
    }
}

impl DisclosureOracle for MockOracle {
    fn fulfil_pending(&self) -> Result<Vec<DisclosureResponse>, FheError> {
        let queued = self.network.drain_queue();
        let mut responses = Vec::with_capacity(queued.len());
        for item in queued {
            let cleartext = self.network.reveal_bool(&item.handle)?;
            let attestation = Attestation::sign(item.request_id, item.callback, &cleartext, &self.signers)
                .map_err(|e| FheError::Encoding(e.to_string()))?;
            tracing::debug!(
                request_id = %item.request_id,
                signers = self.signers.len(),
                "disclosure signed"
            );
            responses.push(DisclosureResponse {
                request_id: item.request_id,
                callback: item.callback,
                cleartext,
                attestation,
            });
        }
        Ok(responses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attestation::TrustedOracleSet;
    use crate::traits::{ConfidentialCompute, InputContext};
    use gt_core::Address;

    #[test]
    fn test_fulfil_signs_each_queued_disclosure() {
        let net = Arc::new(MockFheNetwork::new());
        let oracle = MockOracle::new(
            Arc::clone(&net),
            vec![Ed25519KeyPair::from_seed(&[1; 32]), Ed25519KeyPair::from_seed(&[2; 32])],
        );
        let verifier = Address::from_label("verifier").unwrap();
        let ctx = InputContext {
            contract: verifier,
            user: Address::from_label("alice").unwrap(),
        };

        let mut ids = Vec::new();
        for balance in [2000, 500] {
            let (ct, proof) = net.encrypt_input(ctx, balance).unwrap();
            net.verify_input_proof(&ct, &proof, &ctx).unwrap();
            let flag = net.ge_threshold(&verifier, &ct, 1000).unwrap();
            ids.push(net.request_disclosure(&verifier, &flag).unwrap());
        }

        let responses = oracle.fulfil_pending().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(net.pending_disclosures(), 0);

        let trusted = TrustedOracleSet::new(oracle.public_keys(), 2).unwrap();
        for (resp, (id, expected)) in responses.iter().zip(ids.iter().zip([true, false])) {
            assert_eq!(resp.request_id, *id);
            assert_eq!(resp.callback, verifier);
            assert_eq!(resp.cleartext.decode_bool().unwrap(), expected);
            let signers = trusted
                .verify(resp.request_id, verifier, &resp.cleartext, &resp.attestation)
                .unwrap();
            assert_eq!(signers, 2);
        }
    }

    #[test]
    fn test_empty_queue_yields_nothing() {
        let oracle = MockOracle::new(Arc::new(MockFheNetwork::new()), vec![]);
        assert!(oracle.fulfil_pending().unwrap().is_empty());
    }
}
