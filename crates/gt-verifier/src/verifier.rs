//! # Threshold Verifier
//!
//! ## Request path
//!
//! `verify_and_request_mint` checks the event is open, has the collaborator
//! verify the caller's input proof, computes `balance >= threshold` under
//! encryption and queues the boolean for disclosure. The returned request id
//! is the only link between the asynchronous callback and the originating
//! `(requester, event)` pair, so it is recorded in the pending table before
//! the call returns. The pending record is written last: any earlier failure
//! leaves the table untouched.
//!
//! ## Callback path
//!
//! `oracle_callback` is an inbound message handler. Anyone may relay it;
//! authenticity comes from the attestation, which must carry enough valid
//! signatures from the configured oracle keys over exactly
//! `(request_id, cleartext)`. Checks run in this order:
//!
//! 1. attestation (`InvalidAttestation`)
//! 2. request known (`NoSuchRequest`)
//! 3. request still pending (`AlreadyFulfilled`, `RequestExpired`)
//! 4. cleartext decodes as a boolean (`MalformedResult`)
//!
//! A qualified result mints the next sequential credential to the stored
//! requester, tagged with the stored event id. Either way the record leaves
//! `Requested` for good, so a replay can never mint twice.
//!
//! Like every component method, both paths check before they write: an
//! error return leaves the verifier exactly as it was.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gt_catalog::EventCatalog;
use gt_core::{
    Address, CallContext, EventId, EventLog, LedgerEvent, Ownership, RequestId, TokenId,
};
use gt_credential::EligibilityCredential;
use gt_fhe::{
    Attestation, Cleartext, ConfidentialCompute, EncryptedU32, InputContext, InputProof,
    TrustedOracleSet,
};
use gt_state::{AttemptError, VerificationAttempt, VerificationState};

use crate::config::VerifierConfig;
use crate::error::VerifierError;

/// What a participant submits: the event, their encrypted balance, and the
/// proof binding that ciphertext to them and to this verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSubmission {
    pub event_id: EventId,
    pub balance: EncryptedU32,
    pub proof: InputProof,
}

/// Result of a successfully processed callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackOutcome {
    Qualified { token_id: TokenId },
    NotQualified,
}

#[derive(Debug, Clone)]
pub struct ThresholdVerifier {
    address: Address,
    ownership: Ownership,
    event_catalog: Address,
    credential_registry: Address,
    config: VerifierConfig,
    oracles: TrustedOracleSet,
    attempts: BTreeMap<RequestId, VerificationAttempt>,
}

impl ThresholdVerifier {
    pub fn new(
        address: Address,
        owner: Address,
        event_catalog: Address,
        credential_registry: Address,
        config: VerifierConfig,
    ) -> Result<Self, VerifierError> {
        let oracles = config.validate()?;
        Ok(Self {
            address,
            ownership: Ownership::new(owner),
            event_catalog,
            credential_registry,
            config,
            oracles,
            attempts: BTreeMap::new(),
        })
    }

    // ─── Request path ────────────────────────────────────────────────

    pub fn verify_and_request_mint<C: ConfidentialCompute + ?Sized>(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        catalog: &EventCatalog,
        compute: &C,
        submission: &EncryptedSubmission,
    ) -> Result<RequestId, VerifierError> {
        let event_id = submission.event_id;
        let event = catalog
            .get_event(event_id)
            .map_err(|_| VerifierError::EventNotFound(event_id))?;
        if !event.is_open_at(ctx.now) {
            return Err(VerifierError::EventNotActive(event_id));
        }

        if self.config.single_attempt_per_event {
            if let Some(open) = self.open_attempt(&ctx.caller, event_id) {
                return Err(VerifierError::AttemptInFlight {
                    requester: ctx.caller,
                    event_id,
                    request_id: open.request_id,
                });
            }
        }

        let input = InputContext {
            contract: self.address,
            user: ctx.caller,
        };
        compute
            .verify_input_proof(&submission.balance, &submission.proof, &input)
            .map_err(|e| VerifierError::InvalidProof(e.to_string()))?;

        let qualifies = compute
            .ge_threshold(&self.address, &submission.balance, event.threshold)
            .map_err(|e| VerifierError::Compute(e.to_string()))?;
        let request_id = compute
            .request_disclosure(&self.address, &qualifies)
            .map_err(|e| VerifierError::Compute(e.to_string()))?;
        if self.attempts.contains_key(&request_id) {
            return Err(VerifierError::DuplicateRequestId(request_id));
        }

        self.attempts.insert(
            request_id,
            VerificationAttempt::register(request_id, ctx.caller, event_id, ctx.now),
        );
        log.emit(LedgerEvent::VerificationRequested {
            verifier: self.address,
            request_id,
            requester: ctx.caller,
            event_id,
        });

        tracing::info!(%request_id, requester = %ctx.caller, %event_id, "verification requested");
        Ok(request_id)
    }

    // ─── Callback path ───────────────────────────────────────────────

    pub fn oracle_callback(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        registry: &mut EligibilityCredential,
        request_id: RequestId,
        cleartext: &Cleartext,
        attestation: &Attestation,
    ) -> Result<CallbackOutcome, VerifierError> {
        self.oracles
            .verify(request_id, self.address, cleartext, attestation)
            .map_err(|e| VerifierError::InvalidAttestation(e.to_string()))?;

        let mut attempt = self
            .attempts
            .get(&request_id)
            .cloned()
            .ok_or(VerifierError::NoSuchRequest(request_id))?;
        match attempt.state {
            VerificationState::Requested => {}
            VerificationState::Expired => return Err(VerifierError::RequestExpired(request_id)),
            VerificationState::Qualified | VerificationState::NotQualified => {
                return Err(VerifierError::AlreadyFulfilled(request_id))
            }
        }
        let (requester, event_id) = (attempt.requester, attempt.event_id);

        let qualified = cleartext
            .decode_bool()
            .map_err(|e| VerifierError::MalformedResult(e.to_string()))?;

        // The mint is the last fallible step; the resolved record is only
        // stored once it has succeeded.
        let outcome = if qualified {
            let token_id = registry.next_free_token_id()?;
            attempt
                .qualify(token_id, ctx.now)
                .map_err(|e| attempt_error(request_id, e))?;
            registry.mint(&ctx.as_caller(self.address), log, requester, token_id, event_id)?;
            CallbackOutcome::Qualified { token_id }
        } else {
            attempt
                .disqualify(ctx.now)
                .map_err(|e| attempt_error(request_id, e))?;
            CallbackOutcome::NotQualified
        };
        self.attempts.insert(request_id, attempt);

        log.emit(LedgerEvent::VerificationFulfilled {
            verifier: self.address,
            request_id,
        });
        tracing::info!(%request_id, %requester, %event_id, qualified, "verification fulfilled");
        Ok(outcome)
    }

    /// Move a request whose TTL has elapsed to `Expired`. Any caller.
    pub fn reclaim_expired(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        request_id: RequestId,
    ) -> Result<(), VerifierError> {
        let ttl = self
            .config
            .pending_ttl_secs
            .ok_or(VerifierError::ExpiryDisabled)?;
        let attempt = self
            .attempts
            .get_mut(&request_id)
            .ok_or(VerifierError::NoSuchRequest(request_id))?;
        attempt
            .expire(ttl, ctx.now)
            .map_err(|e| attempt_error(request_id, e))?;
        log.emit(LedgerEvent::VerificationExpired {
            verifier: self.address,
            request_id,
        });
        tracing::info!(%request_id, reclaimed_by = %ctx.caller, "verification expired");
        Ok(())
    }

    // ─── Administration ──────────────────────────────────────────────

    pub fn set_event_catalog(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        catalog: Address,
    ) -> Result<(), VerifierError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.event_catalog = catalog;
        self.emit_linked(log);
        Ok(())
    }

    pub fn set_credential_registry(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        registry: Address,
    ) -> Result<(), VerifierError> {
        self.ownership.require_owner(&ctx.caller)?;
        self.credential_registry = registry;
        self.emit_linked(log);
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        ctx: &CallContext,
        log: &mut EventLog,
        new_owner: Address,
    ) -> Result<(), VerifierError> {
        self.ownership
            .transfer(self.address, &ctx.caller, new_owner, log)?;
        Ok(())
    }

    fn emit_linked(&self, log: &mut EventLog) {
        log.emit(LedgerEvent::VerifierLinked {
            verifier: self.address,
            catalog: self.event_catalog,
            registry: self.credential_registry,
        });
        tracing::info!(
            catalog = %self.event_catalog,
            registry = %self.credential_registry,
            "verifier relinked"
        );
    }

    // ─── Reads ───────────────────────────────────────────────────────

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn event_catalog(&self) -> Address {
        self.event_catalog
    }

    pub fn credential_registry(&self) -> Address {
        self.credential_registry
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// The record for `request_id` in whatever state it is in.
    pub fn pending(&self, request_id: &RequestId) -> Option<&VerificationAttempt> {
        self.attempts.get(request_id)
    }

    pub fn pending_event_id(&self, request_id: &RequestId) -> Option<EventId> {
        self.attempts.get(request_id).map(|a| a.event_id)
    }

    /// Requests still waiting for a callback.
    pub fn pending_count(&self) -> usize {
        self.attempts.values().filter(|a| a.is_pending()).count()
    }

    pub fn attempts(&self) -> impl Iterator<Item = &VerificationAttempt> {
        self.attempts.values()
    }

    fn open_attempt(&self, requester: &Address, event_id: EventId) -> Option<&VerificationAttempt> {
        self.attempts
            .values()
            .find(|a| a.is_pending() && a.requester == *requester && a.event_id == event_id)
    }
}

fn attempt_error(request_id: RequestId, e: AttemptError) -> VerifierError {
    match e {
        AttemptError::TerminalState {
            state: VerificationState::Expired,
            ..
        } => VerifierError::RequestExpired(request_id),
        AttemptError::TerminalState { .. } => VerifierError::AlreadyFulfilled(request_id),
        AttemptError::NotExpired {
            age_secs, ttl_secs, ..
        } => VerifierError::NotExpired {
            request_id,
            age_secs,
            ttl_secs,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_core::{ErrorClass, Timestamp};
    use gt_credential::CredentialMetadata;
    use gt_crypto::Ed25519KeyPair;
    use gt_fhe::{DisclosureOracle, MockFheNetwork, MockOracle};
    use std::sync::Arc;

    struct Fixture {
        net: Arc<MockFheNetwork>,
        oracle: MockOracle,
        catalog: EventCatalog,
        registry: EligibilityCredential,
        verifier: ThresholdVerifier,
        log: EventLog,
        now: Timestamp,
    }

    fn addr(label: &str) -> Address {
        Address::from_label(label).unwrap()
    }

    fn fixture(config: impl FnOnce(&mut VerifierConfig)) -> Fixture {
        let net = Arc::new(MockFheNetwork::new());
        let oracle = MockOracle::new(Arc::clone(&net), vec![Ed25519KeyPair::from_seed(&[1; 32])]);
        let now = Timestamp::parse("2026-06-01T00:00:00Z").unwrap();
        let mut cfg = VerifierConfig::new(oracle.public_keys());
        config(&mut cfg);
        let mut catalog = EventCatalog::new(addr("catalog"), addr("admin"));
        let mut log = EventLog::new();
        catalog
            .create_event(
                &CallContext::new(addr("org"), now),
                &mut log,
                1000,
                "Bronze",
                now.checked_add_days(365).unwrap(),
            )
            .unwrap();
        Fixture {
            net,
            oracle,
            catalog,
            registry: EligibilityCredential::new(
                addr("registry"),
                addr("admin"),
                addr("verifier"),
                CredentialMetadata::default(),
            ),
            verifier: ThresholdVerifier::new(
                addr("verifier"),
                addr("admin"),
                addr("catalog"),
                addr("registry"),
                cfg,
            )
            .unwrap(),
            log,
            now,
        }
    }

    impl Fixture {
        fn ctx(&self, who: &str) -> CallContext {
            CallContext::new(addr(who), self.now)
        }

        fn submit(&mut self, who: &str, balance: u32) -> Result<RequestId, VerifierError> {
            let input = InputContext {
                contract: addr("verifier"),
                user: addr(who),
            };
            let (ct, proof) = self.net.encrypt_input(input, balance).unwrap();
            let submission = EncryptedSubmission {
                event_id: EventId(1),
                balance: ct,
                proof,
            };
            let ctx = self.ctx(who);
            self.verifier.verify_and_request_mint(
                &ctx,
                &mut self.log,
                &self.catalog,
                self.net.as_ref(),
                &submission,
            )
        }

        fn deliver_all(&mut self) -> Vec<Result<CallbackOutcome, VerifierError>> {
            let ctx = self.ctx("relayer");
            self.oracle
                .fulfil_pending()
                .unwrap()
                .into_iter()
                .map(|r| {
                    self.verifier.oracle_callback(
                        &ctx,
                        &mut self.log,
                        &mut self.registry,
                        r.request_id,
                        &r.cleartext,
                        &r.attestation,
                    )
                })
                .collect()
        }
    }

    #[test]
    fn test_request_registers_pending_record() {
        let mut fx = fixture(|_| {});
        let id = fx.submit("alice", 2000).unwrap();
        let attempt = fx.verifier.pending(&id).unwrap();
        assert_eq!(attempt.requester, addr("alice"));
        assert_eq!(fx.verifier.pending_event_id(&id), Some(EventId(1)));
        assert_eq!(fx.verifier.pending_count(), 1);
    }

    #[test]
    fn test_qualified_callback_mints() {
        let mut fx = fixture(|_| {});
        fx.submit("alice", 2000).unwrap();
        let outcomes = fx.deliver_all();
        assert_eq!(outcomes, vec![Ok(CallbackOutcome::Qualified { token_id: TokenId(1) })]);
        assert_eq!(fx.registry.balance_of(&addr("alice")), 1);
        assert_eq!(fx.registry.event_of(TokenId(1)).unwrap(), EventId(1));
        assert_eq!(fx.verifier.pending_count(), 0);
    }

    #[test]
    fn test_not_qualified_callback_consumes_without_mint() {
        let mut fx = fixture(|_| {});
        let id = fx.submit("bob", 500).unwrap();
        assert_eq!(fx.deliver_all(), vec![Ok(CallbackOutcome::NotQualified)]);
        assert_eq!(fx.registry.balance_of(&addr("bob")), 0);
        assert_eq!(fx.verifier.pending(&id).unwrap().state, VerificationState::NotQualified);
    }

    #[test]
    fn test_unknown_event_and_inactive_event() {
        let mut fx = fixture(|_| {});
        let input = InputContext {
            contract: addr("verifier"),
            user: addr("alice"),
        };
        let (ct, proof) = fx.net.encrypt_input(input, 1).unwrap();
        let submission = EncryptedSubmission {
            event_id: EventId(9),
            balance: ct,
            proof,
        };
        let ctx = fx.ctx("alice");
        let err = fx
            .verifier
            .verify_and_request_mint(&ctx, &mut fx.log, &fx.catalog, fx.net.as_ref(), &submission)
            .unwrap_err();
        assert_eq!(err, VerifierError::EventNotFound(EventId(9)));

        let org = fx.ctx("org");
        fx.catalog.deactivate_event(&org, &mut fx.log, EventId(1)).unwrap();
        assert_eq!(fx.submit("alice", 2000), Err(VerifierError::EventNotActive(EventId(1))));
        assert_eq!(fx.verifier.pending_count(), 0);
    }

    #[test]
    fn test_proof_bound_to_other_user_rejected() {
        let mut fx = fixture(|_| {});
        let input = InputContext {
            contract: addr("verifier"),
            user: addr("alice"),
        };
        let (ct, proof) = fx.net.encrypt_input(input, 5000).unwrap();
        let submission = EncryptedSubmission {
            event_id: EventId(1),
            balance: ct,
            proof,
        };
        let ctx = fx.ctx("mallory");
        let err = fx
            .verifier
            .verify_and_request_mint(&ctx, &mut fx.log, &fx.catalog, fx.net.as_ref(), &submission)
            .unwrap_err();
        assert!(matches!(err, VerifierError::InvalidProof(_)));
        assert_eq!(err.class(), ErrorClass::Validation);
        assert_eq!(fx.net.pending_disclosures(), 0);
    }

    #[test]
    fn test_single_attempt_policy() {
        let mut fx = fixture(|c| c.single_attempt_per_event = true);
        let first = fx.submit("alice", 2000).unwrap();
        assert!(matches!(
            fx.submit("alice", 2000),
            Err(VerifierError::AttemptInFlight { request_id, .. }) if request_id == first
        ));
        fx.submit("bob", 2000).unwrap();
        fx.deliver_all();
        fx.submit("alice", 2000).unwrap();
    }

    #[test]
    fn test_reclaim_requires_ttl() {
        let mut fx = fixture(|_| {});
        let id = fx.submit("alice", 2000).unwrap();
        let ctx = fx.ctx("anyone");
        assert_eq!(
            fx.verifier.reclaim_expired(&ctx, &mut fx.log, id),
            Err(VerifierError::ExpiryDisabled)
        );
    }

    #[test]
    fn test_reclaim_then_callback_is_expired() {
        let mut fx = fixture(|c| c.pending_ttl_secs = Some(600));
        let id = fx.submit("alice", 2000).unwrap();

        let early = fx.ctx("anyone");
        assert!(matches!(
            fx.verifier.reclaim_expired(&early, &mut fx.log, id),
            Err(VerifierError::NotExpired { ttl_secs: 600, .. })
        ));

        fx.now = fx.now.checked_add_secs(600).unwrap();
        let late = fx.ctx("anyone");
        fx.verifier.reclaim_expired(&late, &mut fx.log, id).unwrap();
        assert_eq!(fx.verifier.pending(&id).unwrap().state, VerificationState::Expired);
        assert_eq!(fx.deliver_all(), vec![Err(VerifierError::RequestExpired(id))]);
        assert_eq!(fx.registry.total_supply(), 0);
    }

    #[test]
    fn test_admin_relinks_owner_only() {
        let mut fx = fixture(|_| {});
        let stranger = fx.ctx("org");
        assert!(matches!(
            fx.verifier.set_event_catalog(&stranger, &mut fx.log, addr("x")),
            Err(VerifierError::Ownership(_))
        ));
        let admin = fx.ctx("admin");
        fx.verifier
            .set_credential_registry(&admin, &mut fx.log, addr("registry-2"))
            .unwrap();
        assert_eq!(fx.verifier.credential_registry(), addr("registry-2"));
    }

    #[test]
    fn test_attempt_error_mapping() {
        let id = RequestId([3; 32]);
        let expired = AttemptError::TerminalState {
            request_id: id,
            state: VerificationState::Expired,
        };
        assert_eq!(attempt_error(id, expired), VerifierError::RequestExpired(id));
        let done = AttemptError::TerminalState {
            request_id: id,
            state: VerificationState::Qualified,
        };
        assert_eq!(attempt_error(id, done), VerifierError::AlreadyFulfilled(id));
    }
}
