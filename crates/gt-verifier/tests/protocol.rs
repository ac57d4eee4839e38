//! End-to-end protocol tests: participants encrypt balances against the mock
//! network, the verifier requests disclosures through the ledger, and the
//! mock oracle's signed responses are relayed back as callbacks.

use std::sync::Arc;

use gt_catalog::EventUpdate;
use gt_core::{Address, ErrorClass, EventId, LedgerEvent, RequestId, TokenId};
use gt_credential::CredentialMetadata;
use gt_crypto::Ed25519KeyPair;
use gt_fhe::{
    Attestation, Cleartext, DisclosureOracle, DisclosureResponse, InputContext, MockFheNetwork,
    MockOracle,
};
use gt_state::VerificationState;
use gt_verifier::{
    CallbackOutcome, Deployment, EncryptedSubmission, Ledger, LedgerError, VerifierConfig,
    VerifierError,
};

// ─── Harness ─────────────────────────────────────────────────────────

struct World {
    net: Arc<MockFheNetwork>,
    oracle: MockOracle,
    ledger: Ledger<MockFheNetwork>,
    stack: Deployment,
    bronze: EventId,
}

fn addr(label: &str) -> Address {
    Address::from_label(label).unwrap()
}

fn oracle_keys(n: u8) -> Vec<Ed25519KeyPair> {
    (1..=n).map(|i| Ed25519KeyPair::from_seed(&[i; 32])).collect()
}

fn world_with(nodes: u8, tune: impl FnOnce(&mut VerifierConfig)) -> World {
    let net = Arc::new(MockFheNetwork::new());
    let oracle = MockOracle::new(Arc::clone(&net), oracle_keys(nodes));
    let mut config = VerifierConfig::new(oracle.public_keys());
    tune(&mut config);

    let mut ledger = Ledger::new(
        Arc::clone(&net),
        gt_core::Timestamp::parse("2026-09-01T12:00:00Z").unwrap(),
    );
    let stack = ledger
        .deploy_stack(addr("deployer"), config, CredentialMetadata::default())
        .unwrap();
    let expiry = ledger.now().checked_add_days(365).unwrap();
    let bronze = ledger
        .create_event(addr("organizer"), stack.catalog, 1000, "Bronze", expiry)
        .unwrap();
    World {
        net,
        oracle,
        ledger,
        stack,
        bronze,
    }
}

fn world() -> World {
    world_with(1, |_| {})
}

impl World {
    fn encrypt(&self, who: &str, balance: u32, event_id: EventId) -> EncryptedSubmission {
        let input = InputContext {
            contract: self.stack.verifier,
            user: addr(who),
        };
        let (balance, proof) = self.net.encrypt_input(input, balance).unwrap();
        EncryptedSubmission {
            event_id,
            balance,
            proof,
        }
    }

    fn submit(&mut self, who: &str, balance: u32) -> Result<RequestId, LedgerError> {
        let submission = self.encrypt(who, balance, self.bronze);
        self.ledger
            .verify_and_request_mint(addr(who), self.stack.verifier, &submission)
    }

    fn responses(&self) -> Vec<DisclosureResponse> {
        self.oracle.fulfil_pending().unwrap()
    }

    fn deliver(&mut self, response: &DisclosureResponse) -> Result<CallbackOutcome, LedgerError> {
        self.ledger.deliver(addr("relayer"), response)
    }

    fn deliver_all(&mut self) -> Vec<Result<CallbackOutcome, LedgerError>> {
        self.responses().iter().map(|r| self.deliver(r)).collect()
    }

    fn balance(&self, who: &str) -> u64 {
        self.ledger
            .registry(&self.stack.registry)
            .unwrap()
            .balance_of(&addr(who))
    }

    fn state_of(&self, id: &RequestId) -> VerificationState {
        self.ledger
            .verifier(&self.stack.verifier)
            .unwrap()
            .pending(id)
            .unwrap()
            .state
    }

    fn pending_count(&self) -> usize {
        self.ledger
            .verifier(&self.stack.verifier)
            .unwrap()
            .pending_count()
    }
}

fn verifier_err(result: Result<impl std::fmt::Debug, LedgerError>) -> VerifierError {
    match result {
        Err(LedgerError::Verifier(e)) => e,
        other => panic!("expected a verifier error, got {other:?}"),
    }
}

// ─── Scenario ────────────────────────────────────────────────────────

#[test]
fn bronze_scenario_qualifies_a_and_rejects_b() {
    let mut w = world();

    let a = w.submit("participant-a", 2000).unwrap();
    let outcomes = w.deliver_all();
    assert_eq!(outcomes, vec![Ok(CallbackOutcome::Qualified { token_id: TokenId(1) })]);
    assert_eq!(w.balance("participant-a"), 1);
    assert_eq!(w.state_of(&a), VerificationState::Qualified);

    let b = w.submit("participant-b", 500).unwrap();
    assert_eq!(w.deliver_all(), vec![Ok(CallbackOutcome::NotQualified)]);
    assert_eq!(w.balance("participant-b"), 0);
    assert_eq!(w.state_of(&b), VerificationState::NotQualified);

    let registry = w.ledger.registry(&w.stack.registry).unwrap();
    assert_eq!(registry.total_supply(), 1);
    assert_eq!(registry.event_of(TokenId(1)).unwrap(), w.bronze);
    assert_eq!(registry.owner_of(TokenId(1)).unwrap(), addr("participant-a"));
}

#[test]
fn observable_events_follow_the_protocol() {
    let mut w = world();
    let mark = w.ledger.events().len();
    let id = w.submit("participant-a", 2000).unwrap();
    w.deliver_all();

    let kinds: Vec<_> = w.ledger.events().iter().skip(mark).cloned().collect();
    assert_eq!(
        kinds,
        vec![
            LedgerEvent::VerificationRequested {
                verifier: w.stack.verifier,
                request_id: id,
                requester: addr("participant-a"),
                event_id: w.bronze,
            },
            LedgerEvent::Transfer {
                registry: w.stack.registry,
                from: Address::ZERO,
                to: addr("participant-a"),
                token_id: TokenId(1),
            },
            LedgerEvent::VerificationFulfilled {
                verifier: w.stack.verifier,
                request_id: id,
            },
        ]
    );
}

#[test]
fn balance_equal_to_threshold_qualifies() {
    let mut w = world();
    w.submit("participant-a", 1000).unwrap();
    assert_eq!(
        w.deliver_all(),
        vec![Ok(CallbackOutcome::Qualified { token_id: TokenId(1) })]
    );
    assert_eq!(w.balance("participant-a"), 1);
}

#[test]
fn request_creates_exactly_one_pending_record() {
    let mut w = world();
    let id = w.submit("participant-a", 2000).unwrap();
    assert_eq!(w.pending_count(), 1);
    assert_eq!(w.net.pending_disclosures(), 1);
    let verifier = w.ledger.verifier(&w.stack.verifier).unwrap();
    assert_eq!(verifier.pending_event_id(&id), Some(w.bronze));
    assert_eq!(verifier.pending(&id).unwrap().requester, addr("participant-a"));
}

#[test]
fn callbacks_may_arrive_out_of_order() {
    let mut w = world();
    let a = w.submit("participant-a", 2000).unwrap();
    let b = w.submit("participant-b", 3000).unwrap();
    let mut responses = w.responses();
    responses.reverse();
    for r in &responses {
        w.deliver(r).unwrap();
    }
    assert_eq!(w.state_of(&a), VerificationState::Qualified);
    assert_eq!(w.state_of(&b), VerificationState::Qualified);
    let registry = w.ledger.registry(&w.stack.registry).unwrap();
    assert_eq!(registry.tokens_of(&addr("participant-b")), vec![TokenId(1)]);
    assert_eq!(registry.tokens_of(&addr("participant-a")), vec![TokenId(2)]);
}

#[test]
fn duplicate_pending_requests_are_permitted_by_default() {
    let mut w = world();
    let first = w.submit("participant-a", 2000).unwrap();
    let second = w.submit("participant-a", 2000).unwrap();
    assert_ne!(first, second);
    assert_eq!(w.pending_count(), 2);
    w.deliver_all();
    assert_eq!(w.balance("participant-a"), 2);
}

// ─── Validation failures ─────────────────────────────────────────────

#[test]
fn inactive_event_rejects_and_creates_nothing() {
    let mut w = world();
    w.ledger
        .deactivate_event(addr("organizer"), w.stack.catalog, w.bronze)
        .unwrap();
    let err = verifier_err(w.submit("participant-a", 2000));
    assert_eq!(err, VerifierError::EventNotActive(w.bronze));
    assert_eq!(err.class(), ErrorClass::Validation);
    assert_eq!(w.pending_count(), 0);
    assert_eq!(w.net.pending_disclosures(), 0);
}

#[test]
fn expired_event_rejects() {
    let mut w = world();
    w.ledger.advance(365 * 86_400).unwrap();
    assert_eq!(
        verifier_err(w.submit("participant-a", 2000)),
        VerifierError::EventNotActive(w.bronze)
    );
    assert_eq!(w.pending_count(), 0);
}

#[test]
fn unknown_event_rejects() {
    let mut w = world();
    let submission = w.encrypt("participant-a", 2000, EventId(42));
    let result = w
        .ledger
        .verify_and_request_mint(addr("participant-a"), w.stack.verifier, &submission);
    assert_eq!(verifier_err(result), VerifierError::EventNotFound(EventId(42)));
}

#[test]
fn ciphertext_lifted_from_another_participant_rejects() {
    let mut w = world();
    let stolen = w.encrypt("participant-a", 9000, w.bronze);
    let result = w
        .ledger
        .verify_and_request_mint(addr("mallory"), w.stack.verifier, &stolen);
    assert!(matches!(verifier_err(result), VerifierError::InvalidProof(_)));
    assert_eq!(w.pending_count(), 0);
}

#[test]
fn organizer_only_updates_leave_event_unchanged() {
    let mut w = world();
    let expiry = w.ledger.now().checked_add_days(30).unwrap();
    let result = w.ledger.update_event(
        addr("participant-a"),
        w.stack.catalog,
        w.bronze,
        EventUpdate {
            threshold: 0,
            name: "Free".into(),
            expiry,
            active: true,
        },
    );
    assert_eq!(result.unwrap_err().class(), ErrorClass::Authorization);
    let event = w
        .ledger
        .catalog(&w.stack.catalog)
        .unwrap()
        .get_event(w.bronze)
        .unwrap();
    assert_eq!(event.threshold, 1000);
    assert_eq!(event.name, "Bronze");
}

// ─── Protocol failures ───────────────────────────────────────────────

#[test]
fn replayed_callback_fails_and_never_mints_twice() {
    let mut w = world();
    let id = w.submit("participant-a", 2000).unwrap();
    let responses = w.responses();
    w.deliver(&responses[0]).unwrap();
    let before = w.balance("participant-a");

    let err = verifier_err(w.deliver(&responses[0]));
    assert_eq!(err, VerifierError::AlreadyFulfilled(id));
    assert_eq!(err.class(), ErrorClass::Protocol);
    assert_eq!(w.balance("participant-a"), before);
}

#[test]
fn replayed_not_qualified_callback_also_fails() {
    let mut w = world();
    let id = w.submit("participant-b", 1).unwrap();
    let responses = w.responses();
    w.deliver(&responses[0]).unwrap();
    assert_eq!(
        verifier_err(w.deliver(&responses[0])),
        VerifierError::AlreadyFulfilled(id)
    );
}

#[test]
fn attestation_from_untrusted_key_rejects() {
    let mut w = world();
    let id = w.submit("participant-b", 500).unwrap();
    let impostor = [Ed25519KeyPair::from_seed(&[0xee; 32])];
    let forged_result = Cleartext::from_bool(true);
    let forged = Attestation::sign(id, w.stack.verifier, &forged_result, &impostor).unwrap();

    let result =
        w.ledger
            .oracle_callback(addr("relayer"), w.stack.verifier, id, &forged_result, &forged);
    assert!(matches!(verifier_err(result), VerifierError::InvalidAttestation(_)));
    assert_eq!(w.state_of(&id), VerificationState::Requested);
    assert_eq!(w.balance("participant-b"), 0);

    assert_eq!(w.deliver_all(), vec![Ok(CallbackOutcome::NotQualified)]);
}

#[test]
fn flipped_result_breaks_the_attestation() {
    let mut w = world();
    let id = w.submit("participant-b", 500).unwrap();
    let genuine = w.responses().remove(0);
    assert!(!genuine.cleartext.decode_bool().unwrap());

    let result = w.ledger.oracle_callback(
        addr("relayer"),
        w.stack.verifier,
        id,
        &Cleartext::from_bool(true),
        &genuine.attestation,
    );
    assert!(matches!(verifier_err(result), VerifierError::InvalidAttestation(_)));
    assert_eq!(w.balance("participant-b"), 0);
    assert_eq!(w.deliver(&genuine), Ok(CallbackOutcome::NotQualified));
}

#[test]
fn attestation_is_bound_to_the_callback_verifier() {
    let mut w = world();
    let other = w
        .ledger
        .deploy_stack(
            addr("deployer"),
            VerifierConfig::new(w.oracle.public_keys()),
            CredentialMetadata::default(),
        )
        .unwrap();
    let id = w.submit("participant-a", 2000).unwrap();
    let genuine = w.responses().remove(0);

    let mut redirected = genuine.clone();
    redirected.callback = other.verifier;
    assert!(matches!(
        verifier_err(w.deliver(&redirected)),
        VerifierError::InvalidAttestation(_)
    ));
    assert_eq!(w.state_of(&id), VerificationState::Requested);
    assert_eq!(w.deliver(&genuine), Ok(CallbackOutcome::Qualified { token_id: TokenId(1) }));
}

#[test]
fn attestation_threshold_requires_enough_distinct_signers() {
    let mut w = world_with(3, |c| c.attestation_threshold = 2);
    let id = w.submit("participant-a", 2000).unwrap();
    let mut response = w.responses().remove(0);
    let full = response.attestation.clone();

    response.attestation.signatures.truncate(1);
    let dup = response.attestation.signatures[0].clone();
    response.attestation.signatures.push(dup);
    assert!(matches!(
        verifier_err(w.deliver(&response)),
        VerifierError::InvalidAttestation(_)
    ));
    assert_eq!(w.state_of(&id), VerificationState::Requested);

    response.attestation = full;
    response.attestation.signatures.remove(0);
    assert!(w.deliver(&response).is_ok());
    assert_eq!(w.balance("participant-a"), 1);
}

#[test]
fn unknown_request_id_rejects() {
    let mut w = world();
    let bogus = RequestId([0x42; 32]);
    let result = Cleartext::from_bool(true);
    let attestation = Attestation::sign(bogus, w.stack.verifier, &result, &oracle_keys(1)).unwrap();
    let err = verifier_err(w.ledger.oracle_callback(
        addr("relayer"),
        w.stack.verifier,
        bogus,
        &result,
        &attestation,
    ));
    assert_eq!(err, VerifierError::NoSuchRequest(bogus));
    assert_eq!(err.class(), ErrorClass::Protocol);
}

#[test]
fn malformed_cleartext_leaves_request_pending() {
    let mut w = world();
    let id = w.submit("participant-a", 2000).unwrap();
    let garbage = Cleartext(vec![7; 32]);
    let attestation = Attestation::sign(id, w.stack.verifier, &garbage, &oracle_keys(1)).unwrap();
    let result = w
        .ledger
        .oracle_callback(addr("relayer"), w.stack.verifier, id, &garbage, &attestation);
    assert!(matches!(verifier_err(result), VerifierError::MalformedResult(_)));
    assert_eq!(w.state_of(&id), VerificationState::Requested);
}

// ─── Atomicity ───────────────────────────────────────────────────────

#[test]
fn failed_mint_aborts_the_whole_callback() {
    let mut w = world();
    let id = w.submit("participant-a", 2000).unwrap();
    let response = w.responses().remove(0);

    w.ledger
        .set_minter(addr("deployer"), w.stack.registry, addr("someone-else"))
        .unwrap();
    let mark = w.ledger.events().len();
    let err = w.deliver(&response).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Authorization);
    assert_eq!(w.state_of(&id), VerificationState::Requested);
    assert_eq!(w.balance("participant-a"), 0);
    assert_eq!(w.ledger.events().len(), mark);

    w.ledger
        .set_minter(addr("deployer"), w.stack.registry, w.stack.verifier)
        .unwrap();
    assert_eq!(
        w.deliver(&response),
        Ok(CallbackOutcome::Qualified { token_id: TokenId(1) })
    );
}

#[test]
fn direct_mint_by_non_minter_is_unauthorized() {
    let mut w = world();
    let err = w
        .ledger
        .mint(addr("participant-a"), w.stack.registry, addr("participant-a"), TokenId(1), w.bronze)
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Authorization);
    assert_eq!(w.balance("participant-a"), 0);
}

#[test]
fn direct_mint_at_max_token_id_keeps_sequential_numbering() {
    let mut w = world();
    w.ledger
        .set_minter(addr("deployer"), w.stack.registry, addr("ops"))
        .unwrap();
    w.ledger
        .mint(addr("ops"), w.stack.registry, addr("collector"), TokenId(u64::MAX), w.bronze)
        .unwrap();
    w.ledger
        .set_minter(addr("deployer"), w.stack.registry, w.stack.verifier)
        .unwrap();

    w.submit("participant-a", 2000).unwrap();
    assert_eq!(
        w.deliver_all(),
        vec![Ok(CallbackOutcome::Qualified { token_id: TokenId(1) })]
    );
    assert_eq!(w.balance("collector"), 1);
}

// ─── Optional policies ───────────────────────────────────────────────

#[test]
fn expired_request_can_be_reclaimed_and_retried() {
    let mut w = world_with(1, |c| c.pending_ttl_secs = Some(3600));
    let stale = w.submit("participant-a", 2000).unwrap();
    let late_response = w.responses().remove(0);

    assert!(matches!(
        verifier_err(w.ledger.reclaim_expired(addr("anyone"), w.stack.verifier, stale)),
        VerifierError::NotExpired { .. }
    ));

    w.ledger.advance(3600).unwrap();
    w.ledger
        .reclaim_expired(addr("anyone"), w.stack.verifier, stale)
        .unwrap();
    assert_eq!(w.state_of(&stale), VerificationState::Expired);
    assert_eq!(w.pending_count(), 0);

    assert_eq!(
        verifier_err(w.deliver(&late_response)),
        VerifierError::RequestExpired(stale)
    );
    assert_eq!(w.balance("participant-a"), 0);

    w.submit("participant-a", 2000).unwrap();
    w.deliver_all();
    assert_eq!(w.balance("participant-a"), 1);
}

#[test]
fn single_attempt_policy_blocks_concurrent_requests() {
    let mut w = world_with(1, |c| c.single_attempt_per_event = true);
    let first = w.submit("participant-a", 2000).unwrap();
    assert!(matches!(
        verifier_err(w.submit("participant-a", 2000)),
        VerifierError::AttemptInFlight { request_id, .. } if request_id == first
    ));
    assert_eq!(w.pending_count(), 1);

    w.submit("participant-b", 2000).unwrap();
    w.deliver_all();
    w.submit("participant-a", 2000).unwrap();
}

// ─── Administration ──────────────────────────────────────────────────

#[test]
fn ownership_transfer_moves_admin_rights() {
    let mut w = world();
    w.ledger
        .transfer_ownership(addr("deployer"), w.stack.verifier, addr("new-admin"))
        .unwrap();
    let second = w.ledger.deploy_catalog(addr("deployer")).unwrap();
    assert!(w
        .ledger
        .set_event_catalog(addr("deployer"), w.stack.verifier, second)
        .is_err());
    w.ledger
        .set_event_catalog(addr("new-admin"), w.stack.verifier, second)
        .unwrap();
    assert_eq!(
        verifier_err(w.submit("participant-a", 2000)),
        VerifierError::EventNotFound(w.bronze)
    );
}
