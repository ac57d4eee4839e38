//! # Ledger Host
//!
//! Owns every deployed component and runs mutating calls one at a time.
//! Each call goes through [`Ledger::transact`], which marks the event log
//! and the deployment nonce and rewinds both if the call returns an error.
//! Component methods check before they write, and calls that touch several
//! components finish every fallible step before the first write to stored
//! state. A failed call therefore leaves no pending record, no minted token
//! and no log entry behind.
//!
//! Component addresses are derived from the deployer and a ledger-wide
//! deployment nonce. The confidential-compute collaborator is shared with
//! whoever encrypts inputs and runs the oracle.
//!
//! Rejections are logged once here, by class: validation at `debug`,
//! authorization and protocol at `warn`.

use std::collections::BTreeMap;
use std::sync::Arc;

use gt_catalog::{EventCatalog, EventUpdate};
use gt_core::{
    Address, CallContext, ErrorClass, EventId, EventLog, RequestId, Timestamp, TokenId,
};
use gt_credential::{CredentialMetadata, EligibilityCredential};
use gt_fhe::{Attestation, Cleartext, ConfidentialCompute, DisclosureResponse};

use crate::config::VerifierConfig;
use crate::error::LedgerError;
use crate::verifier::{CallbackOutcome, EncryptedSubmission, ThresholdVerifier};

/// Addresses of one fully wired deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deployment {
    pub catalog: Address,
    pub registry: Address,
    pub verifier: Address,
}

#[derive(Debug, Default)]
struct LedgerState {
    catalogs: BTreeMap<Address, EventCatalog>,
    registries: BTreeMap<Address, EligibilityCredential>,
    verifiers: BTreeMap<Address, ThresholdVerifier>,
    log: EventLog,
    deploy_nonce: u64,
}

impl LedgerState {
    fn next_address(&mut self, deployer: &Address) -> Result<Address, LedgerError> {
        let address = Address::derive(deployer, self.deploy_nonce)?;
        self.deploy_nonce += 1;
        Ok(address)
    }

    fn catalog(&self, address: &Address) -> Result<&EventCatalog, LedgerError> {
        self.catalogs.get(address).ok_or(LedgerError::UnknownComponent {
            kind: "event catalog",
            address: *address,
        })
    }

    fn registry(&self, address: &Address) -> Result<&EligibilityCredential, LedgerError> {
        self.registries.get(address).ok_or(LedgerError::UnknownComponent {
            kind: "credential registry",
            address: *address,
        })
    }

    fn verifier(&self, address: &Address) -> Result<&ThresholdVerifier, LedgerError> {
        self.verifiers.get(address).ok_or(LedgerError::UnknownComponent {
            kind: "threshold verifier",
            address: *address,
        })
    }
}

pub struct Ledger<C: ConfidentialCompute> {
    state: LedgerState,
    compute: Arc<C>,
    now: Timestamp,
}

impl<C: ConfidentialCompute> Ledger<C> {
    pub fn new(compute: Arc<C>, genesis: Timestamp) -> Self {
        Self {
            state: LedgerState::default(),
            compute,
            now: genesis,
        }
    }

    // ─── Clock ───────────────────────────────────────────────────────

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// Move block time forward by `secs`.
    pub fn advance(&mut self, secs: i64) -> Result<Timestamp, LedgerError> {
        self.now = self.now.checked_add_secs(secs)?;
        Ok(self.now)
    }

    pub fn compute(&self) -> &Arc<C> {
        &self.compute
    }

    /// Run `op` serially and all-or-nothing.
    fn transact<T, F>(&mut self, op: &'static str, caller: Address, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut LedgerState, &C, &CallContext) -> Result<T, LedgerError>,
    {
        let mark = self.state.log.len();
        let nonce = self.state.deploy_nonce;
        let ctx = CallContext::new(caller, self.now);
        match f(&mut self.state, self.compute.as_ref(), &ctx) {
            Ok(value) => {
                let events = self.state.log.since(mark).len();
                tracing::debug!(op, %caller, events, "call committed");
                Ok(value)
            }
            Err(e) => {
                self.state.log.rollback_to(mark);
                self.state.deploy_nonce = nonce;
                log_rejection(op, &caller, &e);
                Err(e)
            }
        }
    }

    // ─── Deployment ──────────────────────────────────────────────────

    pub fn deploy_catalog(&mut self, deployer: Address) -> Result<Address, LedgerError> {
        self.transact("deploy_catalog", deployer, |s, _, ctx| {
            let address = s.next_address(&ctx.caller)?;
            s.catalogs.insert(address, EventCatalog::new(address, ctx.caller));
            tracing::info!(%address, "event catalog deployed");
            Ok(address)
        })
    }

    pub fn deploy_registry(
        &mut self,
        deployer: Address,
        minter: Address,
        metadata: CredentialMetadata,
    ) -> Result<Address, LedgerError> {
        self.transact("deploy_registry", deployer, |s, _, ctx| {
            let address = s.next_address(&ctx.caller)?;
            s.registries.insert(
                address,
                EligibilityCredential::new(address, ctx.caller, minter, metadata),
            );
            tracing::info!(%address, %minter, "credential registry deployed");
            Ok(address)
        })
    }

    pub fn deploy_verifier(
        &mut self,
        deployer: Address,
        catalog: Address,
        registry: Address,
        config: VerifierConfig,
    ) -> Result<Address, LedgerError> {
        self.transact("deploy_verifier", deployer, |s, _, ctx| {
            s.catalog(&catalog)?;
            s.registry(&registry)?;
            let address = s.next_address(&ctx.caller)?;
            let verifier = ThresholdVerifier::new(address, ctx.caller, catalog, registry, config)?;
            s.verifiers.insert(address, verifier);
            tracing::info!(%address, %catalog, %registry, "threshold verifier deployed");
            Ok(address)
        })
    }

    /// Deploy a catalog, a registry and a verifier, then make the verifier
    /// the registry's minter. One transaction.
    pub fn deploy_stack(
        &mut self,
        deployer: Address,
        config: VerifierConfig,
        metadata: CredentialMetadata,
    ) -> Result<Deployment, LedgerError> {
        self.transact("deploy_stack", deployer, |s, _, ctx| {
            let catalog = s.next_address(&ctx.caller)?;
            let registry = s.next_address(&ctx.caller)?;
            let verifier = s.next_address(&ctx.caller)?;

            let verifier_component =
                ThresholdVerifier::new(verifier, ctx.caller, catalog, registry, config)?;
            let mut registry_component =
                EligibilityCredential::new(registry, ctx.caller, Address::ZERO, metadata);
            registry_component.set_minter(ctx, &mut s.log, verifier)?;

            s.catalogs.insert(catalog, EventCatalog::new(catalog, ctx.caller));
            s.registries.insert(registry, registry_component);
            s.verifiers.insert(verifier, verifier_component);
            tracing::info!(%catalog, %registry, %verifier, "stack deployed");
            Ok(Deployment {
                catalog,
                registry,
                verifier,
            })
        })
    }

    // ─── EventCatalog calls ──────────────────────────────────────────

    pub fn create_event(
        &mut self,
        caller: Address,
        catalog: Address,
        threshold: u32,
        name: &str,
        expiry: Timestamp,
    ) -> Result<EventId, LedgerError> {
        self.transact("create_event", caller, |s, _, ctx| {
            let cat = s.catalogs.get_mut(&catalog).ok_or(LedgerError::UnknownComponent {
                kind: "event catalog",
                address: catalog,
            })?;
            Ok(cat.create_event(ctx, &mut s.log, threshold, name, expiry)?)
        })
    }

    pub fn update_event(
        &mut self,
        caller: Address,
        catalog: Address,
        event_id: EventId,
        update: EventUpdate,
    ) -> Result<(), LedgerError> {
        self.transact("update_event", caller, |s, _, ctx| {
            let cat = s.catalogs.get_mut(&catalog).ok_or(LedgerError::UnknownComponent {
                kind: "event catalog",
                address: catalog,
            })?;
            Ok(cat.update_event(ctx, &mut s.log, event_id, update)?)
        })
    }

    pub fn deactivate_event(
        &mut self,
        caller: Address,
        catalog: Address,
        event_id: EventId,
    ) -> Result<(), LedgerError> {
        self.transact("deactivate_event", caller, |s, _, ctx| {
            let cat = s.catalogs.get_mut(&catalog).ok_or(LedgerError::UnknownComponent {
                kind: "event catalog",
                address: catalog,
            })?;
            Ok(cat.deactivate_event(ctx, &mut s.log, event_id)?)
        })
    }

    // ─── EligibilityCredential calls ─────────────────────────────────

    /// Direct mint with a caller-chosen token id. Only the minter succeeds.
    pub fn mint(
        &mut self,
        caller: Address,
        registry: Address,
        to: Address,
        token_id: TokenId,
        event_id: EventId,
    ) -> Result<(), LedgerError> {
        self.transact("mint", caller, |s, _, ctx| {
            let reg = s.registries.get_mut(&registry).ok_or(LedgerError::UnknownComponent {
                kind: "credential registry",
                address: registry,
            })?;
            Ok(reg.mint(ctx, &mut s.log, to, token_id, event_id)?)
        })
    }

    pub fn set_minter(
        &mut self,
        caller: Address,
        registry: Address,
        minter: Address,
    ) -> Result<(), LedgerError> {
        self.transact("set_minter", caller, |s, _, ctx| {
            let reg = s.registries.get_mut(&registry).ok_or(LedgerError::UnknownComponent {
                kind: "credential registry",
                address: registry,
            })?;
            Ok(reg.set_minter(ctx, &mut s.log, minter)?)
        })
    }

    // ─── ThresholdVerifier calls ─────────────────────────────────────

    pub fn verify_and_request_mint(
        &mut self,
        caller: Address,
        verifier: Address,
        submission: &EncryptedSubmission,
    ) -> Result<RequestId, LedgerError> {
        self.transact("verify_and_request_mint", caller, |s, compute, ctx| {
            let LedgerState {
                catalogs,
                verifiers,
                log,
                ..
            } = s;
            let v = verifiers.get_mut(&verifier).ok_or(LedgerError::UnknownComponent {
                kind: "threshold verifier",
                address: verifier,
            })?;
            let catalog_address = v.event_catalog();
            let catalog = catalogs.get(&catalog_address).ok_or(LedgerError::UnknownComponent {
                kind: "event catalog",
                address: catalog_address,
            })?;
            Ok(v.verify_and_request_mint(ctx, log, catalog, compute, submission)?)
        })
    }

    pub fn oracle_callback(
        &mut self,
        caller: Address,
        verifier: Address,
        request_id: RequestId,
        cleartext: &Cleartext,
        attestation: &Attestation,
    ) -> Result<CallbackOutcome, LedgerError> {
        self.transact("oracle_callback", caller, |s, _, ctx| {
            let LedgerState {
                registries,
                verifiers,
                log,
                ..
            } = s;
            let v = verifiers.get_mut(&verifier).ok_or(LedgerError::UnknownComponent {
                kind: "threshold verifier",
                address: verifier,
            })?;
            let registry_address = v.credential_registry();
            let registry = registries
                .get_mut(&registry_address)
                .ok_or(LedgerError::UnknownComponent {
                    kind: "credential registry",
                    address: registry_address,
                })?;
            Ok(v.oracle_callback(ctx, log, registry, request_id, cleartext, attestation)?)
        })
    }

    /// Relay an oracle response to the verifier it names.
    pub fn deliver(
        &mut self,
        relayer: Address,
        response: &DisclosureResponse,
    ) -> Result<CallbackOutcome, LedgerError> {
        self.oracle_callback(
            relayer,
            response.callback,
            response.request_id,
            &response.cleartext,
            &response.attestation,
        )
    }

    pub fn reclaim_expired(
        &mut self,
        caller: Address,
        verifier: Address,
        request_id: RequestId,
    ) -> Result<(), LedgerError> {
        self.transact("reclaim_expired", caller, |s, _, ctx| {
            let v = s.verifiers.get_mut(&verifier).ok_or(LedgerError::UnknownComponent {
                kind: "threshold verifier",
                address: verifier,
            })?;
            Ok(v.reclaim_expired(ctx, &mut s.log, request_id)?)
        })
    }

    pub fn set_event_catalog(
        &mut self,
        caller: Address,
        verifier: Address,
        catalog: Address,
    ) -> Result<(), LedgerError> {
        self.transact("set_event_catalog", caller, |s, _, ctx| {
            s.catalog(&catalog)?;
            let v = s.verifiers.get_mut(&verifier).ok_or(LedgerError::UnknownComponent {
                kind: "threshold verifier",
                address: verifier,
            })?;
            Ok(v.set_event_catalog(ctx, &mut s.log, catalog)?)
        })
    }

    pub fn set_credential_registry(
        &mut self,
        caller: Address,
        verifier: Address,
        registry: Address,
    ) -> Result<(), LedgerError> {
        self.transact("set_credential_registry", caller, |s, _, ctx| {
            s.registry(&registry)?;
            let v = s.verifiers.get_mut(&verifier).ok_or(LedgerError::UnknownComponent {
                kind: "threshold verifier",
                address: verifier,
            })?;
            Ok(v.set_credential_registry(ctx, &mut s.log, registry)?)
        })
    }

    // ─── Ownership ───────────────────────────────────────────────────

    /// Transfer ownership of whichever component lives at `component`.
    pub fn transfer_ownership(
        &mut self,
        caller: Address,
        component: Address,
        new_owner: Address,
    ) -> Result<(), LedgerError> {
        self.transact("transfer_ownership", caller, |s, _, ctx| {
            if let Some(c) = s.catalogs.get_mut(&component) {
                return Ok(c.transfer_ownership(ctx, &mut s.log, new_owner)?);
            }
            if let Some(r) = s.registries.get_mut(&component) {
                return Ok(r.transfer_ownership(ctx, &mut s.log, new_owner)?);
            }
            if let Some(v) = s.verifiers.get_mut(&component) {
                return Ok(v.transfer_ownership(ctx, &mut s.log, new_owner)?);
            }
            Err(LedgerError::UnknownComponent {
                kind: "component",
                address: component,
            })
        })
    }

    // ─── Reads ───────────────────────────────────────────────────────

    pub fn catalog(&self, address: &Address) -> Result<&EventCatalog, LedgerError> {
        self.state.catalog(address)
    }

    pub fn registry(&self, address: &Address) -> Result<&EligibilityCredential, LedgerError> {
        self.state.registry(address)
    }

    pub fn verifier(&self, address: &Address) -> Result<&ThresholdVerifier, LedgerError> {
        self.state.verifier(address)
    }

    pub fn events(&self) -> &EventLog {
        &self.state.log
    }
}

fn log_rejection(op: &'static str, caller: &Address, e: &LedgerError) {
    match e.class() {
        ErrorClass::Validation => {
            tracing::debug!(op, %caller, error_class = "validation", error = %e, "call rejected");
        }
        ErrorClass::Authorization => {
            tracing::warn!(op, %caller, error_class = "authorization", error = %e, "call rejected");
        }
        ErrorClass::Protocol => {
            tracing::warn!(op, %caller, error_class = "protocol", error = %e, "call rejected");
        }
    }
}
