//! # Observable Ledger Events
//!
//! The records external indexers and UIs consume. Each component appends to
//! the `EventLog` passed into its mutating calls; the host discards
//! everything appended during a call that fails.

use serde::{Deserialize, Serialize};

use crate::identity::{Address, EventId, RequestId, TokenId};
use crate::temporal::Timestamp;

/// One observable record, tagged with the emitting component's address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerEvent {
    EventCreated {
        catalog: Address,
        event_id: EventId,
        organizer: Address,
        threshold: u32,
        name: String,
        expiry: Timestamp,
    },
    EventUpdated {
        catalog: Address,
        event_id: EventId,
        threshold: u32,
        name: String,
        expiry: Timestamp,
        active: bool,
    },
    VerificationRequested {
        verifier: Address,
        request_id: RequestId,
        requester: Address,
        event_id: EventId,
    },
    VerificationFulfilled {
        verifier: Address,
        request_id: RequestId,
    },
    VerificationExpired {
        verifier: Address,
        request_id: RequestId,
    },
    /// Mint record. `from` is [`Address::ZERO`] for every mint.
    Transfer {
        registry: Address,
        from: Address,
        to: Address,
        token_id: TokenId,
    },
    MinterChanged {
        registry: Address,
        previous: Address,
        minter: Address,
    },
    VerifierLinked {
        verifier: Address,
        catalog: Address,
        registry: Address,
    },
    OwnershipTransferred {
        component: Address,
        previous: Address,
        owner: Address,
    },
}

/// Append-only list of ledger events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog(Vec<LedgerEvent>);

impl EventLog {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn emit(&mut self, event: LedgerEvent) {
        self.0.push(event);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.0.iter()
    }

    /// Events appended at or after position `mark`.
    pub fn since(&self, mark: usize) -> &[LedgerEvent] {
        self.0.get(mark..).unwrap_or(&[])
    }

    /// Drop everything appended at or after `mark`.
    pub fn rollback_to(&mut self, mark: usize) {
        self.0.truncate(mark);
    }
}
