//! # Verification Attempt State Machine
//!
//! ```text
//! (idle) ──register──▶ Requested ──qualify────▶ Qualified    (terminal)
//!                          │
//!                          ├────disqualify─▶ NotQualified (terminal)
//!                          │
//!                          └────expire─────▶ Expired      (terminal)
//! ```
//!
//! Transitions take the call's block time rather than reading the wall
//! clock, so replaying a ledger reproduces identical records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gt_core::{Address, EventId, RequestId, Timestamp, TokenId};

// ─── Verification State ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationState {
    /// Disclosure requested; waiting for the oracle callback.
    Requested,
    /// Callback reported qualified; a credential was minted (terminal).
    Qualified,
    /// Callback reported not qualified (terminal).
    NotQualified,
    /// Reclaimed after the pending TTL elapsed (terminal).
    Expired,
}

impl VerificationState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Requested)
    }

    /// Whether an oracle callback consumed this attempt.
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Qualified | Self::NotQualified)
    }
}

impl std::fmt::Display for VerificationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Requested => "REQUESTED",
            Self::Qualified => "QUALIFIED",
            Self::NotQualified => "NOT_QUALIFIED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum AttemptError {
    /// The attempt already reached a terminal state.
    #[error("verification attempt {request_id} is already {state}")]
    TerminalState {
        request_id: RequestId,
        state: VerificationState,
    },

    /// The TTL has not elapsed yet.
    #[error("verification attempt {request_id} is not expired: {age_secs}s old, ttl {ttl_secs}s")]
    NotExpired {
        request_id: RequestId,
        age_secs: i64,
        ttl_secs: u64,
    },
}

// ─── Transition Record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptTransitionRecord {
    pub from_state: VerificationState,
    pub to_state: VerificationState,
    pub timestamp: Timestamp,
    pub reason: String,
}

// ─── Verification Attempt ────────────────────────────────────────────

/// The pending-request record keyed by the oracle correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub request_id: RequestId,
    pub requester: Address,
    pub event_id: EventId,
    pub state: VerificationState,
    pub requested_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    /// Set when the attempt qualified.
    pub token_id: Option<TokenId>,
    pub transitions: Vec<AttemptTransitionRecord>,
}

impl VerificationAttempt {
    /// Register a new attempt in `Requested`.
    pub fn register(
        request_id: RequestId,
        requester: Address,
        event_id: EventId,
        now: Timestamp,
    ) -> Self {
        Self {
            request_id,
            requester,
            event_id,
            state: VerificationState::Requested,
            requested_at: now,
            resolved_at: None,
            token_id: None,
            transitions: Vec::new(),
        }
    }

    /// REQUESTED → QUALIFIED, recording the minted token.
    pub fn qualify(&mut self, token_id: TokenId, now: Timestamp) -> Result<(), AttemptError> {
        self.require_requested()?;
        self.token_id = Some(token_id);
        self.do_transition(VerificationState::Qualified, now, &format!("minted {token_id}"));
        Ok(())
    }

    /// REQUESTED → NOT_QUALIFIED.
    pub fn disqualify(&mut self, now: Timestamp) -> Result<(), AttemptError> {
        self.require_requested()?;
        self.do_transition(VerificationState::NotQualified, now, "balance below threshold");
        Ok(())
    }

    /// REQUESTED → EXPIRED, only once `ttl_secs` have elapsed since the
    /// request was registered.
    pub fn expire(&mut self, ttl_secs: u64, now: Timestamp) -> Result<(), AttemptError> {
        self.require_requested()?;
        let age_secs = self.age_secs(now);
        if !self.is_stale(ttl_secs, now) {
            return Err(AttemptError::NotExpired {
                request_id: self.request_id,
                age_secs,
                ttl_secs,
            });
        }
        self.do_transition(
            VerificationState::Expired,
            now,
            &format!("no callback after {age_secs}s"),
        );
        Ok(())
    }

    pub fn is_pending(&self) -> bool {
        self.state == VerificationState::Requested
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn age_secs(&self, now: Timestamp) -> i64 {
        now.secs_since(&self.requested_at)
    }

    /// Whether a `Requested` attempt has outlived `ttl_secs`.
    pub fn is_stale(&self, ttl_secs: u64, now: Timestamp) -> bool {
        self.is_pending() && i128::from(self.age_secs(now)) >= i128::from(ttl_secs)
    }

    fn require_requested(&self) -> Result<(), AttemptError> {
        if self.state.is_terminal() {
            return Err(AttemptError::TerminalState {
                request_id: self.request_id,
                state: self.state,
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: VerificationState, now: Timestamp, reason: &str) {
        self.transitions.push(AttemptTransitionRecord {
            from_state: self.state,
            to_state: to,
            timestamp: now,
            reason: reason.to_string(),
        });
        self.state = to;
        self.resolved_at = Some(now);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
