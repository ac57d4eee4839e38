//! # gt-state — Verification Attempt Lifecycle
//!
//! One `VerificationAttempt` exists per disclosure request the verifier has
//! issued. It is created in `Requested` when the request is registered and
//! moves exactly once to a terminal state:
//!
//! - **Qualified**: the oracle reported `balance >= threshold` and a
//!   credential was minted.
//! - **NotQualified**: the oracle reported `false`; nothing was minted.
//! - **Expired**: the oracle stayed silent past the configured TTL and the
//!   slot was reclaimed.
//!
//! Terminal attempts are kept, not deleted, so a replayed callback is
//! distinguishable from one for a request that never existed.

pub mod attempt;

pub use attempt::{AttemptError, AttemptTransitionRecord, VerificationAttempt, VerificationState};
