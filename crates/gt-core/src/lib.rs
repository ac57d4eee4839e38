//! # gt-core — Foundational Types for the Golden Ticket Stack
//!
//! This crate is the leaf of the workspace dependency graph. It defines the
//! primitives every component shares: who is calling, when, and what the
//! ledger observed.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `Address`, `EventId`, `TokenId` and
//!    `RequestId` are distinct types. An event id cannot be passed where a
//!    token id is expected, and an oracle request id is an opaque 32-byte
//!    handle rather than a bare integer.
//!
//! 2. **`CanonicalBytes` newtype.** Everything that is signed or hashed
//!    (oracle attestations, input-proof bindings, request ids) flows through
//!    `CanonicalBytes::new()`. Two parties that agree on the value agree on
//!    the bytes.
//!
//! 3. **UTC-only timestamps.** `Timestamp` is the ledger clock: seconds
//!    precision, always UTC. Event expiry and pending-request age use it.
//!
//! 4. **Explicit call context.** Every state-mutating operation receives a
//!    `CallContext` naming the caller and the block time. There is no
//!    ambient "current sender".
//!
//! ## Crate Policy
//!
//! - No dependencies on other `gt-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod context;
pub mod digest;
pub mod error;
pub mod events;
pub mod identity;
pub mod ownership;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use context::CallContext;
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use error::{ErrorClass, GtError};
pub use events::{EventLog, LedgerEvent};
pub use identity::{Address, EventId, RequestId, TokenId};
pub use ownership::{Ownership, OwnershipError};
pub use temporal::Timestamp;
