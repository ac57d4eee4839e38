//! # gt-verifier — Encrypted Threshold Verification
//!
//! The `ThresholdVerifier` accepts an encrypted balance for an event, has
//! the confidential-compute collaborator compare it with the event's
//! threshold, and queues only the resulting boolean for disclosure. The
//! oracle answers later through `oracle_callback`, which checks the
//! attestation, resolves the originating `(requester, event)` pair from the
//! pending table and mints a credential if the answer is "qualified".
//!
//! ## Modules
//!
//! - **Config** (`config.rs`): trusted oracle keys, attestation threshold,
//!   optional pending TTL and single-attempt policy.
//! - **Verifier** (`verifier.rs`): the component itself.
//! - **Ledger** (`ledger.rs`): a host owning deployed catalogs, registries
//!   and verifiers. Every mutating call runs serially and all-or-nothing.

pub mod config;
pub mod error;
pub mod ledger;
pub mod verifier;

pub use config::{ConfigError, VerifierConfig};
pub use error::{LedgerError, VerifierError};
pub use ledger::{Deployment, Ledger};
pub use verifier::{CallbackOutcome, EncryptedSubmission, ThresholdVerifier};
