//! # gt-cli — Golden Ticket Command-Line Interface
//!
//! ## Subcommands
//!
//! - `keygen` — generate Ed25519 oracle node keys
//! - `simulate` — run a YAML scenario against an in-process ledger, the
//!   mock confidential-compute network and a mock oracle
//!
//! Argument parsing lives in the subcommand modules; protocol behaviour
//! lives in the domain crates. `scenario` only sequences calls and records
//! what happened.

pub mod keygen;
pub mod scenario;
pub mod simulate;
