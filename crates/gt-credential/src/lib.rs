//! # gt-credential — Eligibility Credential Registry
//!
//! A non-fungible registry of proof-of-eligibility tokens. Each token is
//! minted once, has exactly one owner, and records the event it was earned
//! for. Only the configured minter (the threshold verifier) may mint.
//!
//! There is no transfer entrypoint: a credential stays with the participant
//! who qualified.

pub mod error;
pub mod metadata;
pub mod registry;

pub use error::CredentialError;
pub use metadata::CredentialMetadata;
pub use registry::{EligibilityCredential, TokenRecord};
