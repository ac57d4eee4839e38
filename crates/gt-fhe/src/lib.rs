//! # gt-fhe — Confidential Compute Seams
//!
//! The verifier never sees a balance. It holds opaque ciphertext handles and
//! asks a confidential-compute collaborator to (1) check that an encrypted
//! input was produced by the caller for this verifier, (2) compare it with a
//! plaintext threshold homomorphically, and (3) disclose only the resulting
//! boolean through an attested, asynchronous oracle round trip.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): `ConfidentialCompute` (what the verifier
//!   calls synchronously) and `DisclosureOracle` (the off-ledger side that
//!   later produces signed callbacks). Mock and real backends are
//!   interchangeable behind them.
//!
//! - **Attestation** (`attestation.rs`): the signed disclosure payload and
//!   `TrustedOracleSet`, the fixed key set plus signer threshold the
//!   verifier checks callbacks against.
//!
//! - **Mock** (`mock.rs`, `oracle.rs`, feature `mock`): `MockFheNetwork`
//!   keeps plaintexts behind hash-derived handles and enforces a per-contract
//!   access list; `MockOracle` drains its disclosure queue and signs results
//!   with real Ed25519 keys.
//!
//! ## Security Notice
//!
//! The mock network is transparent: it stores plaintexts. It reproduces the
//! protocol surface (handles, proofs, ACLs, attestations) for tests and the
//! simulation CLI, not the confidentiality.

pub mod attestation;
#[cfg(feature = "mock")]
pub mod mock;
#[cfg(feature = "mock")]
pub mod oracle;
pub mod traits;

pub use attestation::{Attestation, AttestationError, AttestationSignature, DisclosurePayload, TrustedOracleSet};
#[cfg(feature = "mock")]
pub use mock::MockFheNetwork;
#[cfg(feature = "mock")]
pub use oracle::MockOracle;
pub use traits::{
    CiphertextHandle, Cleartext, ConfidentialCompute, DisclosureOracle, DisclosureResponse,
    EncryptedBool, EncryptedU32, FheError, InputContext, InputProof,
};
