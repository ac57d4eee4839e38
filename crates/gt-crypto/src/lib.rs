//! # gt-crypto — Cryptographic Primitives
//!
//! Ed25519 keys and signatures for the decryption-oracle attestation path.
//! The oracle signs the canonical disclosure payload; the verifier checks
//! the signature against its configured trusted key set.
//!
//! ## Crate Policy
//!
//! - Depends only on `gt-core` internally.
//! - Signing and verification accept `&CanonicalBytes`, never raw slices.
//! - Private keys are never serialized or printed.

pub mod ed25519;

pub use ed25519::{verify, verify_with_public_key, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};
