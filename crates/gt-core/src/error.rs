//! # Error Types
//!
//! Shared error types and the three-way error classification used by every
//! component.
//!
//! ## Classification
//!
//! - **Validation**: bad input (empty name, past expiry, inactive event,
//!   unknown event, rejected input proof). The caller fixes the input and
//!   retries.
//! - **Authorization**: the caller is not allowed to perform the call
//!   (non-organizer update, non-minter mint, non-admin configuration).
//! - **Protocol**: the oracle callback path saw something that only a replay,
//!   a forgery or a bug produces (unknown request, already-fulfilled request,
//!   invalid attestation). Logged distinctly from validation failures.

use thiserror::Error;

/// Which of the three rejection classes an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Validation,
    Authorization,
    Protocol,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authorization => "authorization",
            Self::Protocol => "protocol",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Top-level error type for foundational operations.
#[derive(Error, Debug)]
pub enum GtError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A value could not be parsed into a core type.
    #[error("parse error: {0}")]
    Parse(String),

    /// Timestamp arithmetic left the representable range.
    #[error("timestamp out of range: {0}")]
    TimestampRange(String),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted; amounts and thresholds are integers.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error in cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Signature verification failed.
    #[error("signature verification failed: {0}")]
    VerificationFailed(String),

    /// Key parsing failed.
    #[error("key error: {0}")]
    KeyError(String),
}
