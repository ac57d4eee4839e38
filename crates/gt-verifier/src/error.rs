//! # Verifier and Ledger Errors
//!
//! Every error carries an [`ErrorClass`]. The ledger logs validation
//! rejections at `debug`, and authorization and protocol rejections at
//! `warn` with an `error_class` field, so replayed or forged callbacks
//! stand out from ordinary bad input.

use thiserror::Error;

use gt_catalog::CatalogError;
use gt_core::{Address, ErrorClass, EventId, GtError, OwnershipError, RequestId};
use gt_credential::CredentialError;

use crate::config::ConfigError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("{0} not found")]
    EventNotFound(EventId),

    /// The event is deactivated or past its expiry.
    #[error("{0} is not active")]
    EventNotActive(EventId),

    /// The collaborator rejected the input proof for this caller.
    #[error("invalid input proof: {0}")]
    InvalidProof(String),

    /// The collaborator failed to compare or queue the ciphertext.
    #[error("confidential compute failed: {0}")]
    Compute(String),

    #[error("{requester} already has request {request_id} in flight for {event_id}")]
    AttemptInFlight {
        requester: Address,
        event_id: EventId,
        request_id: RequestId,
    },

    #[error("invalid oracle attestation: {0}")]
    InvalidAttestation(String),

    #[error("no pending request {0}")]
    NoSuchRequest(RequestId),

    #[error("request {0} already fulfilled")]
    AlreadyFulfilled(RequestId),

    #[error("request {0} expired before its callback")]
    RequestExpired(RequestId),

    /// The collaborator returned a request id that is already in use.
    #[error("request id {0} issued twice")]
    DuplicateRequestId(RequestId),

    #[error("cleartext result is not a boolean: {0}")]
    MalformedResult(String),

    #[error("pending requests do not expire on this verifier")]
    ExpiryDisabled,

    #[error("request {request_id} is only {age_secs}s old, ttl is {ttl_secs}s")]
    NotExpired {
        request_id: RequestId,
        age_secs: i64,
        ttl_secs: u64,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Ownership(#[from] OwnershipError),
}

impl VerifierError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::EventNotFound(_)
            | Self::EventNotActive(_)
            | Self::InvalidProof(_)
            | Self::Compute(_)
            | Self::AttemptInFlight { .. }
            | Self::ExpiryDisabled
            | Self::NotExpired { .. }
            | Self::Config(_) => ErrorClass::Validation,
            Self::InvalidAttestation(_)
            | Self::NoSuchRequest(_)
            | Self::AlreadyFulfilled(_)
            | Self::RequestExpired(_)
            | Self::DuplicateRequestId(_)
            | Self::MalformedResult(_) => ErrorClass::Protocol,
            Self::Credential(e) => e.class(),
            Self::Ownership(e) => e.class(),
        }
    }
}

/// Errors surfaced by [`crate::Ledger`] calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("no {kind} deployed at {address}")]
    UnknownComponent { kind: &'static str, address: Address },

    /// Address derivation or clock arithmetic failed.
    #[error("host error: {0}")]
    Host(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Verifier(#[from] VerifierError),
}

impl From<GtError> for LedgerError {
    fn from(e: GtError) -> Self {
        Self::Host(e.to_string())
    }
}

impl LedgerError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownComponent { .. } | Self::Host(_) => ErrorClass::Validation,
            Self::Catalog(e) => e.class(),
            Self::Credential(e) => e.class(),
            Self::Verifier(e) => e.class(),
        }
    }
}
