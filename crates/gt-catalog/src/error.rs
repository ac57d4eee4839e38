use thiserror::Error;

use gt_core::{Address, ErrorClass, EventId, OwnershipError, Timestamp};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Expiry must be strictly after the call's block time.
    #[error("expiry {expiry} is not after the current time {now}")]
    InvalidExpiry { expiry: Timestamp, now: Timestamp },

    #[error("event name must not be empty")]
    EmptyName,

    #[error("{0} not found")]
    NotFound(EventId),

    #[error("event ids exhausted")]
    EventIdExhausted,

    #[error("caller {caller} is not the organizer of {event_id}")]
    NotOrganizer { event_id: EventId, caller: Address },

    #[error(transparent)]
    Ownership(#[from] OwnershipError),
}

impl CatalogError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidExpiry { .. }
            | Self::EmptyName
            | Self::NotFound(_)
            | Self::EventIdExhausted => ErrorClass::Validation,
            Self::NotOrganizer { .. } => ErrorClass::Authorization,
            Self::Ownership(e) => e.class(),
        }
    }
}
