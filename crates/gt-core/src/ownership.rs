//! # Component Ownership
//!
//! Every deployed component has a single administrator. Administrative
//! calls (minter rotation, verifier rewiring, ownership handover) go through
//! [`Ownership::require_owner`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorClass;
use crate::events::{EventLog, LedgerEvent};
use crate::identity::Address;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("caller {caller} is not the owner ({owner})")]
    NotOwner { caller: Address, owner: Address },

    #[error("ownership cannot be transferred to the zero address")]
    ZeroAddress,
}

impl OwnershipError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::NotOwner { .. } => ErrorClass::Authorization,
            Self::ZeroAddress => ErrorClass::Validation,
        }
    }
}

/// The administrator slot of one component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn require_owner(&self, caller: &Address) -> Result<(), OwnershipError> {
        if *caller != self.owner {
            return Err(OwnershipError::NotOwner {
                caller: *caller,
                owner: self.owner,
            });
        }
        Ok(())
    }

    /// Hand the slot to `new_owner`. Only the current owner may call this.
    pub fn transfer(
        &mut self,
        component: Address,
        caller: &Address,
        new_owner: Address,
        log: &mut EventLog,
    ) -> Result<(), OwnershipError> {
        self.require_owner(caller)?;
        if new_owner.is_zero() {
            return Err(OwnershipError::ZeroAddress);
        }
        let previous = self.owner;
        self.owner = new_owner;
        log.emit(LedgerEvent::OwnershipTransferred {
            component,
            previous,
            owner: new_owner,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(label: &str) -> Address {
        Address::from_label(label).unwrap()
    }

    #[test]
    fn test_owner_passes_check() {
        let own = Ownership::new(addr("admin"));
        assert!(own.require_owner(&addr("admin")).is_ok());
        let err = own.require_owner(&addr("mallory")).unwrap_err();
        assert_eq!(err.class(), ErrorClass::Authorization);
    }

    #[test]
    fn test_transfer_emits_event() {
        let mut own = Ownership::new(addr("admin"));
        let mut log = EventLog::new();
        own.transfer(addr("component"), &addr("admin"), addr("next"), &mut log)
            .unwrap();
        assert_eq!(own.owner(), addr("next"));
        assert_eq!(log.len(), 1);
        assert!(own.require_owner(&addr("admin")).is_err());
    }

    #[test]
    fn test_transfer_rejects_non_owner_and_zero() {
        let mut own = Ownership::new(addr("admin"));
        let mut log = EventLog::new();
        assert!(own
            .transfer(addr("component"), &addr("mallory"), addr("mallory"), &mut log)
            .is_err());
        assert_eq!(
            own.transfer(addr("component"), &addr("admin"), Address::ZERO, &mut log),
            Err(OwnershipError::ZeroAddress)
        );
        assert!(log.is_empty());
        assert_eq!(own.owner(), addr("admin"));
    }
}
