//! # Call Context
//!
//! The caller identity and block time for one state-mutating call.

use serde::{Deserialize, Serialize};

use crate::identity::Address;
use crate::temporal::Timestamp;

/// Who is calling, and at what ledger time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub now: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, now: Timestamp) -> Self {
        Self { caller, now }
    }

    /// The same block time with a different caller. Used when one component
    /// calls another: the callee sees the calling component as `caller`.
    pub fn as_caller(&self, caller: Address) -> Self {
        Self { caller, now: self.now }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_caller_keeps_time() {
        let now = Timestamp::parse("2026-10-18T12:00:00Z").unwrap();
        let alice = Address::from_label("alice").unwrap();
        let verifier = Address::from_label("verifier").unwrap();
        let ctx = CallContext::new(alice, now);
        let inner = ctx.as_caller(verifier);
        assert_eq!(inner.caller, verifier);
        assert_eq!(inner.now, now);
    }
}
