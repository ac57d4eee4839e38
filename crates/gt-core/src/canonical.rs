//! # Canonical Serialization
//!
//! `CanonicalBytes` is the only byte representation that the stack signs or
//! hashes. The oracle signs `CanonicalBytes` of its disclosure payload, the
//! verifier re-derives the same bytes before checking the signature, and the
//! mock encryption network binds input proofs through it.
//!
//! ## Rules
//!
//! 1. **No floats.** Thresholds, balances and counters are integers. A float
//!    anywhere in the value tree is rejected, so no two implementations can
//!    disagree on number formatting.
//! 2. **RFC 8785 (JCS) output.** Keys sorted, compact separators, UTF-8.
//!
//! The inner buffer is private; `CanonicalBytes::new()` is the sole
//! constructor.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization of a float-free value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize any serializable value.
    ///
    /// # Errors
    ///
    /// `CanonicalizationError::FloatRejected` if the value tree contains a
    /// non-integer number, `CanonicalizationError::SerializationFailed` if
    /// serde cannot represent the value as JSON.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        reject_floats(&value)?;
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// The canonical byte sequence.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn reject_floats(value: &Value) -> Result<(), CanonicalizationError> {
    match value {
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
        Value::Number(n) => {
            if n.is_f64() {
                if let Some(f) = n.as_f64() {
                    return Err(CanonicalizationError::FloatRejected(f));
                }
            }
            Ok(())
        }
        Value::Object(map) => map.values().try_for_each(reject_floats),
        Value::Array(arr) => arr.iter().try_for_each(reject_floats),
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn canonical_bytes_deterministic(
            threshold in any::<u32>(),
            name in "[a-zA-Z0-9 ]{1,24}",
            active in any::<bool>(),
        ) {
            let v = serde_json::json!({"threshold": threshold, "name": name, "active": active});
            let a = CanonicalBytes::new(&v).unwrap();
            let b = CanonicalBytes::new(&v).unwrap();
            prop_assert_eq!(a.as_bytes(), b.as_bytes());
        }

        #[test]
        fn canonical_bytes_parse_back(
            keys in prop::collection::btree_set("[a-z]{1,8}", 1..6)
        ) {
            let map: serde_json::Map<String, Value> = keys
                .iter()
                .enumerate()
                .map(|(i, k)| (k.clone(), serde_json::json!(i)))
                .collect();
            let cb = CanonicalBytes::new(&Value::Object(map.clone())).unwrap();
            let parsed: serde_json::Map<String, Value> =
                serde_json::from_slice(cb.as_bytes()).unwrap();
            prop_assert_eq!(parsed, map);
        }
    }
}
