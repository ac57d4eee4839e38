//! # Ledger Time
//!
//! `Timestamp` is the block time handed to every call: UTC, seconds
//! precision. Event expiry comparisons and pending-request age both use it,
//! so sub-second jitter can never make an expiry check flap.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GtError;

/// A UTC timestamp truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Parse an RFC 3339 string. Only the `Z` suffix is accepted.
    pub fn parse(s: &str) -> Result<Self, GtError> {
        if !s.ends_with('Z') {
            return Err(GtError::Parse(format!(
                "timestamp must use Z suffix (UTC only), got: {s:?}"
            )));
        }
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|e| GtError::Parse(format!("invalid RFC 3339 timestamp {s:?}: {e}")))?;
        Ok(Self(truncate_to_seconds(dt.with_timezone(&Utc))))
    }

    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// `self + secs`, failing instead of wrapping.
    pub fn checked_add_secs(&self, secs: i64) -> Result<Self, GtError> {
        let delta = Duration::try_seconds(secs)
            .ok_or_else(|| GtError::TimestampRange(format!("duration {secs}s out of range")))?;
        self.0
            .checked_add_signed(delta)
            .map(Self)
            .ok_or_else(|| GtError::TimestampRange(format!("{self} + {secs}s overflows")))
    }

    /// `self + days`.
    pub fn checked_add_days(&self, days: i64) -> Result<Self, GtError> {
        let secs = days
            .checked_mul(86_400)
            .ok_or_else(|| GtError::TimestampRange(format!("{days} days overflows")))?;
        self.checked_add_secs(secs)
    }

    /// Whole seconds elapsed from `earlier` to `self`; negative if `earlier`
    /// is later.
    pub fn secs_since(&self, earlier: &Timestamp) -> i64 {
        self.epoch_secs() - earlier.epoch_secs()
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

fn truncate_to_seconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}
