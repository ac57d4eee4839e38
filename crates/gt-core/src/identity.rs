//! # Identity Newtypes
//!
//! Distinct types for every identifier namespace on the ledger. An
//! `EventId` cannot be confused with a `TokenId`, and a `RequestId` is an
//! opaque 32-byte correlation handle produced by the oracle integration
//! layer, never an integer a caller could guess or reuse.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::canonical::CanonicalBytes;
use crate::digest::{sha256_digest, ContentDigest};
use crate::error::GtError;

/// A 20-byte ledger identity (participant, organizer or deployed component).
///
/// Serializes as a `0x`-prefixed lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 20]);

/// Sequential event identifier, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

/// Sequential credential token number, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub u64);

/// Opaque oracle correlation handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub [u8; 32]);

// ─── Address ─────────────────────────────────────────────────────────

impl Address {
    /// The all-zero address; the `from` side of a mint record.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Derive the address of a component deployed by `deployer` at `nonce`.
    ///
    /// `address = SHA256(canonical({"deployer", "nonce"}))[12..32]`.
    pub fn derive(deployer: &Address, nonce: u64) -> Result<Self, GtError> {
        let cb = CanonicalBytes::new(&serde_json::json!({
            "deployer": deployer.to_hex(),
            "nonce": nonce,
        }))?;
        Ok(Self::from_digest(&sha256_digest(&cb)))
    }

    /// Deterministic address for a human-readable label.
    ///
    /// Used by scenario files and tests to name participants ("alice",
    /// "organizer") without managing key material.
    pub fn from_label(label: &str) -> Result<Self, GtError> {
        let cb = CanonicalBytes::new(&serde_json::json!({ "label": label }))?;
        Ok(Self::from_digest(&sha256_digest(&cb)))
    }

    fn from_digest(digest: &ContentDigest) -> Self {
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest.as_bytes()[12..32]);
        Self(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", encode_hex(&self.0))
    }

    /// Parse a 40-hex-digit address, with or without `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, GtError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = decode_hex(s)?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| GtError::Parse(format!("address must be 20 bytes: {s:?}")))?;
        Ok(Self(arr))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ─── EventId / TokenId ───────────────────────────────────────────────

impl EventId {
    /// The first id the catalog assigns.
    pub const FIRST: EventId = EventId(1);

    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id after this one, or `None` at `u64::MAX`.
    pub fn next(&self) -> Option<EventId> {
        self.0.checked_add(1).map(EventId)
    }
}

impl TokenId {
    pub const FIRST: TokenId = TokenId(1);

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> Option<TokenId> {
        self.0.checked_add(1).map(TokenId)
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "token:{}", self.0)
    }
}

// ─── RequestId ───────────────────────────────────────────────────────

impl RequestId {
    pub fn from_digest(digest: ContentDigest) -> Self {
        Self(digest.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        encode_hex(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, GtError> {
        let bytes = decode_hex(s.trim())?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| GtError::Parse(format!("request id must be 32 bytes: {s:?}")))?;
        Ok(Self(arr))
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RequestId({}...)", &self.to_hex()[..8])
    }
}

impl Serialize for RequestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ─── Hex utilities ───────────────────────────────────────────────────

fn encode_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn decode_hex(hex: &str) -> Result<Vec<u8>, GtError> {
    if hex.len() % 2 != 0 {
        return Err(GtError::Parse("hex string must have even length".to_string()));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| GtError::Parse(format!("invalid hex at position {i}")))
        })
        .collect()
}
