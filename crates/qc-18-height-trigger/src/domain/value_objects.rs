//! # Value Objects
//!
//! Immutable domain primitives for the height trigger.
//! These types are defined by their value, not identity.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// External (burn chain) block height as observed through the oracle.
pub type BlockHeight = u64;

/// Custodied funds in the smallest unit of the host chain.
pub type Amount = u128;

// =============================================================================
// PRINCIPAL (20 bytes)
// =============================================================================

/// A 20-byte caller identity.
///
/// The owner is recorded as a `Principal` at deployment and every call
/// carries the `Principal` of its sender. Authorization is plain equality.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Principal(pub [u8; 20]);

impl Principal {
    /// The zero principal (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates a principal from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates a principal from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Returns true if this is the zero principal.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Full lowercase hex form with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{}...{}",
            hex::encode(&self.0[..4]),
            hex::encode(&self.0[18..])
        )
    }
}

impl From<[u8; 20]> for Principal {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl From<Principal> for [u8; 20] {
    fn from(principal: Principal) -> Self {
        principal.0
    }
}

/// Failure to parse a [`Principal`] from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrincipalParseError {
    /// Input was not valid hex.
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    /// Input decoded to the wrong number of bytes.
    #[error("invalid principal length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

impl FromStr for Principal {
    type Err = PrincipalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes =
            hex::decode(digits).map_err(|e| PrincipalParseError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes).ok_or(PrincipalParseError::InvalidLength(bytes.len()))
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable numeric error codes returned to callers.
///
/// These never change between releases; hosts match on them.
pub mod error_codes {
    /// Caller is not the owner.
    pub const OWNER_ONLY: u32 = 100;
    /// The action already fired (or, under `SetOnce`, the target is locked).
    pub const ALREADY_TRIGGERED: u32 = 101;
    /// Observed height is below the target.
    pub const HEIGHT_NOT_REACHED: u32 = 102;
    /// Target height of zero.
    pub const INVALID_HEIGHT: u32 = 103;
    /// Withdrawal attempted before the action fired.
    pub const NOT_YET_TRIGGERED: u32 = 104;
    /// Trigger attempted with no target armed.
    pub const TARGET_NOT_SET: u32 = 105;
    /// Withdrawal exceeds the custodied balance.
    pub const INSUFFICIENT_FUNDS: u32 = 106;
    /// The funds-movement collaborator refused the transfer.
    pub const TRANSFER_FAILED: u32 = 107;
    /// Deposit of zero.
    pub const INVALID_AMOUNT: u32 = 108;
    /// Deposit would overflow the balance counter.
    pub const BALANCE_OVERFLOW: u32 = 109;
    /// Persisted state failed invariant checks on restore.
    pub const CORRUPT_STATE: u32 = 110;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_principal_parse_with_prefix() {
        let p: Principal = "0x0101010101010101010101010101010101010101".parse().unwrap();
        assert_eq!(p, Principal::new([1u8; 20]));
    }

    #[test]
    fn test_principal_parse_without_prefix() {
        let p: Principal = "ff".repeat(20).parse().unwrap();
        assert_eq!(p, Principal::new([0xFF; 20]));
    }

    #[test]
    fn test_principal_parse_wrong_length() {
        let err = "0xabcd".parse::<Principal>().unwrap_err();
        assert_eq!(err, PrincipalParseError::InvalidLength(2));
    }

    #[test]
    fn test_principal_parse_bad_hex() {
        assert!(matches!(
            "0xzz".parse::<Principal>(),
            Err(PrincipalParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_principal_display_is_abbreviated() {
        let p = Principal::new([0xAB; 20]);
        assert_eq!(p.to_string(), "0xabababab...abab");
        assert_eq!(format!("{p:?}"), format!("0x{}", "ab".repeat(20)));
    }

    #[test]
    fn test_principal_serde_as_hex() {
        let p = Principal::new([0x11; 20]);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "11".repeat(20)));
        let back: Principal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_principal_zero() {
        assert!(Principal::ZERO.is_zero());
        assert!(!Principal::new([1u8; 20]).is_zero());
    }
}
