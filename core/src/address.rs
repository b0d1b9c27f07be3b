//! Ledger addresses
//!
//! A 20-byte account identifier rendered as `0x`-prefixed lowercase hex.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an address in bytes
pub const ADDRESS_LEN: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),

    #[error("Invalid address length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Account identifier on the ledger
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Derive a deterministic address from a human-readable label.
    ///
    /// Takes the trailing 20 bytes of `SHA3-256(label)`.
    pub fn derive(label: &str) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(label.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LEN..]);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        let decoded =
            hex::decode(raw).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;

        if decoded.len() != ADDRESS_LEN {
            return Err(AddressParseError::InvalidLength {
                expected: ADDRESS_LEN,
                actual: decoded.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&decoded);
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
