//! Shared primitive types
//!
//! Ledger-agnostic identifiers and value types used across the registries,
//! the order engine and the instruction set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied order identifier, unique per originating ledger.
pub type OrderId = u64;

/// Value in the ledger's smallest unit (nanotons, wei, jetton units).
pub type Amount = u128;

/// Ledger clock, seconds since the Unix epoch.
pub type Timestamp = u64;

/// Numeric chain identifier (EVM chain id, or the TON workchain-derived id).
pub type ChainId = u64;

/// Identifier of a registered bridge route.
pub type BridgeId = u64;

// ============================================================================
// ADDRESSES AND ASSETS
// ============================================================================

/// Ledger-native address.
///
/// Kept opaque: TON user-friendly/raw addresses and 0x-prefixed EVM addresses
/// both pass through unchanged. Comparison is exact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Asset held in escrow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "address", rename_all = "snake_case")]
pub enum Asset {
    /// The ledger's native coin (TON, ETH)
    Native,
    /// Fungible token identified by its master/contract address (jetton, ERC-20)
    Token(Address),
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Token(addr) => write!(f, "token:{}", addr),
        }
    }
}

/// Which ledger escrows the funds of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Funds escrowed here, counterpart paid out on the foreign (EVM) chain
    ToForeign,
    /// Order originated on the foreign chain; a resolver escrows the counterpart here
    FromForeign,
}

// ============================================================================
// FILL IDENTIFIERS
// ============================================================================

/// Key of one entry in an order's partial-fill map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FillId(pub [u8; 32]);

impl FillId {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for FillId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for FillId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for FillId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        crate::hashlock::decode_hex_32(&s)
            .map(FillId)
            .map_err(serde::de::Error::custom)
    }
}
