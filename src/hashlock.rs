//! Hash Commitment Module
//!
//! SHA-256 commitments binding an order to a secret. The same secret always
//! yields the same hashlock; claiming an order requires presenting the preimage.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::types::{FillId, OrderId};

/// Width of a hashlock in bytes.
pub const HASH_LEN: usize = 32;

/// Committed hash of a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hashlock(pub [u8; HASH_LEN]);

/// Preimage revealed by the claimant. Arbitrary length.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(pub Vec<u8>);

// ============================================================================
// COMMITMENT OPERATIONS
// ============================================================================

/// Computes the hashlock for a secret.
pub fn commit(secret: &[u8]) -> Hashlock {
    let digest = Sha256::digest(secret);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest);
    Hashlock(out)
}

/// Returns true iff `secret` is a preimage of `hashlock`.
pub fn verify(secret: &[u8], hashlock: &Hashlock) -> bool {
    commit(secret) == *hashlock
}

/// Derives the fill id used when a claim does not carry one.
///
/// Binding the order id keeps ids from different orders sharing a secret
/// apart; binding the secret makes a replayed claim collide with the first.
pub fn derive_fill_id(order_id: OrderId, secret: &[u8]) -> FillId {
    let mut hasher = Sha256::new();
    hasher.update(order_id.to_be_bytes());
    hasher.update(secret);
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&hasher.finalize());
    FillId(out)
}

/// Decodes a 32-byte value from hex, with or without a `0x` prefix.
pub fn decode_hex_32(s: &str) -> Result<[u8; HASH_LEN], String> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| format!("invalid hex '{}': {}", s, e))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected {} bytes, got {}", HASH_LEN, b.len()))
}

// ============================================================================
// HASHLOCK
// ============================================================================

impl Hashlock {
    pub fn from_hex(s: &str) -> Result<Self, String> {
        decode_hex_32(s).map(Hashlock)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hashlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Hashlock {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hashlock {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hashlock::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// SECRET
// ============================================================================

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }
}

impl From<&str> for Secret {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

// Secrets stay out of logs until they are revealed on-chain.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

impl Serialize for Secret {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(stripped)
            .map(Secret)
            .map_err(|e| serde::de::Error::custom(format!("invalid secret hex: {}", e)))
    }
}
