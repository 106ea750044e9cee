//! Ledger Adapter Module
//!
//! The order engine moves value only through `LedgerAdapter`: escrow funds from
//! a sender, pay out of escrow, and read the ledger clock. Each call either
//! commits or fails as a unit; the engine never retries.

pub mod memory;

pub use memory::InMemoryLedger;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::LedgerError;
use crate::types::{Address, Amount, Asset, Timestamp};

/// Reference to a committed payout transaction (hash, or logical time on TON).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRef(pub String);

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract the order engine requires from the host ledger.
pub trait LedgerAdapter {
    /// Moves `amount` of `asset` from `from` into escrow.
    fn escrow(&mut self, from: &Address, asset: &Asset, amount: Amount) -> Result<(), LedgerError>;

    /// Pays `amount` of `asset` out of escrow to `to`.
    fn payout(&mut self, asset: &Asset, amount: Amount, to: &Address) -> Result<TxRef, LedgerError>;

    /// Current ledger time in seconds.
    fn now(&self) -> Timestamp;
}
