//! Error types
//!
//! Every guard failure maps to exactly one `HtlcError` variant, and every
//! variant carries a stable numeric exit code surfaced to callers.

use thiserror::Error;

use crate::types::{Amount, BridgeId, ChainId, OrderId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HtlcError {
    #[error("Unauthorized caller")]
    Unauthorized,

    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),

    #[error("Order {0} is already finalized")]
    OrderFinalized(OrderId),

    #[error("Order {0} has expired")]
    OrderExpired(OrderId),

    #[error("Order {0} already exists")]
    DuplicateOrder(OrderId),

    #[error("Fill {fill_id} already recorded for order {order_id}")]
    DuplicateFill { order_id: OrderId, fill_id: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Amount),

    #[error("Timelock {timelock} is not in the future (now {now})")]
    InvalidTimelock { timelock: u64, now: u64 },

    #[error("No active bridge for chain {0}")]
    InvalidChainId(ChainId),

    #[error("Secret does not match hashlock")]
    InvalidSecret,

    #[error("Timelock not expired yet (now {now}, timelock {timelock})")]
    TimelockNotExpired { timelock: u64, now: u64 },

    #[error("Escrow failed: {0}")]
    EscrowFailed(LedgerError),

    #[error("Payout failed: {0}")]
    PayoutFailed(LedgerError),

    #[error("Invalid transfer bounds: min {min} > max {max}")]
    InvalidBounds { min: Amount, max: Amount },

    #[error("Bridge {0} already registered")]
    DuplicateBridge(BridgeId),

    #[error("Bridge {0} not found")]
    BridgeNotFound(BridgeId),
}

impl HtlcError {
    /// Stable exit code for this error.
    pub fn code(&self) -> u32 {
        match self {
            HtlcError::Unauthorized => 80,
            HtlcError::OrderNotFound(_) => 81,
            HtlcError::OrderFinalized(_) => 82,
            HtlcError::OrderExpired(_) => 83,
            HtlcError::DuplicateOrder(_) => 84,
            HtlcError::DuplicateFill { .. } => 85,
            HtlcError::InvalidAmount(_) => 86,
            HtlcError::InvalidTimelock { .. } => 87,
            HtlcError::InvalidChainId(_) => 88,
            HtlcError::InvalidSecret => 89,
            HtlcError::TimelockNotExpired { .. } => 90,
            HtlcError::EscrowFailed(_) => 91,
            HtlcError::PayoutFailed(_) => 92,
            HtlcError::InvalidBounds { .. } => 93,
            HtlcError::DuplicateBridge(_) => 94,
            HtlcError::BridgeNotFound(_) => 95,
        }
    }
}

/// Failure reported by a ledger adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("transfer rejected: {0}")]
    Rejected(String),
}
