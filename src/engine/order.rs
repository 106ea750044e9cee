//! Order state
//!
//! An order is created once, then mutated only by fills and a refund. Orders
//! are kept after they finalize so replays keep failing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hashlock::{Hashlock, Secret};
use crate::types::{Address, Amount, Asset, BridgeId, ChainId, Direction, FillId, OrderId, Timestamp};

/// Caller-supplied part of an order. The sender is the instruction's signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfig {
    pub id: OrderId,
    pub direction: Direction,
    pub source_asset: Asset,
    pub receiver: Address,
    pub hashlock: Hashlock,
    pub timelock: Timestamp,
    pub amount: Amount,
}

/// Lifecycle state derived from the order's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Nothing claimed yet
    Created,
    /// Some, not all, of the amount claimed
    PartiallyFilled,
    /// Fully claimed by fills
    Filled,
    /// Remainder returned to the sender after expiry
    Refunded,
}

/// Append-only map of fill id to claimed amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartialFills(BTreeMap<FillId, Amount>);

impl PartialFills {
    pub fn contains(&self, fill_id: &FillId) -> bool {
        self.0.contains_key(fill_id)
    }

    /// Records a fill. Returns false, leaving the map untouched, if the id is taken.
    pub(crate) fn insert(&mut self, fill_id: FillId, amount: Amount) -> bool {
        if self.0.contains_key(&fill_id) {
            return false;
        }
        self.0.insert(fill_id, amount);
        true
    }

    pub fn get(&self, fill_id: &FillId) -> Option<Amount> {
        self.0.get(fill_id).copied()
    }

    pub fn total(&self) -> Amount {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FillId, &Amount)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub direction: Direction,
    pub source_asset: Asset,
    pub sender: Address,
    pub receiver: Address,
    pub hashlock: Hashlock,
    pub timelock: Timestamp,
    pub amount: Amount,
    pub total_filled: Amount,
    pub finalized: bool,
    /// Set when the order finalized through a refund
    pub refunded: bool,
    pub partial_fills: PartialFills,
    pub foreign_chain_id: ChainId,
    pub foreign_contract_address: Address,
    /// Route the order was validated against
    pub bridge_id: BridgeId,
    pub created_at: Timestamp,
    /// Preimage published by the first successful fill
    pub revealed_secret: Option<Secret>,
}

impl Order {
    pub(crate) fn new(
        config: OrderConfig,
        sender: Address,
        foreign_chain_id: ChainId,
        foreign_contract_address: Address,
        bridge_id: BridgeId,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: config.id,
            direction: config.direction,
            source_asset: config.source_asset,
            sender,
            receiver: config.receiver,
            hashlock: config.hashlock,
            timelock: config.timelock,
            amount: config.amount,
            total_filled: 0,
            finalized: false,
            refunded: false,
            partial_fills: PartialFills::default(),
            foreign_chain_id,
            foreign_contract_address,
            bridge_id,
            created_at,
            revealed_secret: None,
        }
    }

    /// Amount still escrowed for this order.
    pub fn remaining(&self) -> Amount {
        self.amount - self.total_filled
    }

    pub fn status(&self) -> OrderStatus {
        if self.refunded {
            OrderStatus::Refunded
        } else if self.finalized {
            OrderStatus::Filled
        } else if self.total_filled > 0 {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Created
        }
    }

    /// Open orders accept fills before the timelock and a refund after it.
    pub fn is_open(&self) -> bool {
        !self.finalized
    }
}
