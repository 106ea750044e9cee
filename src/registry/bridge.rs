//! Bridge Registry
//!
//! Owner-controlled table of cross-chain routes. Order creation consults it to
//! reject unsupported target chains and amounts outside a route's bounds.
//! Bridges are never deleted; they are deactivated through `is_active`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::HtlcError;
use crate::types::{Address, Amount, BridgeId, ChainId};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// A registered route between two chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub bridge_id: BridgeId,
    pub source_chain_id: ChainId,
    pub target_chain_id: ChainId,
    /// Bridge contract on the target chain
    pub bridge_contract_address: Address,
    pub bridge_fee: Amount,
    pub min_transfer_amount: Amount,
    pub max_transfer_amount: Amount,
    pub is_active: bool,
}

impl Bridge {
    /// Whether `amount` lies inside this route's transfer bounds (inclusive).
    pub fn accepts(&self, amount: Amount) -> bool {
        self.min_transfer_amount <= amount && amount <= self.max_transfer_amount
    }
}

/// Parameters of `RegisterBridge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeRegistration {
    pub bridge_id: BridgeId,
    pub source_chain_id: ChainId,
    pub target_chain_id: ChainId,
    pub bridge_contract_address: Address,
    pub bridge_fee: Amount,
    pub min_transfer_amount: Amount,
    pub max_transfer_amount: Amount,
}

/// Partial update of `UpdateBridge`; only supplied fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeUpdate {
    #[serde(default)]
    pub bridge_fee: Option<Amount>,
    #[serde(default)]
    pub min_transfer_amount: Option<Amount>,
    #[serde(default)]
    pub max_transfer_amount: Option<Amount>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

// ============================================================================
// REGISTRY
// ============================================================================

#[derive(Debug, Clone)]
pub struct BridgeRegistry {
    owner: Address,
    bridges: BTreeMap<BridgeId, Bridge>,
}

impl BridgeRegistry {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            bridges: BTreeMap::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Address) {
        self.owner = owner;
    }

    fn ensure_owner(&self, caller: &Address) -> Result<(), HtlcError> {
        if *caller != self.owner {
            warn!("Bridge registry: rejected call from non-owner {}", caller);
            return Err(HtlcError::Unauthorized);
        }
        Ok(())
    }

    /// Registers a new bridge route, active on creation.
    pub fn register(
        &mut self,
        caller: &Address,
        params: BridgeRegistration,
    ) -> Result<&Bridge, HtlcError> {
        self.ensure_owner(caller)?;

        if params.min_transfer_amount > params.max_transfer_amount {
            return Err(HtlcError::InvalidBounds {
                min: params.min_transfer_amount,
                max: params.max_transfer_amount,
            });
        }
        if self.bridges.contains_key(&params.bridge_id) {
            return Err(HtlcError::DuplicateBridge(params.bridge_id));
        }

        let bridge = Bridge {
            bridge_id: params.bridge_id,
            source_chain_id: params.source_chain_id,
            target_chain_id: params.target_chain_id,
            bridge_contract_address: params.bridge_contract_address,
            bridge_fee: params.bridge_fee,
            min_transfer_amount: params.min_transfer_amount,
            max_transfer_amount: params.max_transfer_amount,
            is_active: true,
        };
        info!(
            "Registered bridge {}: chain {} -> {} (bounds {}..={}, fee {})",
            bridge.bridge_id,
            bridge.source_chain_id,
            bridge.target_chain_id,
            bridge.min_transfer_amount,
            bridge.max_transfer_amount,
            bridge.bridge_fee
        );
        Ok(self.bridges.entry(params.bridge_id).or_insert(bridge))
    }

    /// Applies a partial update. Bounds are re-validated after the merge and
    /// nothing changes if they end up inverted.
    pub fn update(
        &mut self,
        caller: &Address,
        bridge_id: BridgeId,
        update: BridgeUpdate,
    ) -> Result<&Bridge, HtlcError> {
        self.ensure_owner(caller)?;

        let current = self
            .bridges
            .get(&bridge_id)
            .ok_or(HtlcError::BridgeNotFound(bridge_id))?;

        let mut merged = current.clone();
        if let Some(fee) = update.bridge_fee {
            merged.bridge_fee = fee;
        }
        if let Some(min) = update.min_transfer_amount {
            merged.min_transfer_amount = min;
        }
        if let Some(max) = update.max_transfer_amount {
            merged.max_transfer_amount = max;
        }
        if let Some(active) = update.is_active {
            merged.is_active = active;
        }

        if merged.min_transfer_amount > merged.max_transfer_amount {
            return Err(HtlcError::InvalidBounds {
                min: merged.min_transfer_amount,
                max: merged.max_transfer_amount,
            });
        }

        info!(
            "Updated bridge {}: bounds {}..={}, fee {}, active {}",
            bridge_id,
            merged.min_transfer_amount,
            merged.max_transfer_amount,
            merged.bridge_fee,
            merged.is_active
        );
        let slot = self
            .bridges
            .get_mut(&bridge_id)
            .ok_or(HtlcError::BridgeNotFound(bridge_id))?;
        *slot = merged;
        Ok(slot)
    }

    /// Finds the active bridge serving `target_chain_id`.
    ///
    /// When several active routes target the same chain, the lowest bridge id wins.
    pub fn resolve_route(&self, target_chain_id: ChainId) -> Result<&Bridge, HtlcError> {
        self.bridges
            .values()
            .find(|b| b.is_active && b.target_chain_id == target_chain_id)
            .ok_or(HtlcError::InvalidChainId(target_chain_id))
    }

    /// Finds the active bridge for an exact `(source, target)` pair.
    pub fn resolve_pair(
        &self,
        source_chain_id: ChainId,
        target_chain_id: ChainId,
    ) -> Result<&Bridge, HtlcError> {
        self.bridges
            .values()
            .find(|b| {
                b.is_active
                    && b.source_chain_id == source_chain_id
                    && b.target_chain_id == target_chain_id
            })
            .ok_or(HtlcError::InvalidChainId(target_chain_id))
    }

    pub fn get(&self, bridge_id: BridgeId) -> Option<&Bridge> {
        self.bridges.get(&bridge_id)
    }

    pub fn all(&self) -> impl Iterator<Item = &Bridge> {
        self.bridges.values()
    }

    pub fn len(&self) -> usize {
        self.bridges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}
