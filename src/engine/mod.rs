//! Order Engine
//!
//! The HTLC state machine. Orders move `Created -> PartiallyFilled* -> Filled`
//! or `Created -> PartiallyFilled* -> Refunded`; `finalized` makes the two
//! terminal paths mutually exclusive.
//!
//! Every mutating operation checks all of its guards against current state,
//! then calls the ledger, and only mutates state once the ledger call has
//! committed. A failed escrow or payout therefore leaves the order untouched.

mod order;
mod policy;

pub use order::{Order, OrderConfig, OrderStatus, PartialFills};
pub use policy::{EnginePolicy, FillAuthorization, FillPolicy};

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::HtlcError;
use crate::hashlock::{self, Secret};
use crate::instruction::{Envelope, Event, Instruction};
use crate::ledger::{LedgerAdapter, TxRef};
use crate::registry::{Bridge, BridgeRegistration, BridgeRegistry, BridgeUpdate, ResolverWhitelist};
use crate::types::{Address, Amount, BridgeId, ChainId, Direction, FillId, OrderId};

// ============================================================================
// OPERATION RESULTS
// ============================================================================

/// Result of a successful fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillReceipt {
    pub fill_id: FillId,
    /// Amount paid to the receiver by this fill
    pub amount: Amount,
    pub total_filled: Amount,
    pub finalized: bool,
    pub tx: TxRef,
}

/// Result of a successful refund.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundReceipt {
    pub amount: Amount,
    pub tx: TxRef,
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct OrderEngine<L: LedgerAdapter> {
    ledger: L,
    policy: EnginePolicy,
    bridges: BridgeRegistry,
    whitelist: ResolverWhitelist,
    orders: BTreeMap<OrderId, Order>,
}

impl<L: LedgerAdapter> OrderEngine<L> {
    /// Creates an engine administered by `owner`.
    pub fn new(owner: Address, policy: EnginePolicy, ledger: L) -> Self {
        info!(
            "Order engine initialized (owner {}, fill policy {:?}, fill authorization {:?})",
            owner, policy.fill_policy, policy.fill_authorization
        );
        Self {
            ledger,
            policy,
            bridges: BridgeRegistry::new(owner.clone()),
            whitelist: ResolverWhitelist::new(owner),
            orders: BTreeMap::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------------

    /// Applies one instruction as a single step.
    pub fn apply(&mut self, envelope: Envelope) -> Result<Event, HtlcError> {
        let Envelope { sender, instruction } = envelope;
        let name = instruction.name();

        let result = match instruction {
            Instruction::CreateOrder {
                order,
                foreign_chain_id,
                foreign_contract_address,
                custom_payload: _,
            } => self.create_order(&sender, order, foreign_chain_id, foreign_contract_address),
            Instruction::Fill {
                order_id,
                secret,
                fill_id,
                amount,
                custom_payload: _,
            } => self.fill(&sender, order_id, fill_id, &secret, amount),
            Instruction::Refund { order_id } => self.refund(order_id),
            Instruction::RegisterBridge(params) => self
                .register_bridge(&sender, params)
                .map(|bridge| Event::BridgeRegistered { bridge }),
            Instruction::UpdateBridge { bridge_id, update } => self
                .update_bridge(&sender, bridge_id, update)
                .map(|bridge| Event::BridgeUpdated { bridge }),
            Instruction::SetWhitelist { resolver, enabled } => self
                .set_whitelist(&sender, resolver.clone(), enabled)
                .map(|()| Event::WhitelistUpdated { resolver, enabled }),
            Instruction::TransferOwnership { new_owner } => {
                self.transfer_ownership(&sender, new_owner)
            }
        };

        if let Err(e) = &result {
            warn!("{} from {} rejected (code {}): {}", name, sender, e.code(), e);
        }
        result
    }

    // ------------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------------

    /// Validates and escrows a new order.
    pub fn create_order(
        &mut self,
        sender: &Address,
        config: OrderConfig,
        foreign_chain_id: ChainId,
        foreign_contract_address: Address,
    ) -> Result<Event, HtlcError> {
        let now = self.ledger.now();

        if config.amount == 0 {
            return Err(HtlcError::InvalidAmount(config.amount));
        }
        if config.timelock <= now {
            return Err(HtlcError::InvalidTimelock {
                timelock: config.timelock,
                now,
            });
        }

        let bridge = self.bridges.resolve_route(foreign_chain_id)?;
        if !bridge.accepts(config.amount) {
            return Err(HtlcError::InvalidAmount(config.amount));
        }
        let (bridge_id, bridge_fee) = (bridge.bridge_id, bridge.bridge_fee);

        if config.direction == Direction::FromForeign && !self.whitelist.is_whitelisted(sender) {
            return Err(HtlcError::Unauthorized);
        }
        if self.orders.contains_key(&config.id) {
            return Err(HtlcError::DuplicateOrder(config.id));
        }

        self.ledger
            .escrow(sender, &config.source_asset, config.amount)
            .map_err(HtlcError::EscrowFailed)?;

        let order = Order::new(
            config,
            sender.clone(),
            foreign_chain_id,
            foreign_contract_address,
            bridge_id,
            now,
        );
        info!(
            "Order {} created: {} {} from {} to {}, hashlock {}, timelock {}, bridge {}",
            order.id,
            order.amount,
            order.source_asset,
            order.sender,
            order.receiver,
            order.hashlock,
            order.timelock,
            bridge_id
        );

        let event = Event::OrderCreated {
            order_id: order.id,
            sender: order.sender.clone(),
            amount: order.amount,
            hashlock: order.hashlock,
            timelock: order.timelock,
            foreign_chain_id,
            bridge_id,
            bridge_fee,
        };
        self.orders.insert(order.id, order);
        Ok(event)
    }

    /// Claims funds by revealing the secret (the `GetFund` operation).
    ///
    /// `fill_id` defaults to one derived from the order id and the secret, so a
    /// replay of the same claim fails with `DuplicateFill`.
    pub fn fill(
        &mut self,
        caller: &Address,
        order_id: OrderId,
        fill_id: Option<FillId>,
        secret: &Secret,
        requested: Option<Amount>,
    ) -> Result<Event, HtlcError> {
        let receipt = self.fill_order(caller, order_id, fill_id, secret, requested)?;
        let order = self.order(order_id).ok_or(HtlcError::OrderNotFound(order_id))?;
        Ok(Event::OrderFilled {
            order_id,
            fill_id: receipt.fill_id,
            amount: receipt.amount,
            total_filled: receipt.total_filled,
            finalized: receipt.finalized,
            receiver: order.receiver.clone(),
            secret: secret.clone(),
            tx: receipt.tx,
        })
    }

    /// Same as [`fill`](Self::fill), returning the receipt instead of the event.
    pub fn fill_order(
        &mut self,
        caller: &Address,
        order_id: OrderId,
        fill_id: Option<FillId>,
        secret: &Secret,
        requested: Option<Amount>,
    ) -> Result<FillReceipt, HtlcError> {
        if self.policy.fill_authorization == FillAuthorization::WhitelistedResolver
            && !self.whitelist.is_whitelisted(caller)
        {
            return Err(HtlcError::Unauthorized);
        }

        let now = self.ledger.now();
        let order = self
            .orders
            .get(&order_id)
            .ok_or(HtlcError::OrderNotFound(order_id))?;

        let fill_id = fill_id.unwrap_or_else(|| hashlock::derive_fill_id(order_id, secret.as_bytes()));
        if order.partial_fills.contains(&fill_id) {
            return Err(HtlcError::DuplicateFill {
                order_id,
                fill_id: fill_id.to_hex(),
            });
        }
        if order.finalized {
            return Err(HtlcError::OrderFinalized(order_id));
        }
        if now >= order.timelock {
            return Err(HtlcError::OrderExpired(order_id));
        }
        if !hashlock::verify(secret.as_bytes(), &order.hashlock) {
            return Err(HtlcError::InvalidSecret);
        }

        let remaining = order.remaining();
        let claimed = match (self.policy.fill_policy, requested) {
            (_, Some(0)) => return Err(HtlcError::InvalidAmount(0)),
            (FillPolicy::SingleShot, Some(amount)) if amount != remaining => {
                return Err(HtlcError::InvalidAmount(amount))
            }
            (FillPolicy::SingleShot, _) | (FillPolicy::Partial, None) => remaining,
            (FillPolicy::Partial, Some(amount)) => amount.min(remaining),
        };

        let asset = order.source_asset.clone();
        let receiver = order.receiver.clone();
        let tx = self
            .ledger
            .payout(&asset, claimed, &receiver)
            .map_err(HtlcError::PayoutFailed)?;

        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(HtlcError::OrderNotFound(order_id))?;
        order.partial_fills.insert(fill_id, claimed);
        order.total_filled += claimed;
        order.finalized = order.total_filled == order.amount;
        if order.revealed_secret.is_none() {
            order.revealed_secret = Some(secret.clone());
        }

        info!(
            "Order {} filled: {} to {} under fill {} (total {}/{}, finalized {})",
            order_id, claimed, receiver, fill_id, order.total_filled, order.amount, order.finalized
        );

        Ok(FillReceipt {
            fill_id,
            amount: claimed,
            total_filled: order.total_filled,
            finalized: order.finalized,
            tx,
        })
    }

    /// Returns the unclaimed remainder to the sender once the timelock has passed.
    ///
    /// Anyone may trigger a refund; funds only ever go back to the sender.
    pub fn refund(&mut self, order_id: OrderId) -> Result<Event, HtlcError> {
        let receipt = self.refund_order(order_id)?;
        let order = self.order(order_id).ok_or(HtlcError::OrderNotFound(order_id))?;
        Ok(Event::OrderRefunded {
            order_id,
            amount: receipt.amount,
            sender: order.sender.clone(),
            tx: receipt.tx,
        })
    }

    /// Same as [`refund`](Self::refund), returning the receipt instead of the event.
    pub fn refund_order(&mut self, order_id: OrderId) -> Result<RefundReceipt, HtlcError> {
        let now = self.ledger.now();
        let order = self
            .orders
            .get(&order_id)
            .ok_or(HtlcError::OrderNotFound(order_id))?;

        if order.finalized {
            return Err(HtlcError::OrderFinalized(order_id));
        }
        if now < order.timelock {
            return Err(HtlcError::TimelockNotExpired {
                timelock: order.timelock,
                now,
            });
        }

        let amount = order.remaining();
        let asset = order.source_asset.clone();
        let sender = order.sender.clone();
        let tx = self
            .ledger
            .payout(&asset, amount, &sender)
            .map_err(HtlcError::PayoutFailed)?;

        let order = self
            .orders
            .get_mut(&order_id)
            .ok_or(HtlcError::OrderNotFound(order_id))?;
        order.finalized = true;
        order.refunded = true;

        info!("Order {} refunded: {} returned to {}", order_id, amount, sender);
        Ok(RefundReceipt { amount, tx })
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    /// Registers a new bridge route.
    ///
    /// # Arguments
    ///
    /// * `caller` - Must be the owner
    /// * `params` - Route endpoints, fee and transfer bounds
    ///
    /// # Returns
    ///
    /// * `Ok(Bridge)` - The stored route, active
    /// * `Err(HtlcError)` - `Unauthorized`, `DuplicateBridge` or `InvalidBounds`
    pub fn register_bridge(
        &mut self,
        caller: &Address,
        params: BridgeRegistration,
    ) -> Result<Bridge, HtlcError> {
        self.bridges.register(caller, params).cloned()
    }

    /// Applies the set fields of `update` to an existing route.
    ///
    /// # Arguments
    ///
    /// * `caller` - Must be the owner
    /// * `bridge_id` - Route to change
    /// * `update` - Fields to overwrite; `None` keeps the current value
    ///
    /// # Returns
    ///
    /// * `Ok(Bridge)` - The route after the update
    /// * `Err(HtlcError)` - `Unauthorized`, `BridgeNotFound` or `InvalidBounds`
    pub fn update_bridge(
        &mut self,
        caller: &Address,
        bridge_id: BridgeId,
        update: BridgeUpdate,
    ) -> Result<Bridge, HtlcError> {
        self.bridges.update(caller, bridge_id, update).cloned()
    }

    /// Grants or revokes a resolver's fill rights. Owner only; idempotent.
    pub fn set_whitelist(
        &mut self,
        caller: &Address,
        resolver: Address,
        enabled: bool,
    ) -> Result<(), HtlcError> {
        self.whitelist.set_status(caller, resolver, enabled)
    }

    /// Hands both registries to a new owner.
    ///
    /// # Arguments
    ///
    /// * `caller` - Must be the current owner
    /// * `new_owner` - Address receiving all admin rights
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Event, HtlcError> {
        if caller != self.owner() {
            return Err(HtlcError::Unauthorized);
        }
        let previous_owner = self.owner().clone();
        self.bridges.set_owner(new_owner.clone());
        self.whitelist.set_owner(new_owner.clone());
        info!("Ownership transferred from {} to {}", previous_owner, new_owner);
        Ok(Event::OwnershipTransferred {
            previous_owner,
            new_owner,
        })
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Current admin of the bridge registry and the whitelist.
    pub fn owner(&self) -> &Address {
        self.bridges.owner()
    }

    pub fn policy(&self) -> EnginePolicy {
        self.policy
    }

    pub fn order(&self, order_id: OrderId) -> Option<&Order> {
        self.orders.get(&order_id)
    }

    /// All orders, ascending by id.
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Lifecycle status derived from the order's flags and fill total.
    pub fn order_status(&self, order_id: OrderId) -> Option<OrderStatus> {
        self.orders.get(&order_id).map(Order::status)
    }

    /// Secret published by the first fill of an order.
    pub fn revealed_secret(&self, order_id: OrderId) -> Option<&Secret> {
        self.orders.get(&order_id)?.revealed_secret.as_ref()
    }

    pub fn bridges(&self) -> &BridgeRegistry {
        &self.bridges
    }

    pub fn whitelist(&self) -> &ResolverWhitelist {
        &self.whitelist
    }

    /// Whether `address` may fill under `FillAuthorization::WhitelistedResolver`.
    pub fn is_whitelisted(&self, address: &Address) -> bool {
        self.whitelist.is_whitelisted(address)
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Direct ledger access for hosts and tests (clock, balances).
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }
}
