//! HTLC Service
//!
//! Shares one order engine between request handlers. Each instruction holds
//! the engine's write lock for its whole application, so instructions are
//! applied strictly one after another against current state. Envelopes arriving
//! over HTTP are authenticated against the signer registry first.

mod events;

pub use events::{
    EventLog, EventPage, IndexedEvent, DEFAULT_EVENT_LOG_CAPACITY, DEFAULT_EVENT_PAGE,
    MAX_EVENT_PAGE,
};

use anyhow::Context;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::{AuthError, SignedEnvelope, SignerRegistry};
use crate::config::Config;
use crate::engine::{Order, OrderEngine};
use crate::error::HtlcError;
use crate::hashlock::Secret;
use crate::instruction::{Envelope, Event};
use crate::ledger::{InMemoryLedger, LedgerAdapter};
use crate::registry::{Bridge, BridgeRegistration};
use crate::types::{Address, BridgeId, OrderId};

pub struct HtlcService<L: LedgerAdapter = InMemoryLedger> {
    engine: Arc<RwLock<OrderEngine<L>>>,
    /// Events of successfully applied instructions, in application order
    events: Arc<RwLock<EventLog>>,
    signers: Arc<SignerRegistry>,
}

impl<L: LedgerAdapter> Clone for HtlcService<L> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            events: self.events.clone(),
            signers: self.signers.clone(),
        }
    }
}

impl HtlcService<InMemoryLedger> {
    /// Builds a service on the in-memory ledger and bootstraps it from config:
    /// seed balances, bridge routes, whitelisted resolvers and signer keys.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let owner = config.engine.owner_address();
        let mut ledger = InMemoryLedger::new();
        for balance in &config.balances {
            ledger.credit(
                &Address::new(balance.account.clone()),
                &balance.asset(),
                balance.amount as u128,
            );
        }

        let mut engine = OrderEngine::new(owner.clone(), config.engine.policy(), ledger);

        for bridge in &config.bridges {
            engine
                .register_bridge(
                    &owner,
                    BridgeRegistration {
                        bridge_id: bridge.bridge_id,
                        source_chain_id: bridge
                            .source_chain_id
                            .unwrap_or(config.engine.local_chain_id),
                        target_chain_id: bridge.target_chain_id,
                        bridge_contract_address: Address::new(
                            bridge.bridge_contract_address.clone(),
                        ),
                        bridge_fee: bridge.bridge_fee as u128,
                        min_transfer_amount: bridge.min_transfer_amount as u128,
                        max_transfer_amount: bridge.max_transfer_amount as u128,
                    },
                )
                .with_context(|| format!("Failed to register bridge {}", bridge.bridge_id))?;
        }

        for resolver in &config.whitelist.resolvers {
            engine
                .set_whitelist(&owner, Address::new(resolver.clone()), true)
                .with_context(|| format!("Failed to whitelist resolver {}", resolver))?;
        }

        let mut signers = SignerRegistry::new();
        for signer in &config.signers {
            signers
                .register_hex(Address::new(signer.address.clone()), &signer.public_key)
                .with_context(|| format!("Failed to register signer {}", signer.address))?;
        }

        info!(
            "Service bootstrapped: {} bridge(s), {} resolver(s), {} signer(s)",
            config.bridges.len(),
            config.whitelist.resolvers.len(),
            signers.len()
        );
        Ok(Self::with_event_capacity(engine, config.api.event_log_capacity).with_signers(signers))
    }
}

impl<L: LedgerAdapter> HtlcService<L> {
    /// Service with the default event log capacity and no registered signers.
    pub fn new(engine: OrderEngine<L>) -> Self {
        Self::with_event_capacity(engine, DEFAULT_EVENT_LOG_CAPACITY)
    }

    pub fn with_event_capacity(engine: OrderEngine<L>, capacity: usize) -> Self {
        Self {
            engine: Arc::new(RwLock::new(engine)),
            events: Arc::new(RwLock::new(EventLog::with_capacity(capacity))),
            signers: Arc::new(SignerRegistry::new()),
        }
    }

    /// Replaces the signer registry used by `verify`.
    pub fn with_signers(mut self, signers: SignerRegistry) -> Self {
        self.signers = Arc::new(signers);
        self
    }

    /// Checks the envelope's signature against its sender's registered key.
    pub fn verify(&self, signed: &SignedEnvelope) -> Result<(), AuthError> {
        self.signers.verify(signed)
    }

    /// Applies one instruction under the engine write lock and records its event.
    ///
    /// The sender is trusted as given; callers outside the process go through
    /// `verify` first.
    pub async fn apply(&self, envelope: Envelope) -> Result<Event, HtlcError> {
        let mut engine = self.engine.write().await;
        let event = engine.apply(envelope)?;
        self.events.write().await.push(event.clone());
        Ok(event)
    }

    /// Snapshot of an order; later instructions do not affect the copy.
    pub async fn order(&self, order_id: OrderId) -> Option<Order> {
        self.engine.read().await.order(order_id).cloned()
    }

    pub async fn revealed_secret(&self, order_id: OrderId) -> Option<Secret> {
        self.engine.read().await.revealed_secret(order_id).cloned()
    }

    pub async fn bridge(&self, bridge_id: BridgeId) -> Option<Bridge> {
        self.engine.read().await.bridges().get(bridge_id).cloned()
    }

    /// All registered routes, active or not.
    pub async fn bridges(&self) -> Vec<Bridge> {
        self.engine.read().await.bridges().all().cloned().collect()
    }

    pub async fn is_whitelisted(&self, address: &Address) -> bool {
        self.engine.read().await.is_whitelisted(address)
    }

    pub async fn owner(&self) -> Address {
        self.engine.read().await.owner().clone()
    }

    /// Every retained event, oldest first.
    pub async fn events(&self) -> Vec<Event> {
        self.events.read().await.iter().cloned().collect()
    }

    /// Up to `limit` retained events starting at index `since`.
    pub async fn events_page(&self, since: u64, limit: usize) -> EventPage {
        self.events.read().await.page(since, limit)
    }

    /// Runs `f` against the ledger under the engine write lock.
    pub async fn with_ledger<R>(&self, f: impl FnOnce(&mut L) -> R) -> R {
        let mut engine = self.engine.write().await;
        f(engine.ledger_mut())
    }
}
