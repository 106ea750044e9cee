//! Instruction definitions
//!
//! The closed set of messages the engine accepts, the signed envelope that
//! carries them, and the event each one emits on success.

use serde::{Deserialize, Serialize};

use crate::engine::OrderConfig;
use crate::hashlock::{Hashlock, Secret};
use crate::ledger::TxRef;
use crate::registry::{Bridge, BridgeRegistration, BridgeUpdate};
use crate::types::{Address, Amount, BridgeId, ChainId, FillId, OrderId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    /// Escrow funds under a hashlock/timelock for a registered route.
    ///
    /// Authorization: sender funds the escrow; `FromForeign` orders also
    /// require a whitelisted sender.
    CreateOrder {
        order: OrderConfig,
        foreign_chain_id: ChainId,
        foreign_contract_address: Address,
        #[serde(default)]
        custom_payload: Option<String>,
    },

    /// Claim (`GetFund`) by revealing the secret.
    ///
    /// Authorization: per `FillAuthorization`.
    Fill {
        order_id: OrderId,
        secret: Secret,
        #[serde(default)]
        fill_id: Option<FillId>,
        /// Requested amount; the full remainder when omitted
        #[serde(default)]
        amount: Option<Amount>,
        #[serde(default)]
        custom_payload: Option<String>,
    },

    /// Return the unclaimed remainder to the sender after the timelock.
    ///
    /// Authorization: anyone.
    Refund { order_id: OrderId },

    /// Authorization: owner.
    RegisterBridge(BridgeRegistration),

    /// Authorization: owner.
    UpdateBridge {
        bridge_id: BridgeId,
        #[serde(default)]
        update: BridgeUpdate,
    },

    /// Authorization: owner.
    SetWhitelist { resolver: Address, enabled: bool },

    /// Authorization: owner.
    TransferOwnership { new_owner: Address },
}

impl Instruction {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::CreateOrder { .. } => "CreateOrder",
            Instruction::Fill { .. } => "Fill",
            Instruction::Refund { .. } => "Refund",
            Instruction::RegisterBridge(_) => "RegisterBridge",
            Instruction::UpdateBridge { .. } => "UpdateBridge",
            Instruction::SetWhitelist { .. } => "SetWhitelist",
            Instruction::TransferOwnership { .. } => "TransferOwnership",
        }
    }
}

/// An instruction together with its authenticated sender.
///
/// The engine trusts `sender` as given. Over HTTP the envelope arrives
/// wrapped in an `auth::SignedEnvelope` and is verified before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender: Address,
    pub instruction: Instruction,
}

impl Envelope {
    pub fn new(sender: impl Into<Address>, instruction: Instruction) -> Self {
        Self {
            sender: sender.into(),
            instruction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    OrderCreated {
        order_id: OrderId,
        sender: Address,
        amount: Amount,
        hashlock: Hashlock,
        timelock: Timestamp,
        foreign_chain_id: ChainId,
        bridge_id: BridgeId,
        bridge_fee: Amount,
    },
    OrderFilled {
        order_id: OrderId,
        fill_id: FillId,
        amount: Amount,
        total_filled: Amount,
        finalized: bool,
        receiver: Address,
        /// Revealed preimage, for the counterpart leg's relay
        secret: Secret,
        tx: TxRef,
    },
    OrderRefunded {
        order_id: OrderId,
        amount: Amount,
        sender: Address,
        tx: TxRef,
    },
    BridgeRegistered { bridge: Bridge },
    BridgeUpdated { bridge: Bridge },
    WhitelistUpdated { resolver: Address, enabled: bool },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

impl Event {
    /// Order the event concerns, if any.
    pub fn order_id(&self) -> Option<OrderId> {
        match self {
            Event::OrderCreated { order_id, .. }
            | Event::OrderFilled { order_id, .. }
            | Event::OrderRefunded { order_id, .. } => Some(*order_id),
            _ => None,
        }
    }
}
