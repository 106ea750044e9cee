//! Shared test helpers
//!
//! - **Constants**: addresses, chain ids and the pinned start time
//! - **Engine builders**: engines with a registered route and a whitelisted resolver
//! - **Order builders**: order configs and one-call order creation
//! - **Signing**: deterministic Ed25519 keys per test address

use ed25519_dalek::SigningKey;
use htlc_bridge::auth::public_key_hex;
use htlc_bridge::config::{
    ApiConfig, BalanceConfig, BridgeConfig, Config, EngineConfig, SignerConfig, WhitelistConfig,
};
use htlc_bridge::service::DEFAULT_EVENT_LOG_CAPACITY;
use htlc_bridge::{
    commit, Address, Amount, Asset, BridgeRegistration, Direction, EnginePolicy, Envelope, Event,
    FillAuthorization, FillPolicy, HtlcError, InMemoryLedger, Instruction, OrderConfig,
    OrderEngine, OrderId, Secret, SignedEnvelope, Timestamp,
};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Registry owner
pub const OWNER: &str = "0:0000000000000000000000000000000000000000000000000000000000000001";

/// Whitelisted resolver
pub const RESOLVER: &str = "0:00000000000000000000000000000000000000000000000000000000000000a1";

/// Order sender (maker)
pub const MAKER: &str = "0:00000000000000000000000000000000000000000000000000000000000000b2";

/// Order receiver
pub const TAKER: &str = "0:00000000000000000000000000000000000000000000000000000000000000c3";

/// Address with no privileges
pub const STRANGER: &str = "0:00000000000000000000000000000000000000000000000000000000000000d4";

/// Destination HTLC contract on the EVM side
pub const FOREIGN_CONTRACT: &str = "0x0000000000000000000000000000000000000e05";

/// Bridge contract on the EVM side
pub const BRIDGE_CONTRACT: &str = "0x0000000000000000000000000000000000000b01";

/// Chain id of the ledger under test
pub const LOCAL_CHAIN_ID: u64 = 607;

/// Supported EVM chain (Sepolia)
pub const EVM_CHAIN_ID: u64 = 11155111;

/// Chain id with no registered route
pub const UNSUPPORTED_CHAIN_ID: u64 = 999999;

pub const BRIDGE_ID: u64 = 1;
pub const BRIDGE_MIN: Amount = 10;
pub const BRIDGE_MAX: Amount = 10_000;
pub const BRIDGE_FEE: Amount = 3;

/// Pinned ledger time at the start of every test
pub const T: Timestamp = 1_700_000_000;

/// Default timelock offset
pub const HOUR: u64 = 3600;

/// Starting balance of the maker and the resolver
pub const INITIAL_BALANCE: Amount = 1_000_000;

pub const SECRET: &str = "s";

// ============================================================================
// ENGINE BUILDERS
// ============================================================================

pub fn addr(s: &str) -> Address {
    Address::from(s)
}

pub fn bridge_registration(bridge_id: u64, target_chain_id: u64) -> BridgeRegistration {
    BridgeRegistration {
        bridge_id,
        source_chain_id: LOCAL_CHAIN_ID,
        target_chain_id,
        bridge_contract_address: addr(BRIDGE_CONTRACT),
        bridge_fee: BRIDGE_FEE,
        min_transfer_amount: BRIDGE_MIN,
        max_transfer_amount: BRIDGE_MAX,
    }
}

/// Engine at time `T` with funded maker and resolver, one active route to
/// `EVM_CHAIN_ID`, and `RESOLVER` whitelisted.
pub fn test_engine_with_policy(policy: EnginePolicy) -> OrderEngine<InMemoryLedger> {
    let mut ledger = InMemoryLedger::at(T);
    ledger.credit(&addr(MAKER), &Asset::Native, INITIAL_BALANCE);
    ledger.credit(&addr(RESOLVER), &Asset::Native, INITIAL_BALANCE);

    let owner = addr(OWNER);
    let mut engine = OrderEngine::new(owner.clone(), policy, ledger);
    engine
        .register_bridge(&owner, bridge_registration(BRIDGE_ID, EVM_CHAIN_ID))
        .unwrap();
    engine.set_whitelist(&owner, addr(RESOLVER), true).unwrap();
    engine
}

/// Engine with the default policies (single-shot fills by whitelisted resolvers).
pub fn test_engine() -> OrderEngine<InMemoryLedger> {
    test_engine_with_policy(EnginePolicy::default())
}

pub fn partial_policy() -> EnginePolicy {
    EnginePolicy {
        fill_policy: FillPolicy::Partial,
        fill_authorization: FillAuthorization::WhitelistedResolver,
    }
}

pub fn open_policy() -> EnginePolicy {
    EnginePolicy {
        fill_policy: FillPolicy::SingleShot,
        fill_authorization: FillAuthorization::AnySecretHolder,
    }
}

// ============================================================================
// ORDER BUILDERS
// ============================================================================

pub fn order_config(id: OrderId, amount: Amount, secret: &str, timelock: Timestamp) -> OrderConfig {
    OrderConfig {
        id,
        direction: Direction::ToForeign,
        source_asset: Asset::Native,
        receiver: addr(TAKER),
        hashlock: commit(secret.as_bytes()),
        timelock,
        amount,
    }
}

/// Creates a `ToForeign` order from `MAKER` on the default route.
pub fn create_order(
    engine: &mut OrderEngine<InMemoryLedger>,
    id: OrderId,
    amount: Amount,
    secret: &str,
) -> Result<Event, HtlcError> {
    engine.create_order(
        &addr(MAKER),
        order_config(id, amount, secret, T + HOUR),
        EVM_CHAIN_ID,
        addr(FOREIGN_CONTRACT),
    )
}

pub fn create_order_envelope(id: OrderId, amount: Amount, secret: &str) -> Envelope {
    Envelope::new(
        MAKER,
        Instruction::CreateOrder {
            order: order_config(id, amount, secret, T + HOUR),
            foreign_chain_id: EVM_CHAIN_ID,
            foreign_contract_address: addr(FOREIGN_CONTRACT),
            custom_payload: None,
        },
    )
}

pub fn fill_envelope(sender: &str, order_id: OrderId, secret: &str) -> Envelope {
    Envelope::new(
        sender,
        Instruction::Fill {
            order_id,
            secret: Secret::from(secret),
            fill_id: None,
            amount: None,
            custom_payload: None,
        },
    )
}

pub fn native_balance(engine: &OrderEngine<InMemoryLedger>, who: &str) -> Amount {
    engine.ledger().balance(&addr(who), &Asset::Native)
}

// ============================================================================
// SIGNING
// ============================================================================

/// Deterministic signing key of a test address.
pub fn signing_key(who: &str) -> SigningKey {
    let seed = match who {
        OWNER => 1,
        RESOLVER => 2,
        MAKER => 3,
        TAKER => 4,
        STRANGER => 5,
        _ => 0xee,
    };
    SigningKey::from_bytes(&[seed; 32])
}

/// Signs `envelope` with its sender's key.
pub fn sign(envelope: Envelope) -> SignedEnvelope {
    let key = signing_key(envelope.sender.as_str());
    SignedEnvelope::sign(envelope, &key).unwrap()
}

/// Signs `envelope` with `signer`'s key, whoever the envelope claims as sender.
pub fn sign_as(signer: &str, envelope: Envelope) -> SignedEnvelope {
    SignedEnvelope::sign(envelope, &signing_key(signer)).unwrap()
}

// ============================================================================
// CONFIGURATION BUILDERS
// ============================================================================

/// Config matching `test_engine`: same owner, route, resolver and balances,
/// plus signer keys for every test address except `TAKER`.
pub fn build_test_config() -> Config {
    Config {
        engine: EngineConfig {
            owner: OWNER.to_string(),
            local_chain_id: LOCAL_CHAIN_ID,
            fill_policy: FillPolicy::SingleShot,
            fill_authorization: FillAuthorization::WhitelistedResolver,
        },
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3340,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        },
        bridges: vec![BridgeConfig {
            bridge_id: BRIDGE_ID,
            source_chain_id: None,
            target_chain_id: EVM_CHAIN_ID,
            bridge_contract_address: BRIDGE_CONTRACT.to_string(),
            bridge_fee: BRIDGE_FEE as u64,
            min_transfer_amount: BRIDGE_MIN as u64,
            max_transfer_amount: BRIDGE_MAX as u64,
        }],
        whitelist: WhitelistConfig {
            resolvers: vec![RESOLVER.to_string()],
        },
        // TAKER is left unregistered
        signers: [OWNER, RESOLVER, MAKER, STRANGER]
            .iter()
            .map(|who| SignerConfig {
                address: who.to_string(),
                public_key: public_key_hex(&signing_key(who).verifying_key()),
            })
            .collect(),
        balances: vec![BalanceConfig {
            account: MAKER.to_string(),
            token: None,
            amount: INITIAL_BALANCE as u64,
        }],
    }
}
