//! Configuration Management Module
//!
//! Loads the service configuration from TOML: engine owner and fill policies,
//! API binding, instruction signer keys, and the bridge routes, resolvers and
//! dev balances to bootstrap at start-up.

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::auth::parse_public_key;
use crate::engine::{EnginePolicy, FillAuthorization, FillPolicy};
use crate::types::{Address, Asset};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/htlc.toml";

/// Environment variable overriding the config location.
pub const CONFIG_PATH_ENV: &str = "HTLC_CONFIG_PATH";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    pub api: ApiConfig,
    /// Routes registered by the owner at start-up (use [[bridges]] in TOML)
    #[serde(default)]
    pub bridges: Vec<BridgeConfig>,
    #[serde(default)]
    pub whitelist: WhitelistConfig,
    /// Keys allowed to submit instructions over HTTP (use [[signers]] in TOML)
    #[serde(default)]
    pub signers: Vec<SignerConfig>,
    /// Seed balances for the in-memory ledger (dev only)
    #[serde(default)]
    pub balances: Vec<BalanceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Admin address controlling the registries
    pub owner: String,
    /// Chain id of the ledger this engine runs on
    pub local_chain_id: u64,
    #[serde(default)]
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub fill_authorization: FillAuthorization,
}

impl EngineConfig {
    pub fn owner_address(&self) -> Address {
        Address::new(self.owner.clone())
    }

    pub fn policy(&self) -> EnginePolicy {
        EnginePolicy {
            fill_policy: self.fill_policy,
            fill_authorization: self.fill_authorization,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Most recent events kept for GET /events
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
}

fn default_event_log_capacity() -> usize {
    crate::service::DEFAULT_EVENT_LOG_CAPACITY
}

/// Ed25519 key of an address allowed to submit instructions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignerConfig {
    pub address: String,
    /// Hex public key (32 bytes, optional 0x)
    pub public_key: String,
}

/// Bridge route to register at start-up.
///
/// Amounts are u64 because TOML integers cannot hold the full `Amount` range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub bridge_id: u64,
    /// Defaults to `engine.local_chain_id`
    #[serde(default)]
    pub source_chain_id: Option<u64>,
    pub target_chain_id: u64,
    pub bridge_contract_address: String,
    #[serde(default)]
    pub bridge_fee: u64,
    pub min_transfer_amount: u64,
    pub max_transfer_amount: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhitelistConfig {
    #[serde(default)]
    pub resolvers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceConfig {
    pub account: String,
    /// Token master/contract address; native coin when absent
    #[serde(default)]
    pub token: Option<String>,
    pub amount: u64,
}

impl BalanceConfig {
    pub fn asset(&self) -> Asset {
        match &self.token {
            Some(addr) => Asset::Token(Address::new(addr.clone())),
            None => Asset::Native,
        }
    }
}

// ============================================================================
// CONFIGURATION LOADING
// ============================================================================

impl Config {
    /// Loads configuration from `$HTLC_CONFIG_PATH`, or `config/htlc.toml`.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &str) -> anyhow::Result<Self> {
        if !std::path::Path::new(path).exists() {
            anyhow::bail!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/htlc.template.toml config/htlc.toml\n\
                Then edit config/htlc.toml with your actual values.",
                path
            );
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path))?;
        Self::from_toml(&content).with_context(|| format!("Failed to parse config file '{}'", path))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the engine would refuse at bootstrap.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.engine.owner.trim().is_empty() {
            anyhow::bail!("engine.owner must not be empty");
        }
        for bridge in &self.bridges {
            if bridge.min_transfer_amount > bridge.max_transfer_amount {
                anyhow::bail!(
                    "bridge {}: min_transfer_amount {} exceeds max_transfer_amount {}",
                    bridge.bridge_id,
                    bridge.min_transfer_amount,
                    bridge.max_transfer_amount
                );
            }
        }
        for signer in &self.signers {
            parse_public_key(&signer.public_key)
                .with_context(|| format!("signer {}: invalid public_key", signer.address))?;
        }
        if self.api.event_log_capacity == 0 {
            anyhow::bail!("api.event_log_capacity must be at least 1");
        }
        Ok(())
    }
}

impl Default for Config {
    /// Local development defaults with no bridges registered.
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                owner: "0:0000000000000000000000000000000000000000000000000000000000000001"
                    .to_string(),
                local_chain_id: 607,
                fill_policy: FillPolicy::SingleShot,
                fill_authorization: FillAuthorization::WhitelistedResolver,
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 3340,
                event_log_capacity: default_event_log_capacity(),
            },
            bridges: Vec::new(),
            whitelist: WhitelistConfig::default(),
            signers: Vec::new(),
            balances: Vec::new(),
        }
    }
}
