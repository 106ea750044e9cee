//! HTLC Bridge Library
//!
//! Hash time-locked orders for swaps between a TON-style and an EVM-style
//! ledger. An order escrows funds under a hashlock and a timelock: the
//! receiver's side claims them by revealing the secret before the deadline,
//! otherwise the sender gets the remainder back afterwards. A bridge registry
//! and a resolver whitelist gate which routes and parties the engine serves.

pub mod api;
pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod hashlock;
pub mod instruction;
pub mod ledger;
pub mod registry;
pub mod service;
pub mod types;

// Re-export commonly used types
pub use auth::{AuthError, SignedEnvelope, SignerRegistry};
pub use config::Config;
pub use engine::{EnginePolicy, FillAuthorization, FillPolicy, Order, OrderConfig, OrderEngine, OrderStatus};
pub use error::{HtlcError, LedgerError};
pub use hashlock::{commit, verify, Hashlock, Secret};
pub use instruction::{Envelope, Event, Instruction};
pub use ledger::{InMemoryLedger, LedgerAdapter, TxRef};
pub use registry::{Bridge, BridgeRegistration, BridgeRegistry, BridgeUpdate, ResolverWhitelist};
pub use service::HtlcService;
pub use types::{Address, Amount, Asset, BridgeId, ChainId, Direction, FillId, OrderId, Timestamp};
