//! Registries gating order creation and fills
//!
//! - `bridge`: cross-chain routes with fee and transfer bounds
//! - `whitelist`: resolver addresses allowed to service orders

pub mod bridge;
pub mod whitelist;

pub use bridge::{Bridge, BridgeRegistration, BridgeRegistry, BridgeUpdate};
pub use whitelist::ResolverWhitelist;
