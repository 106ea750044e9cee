//! Deployment policies for fills
//!
//! Both are fixed when the engine is built and never change at runtime.

use serde::{Deserialize, Serialize};

/// How much a single fill may claim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Every fill claims the full remainder; at most one fill per order.
    #[default]
    SingleShot,
    /// A fill claims `min(requested, remaining)`.
    Partial,
}

/// Who may submit a fill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillAuthorization {
    /// Only whitelisted resolvers.
    #[default]
    WhitelistedResolver,
    /// Anyone presenting the correct secret. Payout still goes to the receiver.
    AnySecretHolder,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnginePolicy {
    #[serde(default)]
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub fill_authorization: FillAuthorization,
}
