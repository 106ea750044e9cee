//! Resolver Whitelist
//!
//! Owner-controlled set of resolver addresses. Unknown addresses are not
//! whitelisted.

use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::error::HtlcError;
use crate::types::Address;

#[derive(Debug, Clone)]
pub struct ResolverWhitelist {
    owner: Address,
    entries: BTreeMap<Address, bool>,
}

impl ResolverWhitelist {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn set_owner(&mut self, owner: Address) {
        self.owner = owner;
    }

    /// Sets the whitelist status of `resolver`, overwriting any prior status.
    pub fn set_status(
        &mut self,
        caller: &Address,
        resolver: Address,
        enabled: bool,
    ) -> Result<(), HtlcError> {
        if *caller != self.owner {
            warn!("Whitelist: rejected call from non-owner {}", caller);
            return Err(HtlcError::Unauthorized);
        }
        info!("Whitelist: {} -> {}", resolver, enabled);
        self.entries.insert(resolver, enabled);
        Ok(())
    }

    pub fn is_whitelisted(&self, address: &Address) -> bool {
        self.entries.get(address).copied().unwrap_or(false)
    }

    /// Number of recorded entries, enabled or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Addresses currently whitelisted.
    pub fn enabled(&self) -> impl Iterator<Item = &Address> {
        self.entries
            .iter()
            .filter_map(|(addr, enabled)| enabled.then_some(addr))
    }
}
