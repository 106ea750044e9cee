//! In-memory reference ledger
//!
//! Account balances, an escrow vault per asset, and a clock that is either the
//! system clock or pinned for deterministic runs. Used by the binary in dev
//! mode and by the tests.

use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::{LedgerAdapter, TxRef};
use crate::error::LedgerError;
use crate::types::{Address, Amount, Asset, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    System,
    Fixed(Timestamp),
}

#[derive(Debug, Clone)]
pub struct InMemoryLedger {
    balances: BTreeMap<(Address, Asset), Amount>,
    vault: BTreeMap<Asset, Amount>,
    frozen: BTreeSet<Address>,
    clock: Clock,
    tx_count: u64,
}

impl InMemoryLedger {
    /// Ledger following the system clock.
    pub fn new() -> Self {
        Self {
            balances: BTreeMap::new(),
            vault: BTreeMap::new(),
            frozen: BTreeSet::new(),
            clock: Clock::System,
            tx_count: 0,
        }
    }

    /// Ledger with the clock pinned at `now`.
    pub fn at(now: Timestamp) -> Self {
        Self {
            clock: Clock::Fixed(now),
            ..Self::new()
        }
    }

    /// Pins the clock.
    pub fn set_time(&mut self, now: Timestamp) {
        self.clock = Clock::Fixed(now);
    }

    /// Advances a pinned clock; pins it first if it was following the system clock.
    pub fn advance(&mut self, secs: u64) {
        let now = self.now();
        self.clock = Clock::Fixed(now.saturating_add(secs));
    }

    pub fn credit(&mut self, account: &Address, asset: &Asset, amount: Amount) {
        let slot = self
            .balances
            .entry((account.clone(), asset.clone()))
            .or_insert(0);
        *slot = slot.saturating_add(amount);
    }

    pub fn balance(&self, account: &Address, asset: &Asset) -> Amount {
        self.balances
            .get(&(account.clone(), asset.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// Amount of `asset` currently held in escrow.
    pub fn escrowed(&self, asset: &Asset) -> Amount {
        self.vault.get(asset).copied().unwrap_or(0)
    }

    /// Makes every transfer touching `account` fail until unfrozen.
    pub fn freeze(&mut self, account: &Address) {
        self.frozen.insert(account.clone());
    }

    pub fn unfreeze(&mut self, account: &Address) {
        self.frozen.remove(account);
    }

    fn next_tx_ref(&mut self, asset: &Asset, amount: Amount, to: &Address) -> TxRef {
        self.tx_count += 1;
        let mut hasher = Sha256::new();
        hasher.update(self.tx_count.to_be_bytes());
        hasher.update(asset.to_string().as_bytes());
        hasher.update(amount.to_be_bytes());
        hasher.update(to.as_str().as_bytes());
        TxRef(format!("0x{}", hex::encode(hasher.finalize())))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerAdapter for InMemoryLedger {
    fn escrow(&mut self, from: &Address, asset: &Asset, amount: Amount) -> Result<(), LedgerError> {
        if self.frozen.contains(from) {
            return Err(LedgerError::Rejected(format!("account {} is frozen", from)));
        }
        let available = self.balance(from, asset);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let held = self.escrowed(asset);
        let vault = held.checked_add(amount).ok_or_else(|| {
            LedgerError::Rejected(format!(
                "escrow vault overflow: {} held + {} {}",
                held, amount, asset
            ))
        })?;

        self.balances
            .insert((from.clone(), asset.clone()), available - amount);
        self.vault.insert(asset.clone(), vault);
        debug!("Escrowed {} {} from {}", amount, asset, from);
        Ok(())
    }

    fn payout(&mut self, asset: &Asset, amount: Amount, to: &Address) -> Result<TxRef, LedgerError> {
        if self.frozen.contains(to) {
            return Err(LedgerError::Rejected(format!("account {} is frozen", to)));
        }
        let held = self.escrowed(asset);
        if held < amount {
            return Err(LedgerError::InsufficientBalance {
                available: held,
                required: amount,
            });
        }

        self.vault.insert(asset.clone(), held - amount);
        self.credit(to, asset, amount);
        let tx = self.next_tx_ref(asset, amount, to);
        debug!("Paid out {} {} to {} ({})", amount, asset, to, tx);
        Ok(tx)
    }

    fn now(&self) -> Timestamp {
        match self.clock {
            Clock::Fixed(t) => t,
            Clock::System => chrono::Utc::now().timestamp().max(0) as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escrow_and_payout_move_balances() {
        let alice = Address::from("alice");
        let bob = Address::from("bob");
        let mut ledger = InMemoryLedger::at(100);
        ledger.credit(&alice, &Asset::Native, 50);

        ledger.escrow(&alice, &Asset::Native, 30).unwrap();
        assert_eq!(ledger.balance(&alice, &Asset::Native), 20);
        assert_eq!(ledger.escrowed(&Asset::Native), 30);

        let tx = ledger.payout(&Asset::Native, 30, &bob).unwrap();
        assert!(tx.0.starts_with("0x"));
        assert_eq!(ledger.balance(&bob, &Asset::Native), 30);
        assert_eq!(ledger.escrowed(&Asset::Native), 0);
    }

    #[test]
    fn test_escrow_insufficient_balance_leaves_state() {
        let alice = Address::from("alice");
        let mut ledger = InMemoryLedger::at(0);
        ledger.credit(&alice, &Asset::Native, 5);

        let err = ledger.escrow(&alice, &Asset::Native, 6).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { available: 5, required: 6 });
        assert_eq!(ledger.balance(&alice, &Asset::Native), 5);
        assert_eq!(ledger.escrowed(&Asset::Native), 0);
    }

    #[test]
    fn test_escrow_vault_overflow_rejected() {
        let alice = Address::from("alice");
        let bob = Address::from("bob");
        let mut ledger = InMemoryLedger::at(0);
        ledger.credit(&alice, &Asset::Native, u128::MAX);
        ledger.credit(&bob, &Asset::Native, u128::MAX);
        ledger.escrow(&alice, &Asset::Native, u128::MAX).unwrap();

        let err = ledger.escrow(&bob, &Asset::Native, 1).unwrap_err();

        assert!(matches!(err, LedgerError::Rejected(ref msg) if msg.contains("overflow")));
        assert_eq!(ledger.balance(&bob, &Asset::Native), u128::MAX);
        assert_eq!(ledger.escrowed(&Asset::Native), u128::MAX);
    }

    #[test]
    fn test_pinned_clock_advances() {
        let mut ledger = InMemoryLedger::at(1_000);
        ledger.advance(10);
        assert_eq!(ledger.now(), 1_010);
    }
}
