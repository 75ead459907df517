//! Token custody seam.
//!
//! The treasury never assumes a concrete token implementation; it moves
//! funds through the `TokenLedger` trait so production deployments can
//! bind real bridge-backed ledgers while tests run against the
//! in-memory one. Symbol bindings are immutable once registered.

use crate::access::Address;
use crate::errors::{CasinoError, CasinoResult};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Insufficient balance for '{account}': need {needed}, have {available}")]
    InsufficientBalance {
        account: Address,
        needed: u64,
        available: u64,
    },

    #[error("Allowance from '{owner}' to '{spender}' too low: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        needed: u64,
        available: u64,
    },
}

/// Fungible-token ledger interface.
///
/// `transfer_from` follows the approval model: the spender may move
/// funds out of `from` only up to the standing allowance, which is
/// reduced by the amount moved.
pub trait TokenLedger: Send {
    fn symbol(&self) -> &str;
    fn total_supply(&self) -> u64;
    fn balance_of(&self, account: &Address) -> u64;
    fn allowance(&self, owner: &Address, spender: &Address) -> u64;
    fn approve(&mut self, owner: &Address, spender: &Address, amount: u64);
    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), TokenError>;
    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError>;
}

/// Simple in-memory token ledger.
#[derive(Debug, Default)]
pub struct MemoryToken {
    symbol: String,
    total_supply: u64,
    balances: HashMap<Address, u64>,
    allowances: HashMap<(Address, Address), u64>,
}

impl MemoryToken {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }

    /// Creates new supply in `to`'s balance.
    pub fn mint(&mut self, to: &Address, amount: u64) {
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        self.total_supply += amount;
    }
}

impl TokenLedger for MemoryToken {
    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn total_supply(&self) -> u64 {
        self.total_supply
    }

    fn balance_of(&self, account: &Address) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.allowances
            .get(&(owner.clone(), spender.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: u64) {
        self.allowances
            .insert((owner.clone(), spender.clone()), amount);
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: u64) -> Result<(), TokenError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from.clone(),
                needed: amount,
                available,
            });
        }
        *self.balances.entry(from.clone()).or_insert(0) -= amount;
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        let allowed = self.allowance(from, spender);
        if allowed < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from.clone(),
                spender: spender.clone(),
                needed: amount,
                available: allowed,
            });
        }
        self.transfer(from, to, amount)?;
        self.allowances
            .insert((from.clone(), spender.clone()), allowed - amount);
        Ok(())
    }
}

/// Shared handle to a token ledger.
///
/// Treasuries on both sides of a migration hold handles to the same
/// underlying ledger, so custody moves are visible to both.
#[derive(Clone)]
pub struct TokenHandle {
    inner: Arc<Mutex<dyn TokenLedger + Send>>,
}

impl TokenHandle {
    pub fn new<T: TokenLedger + 'static>(ledger: T) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, dyn TokenLedger + Send + 'static> {
        // A poisoned ledger lock still holds consistent balance state;
        // the writer that panicked never got to observe its own update.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn symbol(&self) -> String {
        self.lock().symbol().to_string()
    }

    pub fn total_supply(&self) -> u64 {
        self.lock().total_supply()
    }

    pub fn balance_of(&self, account: &Address) -> u64 {
        self.lock().balance_of(account)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u64 {
        self.lock().allowance(owner, spender)
    }

    pub fn approve(&self, owner: &Address, spender: &Address, amount: u64) {
        self.lock().approve(owner, spender, amount)
    }

    pub fn transfer(&self, from: &Address, to: &Address, amount: u64) -> Result<(), TokenError> {
        self.lock().transfer(from, to, amount)
    }

    pub fn transfer_from(
        &self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: u64,
    ) -> Result<(), TokenError> {
        self.lock().transfer_from(spender, from, to, amount)
    }
}

impl std::fmt::Debug for TokenHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHandle")
            .field("symbol", &self.symbol())
            .finish()
    }
}

/// Symbol-keyed registry of token handles.
///
/// A symbol can be bound exactly once. Iteration order is the sorted
/// symbol order, which keeps migration sweeps deterministic.
#[derive(Clone, Debug, Default)]
pub struct TokenRegistry {
    by_symbol: BTreeMap<String, TokenHandle>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, symbol: impl Into<String>, handle: TokenHandle) -> CasinoResult<()> {
        let symbol = symbol.into();
        if self.by_symbol.contains_key(&symbol) {
            return Err(CasinoError::DuplicateToken(symbol));
        }
        self.by_symbol.insert(symbol, handle);
        Ok(())
    }

    pub fn get(&self, symbol: &str) -> CasinoResult<&TokenHandle> {
        self.by_symbol
            .get(symbol)
            .ok_or_else(|| CasinoError::UnknownToken(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.by_symbol.contains_key(symbol)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.by_symbol.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TokenHandle)> {
        self.by_symbol.iter().map(|(s, h)| (s.as_str(), h))
    }
}
