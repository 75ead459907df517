//! The treasury ledger.
//!
//! Custodies tokens on behalf of every registered game and tracks how
//! much of its token balance is allocated to each `(game, token)` pair.
//! The treasury is a pure ledger: access control and event emission
//! belong to the orchestrator that owns it.

use crate::access::Address;
use crate::errors::{CasinoError, CasinoResult};
use crate::token::{TokenHandle, TokenRegistry};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A registered game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: u64,
    pub name: String,
    pub enabled: bool,
}

/// Per-(game, token) bookkeeping.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct GameBalance {
    /// Funds earmarked for this game's payouts.
    pub allocated: u64,
    /// Largest single bet the game accepts. Zero means not configured,
    /// which rejects every bet.
    pub maximum_bet: u64,
}

/// What a migration moved, per token symbol.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MigrationReport {
    pub moved: Vec<(String, u64)>,
    pub games: usize,
}

#[derive(Clone, Debug)]
pub struct Treasury {
    /// Custody identity on the token ledgers.
    address: Address,
    tokens: TokenRegistry,
    games: BTreeMap<u64, GameRecord>,
    next_game_id: u64,
    balances: HashMap<(u64, String), GameBalance>,
}

impl Treasury {
    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
            tokens: TokenRegistry::new(),
            games: BTreeMap::new(),
            next_game_id: 0,
            balances: HashMap::new(),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn register_token(
        &mut self,
        symbol: impl Into<String>,
        handle: TokenHandle,
    ) -> CasinoResult<()> {
        self.tokens.register(symbol, handle)
    }

    pub fn token(&self, symbol: &str) -> CasinoResult<&TokenHandle> {
        self.tokens.get(symbol)
    }

    pub fn token_symbols(&self) -> Vec<String> {
        self.tokens.symbols().map(str::to_string).collect()
    }

    /// Registers a game and returns its id. Ids are dense and count up
    /// from zero; names are unique. The maximum bet applies across
    /// every registered token ledger.
    pub fn add_game(
        &mut self,
        name: impl Into<String>,
        maximum_bet: u64,
        enabled: bool,
    ) -> CasinoResult<u64> {
        let name = name.into();
        if self.games.values().any(|g| g.name == name) {
            return Err(CasinoError::DuplicateGame(name));
        }
        let id = self.next_game_id;
        self.next_game_id += 1;
        self.games.insert(id, GameRecord { id, name, enabled });
        if maximum_bet > 0 {
            for symbol in self.token_symbols() {
                self.balance_mut(id, &symbol).maximum_bet = maximum_bet;
            }
        }
        Ok(id)
    }

    pub fn game(&self, game_id: u64) -> CasinoResult<&GameRecord> {
        self.games
            .get(&game_id)
            .ok_or(CasinoError::UnknownGame(game_id))
    }

    pub fn games(&self) -> impl Iterator<Item = &GameRecord> {
        self.games.values()
    }

    pub fn set_enabled(&mut self, game_id: u64, enabled: bool) -> CasinoResult<()> {
        let game = self
            .games
            .get_mut(&game_id)
            .ok_or(CasinoError::UnknownGame(game_id))?;
        game.enabled = enabled;
        Ok(())
    }

    /// The game must exist, be enabled, and the token must be known.
    pub fn require_playable(&self, game_id: u64, symbol: &str) -> CasinoResult<()> {
        let game = self.game(game_id)?;
        if !game.enabled {
            return Err(CasinoError::GameDisabled(game_id));
        }
        self.tokens.get(symbol)?;
        Ok(())
    }

    pub fn balance(&self, game_id: u64, symbol: &str) -> GameBalance {
        self.balances
            .get(&(game_id, symbol.to_string()))
            .copied()
            .unwrap_or_default()
    }

    fn balance_mut(&mut self, game_id: u64, symbol: &str) -> &mut GameBalance {
        self.balances
            .entry((game_id, symbol.to_string()))
            .or_default()
    }

    pub fn set_maximum_bet(
        &mut self,
        game_id: u64,
        symbol: &str,
        maximum_bet: u64,
    ) -> CasinoResult<()> {
        self.game(game_id)?;
        self.tokens.get(symbol)?;
        self.balance_mut(game_id, symbol).maximum_bet = maximum_bet;
        Ok(())
    }

    /// Pulls `amount` from the funder's wallet (against a standing
    /// allowance) and allocates it to the game. Returns the new
    /// allocation.
    pub fn add_funds(
        &mut self,
        funder: &Address,
        game_id: u64,
        symbol: &str,
        amount: u64,
    ) -> CasinoResult<u64> {
        if amount == 0 {
            return Err(CasinoError::ZeroAmount);
        }
        self.game(game_id)?;
        let treasury = self.address.clone();
        self.tokens
            .get(symbol)?
            .transfer_from(&treasury, funder, &treasury, amount)?;
        let balance = self.balance_mut(game_id, symbol);
        balance.allocated += amount;
        Ok(balance.allocated)
    }

    /// Deallocates `amount` from the game and pays it to `to`.
    pub fn withdraw(
        &mut self,
        to: &Address,
        game_id: u64,
        symbol: &str,
        amount: u64,
    ) -> CasinoResult<u64> {
        if amount == 0 {
            return Err(CasinoError::ZeroAmount);
        }
        self.game(game_id)?;
        let allocated = self.balance(game_id, symbol).allocated;
        if allocated < amount {
            return Err(CasinoError::InsufficientFunds {
                needed: amount,
                available: allocated,
            });
        }
        let treasury = self.address.clone();
        self.tokens.get(symbol)?.transfer(&treasury, to, amount)?;
        let balance = self.balance_mut(game_id, symbol);
        balance.allocated -= amount;
        Ok(balance.allocated)
    }

    /// Zeroes every game's allocation for `symbol` and sweeps the
    /// treasury's entire token balance (allocated and dust alike) to
    /// `to`. Returns the swept amount and the ids of games touched.
    pub fn withdraw_max(&mut self, to: &Address, symbol: &str) -> CasinoResult<(u64, Vec<u64>)> {
        let token = self.tokens.get(symbol)?.clone();
        let total = token.balance_of(&self.address);
        if total > 0 {
            token.transfer(&self.address, to, total)?;
        }
        let mut zeroed = Vec::new();
        for ((game_id, sym), balance) in self.balances.iter_mut() {
            if sym == symbol && balance.allocated > 0 {
                balance.allocated = 0;
                zeroed.push(*game_id);
            }
        }
        zeroed.sort_unstable();
        Ok((total, zeroed))
    }

    /// Applies a settlement delta: stake collected in, payout owed
    /// out. Fails without mutating if the payout cannot be covered.
    pub fn settle(
        &mut self,
        game_id: u64,
        symbol: &str,
        stake: u64,
        payout: u64,
    ) -> CasinoResult<u64> {
        self.game(game_id)?;
        let allocated = self.balance(game_id, symbol).allocated;
        if allocated + stake < payout {
            return Err(CasinoError::InsufficientFunds {
                needed: payout,
                available: allocated + stake,
            });
        }
        let balance = self.balance_mut(game_id, symbol);
        balance.allocated = balance.allocated + stake - payout;
        Ok(balance.allocated)
    }

    /// Moves a player's stake into custody. Allocation is unchanged;
    /// `settle` accounts for it.
    pub fn collect(&mut self, from: &Address, symbol: &str, amount: u64) -> CasinoResult<()> {
        let treasury = self.address.clone();
        self.tokens
            .get(symbol)?
            .transfer_from(&treasury, from, &treasury, amount)?;
        Ok(())
    }

    /// Pays custody funds out to a wallet.
    pub fn pay_out(&mut self, to: &Address, symbol: &str, amount: u64) -> CasinoResult<()> {
        let treasury = self.address.clone();
        self.tokens.get(symbol)?.transfer(&treasury, to, amount)?;
        Ok(())
    }

    /// One-shot migration into a successor treasury.
    ///
    /// The destination must share ledgers for every source symbol and
    /// must not have games of its own yet. Preconditions are checked
    /// before anything moves; afterwards the source ledger is zeroed.
    pub fn migrate_into(&mut self, target: &mut Treasury) -> CasinoResult<MigrationReport> {
        if target.next_game_id != 0 {
            return Err(CasinoError::MigrationRejected(
                "destination treasury already has game registrations".to_string(),
            ));
        }
        for symbol in self.tokens.symbols() {
            if !target.tokens.contains(symbol) {
                return Err(CasinoError::MigrationRejected(format!(
                    "destination treasury has no '{}' ledger",
                    symbol
                )));
            }
        }

        let mut moved = Vec::new();
        for (symbol, token) in self.tokens.iter() {
            let amount = token.balance_of(&self.address);
            if amount > 0 {
                token.transfer(&self.address, &target.address, amount)?;
            }
            moved.push((symbol.to_string(), amount));
        }

        target.games = std::mem::take(&mut self.games);
        target.next_game_id = self.next_game_id;
        target.balances = std::mem::take(&mut self.balances);
        let games = target.games.len();

        Ok(MigrationReport { moved, games })
    }
}
