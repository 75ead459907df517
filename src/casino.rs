//! Settlement orchestrator.
//!
//! `Casino` ties the treasury ledger, the hash-chain commitment, the
//! game modules and the loyalty pointer together behind one serialized
//! entry point per operation. Every play is all-or-nothing: validation
//! and the outcome computation happen before any funds move, and the
//! only fallible step after that point (stake collection) rolls back
//! on failure.

use crate::access::{AccessControl, Address, Role};
use crate::errors::{CasinoError, CasinoResult};
use crate::events::{CasinoEvent, EventLog};
use crate::games::{GameModule, PlayContext};
use crate::hash_chain::{derive_seed, Digest32, HashChain};
use crate::pointer::Pointer;
use crate::token::TokenHandle;
use crate::treasury::{MigrationReport, Treasury};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One-shot play submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayRequest {
    pub game_id: u64,
    pub token_symbol: String,
    pub land_id: u64,
    pub machine_id: u64,
    /// Parallel to the bet arrays: entry `i` is player `i`'s bet.
    pub players: Vec<Address>,
    pub bet_types: Vec<u8>,
    pub bet_values: Vec<u64>,
    pub bet_amounts: Vec<u64>,
    /// Pre-image of the committed chain tail.
    pub local_hash: Digest32,
}

/// What a settled play did to the books.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySettlement {
    pub game_id: u64,
    pub number: u64,
    pub win_amounts: Vec<u64>,
    pub total_staked: u64,
    pub total_payout: u64,
    pub new_balance: u64,
}

pub struct Casino {
    access: AccessControl,
    treasury: Treasury,
    chain: HashChain,
    modules: BTreeMap<u64, GameModule>,
    pointer: Pointer,
    events: EventLog,
    retired: bool,
}

impl Casino {
    pub fn new(
        ceo: impl Into<Address>,
        treasury_address: impl Into<Address>,
        pointer_ratio: u64,
    ) -> Self {
        let ceo = ceo.into();
        let address: Address = treasury_address.into();
        let mut pointer = Pointer::new(ceo.clone(), format!("{}.pointer", address), pointer_ratio);
        pointer.declare_source(address.clone());
        Self {
            access: AccessControl::new(ceo),
            treasury: Treasury::new(address),
            chain: HashChain::new(),
            modules: BTreeMap::new(),
            pointer,
            events: EventLog::new(),
            retired: false,
        }
    }

    fn ensure_live(&self) -> CasinoResult<()> {
        if self.retired {
            Err(CasinoError::TreasuryRetired)
        } else {
            Ok(())
        }
    }

    // ---- queries -------------------------------------------------------

    pub fn treasury(&self) -> &Treasury {
        &self.treasury
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn pointer(&self) -> &Pointer {
        &self.pointer
    }

    /// Pointer admin surface; its operations carry their own CEO check.
    pub fn pointer_mut(&mut self) -> &mut Pointer {
        &mut self.pointer
    }

    pub fn tail(&self) -> Option<Digest32> {
        self.chain.tail()
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }

    pub fn module(&self, game_id: u64) -> CasinoResult<&GameModule> {
        self.modules
            .get(&game_id)
            .ok_or(CasinoError::UnknownGame(game_id))
    }

    // ---- CEO operations ------------------------------------------------

    pub fn set_ceo(&mut self, caller: &Address, new_ceo: Address) -> CasinoResult<()> {
        self.ensure_live()?;
        let previous = self.access.set_ceo(caller, new_ceo.clone())?;
        self.events.emit(CasinoEvent::CeoSet { previous, new_ceo });
        Ok(())
    }

    pub fn add_worker(&mut self, caller: &Address, worker: Address) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.add_worker(caller, worker.clone())?;
        // Workers also operate the loyalty ledger.
        self.pointer.register_worker(worker.clone());
        self.events.emit(CasinoEvent::WorkerSet { worker });
        Ok(())
    }

    pub fn remove_worker(&mut self, caller: &Address, worker: &Address) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.remove_worker(caller, worker)?;
        self.pointer.unregister_worker(worker);
        Ok(())
    }

    pub fn register_token(
        &mut self,
        caller: &Address,
        symbol: impl Into<String>,
        handle: TokenHandle,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        self.treasury.register_token(symbol, handle)
    }

    /// Registers a game and binds its strategy module. The maximum bet
    /// and enabled flag take effect immediately.
    pub fn add_game(
        &mut self,
        caller: &Address,
        name: impl Into<String>,
        module: GameModule,
        maximum_bet: u64,
        enabled: bool,
    ) -> CasinoResult<u64> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        let name = name.into();
        let game_id = self.treasury.add_game(name.clone(), maximum_bet, enabled)?;
        self.modules.insert(game_id, module);
        self.events.emit(CasinoEvent::GameAdded { game_id, name });
        Ok(game_id)
    }

    pub fn set_game_enabled(
        &mut self,
        caller: &Address,
        game_id: u64,
        enabled: bool,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        self.treasury.set_enabled(game_id, enabled)?;
        self.events
            .emit(CasinoEvent::GameEnabledSet { game_id, enabled });
        Ok(())
    }

    pub fn set_maximum_bet(
        &mut self,
        caller: &Address,
        game_id: u64,
        symbol: &str,
        maximum_bet: u64,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        self.treasury.set_maximum_bet(game_id, symbol, maximum_bet)?;
        self.events.emit(CasinoEvent::MaximumBetSet {
            game_id,
            token_symbol: symbol.to_string(),
            maximum_bet,
        });
        Ok(())
    }

    /// Swaps the payout table of a slots game.
    pub fn set_slots_factors(
        &mut self,
        caller: &Address,
        game_id: u64,
        factors: [u64; 4],
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        self.modules
            .get_mut(&game_id)
            .ok_or(CasinoError::UnknownGame(game_id))?
            .slots_mut()
            .ok_or_else(|| CasinoError::InvalidBet("game is not a slot machine".to_string()))?
            .set_factors(factors)
    }

    /// Funds a game from the caller's wallet against a standing
    /// allowance.
    pub fn add_funds(
        &mut self,
        caller: &Address,
        game_id: u64,
        symbol: &str,
        amount: u64,
    ) -> CasinoResult<u64> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        let new_balance = self.treasury.add_funds(caller, game_id, symbol, amount)?;
        self.emit_new_balance(game_id, symbol, new_balance);
        Ok(new_balance)
    }

    pub fn withdraw_tokens(
        &mut self,
        caller: &Address,
        game_id: u64,
        symbol: &str,
        amount: u64,
    ) -> CasinoResult<u64> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        let new_balance = self.treasury.withdraw(caller, game_id, symbol, amount)?;
        self.emit_new_balance(game_id, symbol, new_balance);
        Ok(new_balance)
    }

    /// Sweeps the treasury's entire balance for `symbol` to the CEO.
    pub fn withdraw_max_tokens(&mut self, caller: &Address, symbol: &str) -> CasinoResult<u64> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        let (total, zeroed) = self.treasury.withdraw_max(caller, symbol)?;
        for game_id in zeroed {
            self.emit_new_balance(game_id, symbol, 0);
        }
        Ok(total)
    }

    /// Commits a fresh hash-chain tail.
    pub fn set_tail(&mut self, caller: &Address, tail: Digest32) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        self.chain.set_tail(tail);
        self.events.emit(CasinoEvent::TailSet {
            tail: hex::encode(tail),
        });
        Ok(())
    }

    /// One-shot migration of the whole casino state into `target`:
    /// token custody, game registrations and balances, in-flight
    /// matches, the chain tail and the loyalty ledger. The caller must
    /// be CEO on both sides; afterwards this instance is terminal.
    pub fn migrate(&mut self, caller: &Address, target: &mut Casino) -> CasinoResult<MigrationReport> {
        self.ensure_live()?;
        self.access.require(caller, Role::Ceo)?;
        target.access.require(caller, Role::Ceo)?;
        if target.retired {
            return Err(CasinoError::MigrationRejected(
                "destination treasury is retired".to_string(),
            ));
        }
        if !target.modules.is_empty() {
            return Err(CasinoError::MigrationRejected(
                "destination treasury already has games".to_string(),
            ));
        }

        let report = self.treasury.migrate_into(&mut target.treasury)?;

        target.chain = std::mem::take(&mut self.chain);
        target.modules = std::mem::take(&mut self.modules);
        let fresh = Pointer::new(
            self.access.ceo().clone(),
            self.pointer.address().clone(),
            self.pointer.ratio(),
        );
        target.pointer = std::mem::replace(&mut self.pointer, fresh);
        target.pointer.declare_source(target.treasury.address().clone());
        self.retired = true;

        info!(
            destination = %target.treasury.address(),
            games = report.games,
            "treasury migrated"
        );
        self.events.emit(CasinoEvent::TreasuryMigrated {
            destination: target.treasury.address().clone(),
        });
        Ok(report)
    }

    // ---- play ----------------------------------------------------------

    /// Settles one play of a one-shot game.
    pub fn play(&mut self, caller: &Address, req: &PlayRequest) -> CasinoResult<PlaySettlement> {
        self.ensure_live()?;
        self.access.require(caller, Role::Worker)?;

        let n = req.players.len();
        if n == 0
            || req.bet_types.len() != n
            || req.bet_values.len() != n
            || req.bet_amounts.len() != n
        {
            return Err(CasinoError::InvalidBet(
                "players and bet arrays must be parallel and non-empty".to_string(),
            ));
        }

        self.treasury.require_playable(req.game_id, &req.token_symbol)?;
        let engine = self
            .module(req.game_id)?
            .engine()
            .ok_or_else(|| CasinoError::InvalidBet("game is not a one-shot game".to_string()))?;

        let ctx = PlayContext {
            players: &req.players,
            bet_types: &req.bet_types,
            bet_values: &req.bet_values,
            bet_amounts: &req.bet_amounts,
        };
        engine.validate(&ctx)?;

        let balance = self.treasury.balance(req.game_id, &req.token_symbol);
        for amount in &req.bet_amounts {
            if *amount > balance.maximum_bet {
                return Err(CasinoError::BetExceedsMaximum {
                    bet: *amount,
                    maximum: balance.maximum_bet,
                });
            }
        }

        let total_staked = ctx.total_staked();
        let necessary = engine.necessary_balance(&ctx);
        if balance.allocated + total_staked < necessary {
            return Err(CasinoError::InsufficientFunds {
                needed: necessary,
                available: balance.allocated + total_staked,
            });
        }

        // Randomness is checked, and the outcome fixed, before any
        // funds move.
        self.chain.verify(&req.local_hash)?;
        let seed = derive_seed(&req.local_hash, req.land_id, req.machine_id);
        let outcome = engine.play(&seed, &ctx);
        debug!(
            game_id = req.game_id,
            number = outcome.number,
            total_staked,
            "outcome computed"
        );

        // Stake collection is the only step left that can fail; roll
        // back already-collected stakes if one player's pull bounces.
        let mut collected: Vec<(&Address, u64)> = Vec::new();
        for (player, amount) in req.players.iter().zip(&req.bet_amounts) {
            if let Err(e) = self.treasury.collect(player, &req.token_symbol, *amount) {
                for (refundee, refund) in collected {
                    // Refunds come out of funds collected a moment ago.
                    let _ = self.treasury.pay_out(refundee, &req.token_symbol, refund);
                }
                return Err(e);
            }
            collected.push((player, *amount));
        }

        self.chain.consume(&req.local_hash)?;

        let total_payout = outcome.total_payout();
        let new_balance =
            self.treasury
                .settle(req.game_id, &req.token_symbol, total_staked, total_payout)?;
        for (player, win) in req.players.iter().zip(&outcome.win_amounts) {
            if *win > 0 {
                self.treasury.pay_out(player, &req.token_symbol, *win)?;
            }
        }

        let source = self.treasury.address().clone();
        for (player, amount) in req.players.iter().zip(&req.bet_amounts) {
            self.pointer.add_points(&source, player, *amount, n, 0);
        }

        self.emit_new_balance(req.game_id, &req.token_symbol, new_balance);
        self.events.emit(CasinoEvent::GameResult {
            game_id: req.game_id,
            players: req.players.clone(),
            token_symbol: req.token_symbol.clone(),
            land_id: req.land_id,
            machine_id: req.machine_id,
            number: outcome.number,
            win_amounts: outcome.win_amounts.clone(),
        });

        Ok(PlaySettlement {
            game_id: req.game_id,
            number: outcome.number,
            win_amounts: outcome.win_amounts,
            total_staked,
            total_payout,
            new_balance,
        })
    }

    // ---- backgammon ----------------------------------------------------

    /// Opens a backgammon match, pulling the stake from both players.
    pub fn backgammon_start(
        &mut self,
        caller: &Address,
        game_id: u64,
        symbol: &str,
        stake: u64,
        players: [Address; 2],
        wearables: [u64; 2],
    ) -> CasinoResult<u64> {
        self.ensure_live()?;
        self.access.require(caller, Role::Worker)?;
        self.treasury.require_playable(game_id, symbol)?;
        let balance = self.treasury.balance(game_id, symbol);
        if stake > balance.maximum_bet {
            return Err(CasinoError::BetExceedsMaximum {
                bet: stake,
                maximum: balance.maximum_bet,
            });
        }
        self.backgammon_table(game_id)?;

        let [player_a, player_b] = &players;
        self.treasury.collect(player_a, symbol, stake)?;
        if let Err(e) = self.treasury.collect(player_b, symbol, stake) {
            let _ = self.treasury.pay_out(player_a, symbol, stake);
            return Err(e);
        }

        let match_id = match self
            .backgammon_table_mut(game_id)?
            .start(player_a.clone(), player_b.clone(), stake, symbol.to_string())
        {
            Ok(id) => id,
            Err(e) => {
                let _ = self.treasury.pay_out(player_a, symbol, stake);
                let _ = self.treasury.pay_out(player_b, symbol, stake);
                return Err(e);
            }
        };
        let new_balance = self.treasury.settle(game_id, symbol, stake * 2, 0)?;

        let source = self.treasury.address().clone();
        for (player, wearable) in players.iter().zip(wearables) {
            self.pointer.add_points(&source, player, stake, 2, wearable);
        }

        self.emit_new_balance(game_id, symbol, new_balance);
        self.events.emit(CasinoEvent::MatchStarted {
            match_id,
            players: players.to_vec(),
            stake,
        });
        Ok(match_id)
    }

    /// A participant doubles, posting one more stake unit.
    pub fn backgammon_raise(
        &mut self,
        caller: &Address,
        game_id: u64,
        match_id: u64,
        raiser: &Address,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Worker)?;
        let (symbol, stake) = self.match_stake(game_id, match_id)?;

        self.treasury.collect(raiser, &symbol, stake)?;
        let posted = match self.backgammon_table_mut(game_id)?.raise(match_id, raiser) {
            Ok(posted) => posted,
            Err(e) => {
                let _ = self.treasury.pay_out(raiser, &symbol, stake);
                return Err(e);
            }
        };
        let new_balance = self.treasury.settle(game_id, &symbol, posted, 0)?;

        let source = self.treasury.address().clone();
        self.pointer.add_points(&source, raiser, posted, 2, 0);

        let total_staked = self.bg_match(game_id, match_id)?.total_staked;
        self.emit_new_balance(game_id, &symbol, new_balance);
        self.events.emit(CasinoEvent::StakeRaised {
            match_id,
            player: raiser.clone(),
            total_staked,
        });
        Ok(())
    }

    /// The opponent accepts the double; the cube value doubles.
    pub fn backgammon_call(
        &mut self,
        caller: &Address,
        game_id: u64,
        match_id: u64,
        player: &Address,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Worker)?;
        let (symbol, stake) = self.match_stake(game_id, match_id)?;

        self.treasury.collect(player, &symbol, stake)?;
        let posted = match self.backgammon_table_mut(game_id)?.call(match_id, player) {
            Ok(posted) => posted,
            Err(e) => {
                let _ = self.treasury.pay_out(player, &symbol, stake);
                return Err(e);
            }
        };
        let new_balance = self.treasury.settle(game_id, &symbol, posted, 0)?;

        let source = self.treasury.address().clone();
        self.pointer.add_points(&source, player, posted, 2, 0);

        let total_staked = self.bg_match(game_id, match_id)?.total_staked;
        self.emit_new_balance(game_id, &symbol, new_balance);
        self.events.emit(CasinoEvent::StakeDoubled {
            match_id,
            player: player.clone(),
            total_staked,
        });
        Ok(())
    }

    /// The opponent declines the double; the raiser takes the pot.
    pub fn backgammon_drop(
        &mut self,
        caller: &Address,
        game_id: u64,
        match_id: u64,
        dropper: &Address,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Worker)?;
        let (symbol, _) = self.match_stake(game_id, match_id)?;

        let (winner, payout) = self
            .backgammon_table_mut(game_id)?
            .drop_game(match_id, dropper)?;
        let new_balance = self.treasury.settle(game_id, &symbol, 0, payout)?;
        self.treasury.pay_out(&winner, &symbol, payout)?;

        self.emit_new_balance(game_id, &symbol, new_balance);
        self.events.emit(CasinoEvent::MatchDropped {
            match_id,
            dropper: dropper.clone(),
            winner,
            payout,
        });
        Ok(())
    }

    /// Pays the pot out to the match winner.
    pub fn backgammon_resolve(
        &mut self,
        caller: &Address,
        game_id: u64,
        match_id: u64,
        winner: &Address,
    ) -> CasinoResult<()> {
        self.ensure_live()?;
        self.access.require(caller, Role::Worker)?;
        let (symbol, _) = self.match_stake(game_id, match_id)?;

        let payout = self
            .backgammon_table_mut(game_id)?
            .resolve(match_id, winner)?;
        let new_balance = self.treasury.settle(game_id, &symbol, 0, payout)?;
        self.treasury.pay_out(winner, &symbol, payout)?;

        self.emit_new_balance(game_id, &symbol, new_balance);
        self.events.emit(CasinoEvent::MatchResolved {
            match_id,
            winner: winner.clone(),
            payout,
        });
        Ok(())
    }

    pub fn bg_match(&self, game_id: u64, match_id: u64) -> CasinoResult<&crate::games::backgammon::BgMatch> {
        self.backgammon_table(game_id)?.get(match_id)
    }

    fn backgammon_table(&self, game_id: u64) -> CasinoResult<&crate::games::BackgammonTable> {
        self.module(game_id)?.backgammon().ok_or_else(|| {
            CasinoError::InvalidBet("game is not a backgammon table".to_string())
        })
    }

    fn backgammon_table_mut(
        &mut self,
        game_id: u64,
    ) -> CasinoResult<&mut crate::games::BackgammonTable> {
        self.modules
            .get_mut(&game_id)
            .ok_or(CasinoError::UnknownGame(game_id))?
            .backgammon_mut()
            .ok_or_else(|| CasinoError::InvalidBet("game is not a backgammon table".to_string()))
    }

    fn match_stake(&self, game_id: u64, match_id: u64) -> CasinoResult<(String, u64)> {
        let m = self.bg_match(game_id, match_id)?;
        Ok((m.token_symbol.clone(), m.stake))
    }

    fn emit_new_balance(&mut self, game_id: u64, symbol: &str, new_balance: u64) {
        self.events.emit(CasinoEvent::NewBalance {
            game_id,
            token_symbol: symbol.to_string(),
            new_balance,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::{BackgammonTable, Roulette, Slots};
    use crate::hash_chain::chain_from_secret;
    use crate::token::{MemoryToken, TokenHandle};

    const SYM: &str = "PLAY";

    fn addr(s: &str) -> Address {
        s.to_string()
    }

    /// Casino with a funded roulette table, a worker, players with
    /// standing allowances, and a three-link hash chain.
    fn setup() -> (Casino, TokenHandle, u64, Vec<Digest32>) {
        let mut token = MemoryToken::new(SYM);
        token.mint(&addr("ceo"), 1_000_000);
        token.mint(&addr("p1"), 10_000);
        token.mint(&addr("p2"), 10_000);
        let handle = TokenHandle::new(token);

        let mut casino = Casino::new("ceo", "treasury", 100);
        casino
            .register_token(&addr("ceo"), SYM, handle.clone())
            .unwrap();
        casino.add_worker(&addr("ceo"), addr("worker")).unwrap();

        let game = casino
            .add_game(
                &addr("ceo"),
                "roulette",
                GameModule::Roulette(Roulette::default()),
                1_000,
                true,
            )
            .unwrap();
        handle.approve(&addr("ceo"), &addr("treasury"), 1_000_000);
        casino.add_funds(&addr("ceo"), game, SYM, 100_000).unwrap();

        handle.approve(&addr("p1"), &addr("treasury"), 10_000);
        handle.approve(&addr("p2"), &addr("treasury"), 10_000);

        let links = chain_from_secret(b"secret", 4);
        casino.set_tail(&addr("ceo"), links[3]).unwrap();
        (casino, handle, game, links)
    }

    fn straight_up(game: u64, local_hash: Digest32) -> PlayRequest {
        PlayRequest {
            game_id: game,
            token_symbol: SYM.to_string(),
            land_id: 1,
            machine_id: 1,
            players: vec![addr("p1")],
            bet_types: vec![0],
            bet_values: vec![17],
            bet_amounts: vec![100],
            local_hash,
        }
    }

    #[test]
    fn test_play_settles_and_conserves_tokens() {
        let (mut casino, token, game, links) = setup();
        let supply_before = token.total_supply();

        let settlement = casino
            .play(&addr("worker"), &straight_up(game, links[2]))
            .unwrap();

        assert_eq!(settlement.total_staked, 100);
        let expected_balance = 100_000 + 100 - settlement.total_payout;
        assert_eq!(settlement.new_balance, expected_balance);
        assert_eq!(
            casino.treasury().balance(game, SYM).allocated,
            expected_balance
        );
        let p1_expected = 10_000 - 100 + settlement.win_amounts[0];
        assert_eq!(token.balance_of(&addr("p1")), p1_expected);
        assert_eq!(token.total_supply(), supply_before);

        // Players accrue points for the wager.
        assert_eq!(casino.pointer().balance_of(&addr("p1")), 1);
    }

    #[test]
    fn test_play_requires_worker() {
        let (mut casino, _, game, links) = setup();
        assert!(matches!(
            casino.play(&addr("p1"), &straight_up(game, links[2])),
            Err(CasinoError::AccessDenied { .. })
        ));
    }

    #[test]
    fn test_hash_replay_rejected() {
        let (mut casino, _, game, links) = setup();
        casino
            .play(&addr("worker"), &straight_up(game, links[2]))
            .unwrap();
        assert_eq!(
            casino.play(&addr("worker"), &straight_up(game, links[2])),
            Err(CasinoError::HashChainViolation)
        );
        // The next link up the chain works.
        casino
            .play(&addr("worker"), &straight_up(game, links[1]))
            .unwrap();
    }

    #[test]
    fn test_failed_play_leaves_state_untouched() {
        let (mut casino, token, game, links) = setup();
        // p2 has no allowance left after this revoke; the multi-player
        // play must refund p1's already-collected stake.
        token.approve(&addr("p2"), &addr("treasury"), 0);

        let req = PlayRequest {
            game_id: game,
            token_symbol: SYM.to_string(),
            land_id: 1,
            machine_id: 1,
            players: vec![addr("p1"), addr("p2")],
            bet_types: vec![0, 0],
            bet_values: vec![5, 9],
            bet_amounts: vec![100, 100],
            local_hash: links[2],
        };
        let err = casino.play(&addr("worker"), &req).unwrap_err();
        assert!(matches!(err, CasinoError::Token(_)));

        assert_eq!(token.balance_of(&addr("p1")), 10_000);
        assert_eq!(token.balance_of(&addr("p2")), 10_000);
        assert_eq!(casino.treasury().balance(game, SYM).allocated, 100_000);
        // The chain link was not burned; the play can be resubmitted.
        assert_eq!(casino.tail(), Some(links[3]));
    }

    #[test]
    fn test_bet_above_maximum_rejected() {
        let (mut casino, _, game, links) = setup();
        let mut req = straight_up(game, links[2]);
        req.bet_amounts = vec![1_001];
        assert_eq!(
            casino.play(&addr("worker"), &req),
            Err(CasinoError::BetExceedsMaximum {
                bet: 1_001,
                maximum: 1_000,
            })
        );
    }

    #[test]
    fn test_underfunded_game_rejects_play() {
        let (mut casino, token, _, links) = setup();
        let game = casino
            .add_game(
                &addr("ceo"),
                "slots",
                GameModule::Slots(Slots::default()),
                1_000,
                true,
            )
            .unwrap();
        // Allocate less than one jackpot's worth.
        casino.add_funds(&addr("ceo"), game, SYM, 1_000).unwrap();
        token.approve(&addr("p1"), &addr("treasury"), 10_000);

        let req = PlayRequest {
            game_id: game,
            token_symbol: SYM.to_string(),
            land_id: 1,
            machine_id: 2,
            players: vec![addr("p1")],
            bet_types: vec![0],
            bet_values: vec![0],
            bet_amounts: vec![100],
            local_hash: links[2],
        };
        // Needs 250 * 100 covered, has 1_000 + 100.
        assert!(matches!(
            casino.play(&addr("worker"), &req),
            Err(CasinoError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn test_disabled_game_rejects_play() {
        let (mut casino, _, game, links) = setup();
        casino.set_game_enabled(&addr("ceo"), game, false).unwrap();
        assert_eq!(
            casino.play(&addr("worker"), &straight_up(game, links[2])),
            Err(CasinoError::GameDisabled(game))
        );
    }

    #[test]
    fn test_backgammon_full_round() {
        let (mut casino, token, _, _) = setup();
        let game = casino
            .add_game(
                &addr("ceo"),
                "backgammon",
                GameModule::Backgammon(BackgammonTable::new()),
                500,
                true,
            )
            .unwrap();

        let match_id = casino
            .backgammon_start(
                &addr("worker"),
                game,
                SYM,
                100,
                [addr("p1"), addr("p2")],
                [1, 0],
            )
            .unwrap();
        assert_eq!(casino.treasury().balance(game, SYM).allocated, 200);
        assert_eq!(token.balance_of(&addr("p1")), 9_900);

        casino
            .backgammon_raise(&addr("worker"), game, match_id, &addr("p1"))
            .unwrap();
        assert_eq!(casino.bg_match(game, match_id).unwrap().total_staked, 300);

        casino
            .backgammon_call(&addr("worker"), game, match_id, &addr("p2"))
            .unwrap();
        assert_eq!(casino.bg_match(game, match_id).unwrap().total_staked, 400);
        assert_eq!(casino.bg_match(game, match_id).unwrap().stake, 200);

        casino
            .backgammon_resolve(&addr("worker"), game, match_id, &addr("p2"))
            .unwrap();
        // p2 staked 200 total and won the 400 pot.
        assert_eq!(token.balance_of(&addr("p2")), 10_200);
        assert_eq!(casino.treasury().balance(game, SYM).allocated, 0);

        // Wearable bonus applied to p1 at match start: 100/100 * 120%.
        assert!(casino.pointer().balance_of(&addr("p1")) >= 1);
    }

    #[test]
    fn test_backgammon_drop_forfeits() {
        let (mut casino, token, _, _) = setup();
        let game = casino
            .add_game(
                &addr("ceo"),
                "backgammon",
                GameModule::Backgammon(BackgammonTable::new()),
                500,
                true,
            )
            .unwrap();

        let match_id = casino
            .backgammon_start(
                &addr("worker"),
                game,
                SYM,
                100,
                [addr("p1"), addr("p2")],
                [0, 0],
            )
            .unwrap();
        casino
            .backgammon_raise(&addr("worker"), game, match_id, &addr("p2"))
            .unwrap();
        casino
            .backgammon_drop(&addr("worker"), game, match_id, &addr("p1"))
            .unwrap();

        // p2 staked 200 and took the 300 pot.
        assert_eq!(token.balance_of(&addr("p2")), 10_100);
        assert_eq!(token.balance_of(&addr("p1")), 9_900);
    }

    #[test]
    fn test_first_registered_game_gets_id_zero() {
        let (casino, _, game, _) = setup();
        assert_eq!(game, 0);
        assert_eq!(casino.treasury().game(0).unwrap().name, "roulette");
        assert_eq!(casino.treasury().balance(0, SYM).maximum_bet, 1_000);
    }

    #[test]
    fn test_slots_factors_are_ceo_adjustable() {
        let (mut casino, _, roulette, _) = setup();
        let game = casino
            .add_game(
                &addr("ceo"),
                "slots",
                GameModule::Slots(Slots::default()),
                1_000,
                true,
            )
            .unwrap();

        assert!(casino
            .set_slots_factors(&addr("worker"), game, [100, 10, 5, 2])
            .is_err());
        casino
            .set_slots_factors(&addr("ceo"), game, [100, 10, 5, 2])
            .unwrap();
        // Only slots carry a payout table.
        assert!(casino
            .set_slots_factors(&addr("ceo"), roulette, [100, 10, 5, 2])
            .is_err());
    }

    #[test]
    fn test_migration_retires_source() {
        let (mut casino, token, game, links) = setup();
        let mut successor = Casino::new("ceo", "treasury2", 100);
        successor
            .register_token(&addr("ceo"), SYM, token.clone())
            .unwrap();
        successor.add_worker(&addr("ceo"), addr("worker")).unwrap();

        let report = casino.migrate(&addr("ceo"), &mut successor).unwrap();
        assert_eq!(report.moved, vec![(SYM.to_string(), 100_000)]);
        assert!(casino.is_retired());

        // Source rejects everything, including reads-for-write.
        assert_eq!(
            casino.play(&addr("worker"), &straight_up(game, links[2])),
            Err(CasinoError::TreasuryRetired)
        );
        assert_eq!(
            casino.add_funds(&addr("ceo"), game, SYM, 1),
            Err(CasinoError::TreasuryRetired)
        );

        // Successor carries balances, max bets and the tail.
        assert_eq!(successor.treasury().balance(game, SYM).allocated, 100_000);
        assert_eq!(successor.treasury().balance(game, SYM).maximum_bet, 1_000);
        assert_eq!(successor.tail(), Some(links[3]));
        assert_eq!(token.balance_of(&addr("treasury2")), 100_000);

        // And plays settle against the successor directly, once the
        // player grants it an allowance.
        token.approve(&addr("p1"), &addr("treasury2"), 10_000);
        successor
            .play(&addr("worker"), &straight_up(game, links[2]))
            .unwrap();
    }

    #[test]
    fn test_migration_requires_ceo_on_both_sides() {
        let (mut casino, token, _, _) = setup();
        let mut successor = Casino::new("other-ceo", "treasury2", 100);
        successor
            .register_token(&addr("other-ceo"), SYM, token)
            .unwrap();
        assert!(matches!(
            casino.migrate(&addr("ceo"), &mut successor),
            Err(CasinoError::AccessDenied { .. })
        ));
        assert!(!casino.is_retired());
    }
}
