//! Loyalty point side-ledger.
//!
//! Players accrue points proportional to wagered volume, boosted by
//! table size and equipped wearables, with an optional affiliate
//! mirror. Accrual only happens for declared source contracts while
//! collection is switched on; everything else is a silent no-op so a
//! misconfigured pointer can never block settlement.

use crate::access::{AccessControl, Address, Role};
use crate::errors::{CasinoError, CasinoResult};
use crate::token::TokenHandle;
use std::collections::{HashMap, HashSet};

/// Default share of accrued points mirrored to an affiliate, percent.
pub const DEFAULT_AFFILIATE_PERCENT: u64 = 10;

/// Default table-size bonus in percent for 2, 3, and 4+ players.
/// Solo play earns nothing extra.
pub const DEFAULT_PLAYER_BONUS: [u64; 3] = [10, 20, 30];

/// Wearable bonus in percent, +10 per equipped wearable, capped at 4.
fn wearable_bonus_percent(wearables: u64) -> u64 {
    wearables.min(4) * 10
}

pub struct Pointer {
    access: AccessControl,
    /// Custody identity the distribution token pays out from.
    address: Address,
    /// Wagered base units per point.
    ratio: u64,
    /// Bonus percent for 2, 3, and 4+ player tables.
    player_bonus: [u64; 3],
    affiliate_percent: u64,
    collecting: bool,
    distributing: bool,
    declared: HashSet<Address>,
    affiliates: HashMap<Address, Address>,
    points: HashMap<Address, u64>,
    token: Option<TokenHandle>,
}

impl Pointer {
    pub fn new(ceo: impl Into<Address>, address: impl Into<Address>, ratio: u64) -> Self {
        Self {
            access: AccessControl::new(ceo),
            address: address.into(),
            ratio: ratio.max(1),
            player_bonus: DEFAULT_PLAYER_BONUS,
            affiliate_percent: DEFAULT_AFFILIATE_PERCENT,
            collecting: true,
            distributing: false,
            declared: HashSet::new(),
            affiliates: HashMap::new(),
            points: HashMap::new(),
            token: None,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn ratio(&self) -> u64 {
        self.ratio
    }

    pub fn balance_of(&self, player: &Address) -> u64 {
        self.points.get(player).copied().unwrap_or(0)
    }

    pub fn set_affiliate_percent(&mut self, caller: &Address, percent: u64) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.affiliate_percent = percent.min(100);
        Ok(())
    }

    /// Retunes how much wagered volume buys one point.
    pub fn set_ratio(&mut self, caller: &Address, ratio: u64) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.ratio = ratio.max(1);
        Ok(())
    }

    /// Retunes the table-size bonus for a given table size. Sizes of
    /// four and up share one bucket; solo tables never carry a bonus.
    pub fn change_player_bonus(
        &mut self,
        caller: &Address,
        num_players: usize,
        percent: u64,
    ) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        match num_players {
            0 | 1 => Err(CasinoError::PointsRejected(
                "solo tables carry no bonus".to_string(),
            )),
            2 => {
                self.player_bonus[0] = percent;
                Ok(())
            }
            3 => {
                self.player_bonus[1] = percent;
                Ok(())
            }
            _ => {
                self.player_bonus[2] = percent;
                Ok(())
            }
        }
    }

    fn player_bonus_percent(&self, num_players: usize) -> u64 {
        match num_players {
            0 | 1 => 0,
            2 => self.player_bonus[0],
            3 => self.player_bonus[1],
            _ => self.player_bonus[2],
        }
    }

    /// Grants the worker role on the pointer itself, allowing the
    /// worker to assign affiliates.
    pub fn add_worker(&mut self, caller: &Address, worker: Address) -> CasinoResult<()> {
        self.access.add_worker(caller, worker)
    }

    /// Worker-roster hook for the owning orchestrator during wiring.
    pub(crate) fn register_worker(&mut self, worker: Address) {
        let ceo = self.access.ceo().clone();
        let _ = self.access.add_worker(&ceo, worker);
    }

    pub(crate) fn unregister_worker(&mut self, worker: &Address) {
        let ceo = self.access.ceo().clone();
        let _ = self.access.remove_worker(&ceo, worker);
    }

    /// Declares a contract whose wagers accrue points.
    pub fn declare_contract(&mut self, caller: &Address, source: Address) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.declared.insert(source);
        Ok(())
    }

    /// Declaration hook for the owning orchestrator during wiring.
    pub(crate) fn declare_source(&mut self, source: Address) {
        self.declared.insert(source);
    }

    pub fn revoke_contract(&mut self, caller: &Address, source: &Address) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.declared.remove(source);
        Ok(())
    }

    pub fn set_collecting(&mut self, caller: &Address, enabled: bool) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.collecting = enabled;
        Ok(())
    }

    pub fn set_distributing(&mut self, caller: &Address, enabled: bool) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.distributing = enabled;
        Ok(())
    }

    /// Binds the token that `distribute` pays points out in, 1:1.
    pub fn set_distribution_token(
        &mut self,
        caller: &Address,
        token: TokenHandle,
    ) -> CasinoResult<()> {
        self.access.require(caller, Role::Ceo)?;
        self.token = Some(token);
        Ok(())
    }

    /// Binds an affiliate to a player. Affiliate onboarding is an
    /// operator task, so this takes the worker role, not the CEO's.
    pub fn set_affiliate(
        &mut self,
        caller: &Address,
        player: Address,
        affiliate: Address,
    ) -> CasinoResult<()> {
        self.access.require(caller, Role::Worker)?;
        if player == affiliate {
            return Err(CasinoError::PointsRejected(
                "a player cannot be their own affiliate".to_string(),
            ));
        }
        self.affiliates.insert(player, affiliate);
        Ok(())
    }

    /// Accrues points for one wager. Returns the amount credited to
    /// the player, 0 when accrual is gated off.
    pub fn add_points(
        &mut self,
        source: &Address,
        player: &Address,
        wagered: u64,
        num_players: usize,
        wearables: u64,
    ) -> u64 {
        if !self.collecting || !self.declared.contains(source) {
            return 0;
        }
        let base = wagered / self.ratio;
        let bonus =
            100 + self.player_bonus_percent(num_players) + wearable_bonus_percent(wearables);
        let accrued = base * bonus / 100;
        if accrued == 0 {
            return 0;
        }
        *self.points.entry(player.clone()).or_insert(0) += accrued;

        if let Some(affiliate) = self.affiliates.get(player).cloned() {
            let mirrored = accrued * self.affiliate_percent / 100;
            if mirrored > 0 {
                *self.points.entry(affiliate).or_insert(0) += mirrored;
            }
        }
        accrued
    }

    /// Pays out and zeroes the player's point balance. Returns the
    /// amount distributed.
    pub fn distribute(&mut self, player: &Address) -> CasinoResult<u64> {
        if !self.distributing {
            return Err(CasinoError::PointsRejected(
                "distribution is switched off".to_string(),
            ));
        }
        let token = self.token.as_ref().ok_or_else(|| {
            CasinoError::PointsRejected("no distribution token configured".to_string())
        })?;
        let amount = self.balance_of(player);
        if amount == 0 {
            return Ok(0);
        }
        token.transfer(&self.address, player, amount)?;
        self.points.insert(player.clone(), 0);
        Ok(amount)
    }
}
