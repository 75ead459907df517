//! Slot machine.
//!
//! The reel strip maps a 0..999 draw onto ten symbol slots. Symbol 1
//! is the jackpot; the payout factors are per-symbol multipliers on
//! the staked amount.

use super::{GameEngine, Outcome, PlayContext};
use crate::errors::{CasinoError, CasinoResult};
use crate::hash_chain::Seed;

/// Symbol at each of the ten strip positions.
pub const SYMBOL_STRIP: [u8; 10] = [4, 4, 4, 4, 3, 3, 3, 2, 2, 1];

/// Payout multiplier for symbols 1 through 4.
pub const DEFAULT_FACTORS: [u64; 4] = [250, 15, 8, 4];

pub struct Slots {
    factors: [u64; 4],
}

impl Slots {
    pub fn new(factors: [u64; 4]) -> Self {
        Self { factors }
    }

    pub fn jackpot_factor(&self) -> u64 {
        self.factors[0]
    }

    pub fn factors(&self) -> [u64; 4] {
        self.factors
    }

    /// Swaps in a new payout table. The jackpot factor sizes the
    /// coverage check, so it must stay nonzero.
    pub fn set_factors(&mut self, factors: [u64; 4]) -> CasinoResult<()> {
        if factors[0] == 0 {
            return Err(CasinoError::InvalidBet(
                "jackpot factor must be nonzero".to_string(),
            ));
        }
        self.factors = factors;
        Ok(())
    }
}

impl Default for Slots {
    fn default() -> Self {
        Self::new(DEFAULT_FACTORS)
    }
}

impl GameEngine for Slots {
    fn name(&self) -> &'static str {
        "slots"
    }

    fn validate(&self, ctx: &PlayContext) -> CasinoResult<()> {
        if ctx.bet_types.len() != 1 {
            return Err(CasinoError::InvalidBet(
                "slots takes exactly one bet per pull".to_string(),
            ));
        }
        if ctx.bet_types[0] != 0 {
            return Err(CasinoError::InvalidBet(format!(
                "unknown bet type {}",
                ctx.bet_types[0]
            )));
        }
        if ctx.bet_amounts[0] == 0 {
            return Err(CasinoError::ZeroAmount);
        }
        Ok(())
    }

    fn necessary_balance(&self, ctx: &PlayContext) -> u64 {
        // Worst case is the jackpot symbol.
        self.jackpot_factor() * ctx.total_staked()
    }

    fn play(&self, seed: &Seed, ctx: &PlayContext) -> Outcome {
        let number = seed.number(1_000);
        let symbol = SYMBOL_STRIP[(number % 10) as usize];
        let win = ctx.bet_amounts[0] * self.factors[(symbol - 1) as usize];
        Outcome {
            number,
            win_amounts: vec![win],
        }
    }
}
