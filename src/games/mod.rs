//! Game strategy modules.
//!
//! One-shot games (roulette, slots, blackjack) implement `GameEngine`:
//! pure bet validation, worst-case payout sizing, and deterministic
//! outcome computation from a seed. Backgammon is stateful and exposes
//! its own match lifecycle instead.

pub mod backgammon;
pub mod blackjack;
pub mod roulette;
pub mod slots;

pub use backgammon::BackgammonTable;
pub use blackjack::BlackJack;
pub use roulette::Roulette;
pub use slots::Slots;

use crate::access::Address;
use crate::errors::CasinoResult;
use crate::hash_chain::Seed;

/// Borrowed view of one play's bet arrays.
///
/// The arrays are parallel: entry `i` is player `i`'s bet.
#[derive(Clone, Copy, Debug)]
pub struct PlayContext<'a> {
    pub players: &'a [Address],
    pub bet_types: &'a [u8],
    pub bet_values: &'a [u64],
    pub bet_amounts: &'a [u64],
}

impl PlayContext<'_> {
    pub fn total_staked(&self) -> u64 {
        self.bet_amounts.iter().sum()
    }
}

/// Result of one play: the drawn number and the payout per bet entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub number: u64,
    pub win_amounts: Vec<u64>,
}

impl Outcome {
    pub fn total_payout(&self) -> u64 {
        self.win_amounts.iter().sum()
    }
}

/// One-shot game strategy.
pub trait GameEngine: Send {
    fn name(&self) -> &'static str;

    /// Checks bet shape and per-game betting rules. Pure.
    fn validate(&self, ctx: &PlayContext) -> CasinoResult<()>;

    /// Worst-case payout for these bets. The treasury refuses plays it
    /// could not cover at this bound.
    fn necessary_balance(&self, ctx: &PlayContext) -> u64;

    /// Computes the outcome for a seed. Pure and deterministic.
    fn play(&self, seed: &Seed, ctx: &PlayContext) -> Outcome;
}

/// A game bound to a treasury registration.
pub enum GameModule {
    Roulette(Roulette),
    Slots(Slots),
    BlackJack(BlackJack),
    Backgammon(BackgammonTable),
}

impl GameModule {
    pub fn name(&self) -> &'static str {
        match self {
            GameModule::Roulette(_) => "roulette",
            GameModule::Slots(_) => "slots",
            GameModule::BlackJack(_) => "blackjack",
            GameModule::Backgammon(_) => "backgammon",
        }
    }

    /// The one-shot engine, if this module is one.
    pub fn engine(&self) -> Option<&dyn GameEngine> {
        match self {
            GameModule::Roulette(g) => Some(g),
            GameModule::Slots(g) => Some(g),
            GameModule::BlackJack(g) => Some(g),
            GameModule::Backgammon(_) => None,
        }
    }

    pub fn slots_mut(&mut self) -> Option<&mut Slots> {
        match self {
            GameModule::Slots(slots) => Some(slots),
            _ => None,
        }
    }

    pub fn backgammon_mut(&mut self) -> Option<&mut BackgammonTable> {
        match self {
            GameModule::Backgammon(table) => Some(table),
            _ => None,
        }
    }

    pub fn backgammon(&self) -> Option<&BackgammonTable> {
        match self {
            GameModule::Backgammon(table) => Some(table),
            _ => None,
        }
    }
}

impl std::fmt::Debug for GameModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("GameModule").field(&self.name()).finish()
    }
}
