//! European roulette.
//!
//! Single zero, 37 pockets. Six bet kinds with fixed payout factors;
//! the wheel number is the seed reduced mod 37.

use super::{GameEngine, Outcome, PlayContext};
use crate::errors::{CasinoError, CasinoResult};
use crate::hash_chain::Seed;
use std::collections::HashMap;

/// Most bet entries a single play may carry.
pub const MAX_BETS_PER_PLAY: usize = 36;

/// Default cap on the aggregate amount riding on one square per play.
pub const DEFAULT_SQUARE_LIMIT: u64 = 4_000;

const RED_NUMBERS: [u64; 18] = [
    1, 3, 5, 7, 9, 12, 14, 16, 18, 19, 21, 23, 25, 27, 30, 32, 34, 36,
];

/// Bet grammar. The wire encoding is the discriminant byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BetKind {
    /// One number, 0..=36. Pays 36x.
    Single,
    /// 0 = even, 1 = odd. Zero loses both. Pays 2x.
    EvenOdd,
    /// 0 = red, 1 = black. Zero loses both. Pays 2x.
    RedBlack,
    /// 0 = low (1-18), 1 = high (19-36). Pays 2x.
    HighLow,
    /// Column 0..=2. Pays 3x.
    Column,
    /// Dozen 0..=2. Pays 3x.
    Dozen,
}

impl BetKind {
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(BetKind::Single),
            1 => Some(BetKind::EvenOdd),
            2 => Some(BetKind::RedBlack),
            3 => Some(BetKind::HighLow),
            4 => Some(BetKind::Column),
            5 => Some(BetKind::Dozen),
            _ => None,
        }
    }

    pub fn payout_factor(&self) -> u64 {
        match self {
            BetKind::Single => 36,
            BetKind::EvenOdd | BetKind::RedBlack | BetKind::HighLow => 2,
            BetKind::Column | BetKind::Dozen => 3,
        }
    }

    fn max_value(&self) -> u64 {
        match self {
            BetKind::Single => 36,
            BetKind::EvenOdd | BetKind::RedBlack | BetKind::HighLow => 1,
            BetKind::Column | BetKind::Dozen => 2,
        }
    }

    fn hits(&self, value: u64, number: u64) -> bool {
        match self {
            BetKind::Single => number == value,
            BetKind::EvenOdd => number != 0 && number % 2 == value % 2,
            BetKind::RedBlack => {
                let red = RED_NUMBERS.contains(&number);
                number != 0 && ((value == 0 && red) || (value == 1 && !red))
            }
            BetKind::HighLow => {
                (value == 0 && (1..=18).contains(&number))
                    || (value == 1 && (19..=36).contains(&number))
            }
            BetKind::Column => number != 0 && (number - 1) % 3 == value,
            BetKind::Dozen => number != 0 && (number - 1) / 12 == value,
        }
    }
}

pub struct Roulette {
    square_limit: u64,
}

impl Roulette {
    pub fn new(square_limit: u64) -> Self {
        Self { square_limit }
    }

    pub fn square_limit(&self) -> u64 {
        self.square_limit
    }
}

impl Default for Roulette {
    fn default() -> Self {
        Self::new(DEFAULT_SQUARE_LIMIT)
    }
}

impl GameEngine for Roulette {
    fn name(&self) -> &'static str {
        "roulette"
    }

    fn validate(&self, ctx: &PlayContext) -> CasinoResult<()> {
        if ctx.bet_types.len() > MAX_BETS_PER_PLAY {
            return Err(CasinoError::InvalidBet(format!(
                "at most {} bets per play, got {}",
                MAX_BETS_PER_PLAY,
                ctx.bet_types.len()
            )));
        }

        // Aggregate cap per square: the combined amount riding on one
        // (kind, value) pair within a play is bounded, and a breach
        // rejects the whole play.
        let mut squares: HashMap<(BetKind, u64), u64> = HashMap::new();
        for i in 0..ctx.bet_types.len() {
            let kind = BetKind::from_u8(ctx.bet_types[i]).ok_or_else(|| {
                CasinoError::InvalidBet(format!("unknown bet type {}", ctx.bet_types[i]))
            })?;
            let value = ctx.bet_values[i];
            if value > kind.max_value() {
                return Err(CasinoError::InvalidBet(format!(
                    "bet value {} out of range for {:?}",
                    value, kind
                )));
            }
            if ctx.bet_amounts[i] == 0 {
                return Err(CasinoError::ZeroAmount);
            }
            let riding = squares.entry((kind, value)).or_insert(0);
            *riding += ctx.bet_amounts[i];
            if *riding > self.square_limit {
                return Err(CasinoError::InvalidBet(format!(
                    "square ({:?}, {}) exceeds the per-play limit of {}",
                    kind, value, self.square_limit
                )));
            }
        }
        Ok(())
    }

    fn necessary_balance(&self, ctx: &PlayContext) -> u64 {
        ctx.bet_types
            .iter()
            .zip(ctx.bet_amounts)
            .map(|(ty, amount)| {
                BetKind::from_u8(*ty)
                    .map(|k| k.payout_factor() * amount)
                    .unwrap_or(0)
            })
            .sum()
    }

    fn play(&self, seed: &Seed, ctx: &PlayContext) -> Outcome {
        let number = seed.number(37);
        let win_amounts = ctx
            .bet_types
            .iter()
            .zip(ctx.bet_values)
            .zip(ctx.bet_amounts)
            .map(|((ty, value), amount)| match BetKind::from_u8(*ty) {
                Some(kind) if kind.hits(*value, number) => kind.payout_factor() * amount,
                _ => 0,
            })
            .collect();
        Outcome {
            number,
            win_amounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        players: &'a [String],
        types: &'a [u8],
        values: &'a [u64],
        amounts: &'a [u64],
    ) -> PlayContext<'a> {
        PlayContext {
            players,
            bet_types: types,
            bet_values: values,
            bet_amounts: amounts,
        }
    }

    #[test]
    fn test_single_number_pays_36x() {
        let kind = BetKind::Single;
        assert!(kind.hits(17, 17));
        assert!(!kind.hits(17, 16));
        assert_eq!(kind.payout_factor(), 36);
        // Zero is a number like any other for a straight-up bet.
        assert!(kind.hits(0, 0));
    }

    #[test]
    fn test_zero_loses_every_outside_bet() {
        for (kind, value) in [
            (BetKind::EvenOdd, 0),
            (BetKind::EvenOdd, 1),
            (BetKind::RedBlack, 0),
            (BetKind::RedBlack, 1),
            (BetKind::HighLow, 0),
            (BetKind::HighLow, 1),
            (BetKind::Column, 0),
            (BetKind::Dozen, 0),
        ] {
            assert!(!kind.hits(value, 0), "{:?}/{} must lose on zero", kind, value);
        }
    }

    #[test]
    fn test_outside_bets() {
        assert!(BetKind::EvenOdd.hits(0, 14)); // even
        assert!(BetKind::EvenOdd.hits(1, 9)); // odd
        assert!(BetKind::RedBlack.hits(0, 32)); // red
        assert!(BetKind::RedBlack.hits(1, 33)); // black
        assert!(BetKind::HighLow.hits(0, 18));
        assert!(BetKind::HighLow.hits(1, 19));
        assert!(!BetKind::HighLow.hits(0, 19));
    }

    #[test]
    fn test_columns_and_dozens() {
        // First column is 1, 4, 7, ... 34.
        assert!(BetKind::Column.hits(0, 1));
        assert!(BetKind::Column.hits(0, 34));
        assert!(BetKind::Column.hits(2, 36));
        assert!(!BetKind::Column.hits(1, 1));
        assert_eq!(BetKind::Column.payout_factor(), 3);

        assert!(BetKind::Dozen.hits(0, 12));
        assert!(BetKind::Dozen.hits(1, 13));
        assert!(BetKind::Dozen.hits(2, 36));
        assert!(!BetKind::Dozen.hits(2, 24));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let roulette = Roulette::default();
        let players = vec!["p1".to_string()];
        let c = ctx(&players, &[0], &[37], &[10]);
        assert!(matches!(
            roulette.validate(&c),
            Err(CasinoError::InvalidBet(_))
        ));
        let c = ctx(&players, &[6], &[0], &[10]);
        assert!(matches!(
            roulette.validate(&c),
            Err(CasinoError::InvalidBet(_))
        ));
    }

    #[test]
    fn test_validate_enforces_square_limit() {
        let roulette = Roulette::new(4_000);
        let players: Vec<String> = (0..3).map(|i| format!("p{}", i)).collect();
        // Three bets on the same square totalling 4001.
        let c = ctx(
            &players,
            &[0, 0, 0],
            &[17, 17, 17],
            &[2_000, 1_500, 501],
        );
        assert!(matches!(
            roulette.validate(&c),
            Err(CasinoError::InvalidBet(_))
        ));
        // Exactly at the limit passes.
        let c = ctx(&players, &[0, 0, 0], &[17, 17, 17], &[2_000, 1_500, 500]);
        assert!(roulette.validate(&c).is_ok());
        // Different squares are capped independently.
        let c = ctx(&players, &[0, 0, 0], &[17, 18, 19], &[4_000, 4_000, 4_000]);
        assert!(roulette.validate(&c).is_ok());
    }

    #[test]
    fn test_validate_rejects_oversize_plays() {
        let roulette = Roulette::default();
        let players: Vec<String> = (0..37).map(|i| format!("p{}", i)).collect();
        let types = vec![0u8; 37];
        let values: Vec<u64> = (0..37).collect();
        let amounts = vec![1u64; 37];
        let c = ctx(&players, &types, &values, &amounts);
        assert!(matches!(
            roulette.validate(&c),
            Err(CasinoError::InvalidBet(_))
        ));
    }

    #[test]
    fn test_necessary_balance_is_worst_case() {
        let roulette = Roulette::default();
        let players: Vec<String> = (0..2).map(|i| format!("p{}", i)).collect();
        let c = ctx(&players, &[0, 3], &[17, 1], &[100, 200]);
        assert_eq!(roulette.necessary_balance(&c), 100 * 36 + 200 * 2);
    }

    #[test]
    fn test_play_pays_only_hits() {
        use crate::hash_chain::{derive_seed, sha256};

        let roulette = Roulette::default();
        let players: Vec<String> = (0..37).map(|i| format!("p{}", i)).collect();
        // One straight-up bet per pocket: exactly one must win 36x.
        let types = vec![0u8; 36];
        let values: Vec<u64> = (0..36).collect();
        let amounts = vec![10u64; 36];
        let c = ctx(&players[..36], &types, &values, &amounts);

        let seed = derive_seed(&sha256(b"spin"), 1, 1);
        let outcome = roulette.play(&seed, &c);
        assert!(outcome.number < 37);
        let winners: Vec<_> = outcome.win_amounts.iter().filter(|w| **w > 0).collect();
        if outcome.number < 36 {
            assert_eq!(winners, vec![&360]);
            assert_eq!(outcome.win_amounts[outcome.number as usize], 360);
        } else {
            // Pocket 36 was left uncovered.
            assert!(winners.is_empty());
        }
    }
}
