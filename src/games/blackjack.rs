//! One-shot blackjack.
//!
//! Hands are auto-played against a fixed strategy so a full round
//! settles from a single seed: every hand draws to hard 17, dealer
//! included. Cards come from an infinite shoe keyed off the seed, so
//! the round replays identically under verification.

use super::{GameEngine, Outcome, PlayContext};
use crate::errors::{CasinoError, CasinoResult};
use crate::hash_chain::Seed;
use sha2::{Digest, Sha256};

const STAND_AT: u8 = 17;

/// Deterministic infinite shoe.
struct Shoe<'a> {
    seed: &'a Seed,
    cursor: u32,
}

impl<'a> Shoe<'a> {
    fn new(seed: &'a Seed) -> Self {
        Self { seed, cursor: 0 }
    }

    /// Draws a card index 0..51.
    fn draw(&mut self) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.as_bytes());
        hasher.update(self.cursor.to_be_bytes());
        self.cursor += 1;
        let digest = hasher.finalize();
        digest[0] % 52
    }
}

/// Hard value of a card. Aces count 11 here; `hand_value` downgrades.
fn card_value(card: u8) -> u8 {
    match card % 13 {
        0 => 11,
        10 | 11 | 12 => 10,
        rank => rank + 1,
    }
}

fn hand_value(cards: &[u8]) -> u8 {
    let mut total: u8 = cards.iter().map(|c| card_value(*c)).sum();
    let mut soft_aces = cards.iter().filter(|c| *c % 13 == 0).count();
    while total > 21 && soft_aces > 0 {
        total -= 10;
        soft_aces -= 1;
    }
    total
}

fn is_natural(cards: &[u8]) -> bool {
    cards.len() == 2 && hand_value(cards) == 21
}

fn draw_hand(shoe: &mut Shoe) -> Vec<u8> {
    let mut cards = vec![shoe.draw(), shoe.draw()];
    while hand_value(&cards) < STAND_AT {
        cards.push(shoe.draw());
    }
    cards
}

#[derive(Default)]
pub struct BlackJack;

impl BlackJack {
    pub fn new() -> Self {
        Self
    }
}

impl GameEngine for BlackJack {
    fn name(&self) -> &'static str {
        "blackjack"
    }

    fn validate(&self, ctx: &PlayContext) -> CasinoResult<()> {
        for i in 0..ctx.bet_types.len() {
            if ctx.bet_types[i] != 0 {
                return Err(CasinoError::InvalidBet(format!(
                    "unknown bet type {}",
                    ctx.bet_types[i]
                )));
            }
            if ctx.bet_amounts[i] == 0 {
                return Err(CasinoError::ZeroAmount);
            }
        }
        Ok(())
    }

    fn necessary_balance(&self, ctx: &PlayContext) -> u64 {
        // Worst case is a natural on every hand at 5:2.
        ctx.bet_amounts.iter().map(|a| a * 5 / 2).sum()
    }

    fn play(&self, seed: &Seed, ctx: &PlayContext) -> Outcome {
        let mut shoe = Shoe::new(seed);

        // Seats draw in order, dealer last.
        let hands: Vec<Vec<u8>> = ctx.players.iter().map(|_| draw_hand(&mut shoe)).collect();
        let dealer = draw_hand(&mut shoe);
        let dealer_value = hand_value(&dealer);
        let dealer_bust = dealer_value > 21;
        let dealer_natural = is_natural(&dealer);

        let win_amounts = hands
            .iter()
            .zip(ctx.bet_amounts)
            .map(|(hand, amount)| {
                let value = hand_value(hand);
                if value > 21 {
                    0
                } else if is_natural(hand) && !dealer_natural {
                    amount * 5 / 2
                } else if dealer_bust || value > dealer_value {
                    amount * 2
                } else if value == dealer_value {
                    // Push returns the stake.
                    *amount
                } else {
                    0
                }
            })
            .collect();

        Outcome {
            number: dealer_value as u64,
            win_amounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_chain::{derive_seed, sha256};

    static ZERO_VALUES: [u64; 4] = [0; 4];

    fn ctx<'a>(players: &'a [String], amounts: &'a [u64], types: &'a [u8]) -> PlayContext<'a> {
        PlayContext {
            players,
            bet_types: types,
            bet_values: &ZERO_VALUES[..players.len()],
            bet_amounts: amounts,
        }
    }

    #[test]
    fn test_card_values() {
        assert_eq!(card_value(0), 11); // ace of clubs
        assert_eq!(card_value(1), 2);
        assert_eq!(card_value(9), 10); // ten
        assert_eq!(card_value(12), 10); // king
        assert_eq!(card_value(13), 11); // ace of the next suit
    }

    #[test]
    fn test_aces_downgrade() {
        // A + A + 9 = 11 + 1 + 9
        assert_eq!(hand_value(&[0, 13, 8]), 21);
        // A + K = natural
        assert_eq!(hand_value(&[0, 12]), 21);
        assert!(is_natural(&[0, 12]));
        // K + 5 + 9 busts
        assert_eq!(hand_value(&[12, 4, 8]), 24);
    }

    #[test]
    fn test_hands_stand_between_17_and_bust() {
        let seed = derive_seed(&sha256(b"deal"), 3, 9);
        let mut shoe = Shoe::new(&seed);
        for _ in 0..32 {
            let hand = draw_hand(&mut shoe);
            let value = hand_value(&hand);
            assert!(value >= STAND_AT);
            // Without the last card the hand was still below 17.
            assert!(hand_value(&hand[..hand.len() - 1]) < STAND_AT);
        }
    }

    #[test]
    fn test_necessary_balance_covers_naturals() {
        let players = vec!["p1".to_string(), "p2".to_string()];
        let c = ctx(&players, &[100, 40], &[0, 0]);
        assert_eq!(BlackJack::new().necessary_balance(&c), 250 + 100);
    }

    #[test]
    fn test_payouts_bounded_by_necessary_balance() {
        let game = BlackJack::new();
        let players = vec!["p1".to_string(), "p2".to_string(), "p3".to_string()];
        let amounts = [100u64, 250, 75];
        let c = ctx(&players, &amounts, &[0, 0, 0]);

        for round in 0u64..64 {
            let seed = derive_seed(&sha256(round.to_be_bytes()), 1, round);
            let outcome = game.play(&seed, &c);
            assert_eq!(outcome.win_amounts.len(), 3);
            assert!(outcome.total_payout() <= game.necessary_balance(&c));
            for (win, amount) in outcome.win_amounts.iter().zip(&amounts) {
                // Each hand pays 0, push, 2x or 5:2.
                assert!([0, *amount, amount * 2, amount * 5 / 2].contains(win));
            }
        }
    }

    #[test]
    fn test_play_is_deterministic() {
        let game = BlackJack::new();
        let players = vec!["p1".to_string()];
        let c = ctx(&players, &[50], &[0]);
        let seed = derive_seed(&sha256(b"deal"), 7, 7);
        assert_eq!(game.play(&seed, &c), game.play(&seed, &c));
    }
}
