//! Backgammon match ledger.
//!
//! Unlike the one-shot games, a backgammon match is a multi-step
//! escrow: both players post the stake up front, the doubling cube can
//! raise it mid-game, and the pot pays out on resolution or forfeit.
//! This module tracks only match state; fund movement is the
//! orchestrator's job.

use crate::access::Address;
use crate::errors::{CasinoError, CasinoResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Match in progress; either player may raise the cube.
    Active,
    /// `raiser` doubled; the opponent must call or drop.
    Doubled { raiser: Address },
    /// Finished by play. Terminal.
    Resolved { winner: Address },
    /// Opponent declined a double; the raiser took the pot. Terminal.
    Dropped { winner: Address },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BgMatch {
    pub id: u64,
    pub players: [Address; 2],
    /// Current per-player stake unit.
    pub stake: u64,
    /// Pot held in treasury custody.
    pub total_staked: u64,
    pub phase: MatchPhase,
    pub token_symbol: String,
}

impl BgMatch {
    pub fn is_participant(&self, player: &Address) -> bool {
        self.players.iter().any(|p| p == player)
    }

    pub fn opponent_of(&self, player: &Address) -> Option<&Address> {
        match &self.players {
            [a, b] if a == player => Some(b),
            [a, b] if b == player => Some(a),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self.phase,
            MatchPhase::Resolved { .. } | MatchPhase::Dropped { .. }
        )
    }
}

/// All matches for one backgammon game registration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BackgammonTable {
    matches: BTreeMap<u64, BgMatch>,
    next_id: u64,
}

impl BackgammonTable {
    pub fn new() -> Self {
        Self {
            matches: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn get(&self, match_id: u64) -> CasinoResult<&BgMatch> {
        self.matches
            .get(&match_id)
            .ok_or(CasinoError::UnknownMatch(match_id))
    }

    fn get_mut(&mut self, match_id: u64) -> CasinoResult<&mut BgMatch> {
        self.matches
            .get_mut(&match_id)
            .ok_or(CasinoError::UnknownMatch(match_id))
    }

    pub fn matches(&self) -> impl Iterator<Item = &BgMatch> {
        self.matches.values()
    }

    /// Opens a match. Both players are assumed to have posted `stake`
    /// each, so the pot starts at twice the stake.
    pub fn start(
        &mut self,
        player_a: Address,
        player_b: Address,
        stake: u64,
        token_symbol: String,
    ) -> CasinoResult<u64> {
        if stake == 0 {
            return Err(CasinoError::ZeroAmount);
        }
        if player_a == player_b {
            return Err(CasinoError::InvalidBet(
                "a match needs two distinct players".to_string(),
            ));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.matches.insert(
            id,
            BgMatch {
                id,
                players: [player_a, player_b],
                stake,
                total_staked: stake * 2,
                phase: MatchPhase::Active,
                token_symbol,
            },
        );
        Ok(id)
    }

    /// A participant offers a double, posting one more stake unit into
    /// the pot. Returns the amount the raiser must post.
    pub fn raise(&mut self, match_id: u64, raiser: &Address) -> CasinoResult<u64> {
        let m = self.get_mut(match_id)?;
        if !m.is_participant(raiser) {
            return Err(CasinoError::NotAParticipant {
                player: raiser.clone(),
                match_id,
            });
        }
        if m.phase != MatchPhase::Active {
            return Err(CasinoError::InvalidMatchState { match_id });
        }
        let posted = m.stake;
        m.total_staked += posted;
        m.phase = MatchPhase::Doubled {
            raiser: raiser.clone(),
        };
        Ok(posted)
    }

    /// The opponent accepts the double, matching the raiser's post.
    /// The per-player stake doubles and play continues. Returns the
    /// amount the caller must post.
    pub fn call(&mut self, match_id: u64, caller: &Address) -> CasinoResult<u64> {
        let m = self.get_mut(match_id)?;
        if !m.is_participant(caller) {
            return Err(CasinoError::NotAParticipant {
                player: caller.clone(),
                match_id,
            });
        }
        match &m.phase {
            MatchPhase::Doubled { raiser } if raiser != caller => {
                let posted = m.stake;
                m.total_staked += posted;
                m.stake *= 2;
                m.phase = MatchPhase::Active;
                Ok(posted)
            }
            _ => Err(CasinoError::InvalidMatchState { match_id }),
        }
    }

    /// The opponent declines the double and forfeits the pot to the
    /// raiser. Returns the winner and the pot.
    pub fn drop_game(&mut self, match_id: u64, dropper: &Address) -> CasinoResult<(Address, u64)> {
        let m = self.get_mut(match_id)?;
        if !m.is_participant(dropper) {
            return Err(CasinoError::NotAParticipant {
                player: dropper.clone(),
                match_id,
            });
        }
        match m.phase.clone() {
            MatchPhase::Doubled { raiser } if &raiser != dropper => {
                let payout = m.total_staked;
                m.phase = MatchPhase::Dropped {
                    winner: raiser.clone(),
                };
                Ok((raiser, payout))
            }
            _ => Err(CasinoError::InvalidMatchState { match_id }),
        }
    }

    /// Records the finished game and releases the pot to the winner.
    /// Only an active match (no pending double) may resolve.
    pub fn resolve(&mut self, match_id: u64, winner: &Address) -> CasinoResult<u64> {
        let m = self.get_mut(match_id)?;
        if !m.is_participant(winner) {
            return Err(CasinoError::NotAParticipant {
                player: winner.clone(),
                match_id,
            });
        }
        if m.phase != MatchPhase::Active {
            return Err(CasinoError::InvalidMatchState { match_id });
        }
        let payout = m.total_staked;
        m.phase = MatchPhase::Resolved {
            winner: winner.clone(),
        };
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.to_string()
    }

    fn table_with_match(stake: u64) -> (BackgammonTable, u64) {
        let mut table = BackgammonTable::new();
        let id = table
            .start(addr("p1"), addr("p2"), stake, "PLAY".to_string())
            .unwrap();
        (table, id)
    }

    #[test]
    fn test_start_posts_both_stakes() {
        let (table, id) = table_with_match(100);
        let m = table.get(id).unwrap();
        assert_eq!(m.total_staked, 200);
        assert_eq!(m.stake, 100);
        assert_eq!(m.phase, MatchPhase::Active);
    }

    #[test]
    fn test_start_rejects_degenerate_matches() {
        let mut table = BackgammonTable::new();
        assert_eq!(
            table.start(addr("p1"), addr("p2"), 0, "PLAY".to_string()),
            Err(CasinoError::ZeroAmount)
        );
        assert!(table
            .start(addr("p1"), addr("p1"), 10, "PLAY".to_string())
            .is_err());
    }

    #[test]
    fn test_raise_then_call_doubles_the_cube() {
        let (mut table, id) = table_with_match(100);

        let posted = table.raise(id, &addr("p1")).unwrap();
        assert_eq!(posted, 100);
        assert_eq!(table.get(id).unwrap().total_staked, 300);

        let posted = table.call(id, &addr("p2")).unwrap();
        assert_eq!(posted, 100);
        let m = table.get(id).unwrap();
        assert_eq!(m.total_staked, 400);
        assert_eq!(m.stake, 200);
        assert_eq!(m.phase, MatchPhase::Active);
    }

    #[test]
    fn test_raiser_cannot_call_own_double() {
        let (mut table, id) = table_with_match(100);
        table.raise(id, &addr("p1")).unwrap();
        assert_eq!(
            table.call(id, &addr("p1")),
            Err(CasinoError::InvalidMatchState { match_id: id })
        );
    }

    #[test]
    fn test_drop_forfeits_pot_to_raiser() {
        let (mut table, id) = table_with_match(100);
        table.raise(id, &addr("p2")).unwrap();
        let (winner, payout) = table.drop_game(id, &addr("p1")).unwrap();
        assert_eq!(winner, addr("p2"));
        assert_eq!(payout, 300);
        assert!(table.get(id).unwrap().is_finished());
    }

    #[test]
    fn test_resolve_requires_settled_cube() {
        let (mut table, id) = table_with_match(100);
        table.raise(id, &addr("p1")).unwrap();
        // Pending double blocks resolution.
        assert_eq!(
            table.resolve(id, &addr("p1")),
            Err(CasinoError::InvalidMatchState { match_id: id })
        );
        table.call(id, &addr("p2")).unwrap();
        let payout = table.resolve(id, &addr("p2")).unwrap();
        assert_eq!(payout, 400);
    }

    #[test]
    fn test_terminal_matches_reject_everything() {
        let (mut table, id) = table_with_match(50);
        table.resolve(id, &addr("p1")).unwrap();
        assert!(table.raise(id, &addr("p1")).is_err());
        assert!(table.resolve(id, &addr("p2")).is_err());
    }

    #[test]
    fn test_outsiders_rejected() {
        let (mut table, id) = table_with_match(50);
        assert_eq!(
            table.raise(id, &addr("mallory")),
            Err(CasinoError::NotAParticipant {
                player: addr("mallory"),
                match_id: id,
            })
        );
        assert!(table.resolve(id, &addr("mallory")).is_err());
    }

    #[test]
    fn test_unknown_match() {
        let table = BackgammonTable::new();
        assert_eq!(table.get(9).unwrap_err(), CasinoError::UnknownMatch(9));
    }
}
