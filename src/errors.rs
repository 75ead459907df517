//! Error types for the Parlay settlement engine.
//!
//! Each subsystem declares its own error enum next to its module; this
//! root enum ties them together so every operation can return a single
//! `CasinoResult`.

use crate::config::ConfigError;
use crate::token::TokenError;
use thiserror::Error;

/// Root error type for all treasury and settlement operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CasinoError {
    /// Caller does not hold the role the operation requires.
    #[error("Access denied: operation requires the {required} role")]
    AccessDenied { required: &'static str },

    /// The treasury instance has been migrated away and is terminal.
    #[error("Treasury retired: state was migrated to a successor instance")]
    TreasuryRetired,

    /// No game registered under this identifier.
    #[error("Unknown game id {0}")]
    UnknownGame(u64),

    /// Game is registered but currently disabled for play.
    #[error("Game {0} is disabled")]
    GameDisabled(u64),

    /// Token symbol is not registered with the treasury.
    #[error("Unknown token symbol '{0}'")]
    UnknownToken(String),

    /// A symbol binding already exists and bindings are immutable.
    #[error("Token symbol '{0}' is already registered")]
    DuplicateToken(String),

    /// A game with the same name is already registered.
    #[error("Game '{0}' is already registered")]
    DuplicateGame(String),

    /// Deposits, withdrawals and bets must move a positive amount.
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    /// The bet arrays are malformed for the target game.
    #[error("Invalid bet: {0}")]
    InvalidBet(String),

    /// A single bet exceeds the per-game maximum.
    #[error("Bet {bet} exceeds the maximum of {maximum}")]
    BetExceedsMaximum { bet: u64, maximum: u64 },

    /// The game's allocated funds cannot cover the worst-case payout.
    #[error("Insufficient funds: need {needed}, allocated {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Submitted local hash is not the pre-image of the stored tail.
    #[error("Hash chain violation: submitted hash does not extend the tail")]
    HashChainViolation,

    /// No backgammon match with this identifier.
    #[error("Unknown match id {0}")]
    UnknownMatch(u64),

    /// The match is not in a state that permits this transition.
    #[error("Match {match_id} does not permit this action in its current state")]
    InvalidMatchState { match_id: u64 },

    /// The named player is not a participant of the match.
    #[error("Player '{player}' is not part of match {match_id}")]
    NotAParticipant { player: String, match_id: u64 },

    /// Migration preconditions were not met; nothing was moved.
    #[error("Migration rejected: {0}")]
    MigrationRejected(String),

    /// Loyalty point accrual or distribution gate rejected the call.
    #[error("Points operation rejected: {0}")]
    PointsRejected(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias used throughout the crate.
pub type CasinoResult<T> = Result<T, CasinoError>;
