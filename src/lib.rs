//! Parlay: a custodial casino treasury and game-settlement engine.
//!
//! A single treasury custodies player tokens across every registered
//! game, meters randomness through a hash-chain commitment, settles
//! one-shot games (roulette, slots, blackjack) atomically and escrows
//! stateful backgammon matches, with a loyalty-point side-ledger
//! accruing on wagered volume.

pub mod access;
pub mod api;
pub mod casino;
pub mod config;
pub mod errors;
pub mod events;
pub mod games;
pub mod hash_chain;
pub mod pointer;
pub mod token;
pub mod treasury;

pub use access::{AccessControl, Address, Role};
pub use casino::{Casino, PlayRequest, PlaySettlement};
pub use config::CasinoConfig;
pub use errors::{CasinoError, CasinoResult};
pub use events::{CasinoEvent, EventLog};
pub use games::{GameEngine, GameModule};
pub use hash_chain::{chain_from_secret, derive_seed, Digest32, HashChain, Seed};
pub use token::{MemoryToken, TokenHandle, TokenLedger, TokenRegistry};
pub use treasury::{GameBalance, GameRecord, MigrationReport, Treasury};
