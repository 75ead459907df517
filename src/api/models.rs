//! API request and response models.
//!
//! Digests travel as hex strings on the wire; everything else is the
//! core types' own serde encoding.

use crate::casino::PlaySettlement;
use crate::events::RecordedEvent;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub treasury_address: String,
    pub retired: bool,
    pub tail: Option<String>,
    pub games: Vec<GameSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: u64,
    pub name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub game_id: u64,
    pub token_symbol: String,
    pub allocated: u64,
    pub maximum_bet: u64,
}

/// One-shot play submission. `local_hash` is hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayBody {
    pub caller: String,
    pub game_id: u64,
    pub token_symbol: String,
    pub land_id: u64,
    pub machine_id: u64,
    pub players: Vec<String>,
    pub bet_types: Vec<u8>,
    pub bet_values: Vec<u64>,
    pub bet_amounts: Vec<u64>,
    pub local_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayResponse {
    #[serde(flatten)]
    pub settlement: PlaySettlement,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddGameBody {
    pub caller: String,
    pub name: String,
    /// One of "roulette", "slots", "blackjack", "backgammon".
    pub kind: String,
    #[serde(default)]
    pub maximum_bet: u64,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddGameResponse {
    pub game_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundsBody {
    pub caller: String,
    pub game_id: u64,
    pub token_symbol: String,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawMaxBody {
    pub caller: String,
    pub token_symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBalanceResponse {
    pub new_balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxBetBody {
    pub caller: String,
    pub game_id: u64,
    pub token_symbol: String,
    pub maximum_bet: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailBody {
    pub caller: String,
    /// Hex-encoded 32-byte digest.
    pub tail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerBody {
    pub caller: String,
    pub worker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMatchBody {
    pub caller: String,
    pub game_id: u64,
    pub token_symbol: String,
    pub stake: u64,
    pub players: [String; 2],
    #[serde(default)]
    pub wearables: [u64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartMatchResponse {
    pub match_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchActionBody {
    pub caller: String,
    pub game_id: u64,
    pub match_id: u64,
    pub player: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsResponse {
    pub player: String,
    pub points: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsResponse {
    pub events: Vec<RecordedEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
