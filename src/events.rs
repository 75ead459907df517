//! Settlement event log.
//!
//! Every state transition the treasury performs is recorded here and
//! mirrored to the tracing subscriber, so auditors can reconstruct the
//! full history of a deployment from either channel.

use crate::access::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CasinoEvent {
    CeoSet {
        previous: Address,
        new_ceo: Address,
    },
    WorkerSet {
        worker: Address,
    },
    GameAdded {
        game_id: u64,
        name: String,
    },
    GameEnabledSet {
        game_id: u64,
        enabled: bool,
    },
    /// A game's allocated balance changed (deposit, withdrawal or
    /// settlement).
    NewBalance {
        game_id: u64,
        token_symbol: String,
        new_balance: u64,
    },
    MaximumBetSet {
        game_id: u64,
        token_symbol: String,
        maximum_bet: u64,
    },
    TailSet {
        tail: String,
    },
    GameResult {
        game_id: u64,
        players: Vec<Address>,
        token_symbol: String,
        land_id: u64,
        machine_id: u64,
        number: u64,
        win_amounts: Vec<u64>,
    },
    MatchStarted {
        match_id: u64,
        players: Vec<Address>,
        stake: u64,
    },
    StakeRaised {
        match_id: u64,
        player: Address,
        total_staked: u64,
    },
    StakeDoubled {
        match_id: u64,
        player: Address,
        total_staked: u64,
    },
    MatchDropped {
        match_id: u64,
        dropper: Address,
        winner: Address,
        payout: u64,
    },
    MatchResolved {
        match_id: u64,
        winner: Address,
        payout: u64,
    },
    TreasuryMigrated {
        destination: Address,
    },
    TokensDistributed {
        player: Address,
        amount: u64,
    },
}

impl CasinoEvent {
    /// The wire tag of this event, as serialized in `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            CasinoEvent::CeoSet { .. } => "CeoSet",
            CasinoEvent::WorkerSet { .. } => "WorkerSet",
            CasinoEvent::GameAdded { .. } => "GameAdded",
            CasinoEvent::GameEnabledSet { .. } => "GameEnabledSet",
            CasinoEvent::NewBalance { .. } => "NewBalance",
            CasinoEvent::MaximumBetSet { .. } => "MaximumBetSet",
            CasinoEvent::TailSet { .. } => "TailSet",
            CasinoEvent::GameResult { .. } => "GameResult",
            CasinoEvent::MatchStarted { .. } => "MatchStarted",
            CasinoEvent::StakeRaised { .. } => "StakeRaised",
            CasinoEvent::StakeDoubled { .. } => "StakeDoubled",
            CasinoEvent::MatchDropped { .. } => "MatchDropped",
            CasinoEvent::MatchResolved { .. } => "MatchResolved",
            CasinoEvent::TreasuryMigrated { .. } => "TreasuryMigrated",
            CasinoEvent::TokensDistributed { .. } => "TokensDistributed",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: CasinoEvent,
}

/// Append-only in-memory event journal.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    entries: Vec<RecordedEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: CasinoEvent) {
        tracing::info!(target: "parlay::events", event = ?event, "event");
        self.entries.push(RecordedEvent {
            at: Utc::now(),
            event,
        });
    }

    pub fn entries(&self) -> &[RecordedEvent] {
        &self.entries
    }

    pub fn last(&self) -> Option<&CasinoEvent> {
        self.entries.last().map(|e| &e.event)
    }

    /// All recorded events with the given wire tag, in order.
    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a CasinoEvent> {
        self.entries
            .iter()
            .map(|e| &e.event)
            .filter(move |e| e.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
