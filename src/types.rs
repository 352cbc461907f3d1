// Core types for the SkillBlitz match service

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = String;

/// Stake shortcuts offered by the lobby
pub const STAKE_PRESETS: [u32; 4] = [5, 20, 50, 100];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Asset {
    USDT,
    ETH,
    TON,
}

impl Asset {
    pub const ALL: [Asset; 3] = [Asset::USDT, Asset::ETH, Asset::TON];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::USDT => "USDT",
            Asset::ETH => "ETH",
            Asset::TON => "TON",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl std::str::FromStr for Asset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USDT" => Ok(Asset::USDT),
            "ETH" => Ok(Asset::ETH),
            "TON" => Ok(Asset::TON),
            other => Err(format!("Unknown asset: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Game {
    Chess,
    Tetris,
    Checkers,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Game::Chess => "Chess",
            Game::Tetris => "Tetris",
            Game::Checkers => "Checkers",
        };
        f.write_str(name)
    }
}

/// Matching key: two players are compatible iff their params are equal
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MatchParams {
    pub game: Game,
    pub asset: Asset,
    pub stake: Decimal,
}

impl MatchParams {
    pub fn new(game: Game, asset: Asset, stake: Decimal) -> Self {
        // normalize so 20 and 20.00 land in the same bucket
        Self { game, asset, stake: stake.normalize() }
    }
}

impl fmt::Display for MatchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.game, self.asset, self.stake)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueEntry {
    pub params: MatchParams,
    pub player_id: PlayerId,
    pub search_id: Uuid,           // placeholder id of the search that queued it
    pub enqueued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Active,
    Finished,
}

/// Result reported by one player's game UI
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    Win,
    Loss,
    Draw,
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameResult::Win => "win",
            GameResult::Loss => "loss",
            GameResult::Draw => "draw",
        };
        f.write_str(name)
    }
}

/// Match-level outcome, independent of who reported it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "player_id", rename_all = "snake_case")]
pub enum MatchOutcome {
    Winner(PlayerId),
    Draw,
}

impl MatchOutcome {
    /// The outcome as seen by one of the match's players
    pub fn result_for(&self, player_id: &str) -> GameResult {
        match self {
            MatchOutcome::Winner(winner) if winner == player_id => GameResult::Win,
            MatchOutcome::Winner(_) => GameResult::Loss,
            MatchOutcome::Draw => GameResult::Draw,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub game: Game,
    pub asset: Asset,
    pub stake: Decimal,
    pub status: MatchStatus,
    pub players: [PlayerId; 2],    // [waiting side, initiating side]
    pub start_time: DateTime<Utc>,
    pub result: Option<MatchOutcome>,
    pub payout: Option<Decimal>,   // winner payout, or per-player draw payout
    pub fee: Option<Decimal>,
}

impl Match {
    pub fn params(&self) -> MatchParams {
        MatchParams::new(self.game, self.asset, self.stake)
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&PlayerId> {
        match &self.players {
            [a, b] if a == player_id => Some(b),
            [a, b] if b == player_id => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SettlementResult {
    pub payout: Decimal,
    pub fee: Decimal,
    pub net_profit: Decimal,       // payout - stake
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryItem {
    pub match_id: Uuid,
    pub game: Game,
    pub asset: Asset,
    pub stake: Decimal,
    pub result: GameResult,
    pub opponent: Option<PlayerId>,
    pub pot: Decimal,
    pub fee: Decimal,
    pub payout: Decimal,
    pub net_profit: Decimal,
    pub timestamp: DateTime<Utc>,
}

// API Request/Response types
#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub player_id: PlayerId,
}

#[derive(Debug, Deserialize)]
pub struct StartMatchRequest {
    pub player_id: PlayerId,
    pub game: Game,
    pub asset: Asset,
    pub stake: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ReportResultRequest {
    pub player_id: PlayerId,
    pub result: GameResult,
}

// WebSocket message types
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServiceEvent {
    MatchFound {
        match_id: Uuid,
        players: [PlayerId; 2],
        params: MatchParams,
    },
    MatchSettled {
        match_id: Uuid,
        player_id: PlayerId,
        result: GameResult,
        settlement: SettlementResult,
    },
    QueueEntryExpired {
        player_id: PlayerId,
        params: MatchParams,
    },
}
