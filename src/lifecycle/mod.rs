// Per-player match lifecycle: idle -> finding -> playing -> finished -> idle

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::escrow::settlement::pot;
use crate::types::{GameResult, HistoryItem, Match, MatchParams, PlayerId, SettlementResult};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    Finding,
    Playing,
    Finished,
}

impl LifecycleState {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Finding => "finding",
            LifecycleState::Playing => "playing",
            LifecycleState::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CurrentMatch {
    pub id: Uuid,                  // placeholder while finding, paired match id after
    pub params: MatchParams,
    pub opponent: Option<PlayerId>,
    pub start_time: DateTime<Utc>,
    pub result: Option<GameResult>,
    pub settlement: Option<SettlementResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchLifecycle {
    state: LifecycleState,
    current: Option<CurrentMatch>,
    history: Vec<HistoryItem>,     // newest first
}

impl Default for MatchLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchLifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            current: None,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn current(&self) -> Option<&CurrentMatch> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    fn require(&self, expected: LifecycleState, action: &'static str) -> CoreResult<()> {
        if self.state != expected {
            return Err(CoreError::IllegalTransition {
                state: self.state.name(),
                action,
            });
        }
        Ok(())
    }

    pub fn start_search(&mut self, params: MatchParams, placeholder_id: Uuid) -> CoreResult<()> {
        self.require(LifecycleState::Idle, "start a search")?;
        if params.stake <= rust_decimal::Decimal::ZERO {
            return Err(CoreError::InvalidStake(params.stake));
        }

        self.current = Some(CurrentMatch {
            id: placeholder_id,
            params,
            opponent: None,
            start_time: Utc::now(),
            result: None,
            settlement: None,
        });
        self.state = LifecycleState::Finding;
        Ok(())
    }

    pub fn cancel_search(&mut self) -> CoreResult<CurrentMatch> {
        self.require(LifecycleState::Finding, "cancel a search")?;
        let abandoned = self.current.take().ok_or(CoreError::IllegalTransition {
            state: self.state.name(),
            action: "cancel a search",
        })?;
        self.state = LifecycleState::Idle;
        Ok(abandoned)
    }

    pub fn opponent_found(&mut self, paired: &Match, self_id: &str) -> CoreResult<()> {
        self.require(LifecycleState::Finding, "attach an opponent")?;
        let illegal = CoreError::IllegalTransition {
            state: self.state.name(),
            action: "attach a match this player is not part of",
        };

        let opponent = paired.opponent_of(self_id).ok_or_else(|| illegal.clone())?.clone();
        let current = self.current.as_mut().ok_or(illegal)?;

        current.id = paired.id;
        current.opponent = Some(opponent);
        current.start_time = paired.start_time;
        self.state = LifecycleState::Playing;
        Ok(())
    }

    pub fn finish(&mut self, result: GameResult, settlement: SettlementResult) -> CoreResult<HistoryItem> {
        self.require(LifecycleState::Playing, "finish a match")?;
        let current = self.current.as_mut().ok_or(CoreError::IllegalTransition {
            state: LifecycleState::Playing.name(),
            action: "finish a match",
        })?;

        current.result = Some(result);
        current.settlement = Some(settlement);

        let item = HistoryItem {
            match_id: current.id,
            game: current.params.game,
            asset: current.params.asset,
            stake: current.params.stake,
            result,
            opponent: current.opponent.clone(),
            pot: pot(current.params.stake),
            fee: settlement.fee,
            payout: settlement.payout,
            net_profit: settlement.net_profit,
            timestamp: Utc::now(),
        };

        self.history.insert(0, item.clone());
        self.state = LifecycleState::Finished;
        Ok(item)
    }

    /// Clears the finished match; history is kept
    pub fn reset(&mut self) -> CoreResult<()> {
        self.require(LifecycleState::Finished, "reset")?;
        self.current = None;
        self.state = LifecycleState::Idle;
        Ok(())
    }
}
