// Shared storage for the matchmaking queue and the match table

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::{Match, MatchOutcome, MatchParams, MatchStatus, QueueEntry};

// Store factory and trait
pub mod factory;
pub use factory::{create_store, create_test_store, StoreTrait};

// In-memory store; each method is one critical section
// Lock order when both are needed: queue, then matches
pub struct MemoryStore {
    queue: RwLock<HashMap<MatchParams, Vec<QueueEntry>>>, // bucket -> entries in arrival order
    matches: RwLock<HashMap<Uuid, Match>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            queue: RwLock::new(HashMap::new()),
            matches: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert_queue_entry(&self, entry: &QueueEntry) -> Result<bool> {
        let mut queue = self.queue.write()
            .map_err(|e| anyhow!("Failed to acquire write lock on queue: {}", e))?;
        let bucket = queue.entry(entry.params.clone()).or_default();

        if bucket.iter().any(|e| e.player_id == entry.player_id) {
            return Ok(false);
        }
        bucket.push(entry.clone());
        Ok(true)
    }

    pub async fn remove_queue_entry(&self, params: &MatchParams, player_id: &str) -> Result<bool> {
        let mut queue = self.queue.write()
            .map_err(|e| anyhow!("Failed to acquire write lock on queue: {}", e))?;

        let Some(bucket) = queue.get_mut(params) else {
            return Ok(false);
        };
        let before = bucket.len();
        bucket.retain(|e| e.player_id != player_id);
        let removed = bucket.len() != before;

        if bucket.is_empty() {
            queue.remove(params);
        }
        Ok(removed)
    }

    /// Pops the oldest entry in `params` belonging to someone other than
    /// `player_id`, drops the caller's own entry and records the new match,
    /// all under the queue lock.
    pub async fn claim_match(&self, params: &MatchParams, player_id: &str, match_id: Uuid) -> Result<Option<Match>> {
        let mut queue = self.queue.write()
            .map_err(|e| anyhow!("Failed to acquire write lock on queue: {}", e))?;

        let Some(bucket) = queue.get_mut(params) else {
            return Ok(None);
        };
        let Some(index) = bucket.iter().position(|e| e.player_id != player_id) else {
            return Ok(None);
        };

        let opponent = bucket.remove(index);
        bucket.retain(|e| e.player_id != player_id);
        if bucket.is_empty() {
            queue.remove(params);
        }

        let new_match = Match {
            id: match_id,
            game: params.game,
            asset: params.asset,
            stake: params.stake,
            status: MatchStatus::Active,
            players: [opponent.player_id, player_id.to_string()],
            start_time: Utc::now(),
            result: None,
            payout: None,
            fee: None,
        };

        let mut matches = self.matches.write()
            .map_err(|e| anyhow!("Failed to acquire write lock on matches: {}", e))?;
        matches.insert(new_match.id, new_match.clone());
        Ok(Some(new_match))
    }

    pub async fn get_queue_entries(&self, params: &MatchParams) -> Result<Vec<QueueEntry>> {
        let queue = self.queue.read()
            .map_err(|e| anyhow!("Failed to acquire read lock on queue: {}", e))?;
        Ok(queue.get(params).cloned().unwrap_or_default())
    }

    pub async fn remove_stale_entries(&self, cutoff: DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        let mut queue = self.queue.write()
            .map_err(|e| anyhow!("Failed to acquire write lock on queue: {}", e))?;

        let mut removed = Vec::new();
        for bucket in queue.values_mut() {
            let (stale, fresh): (Vec<_>, Vec<_>) = bucket.drain(..).partition(|e| e.enqueued_at < cutoff);
            removed.extend(stale);
            *bucket = fresh;
        }
        queue.retain(|_, bucket| !bucket.is_empty());
        Ok(removed)
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>> {
        let matches = self.matches.read()
            .map_err(|e| anyhow!("Failed to acquire read lock on matches: {}", e))?;
        Ok(matches.get(&match_id).cloned())
    }

    pub async fn find_match_for_player(&self, player_id: &str, active_only: bool) -> Result<Option<Match>> {
        let matches = self.matches.read()
            .map_err(|e| anyhow!("Failed to acquire read lock on matches: {}", e))?;
        Ok(matches.values()
            .filter(|m| m.has_player(player_id))
            .filter(|m| !active_only || m.status == MatchStatus::Active)
            .min_by_key(|m| (m.start_time, m.id))
            .cloned())
    }

    /// Earliest match for the player that started at or after `since`
    pub async fn find_match_since(&self, player_id: &str, since: DateTime<Utc>) -> Result<Option<Match>> {
        let matches = self.matches.read()
            .map_err(|e| anyhow!("Failed to acquire read lock on matches: {}", e))?;
        Ok(matches.values()
            .filter(|m| m.has_player(player_id) && m.start_time >= since)
            .min_by_key(|m| (m.start_time, m.id))
            .cloned())
    }

    pub async fn finish_match(
        &self,
        match_id: Uuid,
        outcome: MatchOutcome,
        payout: Decimal,
        fee: Decimal,
    ) -> Result<bool> {
        let mut matches = self.matches.write()
            .map_err(|e| anyhow!("Failed to acquire write lock on matches: {}", e))?;

        match matches.get_mut(&match_id) {
            Some(m) if m.status == MatchStatus::Active => {
                m.status = MatchStatus::Finished;
                m.result = Some(outcome);
                m.payout = Some(payout);
                m.fee = Some(fee);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(anyhow!("Match {} not found", match_id)),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}
