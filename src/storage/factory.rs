// Store trait and factory
// The in-memory store is the only backend; the trait is the seam for a real broker

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use super::MemoryStore;
use crate::types::{Match, MatchOutcome, MatchParams, QueueEntry};

#[async_trait::async_trait]
pub trait StoreTrait: Send + Sync {
    // Queue operations
    async fn insert_queue_entry(&self, entry: &QueueEntry) -> Result<bool>;
    async fn remove_queue_entry(&self, params: &MatchParams, player_id: &str) -> Result<bool>;
    /// Must be atomic: a waiting entry is consumed by at most one match, and
    /// the match is visible to `find_match_for_player` once the entry is gone
    async fn claim_match(&self, params: &MatchParams, player_id: &str, match_id: Uuid) -> Result<Option<Match>>;
    async fn get_queue_entries(&self, params: &MatchParams) -> Result<Vec<QueueEntry>>;
    async fn remove_stale_entries(&self, cutoff: DateTime<Utc>) -> Result<Vec<QueueEntry>>;

    // Match operations
    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>>;
    async fn find_match_for_player(&self, player_id: &str, active_only: bool) -> Result<Option<Match>>;
    async fn find_match_since(&self, player_id: &str, since: DateTime<Utc>) -> Result<Option<Match>>;
    async fn finish_match(&self, match_id: Uuid, outcome: MatchOutcome, payout: Decimal, fee: Decimal) -> Result<bool>;
}

#[async_trait::async_trait]
impl StoreTrait for MemoryStore {
    async fn insert_queue_entry(&self, entry: &QueueEntry) -> Result<bool> {
        self.insert_queue_entry(entry).await
    }

    async fn remove_queue_entry(&self, params: &MatchParams, player_id: &str) -> Result<bool> {
        self.remove_queue_entry(params, player_id).await
    }

    async fn claim_match(&self, params: &MatchParams, player_id: &str, match_id: Uuid) -> Result<Option<Match>> {
        self.claim_match(params, player_id, match_id).await
    }

    async fn get_queue_entries(&self, params: &MatchParams) -> Result<Vec<QueueEntry>> {
        self.get_queue_entries(params).await
    }

    async fn remove_stale_entries(&self, cutoff: DateTime<Utc>) -> Result<Vec<QueueEntry>> {
        self.remove_stale_entries(cutoff).await
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>> {
        self.get_match(match_id).await
    }

    async fn find_match_for_player(&self, player_id: &str, active_only: bool) -> Result<Option<Match>> {
        self.find_match_for_player(player_id, active_only).await
    }

    async fn find_match_since(&self, player_id: &str, since: DateTime<Utc>) -> Result<Option<Match>> {
        self.find_match_since(player_id, since).await
    }

    async fn finish_match(&self, match_id: Uuid, outcome: MatchOutcome, payout: Decimal, fee: Decimal) -> Result<bool> {
        self.finish_match(match_id, outcome, payout, fee).await
    }
}

pub async fn create_store() -> Result<Arc<dyn StoreTrait>> {
    info!("💾 Using in-memory match store");
    Ok(Arc::new(MemoryStore::new()))
}

pub async fn create_test_store() -> Arc<dyn StoreTrait> {
    Arc::new(MemoryStore::new())
}
