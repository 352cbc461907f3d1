// Matchmaking queue: pairs waiting players that share (game, asset, stake)

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::storage::StoreTrait;
use crate::types::{Match, MatchOutcome, MatchParams, QueueEntry, ServiceEvent};

pub struct MatchmakingQueue {
    store: Arc<dyn StoreTrait>,
    events: broadcast::Sender<ServiceEvent>,
}

impl MatchmakingQueue {
    pub fn new(store: Arc<dyn StoreTrait>, events: broadcast::Sender<ServiceEvent>) -> Self {
        Self { store, events }
    }

    /// Returns false when the player already waits in this bucket
    pub async fn enqueue(&self, params: &MatchParams, player_id: &str, search_id: Uuid) -> CoreResult<bool> {
        let entry = QueueEntry {
            params: params.clone(),
            player_id: player_id.to_string(),
            search_id,
            enqueued_at: Utc::now(),
        };

        let inserted = self.store.insert_queue_entry(&entry).await?;
        if inserted {
            info!("📋 {} queued for {}", player_id, params);
        } else {
            debug!("{} already queued for {}", player_id, params);
        }
        Ok(inserted)
    }

    /// Pairs the caller with the longest-waiting other player in the bucket.
    /// `None` means nobody is waiting yet; the caller is not queued by this.
    pub async fn try_match(&self, params: &MatchParams, player_id: &str) -> CoreResult<Option<Match>> {
        let Some(new_match) = self.store.claim_match(params, player_id, Uuid::new_v4()).await? else {
            debug!("No opponent waiting for {} in {}", player_id, params);
            return Ok(None);
        };

        info!("⚡ Match {} formed: {} vs {} ({})",
            new_match.id, new_match.players[0], new_match.players[1], params);

        // No subscribers is fine; the waiting side can still poll
        let _ = self.events.send(ServiceEvent::MatchFound {
            match_id: new_match.id,
            players: new_match.players.clone(),
            params: params.clone(),
        });

        Ok(Some(new_match))
    }

    pub async fn cancel(&self, params: &MatchParams, player_id: &str) -> CoreResult<bool> {
        let removed = self.store.remove_queue_entry(params, player_id).await?;
        if removed {
            info!("🚫 {} left the queue for {}", player_id, params);
        }
        Ok(removed)
    }

    /// First match (by start time) that includes the player, active or finished
    pub async fn check_for_match(&self, player_id: &str) -> CoreResult<Option<Match>> {
        Ok(self.store.find_match_for_player(player_id, false).await?)
    }

    pub async fn check_for_active_match(&self, player_id: &str) -> CoreResult<Option<Match>> {
        Ok(self.store.find_match_for_player(player_id, true).await?)
    }

    /// Match the player joined during a search that began at `since`,
    /// even if the opponent has already finished it
    pub async fn check_for_match_since(&self, player_id: &str, since: DateTime<Utc>) -> CoreResult<Option<Match>> {
        Ok(self.store.find_match_since(player_id, since).await?)
    }

    pub async fn get_match(&self, match_id: Uuid) -> CoreResult<Option<Match>> {
        Ok(self.store.get_match(match_id).await?)
    }

    pub async fn queue_depth(&self, params: &MatchParams) -> CoreResult<usize> {
        Ok(self.store.get_queue_entries(params).await?.len())
    }

    /// Marks the match finished; later calls for the same match return false
    pub async fn finish_match(
        &self,
        match_id: Uuid,
        outcome: MatchOutcome,
        payout: Decimal,
        fee: Decimal,
    ) -> CoreResult<bool> {
        let updated = self.store
            .finish_match(match_id, outcome.clone(), payout, fee)
            .await?;
        if updated {
            info!("🏁 Match {} finished: {:?}", match_id, outcome);
        }
        Ok(updated)
    }

    pub async fn purge_stale(&self, max_age: Duration) -> CoreResult<Vec<QueueEntry>> {
        let max_age = chrono::Duration::from_std(max_age)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let cutoff = Utc::now() - max_age;

        let removed = self.store.remove_stale_entries(cutoff).await?;
        for entry in &removed {
            warn!("⏰ Queue entry for {} in {} expired", entry.player_id, entry.params);
            let _ = self.events.send(ServiceEvent::QueueEntryExpired {
                player_id: entry.player_id.clone(),
                params: entry.params.clone(),
            });
        }
        Ok(removed)
    }
}
