// Session manager: drives each player's lifecycle through wallet, escrow and queue
//
// Every player has their own lifecycle behind a mutex, so one player's
// actions are serialized while different players proceed independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::escrow::EscrowManager;
use crate::lifecycle::{LifecycleState, MatchLifecycle};
use crate::matchmaking::MatchmakingQueue;
use crate::types::{
    GameResult, HistoryItem, MatchOutcome, MatchParams, PlayerId, QueueEntry, ServiceEvent,
};
use crate::wallet::{Wallet, WalletManager};

pub struct SessionManager {
    wallets: Arc<WalletManager>,
    escrow: Arc<EscrowManager>,
    queue: Arc<MatchmakingQueue>,
    sessions: RwLock<HashMap<PlayerId, Arc<Mutex<MatchLifecycle>>>>,
    events: broadcast::Sender<ServiceEvent>,
}

impl SessionManager {
    pub fn new(
        wallets: Arc<WalletManager>,
        escrow: Arc<EscrowManager>,
        queue: Arc<MatchmakingQueue>,
        events: broadcast::Sender<ServiceEvent>,
    ) -> Self {
        Self {
            wallets,
            escrow,
            queue,
            sessions: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn escrow(&self) -> &Arc<EscrowManager> {
        &self.escrow
    }

    pub fn queue(&self) -> &Arc<MatchmakingQueue> {
        &self.queue
    }

    /// Only starting a search creates a session
    async fn session_handle(&self, player_id: &str) -> Arc<Mutex<MatchLifecycle>> {
        if let Some(handle) = self.existing_session(player_id).await {
            return handle;
        }
        let mut sessions = self.sessions.write().await;
        sessions.entry(player_id.to_string()).or_default().clone()
    }

    async fn existing_session(&self, player_id: &str) -> Option<Arc<Mutex<MatchLifecycle>>> {
        self.sessions.read().await.get(player_id).cloned()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn wallet_count(&self) -> usize {
        self.wallets.wallet_count().await
    }

    pub async fn connect_wallet(&self, player_id: &str) -> Wallet {
        self.wallets.connect(player_id).await
    }

    pub async fn disconnect_wallet(&self, player_id: &str) -> Wallet {
        self.wallets.disconnect(player_id).await
    }

    pub async fn wallet(&self, player_id: &str) -> Wallet {
        self.wallets.wallet(player_id).await
    }

    pub async fn session(&self, player_id: &str) -> MatchLifecycle {
        match self.existing_session(player_id).await {
            Some(handle) => handle.lock().await.clone(),
            None => MatchLifecycle::new(),
        }
    }

    pub async fn history(&self, player_id: &str) -> Vec<HistoryItem> {
        match self.existing_session(player_id).await {
            Some(handle) => handle.lock().await.history().to_vec(),
            None => Vec::new(),
        }
    }

    /// Locks stake + network fee, then either pairs immediately or queues.
    /// Nothing is locked or queued when the funds check fails.
    pub async fn start_match(&self, player_id: &str, params: MatchParams) -> CoreResult<MatchLifecycle> {
        if !self.escrow.assets().is_available(params.asset) {
            return Err(CoreError::AssetUnavailable(params.asset));
        }
        if params.stake <= Decimal::ZERO {
            return Err(CoreError::InvalidStake(params.stake));
        }

        let handle = self.session_handle(player_id).await;
        let mut lifecycle = handle.lock().await;
        if lifecycle.state() != LifecycleState::Idle {
            return Err(CoreError::IllegalTransition {
                state: lifecycle.state().name(),
                action: "start a search",
            });
        }

        let placeholder_id = Uuid::new_v4();
        let locked = self.escrow
            .lock_funds(placeholder_id, player_id, params.asset, params.stake)
            .await?;
        lifecycle.start_search(params.clone(), placeholder_id)?;

        match self.pair_or_enqueue(&mut lifecycle, player_id, &params, placeholder_id).await {
            Ok(()) => Ok(lifecycle.clone()),
            Err(e) => {
                error!("Matchmaking failed for {}: {}, releasing funds", player_id, e);
                lifecycle.cancel_search()?;
                self.escrow.release_funds(placeholder_id, player_id, params.asset, locked).await?;
                Err(e)
            }
        }
    }

    async fn pair_or_enqueue(
        &self,
        lifecycle: &mut MatchLifecycle,
        player_id: &str,
        params: &MatchParams,
        search_id: Uuid,
    ) -> CoreResult<()> {
        match self.queue.try_match(params, player_id).await? {
            Some(paired) => lifecycle.opponent_found(&paired, player_id),
            None => {
                self.queue.enqueue(params, player_id, search_id).await?;
                Ok(())
            }
        }
    }

    /// Waiting side discovers a pairing made by someone else, or makes one
    pub async fn poll_match(&self, player_id: &str) -> CoreResult<MatchLifecycle> {
        let Some(handle) = self.existing_session(player_id).await else {
            return Ok(MatchLifecycle::new());
        };
        let mut lifecycle = handle.lock().await;
        if lifecycle.state() != LifecycleState::Finding {
            return Ok(lifecycle.clone());
        }

        let (params, searching_since) = match lifecycle.current() {
            Some(current) => (current.params.clone(), current.start_time),
            None => return Ok(lifecycle.clone()),
        };

        if let Some(paired) = self.queue.check_for_match_since(player_id, searching_since).await? {
            lifecycle.opponent_found(&paired, player_id)?;
            return Ok(lifecycle.clone());
        }

        if let Some(paired) = self.queue.try_match(&params, player_id).await? {
            lifecycle.opponent_found(&paired, player_id)?;
        }
        Ok(lifecycle.clone())
    }

    /// Leaves the queue and refunds the stake. Once paired the player is
    /// committed: the session moves to playing and the cancel is rejected.
    pub async fn cancel_match(&self, player_id: &str) -> CoreResult<MatchLifecycle> {
        let handle = self.existing_session(player_id).await
            .ok_or_else(|| idle_error("cancel a search"))?;
        let mut lifecycle = handle.lock().await;
        let (params, searching_since) = match (lifecycle.state(), lifecycle.current()) {
            (LifecycleState::Finding, Some(current)) => (current.params.clone(), current.start_time),
            (state, _) => {
                return Err(CoreError::IllegalTransition {
                    state: state.name(),
                    action: "cancel a search",
                })
            }
        };

        if !self.queue.cancel(&params, player_id).await? {
            if let Some(paired) = self.queue.check_for_match_since(player_id, searching_since).await? {
                lifecycle.opponent_found(&paired, player_id)?;
                warn!("{} tried to cancel after being paired into {}", player_id, paired.id);
                return Err(CoreError::IllegalTransition {
                    state: LifecycleState::Playing.name(),
                    action: "cancel a search",
                });
            }
        }

        let abandoned = lifecycle.cancel_search()?;
        self.escrow
            .release_funds(abandoned.id, player_id, params.asset, params.stake)
            .await?;
        Ok(lifecycle.clone())
    }

    /// Game result callback from the (external) game UI.
    ///
    /// The first report decides the match. A later report from the other
    /// side is settled from the recorded outcome, whatever it claims.
    pub async fn report_result(&self, player_id: &str, result: GameResult) -> CoreResult<HistoryItem> {
        let handle = self.existing_session(player_id).await
            .ok_or_else(|| idle_error("report a result"))?;
        let mut lifecycle = handle.lock().await;
        let current = match (lifecycle.state(), lifecycle.current()) {
            (LifecycleState::Playing, Some(current)) => current.clone(),
            (state, _) => {
                return Err(CoreError::IllegalTransition {
                    state: state.name(),
                    action: "report a result",
                })
            }
        };

        let claimed = match (result, &current.opponent) {
            (GameResult::Win, _) => MatchOutcome::Winner(player_id.to_string()),
            (GameResult::Loss, Some(opponent)) => MatchOutcome::Winner(opponent.clone()),
            (GameResult::Loss, None) | (GameResult::Draw, _) => MatchOutcome::Draw,
        };
        let (payout, fee) = self.escrow.match_totals(current.params.stake, claimed == MatchOutcome::Draw);

        let result = if self.queue.finish_match(current.id, claimed, payout, fee).await? {
            result
        } else {
            let recorded = self.queue.get_match(current.id).await?
                .and_then(|m| m.result)
                .ok_or_else(|| CoreError::Store(format!("Match {} has no recorded outcome", current.id)))?;
            let settled_as = recorded.result_for(player_id);
            if settled_as != result {
                warn!("{} reported '{}' for {} but the match was already decided as '{}'",
                    player_id, result, current.id, settled_as);
            }
            settled_as
        };

        let settlement = self.escrow
            .settle_match(current.id, player_id, current.params.asset, current.params.stake, result)
            .await?;

        let item = lifecycle.finish(result, settlement)?;
        let _ = self.events.send(ServiceEvent::MatchSettled {
            match_id: current.id,
            player_id: player_id.to_string(),
            result,
            settlement,
        });
        Ok(item)
    }

    pub async fn reset(&self, player_id: &str) -> CoreResult<MatchLifecycle> {
        let handle = self.existing_session(player_id).await
            .ok_or_else(|| idle_error("reset"))?;
        let mut lifecycle = handle.lock().await;
        lifecycle.reset()?;
        Ok(lifecycle.clone())
    }

    /// Returns a swept player to idle and refunds their stake, but only if
    /// the session is still on the search that queued `entry`
    pub async fn expire_search(&self, entry: &QueueEntry) -> CoreResult<()> {
        let Some(handle) = self.existing_session(&entry.player_id).await else {
            return Ok(());
        };
        let mut lifecycle = handle.lock().await;

        let still_waiting = lifecycle.state() == LifecycleState::Finding
            && lifecycle.current().map(|c| c.id == entry.search_id).unwrap_or(false);
        if !still_waiting {
            debug!("Expired entry for {} belongs to an earlier search", entry.player_id);
            return Ok(());
        }

        let abandoned = lifecycle.cancel_search()?;
        self.escrow
            .release_funds(abandoned.id, &entry.player_id, entry.params.asset, entry.params.stake)
            .await?;
        info!("Search by {} in {} timed out", entry.player_id, entry.params);
        Ok(())
    }

    pub async fn sweep_stale(&self, max_age: Duration) -> CoreResult<usize> {
        let expired = self.queue.purge_stale(max_age).await?;
        for entry in &expired {
            if let Err(e) = self.expire_search(entry).await {
                error!("Failed to expire search for {}: {}", entry.player_id, e);
            }
        }
        Ok(expired.len())
    }

    pub async fn run_sweeper(self: Arc<Self>, every: Duration, max_age: Duration) {
        info!("Queue sweeper started (every {:?}, ttl {:?})", every, max_age);
        let mut ticker = interval(every);

        loop {
            ticker.tick().await;
            if let Err(e) = self.sweep_stale(max_age).await {
                error!("Queue sweep failed: {}", e);
            }
        }
    }
}

fn idle_error(action: &'static str) -> CoreError {
    CoreError::IllegalTransition {
        state: LifecycleState::Idle.name(),
        action,
    }
}
