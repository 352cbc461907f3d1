// Re-export main modules for the SkillBlitz match service library

use std::sync::Arc;
use tokio::sync::broadcast;

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod escrow;
pub mod lifecycle;
pub mod matchmaking;
pub mod session;
pub mod storage;
pub mod types;
pub mod wallet;

pub use error::{CoreError, CoreResult};
pub use types::*;
use crate::assets::AssetTable;
use crate::config::ServiceConfig;
use crate::escrow::EscrowManager;
use crate::matchmaking::MatchmakingQueue;
use crate::session::SessionManager;
use crate::storage::StoreTrait;
use crate::wallet::WalletManager;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub ws_broadcaster: broadcast::Sender<ServiceEvent>,
}

impl AppState {
    /// Wires wallet ledger, escrow, queue and sessions over the given store
    pub fn new(config: &ServiceConfig, store: Arc<dyn StoreTrait>) -> Self {
        let (ws_tx, _ws_rx) = broadcast::channel::<ServiceEvent>(1000);

        let wallets = Arc::new(WalletManager::new(config.simulated_latency));
        let escrow = Arc::new(EscrowManager::new(wallets.clone(), AssetTable::default(), config));
        let queue = Arc::new(MatchmakingQueue::new(store, ws_tx.clone()));
        let sessions = Arc::new(SessionManager::new(wallets, escrow, queue, ws_tx.clone()));

        Self {
            sessions,
            ws_broadcaster: ws_tx,
        }
    }
}
