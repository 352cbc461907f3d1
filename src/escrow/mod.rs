// Mock escrow: locks stakes against the wallet ledger and settles payouts

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::assets::AssetTable;
use crate::config::{DrawPolicy, ServiceConfig};
use crate::error::CoreResult;
use crate::types::{Asset, GameResult, SettlementResult};
use crate::wallet::WalletManager;

pub mod settlement;

use settlement::compute_settlement;

pub struct EscrowManager {
    wallets: Arc<WalletManager>,
    assets: AssetTable,
    fee_rate: Decimal,
    network_fee_usd: Decimal,
    draw_policy: DrawPolicy,
    settle_delay: Duration,
    fees_collected: RwLock<BTreeMap<Asset, Decimal>>,
}

impl EscrowManager {
    pub fn new(wallets: Arc<WalletManager>, assets: AssetTable, config: &ServiceConfig) -> Self {
        Self {
            wallets,
            assets,
            fee_rate: config.fee_rate,
            network_fee_usd: config.network_fee_usd,
            draw_policy: config.draw_policy,
            settle_delay: config.simulated_latency,
            fees_collected: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    pub fn network_fee_usd(&self) -> Decimal {
        self.network_fee_usd
    }

    pub fn draw_policy(&self) -> DrawPolicy {
        self.draw_policy
    }

    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    /// Fixed USD network fee expressed in units of `asset`; 0 when unpriced
    pub fn get_estimated_network_fee(&self, asset: Asset) -> Decimal {
        match self.assets.usd_price(asset) {
            Some(price) => self.network_fee_usd / price,
            None => Decimal::ZERO,
        }
    }

    /// Takes stake + network fee in a single debit; returns the amount locked
    pub async fn lock_funds(
        &self,
        match_id: Uuid,
        player_id: &str,
        asset: Asset,
        stake: Decimal,
    ) -> CoreResult<Decimal> {
        let network_fee = self.get_estimated_network_fee(asset);
        let total = stake + network_fee;

        match self.wallets.debit(player_id, asset, total).await {
            Ok(_) => {
                info!("🔒 Locked funds for match {}: {} stake + {} fee ({}) from {}",
                    match_id, stake, network_fee, asset, player_id);
                Ok(total)
            }
            Err(e) => {
                error!("❌ Failed to lock funds for match {} ({}): {}", match_id, player_id, e);
                Err(e)
            }
        }
    }

    /// Hands locked funds back for a match that never formed
    pub async fn release_funds(
        &self,
        match_id: Uuid,
        player_id: &str,
        asset: Asset,
        amount: Decimal,
    ) -> CoreResult<Decimal> {
        let balance = self.wallets.credit(player_id, asset, amount).await?;
        info!("↩️ Released {} {} locked for match {} back to {}", amount, asset, match_id, player_id);
        Ok(balance)
    }

    /// Match-level (payout, fee) recorded on the match itself
    pub fn match_totals(&self, stake: Decimal, is_draw: bool) -> (Decimal, Decimal) {
        settlement::match_totals(stake, self.fee_rate, is_draw, self.draw_policy)
    }

    pub async fn settle_match(
        &self,
        match_id: Uuid,
        player_id: &str,
        asset: Asset,
        stake: Decimal,
        result: GameResult,
    ) -> CoreResult<SettlementResult> {
        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }

        let settlement = compute_settlement(stake, self.fee_rate, result, self.draw_policy);

        if settlement.payout > Decimal::ZERO {
            self.wallets.credit(player_id, asset, settlement.payout).await?;
        }

        // The losing side's fee is collected through the winner's settlement
        let collects_fee = match result {
            GameResult::Win => true,
            GameResult::Draw => self.draw_policy == DrawPolicy::SplitPot,
            GameResult::Loss => false,
        };
        if collects_fee && settlement.fee > Decimal::ZERO {
            let mut fees = self.fees_collected.write().await;
            *fees.entry(asset).or_insert(Decimal::ZERO) += settlement.fee;
        }

        info!("🎯 Settled match {} for {}: result {}, payout {} {}, fee {}",
            match_id, player_id, result, settlement.payout, asset, settlement.fee);

        Ok(settlement)
    }

    pub async fn fees_collected(&self) -> BTreeMap<Asset, Decimal> {
        self.fees_collected.read().await.clone()
    }
}
