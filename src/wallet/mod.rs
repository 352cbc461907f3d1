// Simulated wallet ledger
// One wallet per player; every balance change goes through debit/credit

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{CoreError, CoreResult};
use crate::types::{Asset, PlayerId};

/// Allocation seeded by a successful wallet-provider handshake
pub fn starting_allocation() -> BTreeMap<Asset, Decimal> {
    BTreeMap::from([
        (Asset::USDT, dec!(100)),
        (Asset::ETH, dec!(0.2)),
        (Asset::TON, dec!(50)),
    ])
}

fn zero_balances() -> BTreeMap<Asset, Decimal> {
    Asset::ALL.iter().map(|a| (*a, Decimal::ZERO)).collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Wallet {
    pub connected: bool,
    pub address: Option<String>,
    pub balances: BTreeMap<Asset, Decimal>,
}

impl Default for Wallet {
    fn default() -> Self {
        Self {
            connected: false,
            address: None,
            balances: zero_balances(),
        }
    }
}

impl Wallet {
    pub fn balance(&self, asset: Asset) -> Decimal {
        self.balances.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }

    /// Fails without touching the balance when funds are short
    pub fn debit(&mut self, asset: Asset, amount: Decimal) -> CoreResult<Decimal> {
        if amount < Decimal::ZERO {
            return Err(CoreError::InvalidAmount(amount));
        }

        let available = self.balance(asset);
        if available < amount {
            return Err(CoreError::InsufficientFunds {
                asset,
                requested: amount,
                available,
            });
        }

        let remaining = available - amount;
        self.balances.insert(asset, remaining);
        Ok(remaining)
    }

    pub fn credit(&mut self, asset: Asset, amount: Decimal) -> CoreResult<Decimal> {
        if amount < Decimal::ZERO {
            return Err(CoreError::InvalidAmount(amount));
        }

        let updated = self.balance(asset) + amount;
        self.balances.insert(asset, updated);
        Ok(updated)
    }

    /// No-op when already connected
    pub fn connect(&mut self) {
        if self.connected {
            return;
        }
        self.connected = true;
        self.address = Some(generate_address());
        self.balances = starting_allocation();
    }

    pub fn disconnect(&mut self) {
        *self = Wallet::default();
    }
}

fn generate_address() -> String {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
    format!("0x{}", hex)
}

pub struct WalletManager {
    wallets: RwLock<HashMap<PlayerId, Wallet>>,
    handshake_delay: Duration,
}

impl WalletManager {
    pub fn new(handshake_delay: Duration) -> Self {
        Self {
            wallets: RwLock::new(HashMap::new()),
            handshake_delay,
        }
    }

    pub async fn connect(&self, player_id: &str) -> Wallet {
        if !self.handshake_delay.is_zero() {
            tokio::time::sleep(self.handshake_delay).await;
        }

        let mut wallets = self.wallets.write().await;
        let wallet = wallets.entry(player_id.to_string()).or_default();
        let was_connected = wallet.connected;
        wallet.connect();

        if was_connected {
            debug!("Wallet for {} already connected", player_id);
        } else {
            info!("🔗 Wallet connected for {} at {}",
                player_id, wallet.address.as_deref().unwrap_or("-"));
        }
        wallet.clone()
    }

    pub async fn disconnect(&self, player_id: &str) -> Wallet {
        let mut wallets = self.wallets.write().await;
        if let Some(wallet) = wallets.get_mut(player_id) {
            wallet.disconnect();
            info!("Wallet disconnected for {}", player_id);
        }
        Wallet::default()
    }

    pub async fn wallet_count(&self) -> usize {
        self.wallets.read().await.len()
    }

    pub async fn wallet(&self, player_id: &str) -> Wallet {
        let wallets = self.wallets.read().await;
        wallets.get(player_id).cloned().unwrap_or_default()
    }

    pub async fn balance(&self, player_id: &str, asset: Asset) -> Decimal {
        self.wallet(player_id).await.balance(asset)
    }

    /// Unknown players are treated as an empty wallet
    pub async fn debit(&self, player_id: &str, asset: Asset, amount: Decimal) -> CoreResult<Decimal> {
        let mut wallets = self.wallets.write().await;
        let outcome = match wallets.get_mut(player_id) {
            Some(wallet) => wallet.debit(asset, amount),
            None => Wallet::default().debit(asset, amount),
        };

        match outcome {
            Ok(remaining) => {
                debug!("Debited {} {} from {} (remaining {})", amount, asset, player_id, remaining);
                Ok(remaining)
            }
            Err(e) => {
                warn!("❌ Debit of {} {} from {} rejected: {}", amount, asset, player_id, e);
                Err(e)
            }
        }
    }

    pub async fn credit(&self, player_id: &str, asset: Asset, amount: Decimal) -> CoreResult<Decimal> {
        let mut wallets = self.wallets.write().await;
        let wallet = wallets.entry(player_id.to_string()).or_default();
        let updated = wallet.credit(asset, amount)?;
        debug!("Credited {} {} to {} (balance {})", amount, asset, player_id, updated);
        Ok(updated)
    }
}
