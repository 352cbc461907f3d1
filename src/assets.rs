// Static asset reference data: USD prices and availability

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::types::Asset;

#[derive(Debug, Clone, Serialize)]
pub struct AssetInfo {
    pub asset: Asset,
    pub usd_price: Option<Decimal>,
    pub available: bool,          // false = listed but "coming soon"
}

#[derive(Debug, Clone)]
pub struct AssetTable {
    entries: Vec<AssetInfo>,
}

impl Default for AssetTable {
    fn default() -> Self {
        Self::new(vec![
            AssetInfo { asset: Asset::USDT, usd_price: Some(dec!(1.00)), available: true },
            AssetInfo { asset: Asset::ETH, usd_price: Some(dec!(2500.00)), available: true },
            AssetInfo { asset: Asset::TON, usd_price: Some(dec!(5.00)), available: false },
        ])
    }
}

impl AssetTable {
    pub fn new(entries: Vec<AssetInfo>) -> Self {
        Self { entries }
    }

    pub fn info(&self, asset: Asset) -> Option<&AssetInfo> {
        self.entries.iter().find(|e| e.asset == asset)
    }

    /// Price is only reported for assets that can actually be staked
    pub fn usd_price(&self, asset: Asset) -> Option<Decimal> {
        self.info(asset)
            .filter(|info| info.available)
            .and_then(|info| info.usd_price)
            .filter(|price| *price > Decimal::ZERO)
    }

    pub fn is_available(&self, asset: Asset) -> bool {
        self.info(asset).map(|info| info.available).unwrap_or(false)
    }

    pub fn all(&self) -> &[AssetInfo] {
        &self.entries
    }
}
