use serde::{Deserialize, Serialize};

use super::window::PerWindow;

/// Trade and transfer metrics reported by the analytics (indexing) provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsSnapshot {
    pub name: String,
    pub symbol: String,
    /// Trade amount / base amount. NaN when the base amount is missing.
    pub price: f64,
    /// Total supply × last price, or 0
    pub market_cap: f64,
    pub liquidity: f64,
    pub volume: PerWindow<f64>,
    pub transactions: PerWindow<u64>,
    /// First block (slot on Solana) in which the token was transferred
    pub launch_block: Option<u64>,
}

/// Percentage price changes reported by the market-data provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PriceChanges {
    #[serde(rename = "24h")]
    pub h24: f64,
    #[serde(rename = "7d")]
    pub d7: f64,
    #[serde(rename = "30d")]
    pub d30: f64,
}

/// Spot market data for a token.
///
/// `Default` is the zero snapshot returned whenever the provider cannot
/// answer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub total_volume: f64,
    /// USD total value locked, when the provider reports one
    pub liquidity: f64,
    pub price_change_percentage: PriceChanges,
    pub market_cap_rank: Option<u32>,
    pub last_updated: Option<String>,
}

impl MarketSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
