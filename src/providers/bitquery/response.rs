//! Bitquery response payloads and their reduction to an [`AnalyticsSnapshot`].

use serde::Deserialize;

use crate::error::ProviderError;
use crate::models::{AnalyticsSnapshot, PerWindow, TimeWindow};
use crate::utils::{de_opt_f64, de_opt_u64};

/// Standard GraphQL response wrapper.
#[derive(Debug, Deserialize)]
pub struct GraphQlEnvelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

impl<T> GraphQlEnvelope<T> {
    /// Return `data`, or the joined error messages when the query was rejected.
    pub fn into_data(self) -> Result<T, ProviderError> {
        if !self.errors.is_empty() {
            let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(ProviderError::GraphQl(messages.join("; ")));
        }

        self.data
            .ok_or_else(|| ProviderError::Malformed("response has no data".to_string()))
    }
}

// ============================================
// Basic (30-day) query
// ============================================

#[derive(Debug, Deserialize)]
pub struct TokenDataResponse {
    #[serde(alias = "solana")]
    pub ethereum: Option<TokenDataNetwork>,
}

impl TokenDataResponse {
    pub fn into_network(self) -> Result<TokenDataNetwork, ProviderError> {
        self.ethereum
            .ok_or_else(|| ProviderError::Malformed("missing network root".to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenDataNetwork {
    #[serde(default)]
    pub transfers: Vec<TransferRow>,
    #[serde(default)]
    pub supply: Vec<SupplyRow>,
    #[serde(default, rename = "dexTrades")]
    pub dex_trades: Vec<DexTradeRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferRow {
    #[serde(default)]
    pub currency: Option<CurrencyRow>,
    #[serde(default, rename = "firstTransaction", deserialize_with = "de_opt_u64")]
    pub first_transaction: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SupplyRow {
    #[serde(default, rename = "totalSupply", deserialize_with = "de_opt_f64")]
    pub total_supply: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DexTradeRow {
    #[serde(default, rename = "tradeAmount", deserialize_with = "de_opt_f64")]
    pub trade_amount: Option<f64>,
    #[serde(default, rename = "baseAmount", deserialize_with = "de_opt_f64")]
    pub base_amount: Option<f64>,
    #[serde(default, rename = "lastPrice", deserialize_with = "de_opt_f64")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub liquidity: Option<f64>,
}

// ============================================
// Per-window query
// ============================================

#[derive(Debug, Deserialize)]
pub struct WindowMetricsResponse {
    #[serde(alias = "solana")]
    pub ethereum: Option<WindowMetricsNetwork>,
}

impl WindowMetricsResponse {
    pub fn into_network(self) -> Result<WindowMetricsNetwork, ProviderError> {
        self.ethereum
            .ok_or_else(|| ProviderError::Malformed("missing network root".to_string()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowMetricsNetwork {
    #[serde(default, rename = "dexTrades")]
    pub dex_trades: Vec<WindowMetricsRow>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowMetricsRow {
    #[serde(default, rename = "volumeUSD", deserialize_with = "de_opt_f64")]
    pub volume_usd: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_u64")]
    pub transactions: Option<u64>,
}

// ============================================
// Derivations
// ============================================

/// Trade amount / base amount.
///
/// Zero when nothing traded; NaN when trades exist but the base amount is
/// missing so reconciliation falls through to market data.
pub fn derive_price(trade_amount: Option<f64>, base_amount: Option<f64>) -> f64 {
    match trade_amount {
        Some(trade) if trade != 0.0 && !trade.is_nan() => match base_amount {
            Some(base) if base != 0.0 => trade / base,
            _ => f64::NAN,
        },
        _ => 0.0,
    }
}

/// Total supply × last price when both are present and non-zero.
pub fn derive_market_cap(total_supply: Option<f64>, last_price: Option<f64>) -> f64 {
    match (total_supply, last_price) {
        (Some(supply), Some(price)) if supply != 0.0 && price != 0.0 => supply * price,
        _ => 0.0,
    }
}

/// Reported liquidity, or trade / base when the provider reported none.
pub fn derive_liquidity(row: &DexTradeRow) -> f64 {
    let liquidity = match row.liquidity {
        Some(reported) => reported,
        None => match (row.trade_amount, row.base_amount) {
            (Some(trade), Some(base)) if trade != 0.0 && base != 0.0 => trade / base,
            _ => 0.0,
        },
    };

    if liquidity.is_finite() {
        liquidity
    } else {
        0.0
    }
}

/// Combine the basic query and the per-window queries into one snapshot.
pub fn build_snapshot(
    basic: TokenDataNetwork,
    windows: Vec<(TimeWindow, WindowMetricsNetwork)>,
) -> AnalyticsSnapshot {
    let transfer = basic.transfers.into_iter().next().unwrap_or_default();
    let currency = transfer.currency.unwrap_or_default();
    let dex = basic.dex_trades.into_iter().next().unwrap_or_default();
    let total_supply = basic.supply.first().and_then(|s| s.total_supply);

    let mut volume = PerWindow::<f64>::default();
    let mut transactions = PerWindow::<u64>::default();

    for (window, metrics) in windows {
        let row = metrics.dex_trades.into_iter().next().unwrap_or_default();
        volume.set(window, row.volume_usd.unwrap_or(0.0));
        transactions.set(window, row.transactions.unwrap_or(0));
    }

    AnalyticsSnapshot {
        name: currency.name.unwrap_or_default(),
        symbol: currency.symbol.unwrap_or_default(),
        price: derive_price(dex.trade_amount, dex.base_amount),
        market_cap: derive_market_cap(total_supply, dex.last_price),
        liquidity: derive_liquidity(&dex),
        volume,
        transactions,
        launch_block: transfer.first_transaction,
    }
}
