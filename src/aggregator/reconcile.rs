//! Source-priority merge of analytics and market data.
//!
//! Analytics wins whenever it has a usable value; market data fills the gaps.

use chrono::{DateTime, Utc};

use crate::models::{AnalyticsSnapshot, MarketSnapshot, TokenRecord};

fn first_non_empty(primary: &str, fallback: &str) -> String {
    if primary.is_empty() {
        fallback.to_string()
    } else {
        primary.to_string()
    }
}

/// Analytics value unless it is zero or not finite.
fn usable_or(primary: f64, fallback: f64) -> f64 {
    if primary != 0.0 && primary.is_finite() {
        primary
    } else {
        fallback
    }
}

/// First strictly positive finite value, else 0.
fn positive_or(primary: f64, fallback: f64) -> f64 {
    [primary, fallback]
        .into_iter()
        .find(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(0.0)
}

/// Build the final record for `address`.
pub fn reconcile(
    address: &str,
    analytics: &AnalyticsSnapshot,
    market: &MarketSnapshot,
    holders: u64,
    launch_date: Option<DateTime<Utc>>,
) -> TokenRecord {
    TokenRecord {
        address: address.to_string(),
        name: first_non_empty(&analytics.name, &market.name),
        symbol: first_non_empty(&analytics.symbol, &market.symbol),
        price: usable_or(analytics.price, market.price),
        market_cap: usable_or(analytics.market_cap, market.market_cap),
        liquidity: positive_or(analytics.liquidity, market.liquidity),
        volume: analytics.volume,
        transactions: analytics.transactions,
        holders,
        launch_date,
    }
}
