//! External data providers.
//!
//! - [`bitquery`] - GraphQL indexing service (mandatory analytics source)
//! - [`coingecko`] - REST market-data service (degrades to an empty snapshot)

pub mod bitquery;
pub mod coingecko;

use async_trait::async_trait;

use crate::chains::ChainProfile;
use crate::error::ProviderError;
use crate::models::{AnalyticsSnapshot, MarketSnapshot};

pub use bitquery::BitqueryClient;
pub use coingecko::CoingeckoClient;

/// Time-windowed trade and transfer metrics for a token.
///
/// Any error aborts the whole aggregation.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn fetch_analytics(
        &self,
        address: &str,
        chain: &ChainProfile,
    ) -> Result<AnalyticsSnapshot, ProviderError>;
}

/// Spot price, market cap and rank for a token.
///
/// Never fails: implementations return [`MarketSnapshot::default`] when they
/// cannot answer.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_market_data(&self, address: &str, chain: &ChainProfile) -> MarketSnapshot;
}
