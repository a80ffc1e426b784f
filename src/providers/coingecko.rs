//! CoinGecko market-data source.
//!
//! Every failure (unknown platform, transport, status, decoding) is logged
//! and turned into an empty [`MarketSnapshot`].

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use log::{error, warn};
use serde::Deserialize;

use crate::chains::ChainProfile;
use crate::config::Settings;
use crate::models::{MarketSnapshot, PriceChanges};
use crate::providers::MarketDataSource;

/// Fixed query flags: skip localization/community/developer payloads.
const CONTRACT_QUERY: [(&str, &str); 5] = [
    ("localization", "false"),
    ("tickers", "true"),
    ("market_data", "true"),
    ("community_data", "false"),
    ("developer_data", "false"),
];

/// Per-currency amounts, e.g. `{"usd": 1.0, "btc": 0.00002}`
type CurrencyMap = HashMap<String, Option<f64>>;

#[derive(Debug, Default, Deserialize)]
pub struct CoinResponse {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub current_price: Option<CurrencyMap>,
    #[serde(default)]
    pub market_cap: Option<CurrencyMap>,
    #[serde(default)]
    pub total_volume: Option<CurrencyMap>,
    #[serde(default)]
    pub total_value_locked: Option<CurrencyMap>,
    #[serde(default)]
    pub price_change_percentage_24h: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_30d: Option<f64>,
}

fn usd(map: &Option<CurrencyMap>) -> f64 {
    map.as_ref()
        .and_then(|m| m.get("usd").copied().flatten())
        .unwrap_or(0.0)
}

impl From<CoinResponse> for MarketSnapshot {
    fn from(coin: CoinResponse) -> Self {
        let market = coin.market_data.unwrap_or_default();

        MarketSnapshot {
            name: coin.name.unwrap_or_default(),
            symbol: coin.symbol.map(|s| s.to_uppercase()).unwrap_or_default(),
            price: usd(&market.current_price),
            market_cap: usd(&market.market_cap),
            total_volume: usd(&market.total_volume),
            liquidity: usd(&market.total_value_locked),
            price_change_percentage: PriceChanges {
                h24: market.price_change_percentage_24h.unwrap_or(0.0),
                d7: market.price_change_percentage_7d.unwrap_or(0.0),
                d30: market.price_change_percentage_30d.unwrap_or(0.0),
            },
            market_cap_rank: coin.market_cap_rank,
            last_updated: coin.last_updated,
        }
    }
}

/// REST client for the CoinGecko contract endpoint.
#[derive(Clone)]
pub struct CoingeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoingeckoClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("Failed to build CoinGecko HTTP client")?;

        Ok(Self {
            http,
            base_url: settings.coingecko_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn contract_url(&self, platform: &str, address: &str) -> String {
        format!(
            "{}/coins/{}/contract/{}",
            self.base_url,
            platform,
            address.to_lowercase()
        )
    }

    async fn try_fetch(&self, address: &str, chain: &ChainProfile) -> Result<MarketSnapshot> {
        let platform = chain
            .market_platform
            .as_deref()
            .ok_or_else(|| anyhow!("Unsupported blockchain: {}", chain.name))?;

        let response = self
            .http
            .get(self.contract_url(platform, address))
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&CONTRACT_QUERY[..])
            .send()
            .await
            .context("CoinGecko request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("CoinGecko returned HTTP {}: {}", status, body);
        }

        let coin: CoinResponse = response
            .json()
            .await
            .context("Failed to decode CoinGecko response")?;

        Ok(coin.into())
    }
}

#[async_trait]
impl MarketDataSource for CoingeckoClient {
    async fn fetch_market_data(&self, address: &str, chain: &ChainProfile) -> MarketSnapshot {
        if chain.market_platform.is_none() {
            warn!("No market-data platform for {}, using empty market data", chain.name);
            return MarketSnapshot::default();
        }

        match self.try_fetch(address, chain).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Coingecko fetch error for {} on {}: {:#}", address, chain.name, e);
                MarketSnapshot::default()
            },
        }
    }
}
