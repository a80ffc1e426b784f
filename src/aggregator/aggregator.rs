use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use moka::future::Cache;

use crate::chains::{ChainKind, ChainProfile, ChainTable, DEFAULT_CHAIN};
use crate::config::Settings;
use crate::error::{AggregatorError, Result};
use crate::holders::HolderEstimator;
use crate::models::TokenRecord;
use crate::providers::{AnalyticsSource, BitqueryClient, CoingeckoClient, MarketDataSource};
use crate::rpc::ChainClients;
use crate::utils::{unix_to_datetime, validate_address, ValidatedAddress};

use super::reconcile::reconcile;

/// Tunables for [`TokenAggregator`] that are not tied to a provider.
#[derive(Debug, Clone)]
pub struct AggregatorOptions {
    pub cache_ttl: Duration,
    pub cache_max_capacity: u64,
    pub holder_sample_concurrency: usize,
}

impl Default for AggregatorOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for AggregatorOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            cache_ttl: Duration::from_secs(settings.cache_ttl_secs),
            cache_max_capacity: settings.cache_max_capacity,
            holder_sample_concurrency: settings.holder_sample_concurrency,
        }
    }
}

/// Fetches, reconciles and caches token data across chains.
///
/// Owns every client it talks to. Records are cached per `"{chain}-{address}"`
/// for a fixed TTL; keys are not normalised, so differently-cased spellings
/// of one EVM address are cached separately.
pub struct TokenAggregator {
    chains: ChainTable,
    analytics: Arc<dyn AnalyticsSource>,
    market: Arc<dyn MarketDataSource>,
    clients: Arc<ChainClients>,
    holders: HolderEstimator,
    cache: Cache<String, Arc<TokenRecord>>,
}

impl TokenAggregator {
    /// Build an aggregator talking to Bitquery, CoinGecko and the configured RPCs.
    pub fn new(settings: &Settings) -> Result<Self> {
        let chains = ChainTable::from_settings(settings);

        let clients =
            ChainClients::connect(&chains, Duration::from_secs(settings.rpc_timeout_secs))
                .map_err(AggregatorError::Setup)?;

        let analytics = BitqueryClient::new(settings).map_err(AggregatorError::Setup)?;
        let market = CoingeckoClient::new(settings).map_err(AggregatorError::Setup)?;

        if settings.bitquery_api_key().is_none() {
            warn!("BITQUERY_API_KEY is not set, every lookup will fail until it is configured");
        }

        Ok(Self::with_sources(
            chains,
            Arc::new(analytics),
            Arc::new(market),
            clients,
            AggregatorOptions::from(settings),
        ))
    }

    /// Build an aggregator from explicit sources.
    pub fn with_sources(
        chains: ChainTable,
        analytics: Arc<dyn AnalyticsSource>,
        market: Arc<dyn MarketDataSource>,
        clients: ChainClients,
        options: AggregatorOptions,
    ) -> Self {
        let clients = Arc::new(clients);
        let holders = HolderEstimator::new(clients.clone(), options.holder_sample_concurrency);

        // Entries only ever leave by TTL (or capacity pressure)
        let cache = Cache::builder()
            .max_capacity(options.cache_max_capacity)
            .time_to_live(options.cache_ttl)
            .build();

        info!(
            "Token aggregator ready: {} chain(s), {} RPC client(s), cache TTL {:?}",
            chains.len(),
            clients.len(),
            options.cache_ttl
        );

        Self {
            chains,
            analytics,
            market,
            clients,
            holders,
            cache,
        }
    }

    /// Token data for `address` on the default chain (ethereum).
    pub async fn get_token_data_default(&self, address: &str) -> Result<Arc<TokenRecord>> {
        self.get_token_data(address, DEFAULT_CHAIN).await
    }

    /// Token data for `address` on `chain`, served from cache when fresh.
    ///
    /// Only validation and analytics failures are returned; market data,
    /// holder counts and launch dates degrade to defaults.
    pub async fn get_token_data(&self, address: &str, chain: &str) -> Result<Arc<TokenRecord>> {
        self.get_or_fetch(address, chain).await.map_err(|e| {
            error!("Error fetching token data: {}", e);
            e
        })
    }

    async fn get_or_fetch(&self, address: &str, chain: &str) -> Result<Arc<TokenRecord>> {
        let profile = self
            .chains
            .get(chain)
            .ok_or_else(|| AggregatorError::UnsupportedChain(chain.to_string()))?;

        let validated = validate_address(address, profile)?;

        let cache_key = format!("{}-{}", chain, address);
        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!("Cache hit for {}", cache_key);
            return Ok(cached);
        }

        let record = Arc::new(self.fetch_token_data(address, &validated, profile).await?);
        self.cache.insert(cache_key, record.clone()).await;

        Ok(record)
    }

    async fn fetch_token_data(
        &self,
        address: &str,
        validated: &ValidatedAddress,
        profile: &ChainProfile,
    ) -> Result<TokenRecord> {
        let analytics = self.analytics.fetch_analytics(address, profile).await?;
        let market = self.market.fetch_market_data(address, profile).await;
        let holders = self.holders.count_holders(validated, profile).await;

        debug!(
            "Launch block value from analytics for {}: {:?}",
            address, analytics.launch_block
        );

        let launch_date = match analytics.launch_block {
            Some(block) => self.resolve_launch_date(block, profile).await,
            None => None,
        };

        Ok(reconcile(address, &analytics, &market, holders, launch_date))
    }

    /// Timestamp of `block` on the token's own chain.
    async fn resolve_launch_date(
        &self,
        block: u64,
        profile: &ChainProfile,
    ) -> Option<DateTime<Utc>> {
        let timestamp = match profile.kind {
            ChainKind::Evm => {
                let rpc = self.clients.evm(&profile.name)?;
                rpc.block_timestamp(block)
                    .await
                    .map(|ts| ts.and_then(|ts| i64::try_from(ts).ok()))
            },
            ChainKind::Solana => {
                let rpc = self.clients.solana(&profile.name)?;
                rpc.block_time(block).await
            },
        };

        match timestamp {
            Ok(ts) => ts.and_then(unix_to_datetime),
            Err(e) => {
                warn!(
                    "Error fetching block timestamp for launch date ({} block {}): {:#}",
                    profile.name, block, e
                );
                None
            },
        }
    }

    /// Flush pending cache maintenance and release every client.
    pub async fn close(self) {
        self.cache.run_pending_tasks().await;
        info!(
            "Token aggregator closed ({} cached record(s) dropped)",
            self.cache.entry_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy::primitives::{Address, U256};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use solana_sdk::pubkey::Pubkey;

    use crate::error::ProviderError;
    use crate::models::{AnalyticsSnapshot, MarketSnapshot};
    use crate::rpc::{EvmRpc, SolanaRpc};

    const USDT: &str = "0xdac17f958d2ee523a2206206994597c13d831ec7";
    const USDT_CHECKSUMMED: &str = "0xdAC17F958D2ee523a2206206994597C13D831ec7";
    const USDC_SOLANA: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";

    /// Analytics stub; `None` simulates a provider failure.
    struct StubAnalytics {
        snapshot: Option<AnalyticsSnapshot>,
        calls: AtomicUsize,
    }

    impl StubAnalytics {
        fn ok(snapshot: AnalyticsSnapshot) -> Arc<Self> {
            Arc::new(Self {
                snapshot: Some(snapshot),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                snapshot: None,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AnalyticsSource for StubAnalytics {
        async fn fetch_analytics(
            &self,
            _address: &str,
            _chain: &ChainProfile,
        ) -> std::result::Result<AnalyticsSnapshot, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.snapshot.clone().ok_or(ProviderError::MissingCredential)
        }
    }

    /// Market stub that, like the real client, answers only for chains with a platform.
    struct StubMarket {
        snapshot: MarketSnapshot,
        calls: AtomicUsize,
    }

    impl StubMarket {
        fn new(snapshot: MarketSnapshot) -> Arc<Self> {
            Arc::new(Self {
                snapshot,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MarketDataSource for StubMarket {
        async fn fetch_market_data(&self, _address: &str, chain: &ChainProfile) -> MarketSnapshot {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if chain.market_platform.is_none() {
                return MarketSnapshot::default();
            }
            self.snapshot.clone()
        }
    }

    struct StubEvm {
        balance: U256,
        block_timestamp: Option<u64>,
    }

    #[async_trait]
    impl EvmRpc for StubEvm {
        async fn balance_of(&self, _token: Address, _holder: Address) -> anyhow::Result<U256> {
            Ok(self.balance)
        }

        async fn block_timestamp(&self, _number: u64) -> anyhow::Result<Option<u64>> {
            self.block_timestamp
                .map(Some)
                .ok_or_else(|| anyhow!("block not found"))
        }
    }

    struct StubSolana {
        amounts: Vec<u64>,
        block_time: i64,
    }

    #[async_trait]
    impl SolanaRpc for StubSolana {
        async fn mint_token_accounts(&self, _mint: &Pubkey) -> anyhow::Result<Vec<Vec<u8>>> {
            Ok(self
                .amounts
                .iter()
                .map(|amount| {
                    let mut data = vec![0u8; 165];
                    data[64..72].copy_from_slice(&amount.to_le_bytes());
                    data
                })
                .collect())
        }

        async fn block_time(&self, _slot: u64) -> anyhow::Result<Option<i64>> {
            Ok(Some(self.block_time))
        }
    }

    fn analytics_snapshot() -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            name: "Tether USD".to_string(),
            symbol: "USDT".to_string(),
            price: 1.0,
            market_cap: 1_000_000.0,
            liquidity: 5.0,
            launch_block: Some(4_634_748),
            ..Default::default()
        }
    }

    fn market_snapshot() -> MarketSnapshot {
        MarketSnapshot {
            name: "Tether".to_string(),
            symbol: "USDT".to_string(),
            price: 1.23,
            market_cap: 500_000.0,
            liquidity: 42.0,
            market_cap_rank: Some(3),
            ..Default::default()
        }
    }

    fn build(
        analytics: Arc<StubAnalytics>,
        market: Arc<StubMarket>,
        clients: ChainClients,
        ttl: Duration,
    ) -> TokenAggregator {
        TokenAggregator::with_sources(
            ChainTable::from_settings(&Settings::default()),
            analytics,
            market,
            clients,
            AggregatorOptions {
                cache_ttl: ttl,
                ..Default::default()
            },
        )
    }

    fn default_build(analytics: Arc<StubAnalytics>, market: Arc<StubMarket>) -> TokenAggregator {
        build(analytics, market, ChainClients::new(), Duration::from_secs(300))
    }

    #[tokio::test]
    async fn test_repeated_calls_hit_cache() {
        let analytics = StubAnalytics::ok(analytics_snapshot());
        let market = StubMarket::new(market_snapshot());
        let aggregator = default_build(analytics.clone(), market.clone());

        let first = aggregator.get_token_data(USDT, "ethereum").await.unwrap();
        let second = aggregator.get_token_data(USDT, "ethereum").await.unwrap();

        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(analytics.calls(), 1);
        assert_eq!(market.calls(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let analytics = StubAnalytics::ok(analytics_snapshot());
        let market = StubMarket::new(market_snapshot());
        let aggregator = build(
            analytics.clone(),
            market.clone(),
            ChainClients::new(),
            Duration::from_millis(100),
        );

        aggregator.get_token_data(USDT, "ethereum").await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        aggregator.get_token_data(USDT, "ethereum").await.unwrap();

        assert_eq!(analytics.calls(), 2);
        assert_eq!(market.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_key_is_case_sensitive() {
        let analytics = StubAnalytics::ok(analytics_snapshot());
        let aggregator = default_build(analytics.clone(), StubMarket::new(market_snapshot()));

        aggregator.get_token_data(USDT, "ethereum").await.unwrap();
        aggregator
            .get_token_data(USDT_CHECKSUMMED, "ethereum")
            .await
            .unwrap();

        assert_eq!(analytics.calls(), 2);
    }

    #[tokio::test]
    async fn test_default_chain_is_ethereum() {
        let analytics = StubAnalytics::ok(analytics_snapshot());
        let aggregator = default_build(analytics.clone(), StubMarket::new(market_snapshot()));

        let by_default = aggregator.get_token_data_default(USDT).await.unwrap();
        let explicit = aggregator.get_token_data(USDT, "ethereum").await.unwrap();

        assert!(Arc::ptr_eq(&by_default, &explicit));
        assert_eq!(analytics.calls(), 1);
    }

    #[tokio::test]
    async fn test_fallbacks_applied_end_to_end() {
        let analytics = StubAnalytics::ok(AnalyticsSnapshot {
            price: f64::NAN,
            market_cap: 0.0,
            liquidity: -1.0,
            ..Default::default()
        });
        let aggregator = default_build(analytics, StubMarket::new(market_snapshot()));

        let record = aggregator.get_token_data(USDT, "ethereum").await.unwrap();

        assert_eq!(record.price, 1.23);
        assert_eq!(record.market_cap, 500_000.0);
        assert_eq!(record.liquidity, 42.0);
        assert_eq!(record.name, "Tether");
        assert_eq!(record.holders, 0);
        assert_eq!(record.launch_date, None);
    }

    #[tokio::test]
    async fn test_missing_market_platform_degrades_to_empty_market_data() {
        let analytics = StubAnalytics::ok(AnalyticsSnapshot {
            price: f64::NAN,
            ..Default::default()
        });
        let market = StubMarket::new(market_snapshot());
        let aggregator = default_build(analytics, market.clone());

        // arbitrum has an analytics network but no market platform
        let record = aggregator.get_token_data(USDT, "arbitrum").await.unwrap();

        assert_eq!(market.calls(), 1);
        assert_eq!(record.price, 0.0);
        assert_eq!(record.market_cap, 0.0);
        assert_eq!(record.name, "");
    }

    #[tokio::test]
    async fn test_analytics_failure_propagates_and_is_not_cached() {
        let analytics = StubAnalytics::failing();
        let market = StubMarket::new(market_snapshot());
        let aggregator = default_build(analytics.clone(), market.clone());

        for _ in 0..2 {
            let err = aggregator.get_token_data(USDT, "ethereum").await.unwrap_err();
            assert!(matches!(
                err,
                AggregatorError::Provider(ProviderError::MissingCredential)
            ));
        }

        assert_eq!(analytics.calls(), 2);
        assert_eq!(market.calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_chain_rejected_without_network_calls() {
        let analytics = StubAnalytics::ok(analytics_snapshot());
        let market = StubMarket::new(market_snapshot());
        let aggregator = default_build(analytics.clone(), market.clone());

        let err = aggregator
            .get_token_data(USDT, "invalid-chain")
            .await
            .unwrap_err();

        assert!(matches!(err, AggregatorError::UnsupportedChain(ref c) if c == "invalid-chain"));
        assert_eq!(analytics.calls(), 0);
        assert_eq!(market.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_address_rejected_without_network_calls() {
        let analytics = StubAnalytics::ok(analytics_snapshot());
        let market = StubMarket::new(market_snapshot());
        let aggregator = default_build(analytics.clone(), market.clone());

        let evm = aggregator.get_token_data("0xinvalid", "ethereum").await;
        let sol = aggregator.get_token_data("0xinvalid", "solana").await;
        let bad_checksum = aggregator
            .get_token_data("0xDAC17F958D2ee523a2206206994597C13D831ec7", "ethereum")
            .await;

        assert!(matches!(evm, Err(AggregatorError::InvalidAddress { .. })));
        assert!(matches!(sol, Err(AggregatorError::InvalidAddress { .. })));
        assert!(matches!(bad_checksum, Err(AggregatorError::InvalidAddress { .. })));
        assert_eq!(analytics.calls(), 0);
        assert_eq!(market.calls(), 0);
    }

    #[tokio::test]
    async fn test_evm_holders_and_launch_date_from_own_chain() {
        let mut clients = ChainClients::new();
        clients.insert_evm(
            "bsc",
            Arc::new(StubEvm {
                balance: U256::from(1u64),
                block_timestamp: Some(1_511_829_681),
            }),
        );
        let aggregator = build(
            StubAnalytics::ok(analytics_snapshot()),
            StubMarket::new(market_snapshot()),
            clients,
            Duration::from_secs(300),
        );

        // No ethereum client exists, so the date can only come from bsc
        let record = aggregator.get_token_data(USDT, "bsc").await.unwrap();

        assert_eq!(record.holders, 2);
        assert_eq!(record.launch_date, unix_to_datetime(1_511_829_681));
    }

    #[tokio::test]
    async fn test_block_lookup_failure_leaves_launch_date_empty() {
        let mut clients = ChainClients::new();
        clients.insert_evm(
            "ethereum",
            Arc::new(StubEvm {
                balance: U256::ZERO,
                block_timestamp: None,
            }),
        );
        let aggregator = build(
            StubAnalytics::ok(analytics_snapshot()),
            StubMarket::new(market_snapshot()),
            clients,
            Duration::from_secs(300),
        );

        let record = aggregator.get_token_data(USDT, "ethereum").await.unwrap();

        assert_eq!(record.launch_date, None);
        assert_eq!(record.holders, 0);
    }

    #[tokio::test]
    async fn test_solana_holders_and_launch_date() {
        let mut clients = ChainClients::new();
        clients.insert_solana(
            "solana",
            Arc::new(StubSolana {
                amounts: vec![10, 0, 3, 7, 0],
                block_time: 1_700_000_000,
            }),
        );
        let aggregator = build(
            StubAnalytics::ok(analytics_snapshot()),
            StubMarket::new(market_snapshot()),
            clients,
            Duration::from_secs(300),
        );

        let record = aggregator.get_token_data(USDC_SOLANA, "solana").await.unwrap();

        assert_eq!(record.holders, 3);
        assert_eq!(record.launch_date, unix_to_datetime(1_700_000_000));
        assert_eq!(record.address, USDC_SOLANA);
    }

    #[tokio::test]
    async fn test_close_releases_aggregator() {
        let aggregator = default_build(
            StubAnalytics::ok(analytics_snapshot()),
            StubMarket::new(market_snapshot()),
        );
        aggregator.get_token_data(USDT, "ethereum").await.unwrap();
        aggregator.close().await;
    }
}
