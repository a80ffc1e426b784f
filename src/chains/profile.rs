use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Settings;

/// Chain name used when the caller does not pick one.
pub const DEFAULT_CHAIN: &str = "ethereum";

/// Address format and RPC family of a chain.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChainKind {
    Evm,
    Solana,
}

/// Static per-chain configuration.
///
/// Holds the RPC endpoint plus the identifiers each external provider uses
/// for this chain. A missing `analytics_network` makes the chain unusable
/// for analytics; a missing `market_platform` yields empty market data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainProfile {
    pub name: String,
    pub kind: ChainKind,
    pub rpc_url: Option<String>,
    pub analytics_network: Option<String>,
    pub market_platform: Option<String>,
}

impl ChainProfile {
    pub fn new(name: &str, kind: ChainKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            rpc_url: None,
            analytics_network: None,
            market_platform: None,
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: Option<String>) -> Self {
        self.rpc_url = rpc_url.filter(|url| !url.trim().is_empty());
        self
    }

    pub fn with_analytics_network(mut self, network: &str) -> Self {
        self.analytics_network = Some(network.to_string());
        self
    }

    pub fn with_market_platform(mut self, platform: &str) -> Self {
        self.market_platform = Some(platform.to_string());
        self
    }
}

/// Lookup table of supported chains, keyed by exact (case-sensitive) name.
#[derive(Debug, Clone, Default)]
pub struct ChainTable {
    profiles: HashMap<String, ChainProfile>,
}

impl ChainTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the default chain table, taking RPC endpoints from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut table = Self::new();

        table.insert(
            ChainProfile::new("ethereum", ChainKind::Evm)
                .with_rpc_url(settings.eth_rpc_url.clone())
                .with_analytics_network("ethereum")
                .with_market_platform("ethereum"),
        );
        table.insert(
            ChainProfile::new("bsc", ChainKind::Evm)
                .with_rpc_url(settings.bsc_rpc_url.clone())
                .with_analytics_network("bsc")
                .with_market_platform("binance-smart-chain"),
        );
        table.insert(
            ChainProfile::new("polygon", ChainKind::Evm)
                .with_rpc_url(settings.polygon_rpc_url.clone())
                .with_analytics_network("matic")
                .with_market_platform("polygon-pos"),
        );
        table.insert(
            ChainProfile::new("avalanche", ChainKind::Evm)
                .with_rpc_url(settings.avalanche_rpc_url.clone())
                .with_analytics_network("avalanche")
                .with_market_platform("avalanche"),
        );
        // Analytics-only: no market platform configured
        table.insert(
            ChainProfile::new("arbitrum", ChainKind::Evm)
                .with_rpc_url(settings.arbitrum_rpc_url.clone())
                .with_analytics_network("arbitrum"),
        );
        table.insert(
            ChainProfile::new("optimism", ChainKind::Evm)
                .with_rpc_url(settings.optimism_rpc_url.clone())
                .with_analytics_network("optimism"),
        );
        table.insert(
            ChainProfile::new("solana", ChainKind::Solana)
                .with_rpc_url(Some(settings.solana_rpc_url.clone()))
                .with_analytics_network("solana")
                .with_market_platform("solana"),
        );

        table
    }

    pub fn insert(&mut self, profile: ChainProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    pub fn get(&self, chain: &str) -> Option<&ChainProfile> {
        self.profiles.get(chain)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
