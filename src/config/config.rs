use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use dotenv::dotenv;
use serde::Deserialize;

/// Public Solana mainnet endpoint used when nothing else is configured.
pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

/// Bitquery GraphQL endpoint.
pub const DEFAULT_BITQUERY_URL: &str = "https://graphql.bitquery.io";

/// CoinGecko public REST API base.
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Root application configuration.
///
/// Layers, lowest priority first:
/// - built-in defaults
/// - optional `config.{yaml,toml,json}` in the working directory
/// - `.env` file, loaded into the environment without replacing set variables
/// - environment variables without prefix (`ETH_RPC_URL`, `BITQUERY_API_KEY`, ...)
/// - [`SettingsOverrides`] passed by the caller
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    // Chain RPC endpoints
    #[serde(default)]
    pub eth_rpc_url: Option<String>,
    #[serde(default)]
    pub bsc_rpc_url: Option<String>,
    #[serde(default)]
    pub polygon_rpc_url: Option<String>,
    #[serde(default)]
    pub avalanche_rpc_url: Option<String>,
    #[serde(default)]
    pub arbitrum_rpc_url: Option<String>,
    #[serde(default)]
    pub optimism_rpc_url: Option<String>,
    #[serde(default = "default_solana_rpc_url")]
    pub solana_rpc_url: String,

    // Analytics provider
    #[serde(default)]
    pub bitquery_api_key: Option<String>,
    #[serde(default = "default_bitquery_url")]
    pub bitquery_url: String,

    // Market-data provider
    #[serde(default = "default_coingecko_url")]
    pub coingecko_url: String,

    /// Timeout applied to every HTTP request (analytics and market data)
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout applied to every chain RPC call
    #[serde(default = "default_timeout_secs")]
    pub rpc_timeout_secs: u64,

    // Record cache
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_max_capacity")]
    pub cache_max_capacity: u64,

    /// Maximum in-flight `balanceOf` calls when sampling EVM balances
    #[serde(default = "default_holder_sample_concurrency")]
    pub holder_sample_concurrency: usize,
}

fn default_solana_rpc_url() -> String {
    DEFAULT_SOLANA_RPC_URL.to_string()
}

fn default_bitquery_url() -> String {
    DEFAULT_BITQUERY_URL.to_string()
}

fn default_coingecko_url() -> String {
    DEFAULT_COINGECKO_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_cache_max_capacity() -> u64 {
    10_000
}

fn default_holder_sample_concurrency() -> usize {
    5
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            eth_rpc_url: None,
            bsc_rpc_url: None,
            polygon_rpc_url: None,
            avalanche_rpc_url: None,
            arbitrum_rpc_url: None,
            optimism_rpc_url: None,
            solana_rpc_url: default_solana_rpc_url(),
            bitquery_api_key: None,
            bitquery_url: default_bitquery_url(),
            coingecko_url: default_coingecko_url(),
            request_timeout_secs: default_timeout_secs(),
            rpc_timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_capacity: default_cache_max_capacity(),
            holder_sample_concurrency: default_holder_sample_concurrency(),
        }
    }
}

/// Values supplied directly by the embedding application.
///
/// Anything set here wins over the config file and the environment.
#[derive(Debug, Default, Clone)]
pub struct SettingsOverrides {
    pub eth_rpc_url: Option<String>,
    pub bsc_rpc_url: Option<String>,
    pub polygon_rpc_url: Option<String>,
    pub avalanche_rpc_url: Option<String>,
    pub arbitrum_rpc_url: Option<String>,
    pub optimism_rpc_url: Option<String>,
    pub solana_rpc_url: Option<String>,
    pub bitquery_api_key: Option<String>,
}

impl Settings {
    /// Load settings from the config file and environment.
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_overrides(SettingsOverrides::default())
    }

    /// Load settings, letting `overrides` take precedence over every other source.
    ///
    /// A `.env` file in the working directory (or a parent) is read if present.
    pub fn with_overrides(overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::load(overrides)
    }

    /// Like [`Settings::with_overrides`], but reads environment variables from
    /// `path`, which must exist.
    pub fn from_env_file(path: &Path, overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        dotenv::from_path(path).map_err(|e| ConfigError::Foreign(Box::new(e)))?;
        Self::load(overrides)
    }

    fn load(overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::default().try_parsing(true))
            .set_override_option("eth_rpc_url", overrides.eth_rpc_url)?
            .set_override_option("bsc_rpc_url", overrides.bsc_rpc_url)?
            .set_override_option("polygon_rpc_url", overrides.polygon_rpc_url)?
            .set_override_option("avalanche_rpc_url", overrides.avalanche_rpc_url)?
            .set_override_option("arbitrum_rpc_url", overrides.arbitrum_rpc_url)?
            .set_override_option("optimism_rpc_url", overrides.optimism_rpc_url)?
            .set_override_option("solana_rpc_url", overrides.solana_rpc_url)?
            .set_override_option("bitquery_api_key", overrides.bitquery_api_key)?
            .build()?;

        let settings: Settings = s.try_deserialize()?;

        Ok(settings)
    }

    /// Analytics credential, treating an empty string as absent.
    pub fn bitquery_api_key(&self) -> Option<&str> {
        self.bitquery_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}
