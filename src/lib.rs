pub mod abis;
pub mod aggregator;
pub mod chains;
pub mod config;
pub mod error;
pub mod holders;
pub mod models;
pub mod providers;
pub mod rpc;
pub mod utils;

pub use aggregator::{AggregatorOptions, TokenAggregator};
pub use chains::{ChainKind, ChainProfile, ChainTable, DEFAULT_CHAIN};
pub use config::{Settings, SettingsOverrides};
pub use error::{AggregatorError, ProviderError};
pub use models::{AnalyticsSnapshot, MarketSnapshot, TokenRecord};
