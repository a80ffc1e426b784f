mod config;

pub use config::{
    Settings, SettingsOverrides, DEFAULT_BITQUERY_URL, DEFAULT_COINGECKO_URL,
    DEFAULT_SOLANA_RPC_URL,
};
