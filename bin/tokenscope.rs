use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};
use simple_logger::SimpleLogger;

use tokenscope::{Settings, SettingsOverrides, TokenAggregator, DEFAULT_CHAIN};

/// Look up aggregated token data and print it as JSON.
#[derive(Debug, Parser)]
#[command(name = "tokenscope", version)]
struct Args {
    /// Token contract address (EVM) or mint (Solana)
    address: String,

    /// Chain name: ethereum, bsc, polygon, avalanche, arbitrum, optimism, solana
    #[arg(short, long, default_value = DEFAULT_CHAIN)]
    chain: String,

    /// Bitquery API key (overrides BITQUERY_API_KEY)
    #[arg(long)]
    bitquery_api_key: Option<String>,

    /// RPC endpoint for the selected chain (overrides config and environment)
    #[arg(long)]
    rpc_url: Option<String>,

    /// Read environment variables from this file instead of `./.env`
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        let mut overrides = SettingsOverrides {
            bitquery_api_key: self.bitquery_api_key.clone(),
            ..Default::default()
        };

        let rpc_url = self.rpc_url.clone();
        match self.chain.as_str() {
            "ethereum" => overrides.eth_rpc_url = rpc_url,
            "bsc" => overrides.bsc_rpc_url = rpc_url,
            "polygon" => overrides.polygon_rpc_url = rpc_url,
            "avalanche" => overrides.avalanche_rpc_url = rpc_url,
            "arbitrum" => overrides.arbitrum_rpc_url = rpc_url,
            "optimism" => overrides.optimism_rpc_url = rpc_url,
            "solana" => overrides.solana_rpc_url = rpc_url,
            _ => {},
        }

        overrides
    }
}

#[tokio::main()]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    SimpleLogger::new()
        .with_level(if args.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init()
        .context("Failed to initialize logger")?;

    // Load configuration
    let settings = match &args.env_file {
        Some(path) => Settings::from_env_file(path, args.overrides()),
        None => Settings::with_overrides(args.overrides()),
    }
    .context("Failed to load configuration. Please check config file and environment")?;

    let aggregator = TokenAggregator::new(&settings).context("Failed to initialize aggregator")?;

    info!("Fetching {} on {}", args.address, args.chain);

    let record = aggregator
        .get_token_data(&args.address, &args.chain)
        .await
        .with_context(|| format!("Failed to fetch token data for {}", args.address))?;

    println!("{}", serde_json::to_string_pretty(record.as_ref())?);

    aggregator.close().await;

    Ok(())
}
