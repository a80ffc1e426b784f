use std::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use crate::abis::IERC20;

/// Read-only EVM calls needed by the aggregator.
#[async_trait]
pub trait EvmRpc: Send + Sync {
    /// ERC-20 `balanceOf(holder)` on `token`.
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256>;

    /// Unix timestamp of block `number`, or None if the node does not know it.
    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>>;
}

/// [`EvmRpc`] over an alloy HTTP provider.
#[derive(Clone)]
pub struct AlloyEvmRpc {
    provider: DynProvider,
    call_timeout: Duration,
}

impl AlloyEvmRpc {
    pub fn new(rpc_url: &str, call_timeout: Duration) -> Result<Self> {
        let url = Url::parse(rpc_url).with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        let client = ProviderBuilder::new().connect_http(url);

        Ok(Self {
            provider: DynProvider::new(client),
            call_timeout,
        })
    }
}

#[async_trait]
impl EvmRpc for AlloyEvmRpc {
    async fn balance_of(&self, token: Address, holder: Address) -> Result<U256> {
        let contract = IERC20::new(token, &self.provider);

        let balance = tokio::time::timeout(self.call_timeout, contract.balanceOf(holder).call())
            .await
            .context("balanceOf timeout")?
            .context("balanceOf call failed")?;

        Ok(balance)
    }

    async fn block_timestamp(&self, number: u64) -> Result<Option<u64>> {
        let block = tokio::time::timeout(
            self.call_timeout,
            self.provider
                .get_block_by_number(BlockNumberOrTag::Number(number)),
        )
        .await
        .context("getBlock timeout")?
        .with_context(|| format!("Failed to fetch block {}", number))?;

        Ok(block.map(|b| b.header.timestamp))
    }
}
