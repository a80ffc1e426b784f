use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcProgramAccountsConfig;
use solana_client::rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType};
use solana_sdk::pubkey::Pubkey;

/// Size of an SPL token account
pub const TOKEN_ACCOUNT_SIZE: u64 = 165;

/// Offset of the mint pubkey inside an SPL token account
pub const TOKEN_ACCOUNT_MINT_OFFSET: usize = 0;

/// Offset of the little-endian u64 amount inside an SPL token account
pub const TOKEN_ACCOUNT_AMOUNT_OFFSET: usize = 64;

/// Read-only Solana calls needed by the aggregator.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Raw data of every token-program account holding `mint`.
    async fn mint_token_accounts(&self, mint: &Pubkey) -> Result<Vec<Vec<u8>>>;

    /// Unix block time of `slot`, or None when the slot has no recorded time.
    async fn block_time(&self, slot: u64) -> Result<Option<i64>>;
}

/// [`SolanaRpc`] over the nonblocking `RpcClient`.
pub struct SolanaRpcClient {
    client: RpcClient,
    call_timeout: Duration,
}

impl SolanaRpcClient {
    pub fn new(rpc_url: &str, call_timeout: Duration) -> Self {
        Self {
            client: RpcClient::new_with_timeout(normalize_rpc_url(rpc_url), call_timeout),
            call_timeout,
        }
    }
}

/// Prefix scheme-less endpoints with `https://`.
pub fn normalize_rpc_url(rpc_url: &str) -> String {
    if rpc_url.starts_with("http") {
        rpc_url.to_string()
    } else {
        format!("https://{}", rpc_url)
    }
}

#[async_trait]
impl SolanaRpc for SolanaRpcClient {
    async fn mint_token_accounts(&self, mint: &Pubkey) -> Result<Vec<Vec<u8>>> {
        let filters = vec![
            RpcFilterType::DataSize(TOKEN_ACCOUNT_SIZE),
            RpcFilterType::Memcmp(Memcmp::new(
                TOKEN_ACCOUNT_MINT_OFFSET,
                MemcmpEncodedBytes::Base58(mint.to_string()),
            )),
        ];

        let config = RpcProgramAccountsConfig {
            filters: Some(filters),
            account_config: Default::default(),
            ..Default::default()
        };

        let accounts = tokio::time::timeout(
            self.call_timeout,
            self.client
                .get_program_accounts_with_config(&spl_token::ID, config),
        )
        .await
        .context("Timeout getting token accounts")?
        .context("Failed to get token accounts")?;

        Ok(accounts
            .into_iter()
            .map(|(_, account)| account.data)
            .collect())
    }

    async fn block_time(&self, slot: u64) -> Result<Option<i64>> {
        let time = tokio::time::timeout(self.call_timeout, self.client.get_block_time(slot))
            .await
            .context("Timeout getting block time")?
            .with_context(|| format!("Failed to get block time for slot {}", slot))?;

        Ok(Some(time))
    }
}
