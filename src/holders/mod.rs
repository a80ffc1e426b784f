//! Holder-count estimation.
//!
//! - EVM: samples a fixed pair of addresses (burn and zero). This is a
//!   diagnostic, not a holder count, and usually returns 0, 1 or 2.
//! - Solana: scans all token accounts for the mint and counts funded ones.
//!
//! Estimation never fails outward; any error yields 0.

mod evm;
mod solana;

use std::sync::Arc;

use log::{error, warn};

use crate::chains::ChainProfile;
use crate::rpc::ChainClients;
use crate::utils::ValidatedAddress;

pub use evm::{count_sampled_holders, SAMPLE_ADDRESSES};
pub use solana::{count_mint_holders, token_account_amount};

/// Dispatches holder estimation to the strategy for each chain kind.
#[derive(Clone)]
pub struct HolderEstimator {
    clients: Arc<ChainClients>,
    sample_concurrency: usize,
}

impl HolderEstimator {
    pub fn new(clients: Arc<ChainClients>, sample_concurrency: usize) -> Self {
        Self {
            clients,
            sample_concurrency,
        }
    }

    pub async fn count_holders(&self, address: &ValidatedAddress, chain: &ChainProfile) -> u64 {
        let result = match address {
            ValidatedAddress::Evm(token) => {
                let Some(rpc) = self.clients.evm(&chain.name) else {
                    warn!("Provider not found for {}", chain.name);
                    return 0;
                };
                count_sampled_holders(
                    rpc.as_ref(),
                    *token,
                    &SAMPLE_ADDRESSES,
                    self.sample_concurrency,
                )
                .await
            },
            ValidatedAddress::Solana(mint) => {
                let Some(rpc) = self.clients.solana(&chain.name) else {
                    warn!("Connection not found for {}", chain.name);
                    return 0;
                };
                count_mint_holders(rpc.as_ref(), mint).await
            },
        };

        result.unwrap_or_else(|e| {
            error!("Error fetching holders count ({}): {:#}", chain.name, e);
            0
        })
    }
}
