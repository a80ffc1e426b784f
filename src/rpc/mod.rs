//! Chain RPC adapters.
//!
//! Each supported chain gets at most one client, built from its
//! [`ChainProfile`] when an RPC URL is configured.

mod evm;
mod solana;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use crate::chains::{ChainKind, ChainTable};

pub use evm::{AlloyEvmRpc, EvmRpc};
pub use solana::{
    normalize_rpc_url, SolanaRpc, SolanaRpcClient, TOKEN_ACCOUNT_AMOUNT_OFFSET,
    TOKEN_ACCOUNT_MINT_OFFSET, TOKEN_ACCOUNT_SIZE,
};

/// RPC clients owned by one aggregator instance, keyed by chain name.
#[derive(Default, Clone)]
pub struct ChainClients {
    evm: HashMap<String, Arc<dyn EvmRpc>>,
    solana: HashMap<String, Arc<dyn SolanaRpc>>,
}

impl ChainClients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every chain in `chains` that has an RPC URL.
    pub fn connect(chains: &ChainTable, call_timeout: Duration) -> Result<Self> {
        let mut clients = Self::new();

        for profile in chains.iter() {
            let Some(rpc_url) = profile.rpc_url.as_deref() else {
                warn!(
                    "No RPC URL configured for {}, holder counts and launch dates will be unavailable",
                    profile.name
                );
                continue;
            };

            match profile.kind {
                ChainKind::Evm => {
                    let rpc = AlloyEvmRpc::new(rpc_url, call_timeout)?;
                    clients.insert_evm(&profile.name, Arc::new(rpc));
                },
                ChainKind::Solana => {
                    let rpc = SolanaRpcClient::new(rpc_url, call_timeout);
                    clients.insert_solana(&profile.name, Arc::new(rpc));
                },
            }

            info!("Connected RPC client for {}", profile.name);
        }

        Ok(clients)
    }

    pub fn insert_evm(&mut self, chain: &str, rpc: Arc<dyn EvmRpc>) {
        self.evm.insert(chain.to_string(), rpc);
    }

    pub fn insert_solana(&mut self, chain: &str, rpc: Arc<dyn SolanaRpc>) {
        self.solana.insert(chain.to_string(), rpc);
    }

    pub fn evm(&self, chain: &str) -> Option<&Arc<dyn EvmRpc>> {
        self.evm.get(chain)
    }

    pub fn solana(&self, chain: &str) -> Option<&Arc<dyn SolanaRpc>> {
        self.solana.get(chain)
    }

    pub fn len(&self) -> usize {
        self.evm.len() + self.solana.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
