use alloy::primitives::Address;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::debug;
use once_cell::sync::Lazy;

use crate::rpc::EvmRpc;
use crate::utils::{parse_evm_address, BURN_ADDRESS, ZERO_ADDRESS};

/// Fixed addresses sampled by the EVM diagnostic.
///
/// This is not a sample of the holder population. The result only says how
/// many of these well-known sinks hold the token.
pub static SAMPLE_ADDRESSES: Lazy<Vec<Address>> = Lazy::new(|| {
    [BURN_ADDRESS, ZERO_ADDRESS]
        .iter()
        .filter_map(|addr| parse_evm_address(addr).ok())
        .collect()
});

/// Count sampled addresses with a non-zero `token` balance.
///
/// At most `concurrency` calls are in flight. A failed call counts as zero,
/// unless every call fails, in which case the last error is returned.
pub async fn count_sampled_holders(
    rpc: &dyn EvmRpc,
    token: Address,
    samples: &[Address],
    concurrency: usize,
) -> Result<u64> {
    let results: Vec<Result<bool>> = stream::iter(samples.iter().copied())
        .map(|holder| async move {
            rpc.balance_of(token, holder)
                .await
                .map(|balance| !balance.is_zero())
                .map_err(|e| {
                    debug!("balanceOf({}) on {} failed: {:#}", holder, token, e);
                    e
                })
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut funded = 0u64;
    let mut failed = 0usize;
    let mut last_error = None;
    for result in results {
        match result {
            Ok(true) => funded += 1,
            Ok(false) => {},
            Err(e) => {
                failed += 1;
                last_error = Some(e);
            },
        }
    }

    match last_error {
        Some(e) if failed == samples.len() => {
            Err(e.context(format!("all {} balanceOf calls failed for {}", failed, token)))
        },
        _ => Ok(funded),
    }
}
