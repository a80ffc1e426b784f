use anyhow::Result;
use solana_sdk::pubkey::Pubkey;

use crate::rpc::{SolanaRpc, TOKEN_ACCOUNT_AMOUNT_OFFSET};

/// Token amount stored in a raw SPL token account, if the data is long enough.
pub fn token_account_amount(data: &[u8]) -> Option<u64> {
    let bytes = data.get(TOKEN_ACCOUNT_AMOUNT_OFFSET..TOKEN_ACCOUNT_AMOUNT_OFFSET + 8)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}

/// Count token accounts of `mint` with a non-zero amount.
///
/// Enumerates every account for the mint in one call, without pagination.
pub async fn count_mint_holders(rpc: &dyn SolanaRpc, mint: &Pubkey) -> Result<u64> {
    let accounts = rpc.mint_token_accounts(mint).await?;

    let funded = accounts
        .iter()
        .filter(|data| token_account_amount(data).is_some_and(|amount| amount > 0))
        .count();

    Ok(funded as u64)
}
