//! Address validation per chain family.
//!
//! Every address is checked against its chain's native format before any
//! network call. Rules:
//!
//! 1. EVM: `0x` followed by exactly 40 hex characters. Mixed-case input is
//!    treated as EIP-55 and its checksum must match. Single-case input has
//!    no checksum to verify and is accepted as is.
//!
//! 2. SOLANA: base58 string decoding to a 32-byte public key.

use std::str::FromStr;

use alloy::primitives::Address;
use solana_sdk::pubkey::Pubkey;

use crate::chains::{ChainKind, ChainProfile};
use crate::error::AggregatorError;

/// An address that passed the format check for its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatedAddress {
    Evm(Address),
    Solana(Pubkey),
}

/// Parse an EVM address, enforcing the EIP-55 checksum on mixed-case input.
pub fn parse_evm_address(input: &str) -> Result<Address, String> {
    let hex = input
        .strip_prefix("0x")
        .ok_or_else(|| "missing 0x prefix".to_string())?;

    if hex.len() != 40 {
        return Err(format!("expected 40 hex characters, got {}", hex.len()));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("contains non-hex characters".to_string());
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(input, None).map_err(|_| "checksum mismatch".to_string())
    } else {
        Address::from_str(input).map_err(|e| e.to_string())
    }
}

/// Parse a base58 Solana public key.
pub fn parse_solana_address(input: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(input).map_err(|e| e.to_string())
}

/// Validate `address` against the format of `profile`'s chain.
pub fn validate_address(
    address: &str,
    profile: &ChainProfile,
) -> Result<ValidatedAddress, AggregatorError> {
    let parsed = match profile.kind {
        ChainKind::Evm => parse_evm_address(address).map(ValidatedAddress::Evm),
        ChainKind::Solana => parse_solana_address(address).map(ValidatedAddress::Solana),
    };

    parsed.map_err(|reason| AggregatorError::InvalidAddress {
        chain: profile.name.clone(),
        address: address.to_string(),
        reason,
    })
}
