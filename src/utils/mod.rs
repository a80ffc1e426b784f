//! Utility functions for tokenscope.
//!
//! - [`validation`] - Per-chain address validation
//! - [`conversion`] - Lenient numeric decoding and timestamp formatting

mod conversion;
mod validation;

// ============================================
// Common Constants
// ============================================

/// The Ethereum zero address (0x0000000000000000000000000000000000000000)
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Conventional burn address (0x000000000000000000000000000000000000dEaD)
pub const BURN_ADDRESS: &str = "0x000000000000000000000000000000000000dead";

// ============================================
// Re-exports
// ============================================

pub use conversion::{
    de_opt_f64, de_opt_u64, to_iso8601, unix_to_datetime, value_to_f64, value_to_u64,
};

pub use validation::{parse_evm_address, parse_solana_address, validate_address, ValidatedAddress};
