//! GraphQL documents sent to Bitquery.
//!
//! EVM networks are queried under the `ethereum(network:)` root and Solana
//! under `solana(network:)`. Both roots return the same field aliases so a
//! single set of response types decodes either.

use crate::chains::ChainKind;

/// Token metadata, first transfer block and aggregate trade data over `$from..$till`.
///
/// `supply` sums everything minted from the zero address.
pub const EVM_TOKEN_DATA_QUERY: &str = r#"
query ($network: EthereumNetwork!, $token: String!, $from: ISO8601DateTime, $till: ISO8601DateTime) {
    ethereum(network: $network) {
        transfers(
            currency: {is: $token}
            date: {since: $from, till: $till}
        ) {
            currency {
                name
                symbol
                decimals
            }
            amount
            count
            volumeUSD: amount(calculate: sum, in: USD)
            firstTransaction: minimum(of: block)
            transactions: count
        }
        supply: transfers(
            currency: {is: $token}
            sender: {is: "0x0000000000000000000000000000000000000000"}
        ) {
            totalSupply: amount(calculate: sum)
        }
        dexTrades(
            baseCurrency: {is: $token}
        ) {
            tradeAmount(in: USD)
            baseAmount
            lastPrice: maximum(of: block, get: quote_price)
            liquidity: maximum(of: quote_price, get: quote_price)
        }
    }
}
"#;

/// Solana counterpart of [`EVM_TOKEN_DATA_QUERY`], without `supply`.
///
/// `firstTransaction` (`minimum(of: block)`) is read as a slot number and is
/// resolved to a date with `getBlockTime(slot)`.
pub const SOLANA_TOKEN_DATA_QUERY: &str = r#"
query ($network: SolanaNetwork!, $token: String!, $from: ISO8601DateTime, $till: ISO8601DateTime) {
    solana(network: $network) {
        transfers(
            currency: {is: $token}
            date: {since: $from, till: $till}
        ) {
            currency {
                name
                symbol
                decimals
            }
            amount
            count
            volumeUSD: amount(calculate: sum, in: USD)
            firstTransaction: minimum(of: block)
            transactions: count
        }
        dexTrades(
            baseCurrency: {is: $token}
        ) {
            tradeAmount(in: USD)
            baseAmount
            lastPrice: maximum(of: block, get: quote_price)
            liquidity: maximum(of: quote_price, get: quote_price)
        }
    }
}
"#;

/// Trade volume and count since `$from`.
pub const EVM_WINDOW_METRICS_QUERY: &str = r#"
query ($network: EthereumNetwork!, $token: String!, $from: ISO8601DateTime) {
    ethereum(network: $network) {
        dexTrades(
            baseCurrency: {is: $token}
            time: {since: $from}
        ) {
            volumeUSD: tradeAmount(in: USD)
            transactions: count
        }
    }
}
"#;

pub const SOLANA_WINDOW_METRICS_QUERY: &str = r#"
query ($network: SolanaNetwork!, $token: String!, $from: ISO8601DateTime) {
    solana(network: $network) {
        dexTrades(
            baseCurrency: {is: $token}
            time: {since: $from}
        ) {
            volumeUSD: tradeAmount(in: USD)
            transactions: count
        }
    }
}
"#;

pub fn token_data_query(kind: ChainKind) -> &'static str {
    match kind {
        ChainKind::Evm => EVM_TOKEN_DATA_QUERY,
        ChainKind::Solana => SOLANA_TOKEN_DATA_QUERY,
    }
}

pub fn window_metrics_query(kind: ChainKind) -> &'static str {
    match kind {
        ChainKind::Evm => EVM_WINDOW_METRICS_QUERY,
        ChainKind::Solana => SOLANA_WINDOW_METRICS_QUERY,
    }
}
