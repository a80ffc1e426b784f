use thiserror::Error;

/// Failure of the mandatory analytics source.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Bitquery API key not found")]
    MissingCredential,

    #[error("chain `{0}` has no analytics network mapping")]
    UnmappedNetwork(String),

    #[error("analytics request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("analytics provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("analytics query rejected: {0}")]
    GraphQl(String),

    #[error("malformed analytics response: {0}")]
    Malformed(String),
}

/// Errors surfaced by [`crate::TokenAggregator::get_token_data`].
#[derive(Debug, Error)]
pub enum AggregatorError {
    #[error("unsupported chain `{0}`")]
    UnsupportedChain(String),

    #[error("invalid {chain} address `{address}`: {reason}")]
    InvalidAddress {
        chain: String,
        address: String,
        reason: String,
    },

    #[error("error fetching analytics data: {0}")]
    Provider(#[from] ProviderError),

    #[error("failed to initialize aggregator: {0:#}")]
    Setup(#[source] anyhow::Error),
}

pub type Result<T, E = AggregatorError> = std::result::Result<T, E>;
