use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::window::PerWindow;

/// Unified token view returned by [`crate::TokenAggregator`].
///
/// Built once per cache miss and shared immutably afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub address: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub market_cap: f64,
    pub liquidity: f64,
    pub volume: PerWindow<f64>,
    pub transactions: PerWindow<u64>,
    /// Estimate only; see [`crate::holders::HolderEstimator`]
    pub holders: u64,
    #[serde(with = "launch_date_format")]
    pub launch_date: Option<DateTime<Utc>>,
}

/// Serialises the launch date as ISO-8601 with milliseconds, or `null`.
mod launch_date_format {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::utils::to_iso8601;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&to_iso8601(ts)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<DateTime<Utc>>::deserialize(deserializer)
    }
}
