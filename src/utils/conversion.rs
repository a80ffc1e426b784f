//! Lenient numeric decoding and timestamp formatting.
//!
//! Provider payloads report numbers inconsistently: the same field may come
//! back as a JSON number, a numeric string, or `null`. These helpers accept
//! all three.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

// ============================================
// JSON Value Conversions
// ============================================

/// Convert a JSON number or numeric string to f64.
pub fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Convert a JSON number or numeric string to u64.
///
/// Float values are accepted only when they are whole and non-negative.
pub fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| value_to_u64(&Value::from(s.parse::<f64>().ok()?)))
        },
        _ => None,
    }
}

// ============================================
// Serde Helpers
// ============================================

/// `deserialize_with` helper for optional lenient f64 fields.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_f64))
}

/// `deserialize_with` helper for optional lenient u64 fields.
pub fn de_opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_u64))
}

// ============================================
// Timestamps
// ============================================

/// Convert unix seconds to a UTC datetime. Returns None when out of range.
pub fn unix_to_datetime(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn to_iso8601(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
