//! Lenient timestamp deserialization
//!
//! Remote catalogs and older saved states carry timestamps in several shapes
//! (RFC 3339, naive ISO without offset, bare dates, or null). Anything that
//! cannot be read becomes the UNIX epoch, which callers treat as "unset".

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// The "unset" timestamp
pub fn unset() -> DateTime<Utc> {
    DateTime::<Utc>::default()
}

pub fn is_unset(ts: &DateTime<Utc>) -> bool {
    *ts == unset()
}

/// Parse a timestamp string in any of the accepted shapes
pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// serde `deserialize_with` hook for required timestamp fields
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let parsed = match &value {
        Value::String(raw) => parse(raw),
        Value::Number(n) => n.as_i64().and_then(DateTime::<Utc>::from_timestamp_millis),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(unset))
}

/// serde `deserialize_with` hook for optional timestamp fields
pub fn deserialize_lenient_opt<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let ts = deserialize_lenient(deserializer)?;
    Ok(if is_unset(&ts) { None } else { Some(ts) })
}
