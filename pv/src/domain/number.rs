//! Lenient numeric deserialization
//!
//! Saved states may carry hand-edited numbers: negative, fractional, quoted
//! or null. These hooks read what they can and fall back to zero, so one bad
//! field never rejects the whole state.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::rating::MAX_RATING;

/// Finite float from a number or numeric string
pub fn float_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
    .filter(|v: &f64| v.is_finite())
}

/// Non-negative whole number; fractions are truncated, negatives become 0
pub fn count_from(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    float_from(value).map(|v| if v <= 0.0 { 0 } else { v.trunc() as u64 })
}

/// serde `deserialize_with` hook for ratings, rounded and clamped to 0..=5
pub fn deserialize_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(float_from(&value).map_or(0, |v| v.round().clamp(0.0, f64::from(MAX_RATING)) as u8))
}

/// serde `deserialize_with` hook for unsigned counters
pub fn deserialize_count<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<u64> + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(count_from(&value)
        .and_then(|n| T::try_from(n).ok())
        .unwrap_or_default())
}

/// serde `deserialize_with` hook for signed integers such as sort positions
pub fn deserialize_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + Default,
{
    let value = Value::deserialize(deserializer)?;
    let whole = value.as_i64().or_else(|| float_from(&value).map(|v| v.trunc() as i64));
    Ok(whole.and_then(|n| T::try_from(n).ok()).unwrap_or_default())
}

/// serde `deserialize_with` hook for non-negative averages
pub fn deserialize_average<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(float_from(&value).map_or(0.0, |v| v.max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize, Default)]
    #[serde(default)]
    struct Holder {
        #[serde(deserialize_with = "deserialize_rating")]
        rating: u8,
        #[serde(deserialize_with = "deserialize_count")]
        uses: u64,
        #[serde(deserialize_with = "deserialize_count")]
        small: usize,
        #[serde(deserialize_with = "deserialize_int")]
        order: i32,
        #[serde(deserialize_with = "deserialize_average")]
        average: f64,
    }

    fn holder(json: &str) -> Holder {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_rating_clamped_and_rounded() {
        assert_eq!(holder(r#"{"rating": -1}"#).rating, 0);
        assert_eq!(holder(r#"{"rating": 3.6}"#).rating, 4);
        assert_eq!(holder(r#"{"rating": 42}"#).rating, MAX_RATING);
        assert_eq!(holder(r#"{"rating": "2"}"#).rating, 2);
        assert_eq!(holder(r#"{"rating": null}"#).rating, 0);
        assert_eq!(holder(r#"{"rating": [5]}"#).rating, 0);
    }

    #[test]
    fn test_counts() {
        let h = holder(r#"{"uses": -7, "small": 2.9}"#);
        assert_eq!(h.uses, 0);
        assert_eq!(h.small, 2);
        assert_eq!(holder(r#"{"uses": 18446744073709551615}"#).uses, u64::MAX);
        assert_eq!(holder(r#"{"uses": "lots"}"#).uses, 0);
    }

    #[test]
    fn test_int_and_average() {
        let h = holder(r#"{"order": -3.5, "average": -1.0}"#);
        assert_eq!(h.order, -3);
        assert_eq!(h.average, 0.0);
        assert_eq!(holder(r#"{"average": "4.5"}"#).average, 4.5);
    }

    #[test]
    fn test_missing_fields_default() {
        let h = holder("{}");
        assert_eq!(h.rating, 0);
        assert_eq!(h.uses, 0);
        assert_eq!(h.average, 0.0);
    }
}
