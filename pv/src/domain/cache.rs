//! Catalog cache bookkeeping used by the background refresh

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::id::short_version;
use super::number;
use super::timestamp;

pub const DEFAULT_REFRESH_INTERVAL_MINUTES: u32 = 60;
pub const MIN_REFRESH_INTERVAL_MINUTES: u32 = 1;

fn default_interval() -> u32 {
    DEFAULT_REFRESH_INTERVAL_MINUTES
}

fn default_enabled() -> bool {
    true
}

/// Unreadable intervals fall back to the default; readable ones get the minimum applied
fn lenient_interval<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number::count_from(&value).map_or(DEFAULT_REFRESH_INTERVAL_MINUTES, |n| {
        u32::try_from(n).unwrap_or(u32::MAX).max(MIN_REFRESH_INTERVAL_MINUTES)
    }))
}

/// Refresh bookkeeping persisted with the state
///
/// `last_background_refresh` is `None` until the first successful refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    #[serde(default = "timestamp::unset", deserialize_with = "timestamp::deserialize_lenient")]
    pub last_updated: DateTime<Utc>,

    #[serde(default, deserialize_with = "timestamp::deserialize_lenient_opt")]
    pub last_background_refresh: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data_version: String,

    #[serde(default)]
    pub is_stale: bool,

    #[serde(default = "default_interval", deserialize_with = "lenient_interval")]
    pub refresh_interval_minutes: u32,

    #[serde(default = "default_enabled", alias = "backgroundRefreshEnabled")]
    pub enabled: bool,
}

impl Default for CacheMetadata {
    fn default() -> Self {
        Self {
            last_updated: Utc::now(),
            last_background_refresh: None,
            data_version: String::new(),
            is_stale: false,
            refresh_interval_minutes: DEFAULT_REFRESH_INTERVAL_MINUTES,
            enabled: true,
        }
    }
}

impl CacheMetadata {
    /// Interval with the minimum applied
    pub fn interval(&self) -> Duration {
        Duration::minutes(i64::from(self.refresh_interval_minutes.max(MIN_REFRESH_INTERVAL_MINUTES)))
    }

    /// True when no refresh has completed or the interval has elapsed since the last one
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_background_refresh {
            None => true,
            Some(last) => now - last >= self.interval(),
        }
    }

    /// Record a successful refresh
    pub fn mark_refreshed(&mut self, now: DateTime<Utc>) {
        self.last_background_refresh = Some(now);
        self.last_updated = now;
        self.data_version = short_version();
        self.is_stale = false;
    }

    pub fn set_interval_minutes(&mut self, minutes: u32) {
        self.refresh_interval_minutes = minutes.max(MIN_REFRESH_INTERVAL_MINUTES);
    }
}
