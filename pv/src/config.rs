//! PromptVault configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::store::STATE_KEY;

/// Main PromptVault configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where state is persisted
    pub storage: StorageConfig,

    /// Remote catalog and background refresh
    pub refresh: RefreshSettings,

    /// Log level (trace, debug, info, warn, error)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Directory for the log file
    #[serde(rename = "log-dir")]
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            refresh: RefreshSettings::default(),
            log_level: None,
            log_dir: default_data_dir().join("logs"),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("promptvault")
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local: .promptvault.yml
        let local_config = PathBuf::from(".promptvault.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User: ~/.config/promptvault/promptvault.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("promptvault").join("promptvault.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of the key-value store
    pub path: PathBuf,

    /// Key the application state is saved under
    #[serde(rename = "state-key")]
    pub state_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: kvstore::default_store_path(),
            state_key: STATE_KEY.to_string(),
        }
    }
}

/// Remote catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshSettings {
    /// Catalog URL
    pub url: String,

    /// Overrides the persisted refresh interval when set
    #[serde(rename = "interval-minutes")]
    pub interval_minutes: Option<u32>,

    /// Overrides the persisted enabled flag when set
    pub enabled: Option<bool>,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Seed an empty library from the remote catalog instead of the built-in one
    #[serde(rename = "seed-from-remote")]
    pub seed_from_remote: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            interval_minutes: None,
            enabled: None,
            timeout_ms: 30_000,
            seed_from_remote: true,
        }
    }
}

impl RefreshSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
