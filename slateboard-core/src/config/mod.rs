//! Configuration for the sync core
//!
//! TOML-file based with environment overrides and validated defaults.

use crate::protocol::API_VERSION;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Sync client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Document store endpoint, e.g. "https://boards.example.com".
    /// Empty means same-origin (browser embedding).
    pub endpoint: String,

    /// Fixed poll interval; no back-off or jitter
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Per-request timeout on store calls
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Wire protocol version sent with every request
    pub api_version: i64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            endpoint: String::new(),
            poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
            api_version: API_VERSION,
        }
    }
}

impl SyncConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: SyncConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply SLATEBOARD_* environment overrides
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(endpoint) = env::var("SLATEBOARD_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Ok(interval) = env::var("SLATEBOARD_POLL_INTERVAL_MS") {
            let ms: u64 = interval.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("SLATEBOARD_POLL_INTERVAL_MS: {}", e))
            })?;
            self.poll_interval = Duration::from_millis(ms);
        }
        if let Ok(timeout) = env::var("SLATEBOARD_REQUEST_TIMEOUT_MS") {
            let ms: u64 = timeout.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("SLATEBOARD_REQUEST_TIMEOUT_MS: {}", e))
            })?;
            self.request_timeout = Duration::from_millis(ms);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ValidationFailed("poll_interval must be non-zero".into()));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed("request_timeout must be non-zero".into()));
        }
        if self.api_version != API_VERSION {
            return Err(ConfigError::ValidationFailed(format!(
                "unsupported api_version {}",
                self.api_version
            )));
        }
        Ok(())
    }
}
