//! History Configuration
//!
//! Endpoint and paging settings for the remote history sources, loaded
//! from the environment or deserialized from the FFI request.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::error::HistoryError;
use crate::history::HistoryContext;
use crate::log_warn;

pub const DEFAULT_BASE_URL: &str = "https://polkadot.api.subscan.io";
pub const DEFAULT_ROW: u32 = 100;
/// Upper bound on any page size; explorers cap `row` far below this
pub const MAX_ROW: u32 = 10_000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;
pub const DEFAULT_THROTTLE_WAIT_SECS: u64 = 5;

/// Rejected configuration values
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),

    #[error("HTTPS required for remote endpoint {0}")]
    InsecureEndpoint(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{field} must be at least 1")]
    ZeroValue { field: &'static str },

    #[error("{field} must be at most {max}")]
    TooLarge { field: &'static str, max: u32 },
}

impl From<ConfigError> for HistoryError {
    fn from(e: ConfigError) -> Self {
        HistoryError::invalid_input(e.to_string())
    }
}

/// Settings for talking to the history explorer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub base_url: String,
    /// Preferred page size per source
    pub default_row: u32,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    /// Client-side request budget per explorer host
    pub requests_per_second: u32,
    /// Longest a request waits locally for the budget; 0 fails at once
    pub throttle_wait_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            default_row: DEFAULT_ROW,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            api_key: None,
            requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            throttle_wait_secs: DEFAULT_THROTTLE_WAIT_SECS,
        }
    }
}

impl HistoryConfig {
    /// Load configuration from environment variables
    ///
    /// - `HISTORY_BASE_URL`: explorer endpoint
    /// - `HISTORY_DEFAULT_ROW`: page size per source
    /// - `HISTORY_TIMEOUT_SECS`: request timeout
    /// - `HISTORY_API_KEY`: explorer API key (optional)
    /// - `HISTORY_RATE_LIMIT`: requests per second per host
    /// - `HISTORY_THROTTLE_WAIT_SECS`: longest local wait for the rate limit
    ///
    /// Malformed numbers fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_url: env::var("HISTORY_BASE_URL").unwrap_or(defaults.base_url),
            default_row: env_number("HISTORY_DEFAULT_ROW", defaults.default_row),
            timeout_secs: env_number("HISTORY_TIMEOUT_SECS", defaults.timeout_secs),
            api_key: env::var("HISTORY_API_KEY").ok().filter(|key| !key.trim().is_empty()),
            requests_per_second: env_number("HISTORY_RATE_LIMIT", defaults.requests_per_second),
            throttle_wait_secs: env_number("HISTORY_THROTTLE_WAIT_SECS", defaults.throttle_wait_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn throttle_wait(&self) -> Duration {
        Duration::from_secs(self.throttle_wait_secs)
    }

    /// Fresh context for a new history session
    pub fn initial_context(&self) -> HistoryContext {
        HistoryContext::new(self.default_row)
    }

    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.default_row == 0 {
            return Err(ConfigError::ZeroValue { field: "default_row" });
        }
        if self.default_row > MAX_ROW {
            return Err(ConfigError::TooLarge {
                field: "default_row",
                max: MAX_ROW,
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroValue { field: "timeout_secs" });
        }
        if self.requests_per_second == 0 {
            return Err(ConfigError::ZeroValue { field: "requests_per_second" });
        }
        validate_endpoint(&self.base_url)
    }
}

/// Parse an explorer endpoint. HTTPS is required except for local hosts.
pub fn validate_endpoint(url: &str) -> Result<Url, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" => {
            let local = matches!(parsed.host_str(), Some("localhost") | Some("127.0.0.1"));
            if local {
                Ok(parsed)
            } else {
                Err(ConfigError::InsecureEndpoint(url.to_string()))
            }
        }
        other => Err(ConfigError::UnsupportedScheme(other.to_string())),
    }
}

fn env_number<T: std::str::FromStr + Copy + std::fmt::Display>(key: &'static str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log_warn!("config", "Ignoring malformed value", key = key, value = raw, default = default);
            default
        }),
        Err(_) => default,
    }
}
