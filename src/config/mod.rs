//! Configuration management for the capstan console
//!
//! This module handles loading and validating configuration from environment
//! variables and files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend server configuration
    pub server: ServerConfig,

    /// Local preference storage configuration
    pub storage: StorageConfig,

    /// Console timing and paging configuration
    pub console: ConsoleConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backend server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the backend API (common prefix for every endpoint)
    pub url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent string
    pub user_agent: String,
}

/// Local preference storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the per-key preference files
    pub data_dir: PathBuf,
}

/// Console timing and paging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Sync status poll interval in milliseconds
    pub poll_interval_ms: u64,

    /// Toast time-to-live in milliseconds
    pub toast_ttl_ms: u64,

    /// Resources per browse page
    pub page_size: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("CAPSTAN_SERVER_URL")
            .unwrap_or_else(|_| String::from("http://localhost:5000/api"));

        let request_timeout_secs = std::env::var("CAPSTAN_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let user_agent = std::env::var("CAPSTAN_USER_AGENT")
            .unwrap_or_else(|_| format!("capstan/{}", env!("CARGO_PKG_VERSION")));

        let data_dir = std::env::var("CAPSTAN_DATA_DIR")
            .unwrap_or_else(|_| String::from("data"))
            .into();

        let poll_interval_ms = std::env::var("CAPSTAN_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(2000);

        let toast_ttl_ms = std::env::var("CAPSTAN_TOAST_TTL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(3000);

        let page_size = std::env::var("CAPSTAN_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(20);

        let log_level = std::env::var("CAPSTAN_LOG_LEVEL").unwrap_or_else(|_| String::from("info"));

        let log_format =
            std::env::var("CAPSTAN_LOG_FORMAT").unwrap_or_else(|_| String::from("text"));

        Ok(Self {
            server: ServerConfig {
                url,
                request_timeout_secs,
                user_agent,
            },
            storage: StorageConfig { data_dir },
            console: ConsoleConfig {
                poll_interval_ms,
                toast_ttl_ms,
                page_size,
            },
            logging: LoggingConfig {
                level: log_level,
                format: log_format,
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.url.trim().is_empty() {
            anyhow::bail!("server url must not be empty");
        }

        url::Url::parse(&self.server.url)
            .with_context(|| format!("server url is not a valid URL: {}", self.server.url))?;

        if self.server.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.console.poll_interval_ms == 0 {
            anyhow::bail!("poll_interval_ms must be greater than 0");
        }

        if self.console.toast_ttl_ms == 0 {
            anyhow::bail!("toast_ttl_ms must be greater than 0");
        }

        if self.console.page_size == 0 || self.console.page_size > 100 {
            anyhow::bail!("page_size must be between 1 and 100");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get sync poll interval as Duration
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.console.poll_interval_ms)
    }

    /// Get toast time-to-live as Duration
    #[must_use]
    pub fn toast_ttl(&self) -> Duration {
        Duration::from_millis(self.console.toast_ttl_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                url: String::from("http://localhost:5000/api"),
                request_timeout_secs: 30,
                user_agent: format!("capstan/{}", env!("CARGO_PKG_VERSION")),
            },
            storage: StorageConfig {
                data_dir: PathBuf::from("data"),
            },
            console: ConsoleConfig {
                poll_interval_ms: 2000,
                toast_ttl_ms: 3000,
                page_size: 20,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        let mut config = Config::default();
        config.server.url = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.console.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_page_rejected() {
        let mut config = Config::default();
        config.console.page_size = 500;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_conversions() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.poll_interval(), Duration::from_millis(2000));
        assert_eq!(config.toast_ttl(), Duration::from_millis(3000));
    }
}
