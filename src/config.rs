//! Configuration management for the risk console

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub services: ServicesConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub buffer: BufferConfig,
    pub logging: LoggingConfig,
}

/// Risk-event feed connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// NATS server URL
    pub url: String,
    /// Subject carrying risk-event frames
    pub subject: String,
    /// Delay before re-subscribing after transport loss
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_reconnect_delay_ms() -> u64 {
    3000
}

/// External service endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    /// Investigation service base URL (case fetch)
    pub investigation_url: String,
    /// Action service base URL (account block)
    pub action_url: String,
    /// Per-request timeout for both services
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

/// Durable review-cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the embedded key-value store
    pub path: String,
}

/// Bounds for the in-memory event buffer
#[derive(Debug, Clone, Deserialize)]
pub struct BufferConfig {
    /// Recent-history window for risk events
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Window for the instability time series
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_events() -> usize {
    50
}

fn default_max_history() -> usize {
    60
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            max_history: default_max_history(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig {
                url: "nats://localhost:4222".to_string(),
                subject: "risk.events".to_string(),
                reconnect_delay_ms: default_reconnect_delay_ms(),
            },
            services: ServicesConfig {
                investigation_url: "http://localhost:8000".to_string(),
                action_url: "http://localhost:8000".to_string(),
                request_timeout_ms: default_request_timeout_ms(),
            },
            cache: CacheConfig {
                path: "./data/case_cache".to_string(),
            },
            buffer: BufferConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.feed.url, "nats://localhost:4222");
        assert_eq!(config.feed.reconnect_delay_ms, 3000);
        assert_eq!(config.buffer.max_events, 50);
        assert_eq!(config.buffer.max_history, 60);
    }

    #[test]
    fn test_minimal_file_fills_defaults() {
        let toml = r#"
            [feed]
            url = "nats://feed:4222"
            subject = "risk.events"

            [services]
            investigation_url = "http://svc:8000"
            action_url = "http://svc:8000"

            [cache]
            path = "/tmp/cache"

            [logging]
            level = "debug"
            format = "json"
        "#;

        let config: AppConfig = Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.feed.reconnect_delay_ms, 3000);
        assert_eq!(config.services.request_timeout_ms, 5000);
        assert_eq!(config.buffer.max_events, 50);
    }
}
