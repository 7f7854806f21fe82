//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config/default.toml.
//! Every section may be omitted; missing keys fall back to production defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::adapters::market_data::{DATA912_HISTORICAL_BONDS, DATA912_LIVE_BONDS};
use crate::adapters::persistence::DEFAULT_HISTORY_FILE;
use crate::strategy::{EngineConfig, SignalMode};

/// Main configuration structure matching config/default.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineSection,
    #[serde(default)]
    pub feed: FeedSection,
    #[serde(default)]
    pub persistence: PersistenceSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Rolling band engine section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Observations in the rolling window
    pub window_size: usize,
    /// Observations kept in memory
    pub retention: usize,
    /// Band half-width in standard deviations
    pub band_k: f64,
    /// "level" or "crossing"
    pub signal_mode: SignalMode,
}

impl Default for EngineSection {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            window_size: engine.window_size,
            retention: engine.retention,
            band_k: engine.band_k,
            signal_mode: engine.signal_mode,
        }
    }
}

/// Price feed section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    /// Live board of bond quotes
    pub live_url: String,
    /// Daily close history, one path segment per symbol
    pub historical_base_url: String,
    pub numerator_symbol: String,
    pub denominator_symbol: String,
    /// Delay between successful polls
    pub poll_interval_secs: u64,
    /// Delay after a failed poll
    pub error_backoff_secs: u64,
    /// Daily rows fetched to warm the window (0 disables)
    pub history_seed_rows: usize,
    pub request_timeout_secs: u64,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            live_url: DATA912_LIVE_BONDS.to_string(),
            historical_base_url: DATA912_HISTORICAL_BONDS.to_string(),
            numerator_symbol: "GD30".to_string(),
            denominator_symbol: "AL30".to_string(),
            poll_interval_secs: 6,
            error_backoff_secs: 10,
            history_seed_rows: 100,
            request_timeout_secs: 10,
        }
    }
}

impl FeedSection {
    /// Get live URL with environment variable override
    /// Checks RATIO_LIVE_URL env var first, falls back to config value
    pub fn get_live_url(&self) -> String {
        std::env::var("RATIO_LIVE_URL").unwrap_or_else(|_| self.live_url.clone())
    }
}

/// Durable history section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PersistenceSection {
    /// JSON Lines history file
    pub path: String,
    /// Upper bound on a single row write
    pub write_timeout_ms: u64,
    /// Rows newer than this are replayed on startup (0 disables)
    pub restore_lookback_hours: u64,
}

impl Default for PersistenceSection {
    fn default() -> Self {
        Self {
            path: format!("data/{}", DEFAULT_HISTORY_FILE),
            write_timeout_ms: 2000,
            restore_lookback_hours: 24,
        }
    }
}

impl PersistenceSection {
    /// Get history path with environment variable override and `~` expansion
    /// Checks RATIO_HISTORY_PATH env var first, falls back to config value
    pub fn get_path(&self) -> PathBuf {
        let raw = std::env::var("RATIO_HISTORY_PATH").unwrap_or_else(|_| self.path.clone());
        PathBuf::from(shellexpand::tilde(&raw).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        EngineConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.feed.live_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "live_url cannot be empty".to_string(),
            ));
        }

        if self.feed.numerator_symbol.is_empty() || self.feed.denominator_symbol.is_empty() {
            return Err(ConfigError::ValidationError(
                "numerator_symbol and denominator_symbol cannot be empty".to_string(),
            ));
        }

        if self.feed.numerator_symbol == self.feed.denominator_symbol {
            return Err(ConfigError::ValidationError(format!(
                "numerator and denominator must differ, both are {}",
                self.feed.numerator_symbol
            )));
        }

        if self.feed.poll_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_secs must be > 0".to_string(),
            ));
        }

        if self.feed.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.persistence.path.is_empty() {
            return Err(ConfigError::ValidationError(
                "persistence path cannot be empty".to_string(),
            ));
        }

        if self.persistence.write_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "write_timeout_ms must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

// Conversion from Config to EngineConfig
impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        EngineConfig {
            window_size: config.engine.window_size,
            retention: config.engine.retention,
            band_k: config.engine.band_k,
            signal_mode: config.engine.signal_mode,
        }
    }
}
