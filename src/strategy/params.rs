//! Engine Parameters
//!
//! Configuration for the rolling band engine. Defaults match the
//! production monitor: 180-sample window, 2000-sample retention, 1.5 sigma.

use serde::{Deserialize, Serialize};

use super::band_classifier::SignalMode;

/// Main engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of observations in the rolling window
    pub window_size: usize,
    /// Maximum number of observations kept in memory
    pub retention: usize,
    /// Band half-width in standard deviations
    pub band_k: f64,
    /// Level (default) or crossing signal rule
    pub signal_mode: SignalMode,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: 180,
            retention: 2000,
            band_k: 1.5,
            signal_mode: SignalMode::Level,
        }
    }
}

impl EngineConfig {
    pub fn with_window(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_band_k(mut self, band_k: f64) -> Self {
        self.band_k = band_k;
        self
    }

    pub fn with_signal_mode(mut self, signal_mode: SignalMode) -> Self {
        self.signal_mode = signal_mode;
        self
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ParamError> {
        if self.window_size == 0 {
            return Err(ParamError::InvalidWindow(self.window_size));
        }
        if self.retention < self.window_size {
            return Err(ParamError::RetentionBelowWindow {
                retention: self.retention,
                window: self.window_size,
            });
        }
        if !self.band_k.is_finite() || self.band_k <= 0.0 {
            return Err(ParamError::InvalidBandMultiplier(self.band_k));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("Invalid window size: {0} (minimum 1)")]
    InvalidWindow(usize),
    #[error("Retention {retention} is smaller than the window {window}")]
    RetentionBelowWindow { retention: usize, window: usize },
    #[error("Invalid band multiplier: {0} (must be finite and > 0)")]
    InvalidBandMultiplier(f64),
}
