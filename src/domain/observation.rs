use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Band signal attached to each observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    #[default]
    None,
    /// Ratio at or below the lower band: buy the numerator bond, sell the denominator bond
    BuyLowerBand,
    /// Ratio at or above the upper band: sell the numerator bond, buy the denominator bond
    SellUpperBand,
}

impl Signal {
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Signal::None)
    }

    /// Short trader-facing description of the suggested leg swap
    pub fn action(&self) -> &'static str {
        match self {
            Signal::None => "no signal",
            Signal::BuyLowerBand => "buy primary / sell secondary",
            Signal::SellUpperBand => "sell primary / buy secondary",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::None => write!(f, "None"),
            Signal::BuyLowerBand => write!(f, "BuyLowerBand"),
            Signal::SellUpperBand => write!(f, "SellUpperBand"),
        }
    }
}

/// Mean, deviation and the k-sigma envelope around the mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bands {
    pub mean: f64,
    pub stddev: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Bands {
    pub fn new(mean: f64, stddev: f64, k: f64) -> Self {
        Self {
            mean,
            stddev,
            upper: mean + k * stddev,
            lower: mean - k * stddev,
        }
    }
}

/// One annotated ratio sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: NaiveDateTime,
    pub numerator_price: f64,
    pub denominator_price: f64,
    pub ratio: f64,
    pub rolling_mean: f64,
    pub rolling_stddev: f64,
    pub band_upper: f64,
    pub band_lower: f64,
    /// Short moving average overlay, absent until enough history exists
    pub short_mean: Option<f64>,
    pub signal: Signal,
}

impl Observation {
    pub(crate) fn set_bands(&mut self, bands: Bands) {
        self.rolling_mean = bands.mean;
        self.rolling_stddev = bands.stddev;
        self.band_upper = bands.upper;
        self.band_lower = bands.lower;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_envelope() {
        let bands = Bands::new(2.0, 0.1, 1.5);
        assert!((bands.upper - 2.15).abs() < 1e-12);
        assert!((bands.lower - 1.85).abs() < 1e-12);
    }

    #[test]
    fn test_zero_deviation_collapses_bands() {
        let bands = Bands::new(1.96, 0.0, 1.5);
        assert_eq!(bands.upper, bands.lower);
        assert_eq!(bands.upper, bands.mean);
    }

    #[test]
    fn test_signal_serde_names() {
        assert_eq!(serde_json::to_string(&Signal::BuyLowerBand).unwrap(), "\"buy_lower_band\"");
        let parsed: Signal = serde_json::from_str("\"sell_upper_band\"").unwrap();
        assert_eq!(parsed, Signal::SellUpperBand);
        assert!(!Signal::None.is_actionable());
    }
}
