//! Band Classifier
//!
//! Maps a ratio and its bands to a signal. Rules, first match wins:
//! 1. ratio <= lower band -> `BuyLowerBand`
//! 2. ratio >= upper band -> `SellUpperBand`
//! 3. otherwise           -> `None`
//!
//! With zero variance the bands coincide: rule 1 fires only when the ratio
//! sits exactly on them, and any other ratio gets no signal.

use serde::{Deserialize, Serialize};

use crate::domain::Signal;

/// Level rule: signal whenever the ratio is at or outside a band
pub fn classify(ratio: f64, band_lower: f64, band_upper: f64) -> Signal {
    if band_lower == band_upper && ratio != band_lower {
        return Signal::None;
    }
    if ratio <= band_lower {
        Signal::BuyLowerBand
    } else if ratio >= band_upper {
        Signal::SellUpperBand
    } else {
        Signal::None
    }
}

/// Crossing rule: signal only on the tick the ratio leaves the band
///
/// `previous_ratio` is judged against the current bands and must have been
/// strictly inside them. With no previous ratio the level rule applies.
pub fn classify_crossing(
    previous_ratio: Option<f64>,
    ratio: f64,
    band_lower: f64,
    band_upper: f64,
) -> Signal {
    let level = classify(ratio, band_lower, band_upper);
    if !level.is_actionable() {
        return Signal::None;
    }

    match previous_ratio {
        Some(prev) if classify(prev, band_lower, band_upper).is_actionable() => Signal::None,
        _ => level,
    }
}

/// Which rule the engine applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalMode {
    #[default]
    Level,
    Crossing,
}

impl SignalMode {
    pub fn classify(
        self,
        previous_ratio: Option<f64>,
        ratio: f64,
        band_lower: f64,
        band_upper: f64,
    ) -> Signal {
        match self {
            SignalMode::Level => classify(ratio, band_lower, band_upper),
            SignalMode::Crossing => classify_crossing(previous_ratio, ratio, band_lower, band_upper),
        }
    }
}
