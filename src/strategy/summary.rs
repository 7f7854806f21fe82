//! Daily summary over durable rows

use chrono::NaiveDateTime;
use serde::Serialize;
use statrs::statistics::Statistics;

use crate::domain::{HistoryRow, Signal};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatioSummary {
    pub count: usize,
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    pub first_ratio: f64,
    pub last_ratio: f64,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub buy_signals: usize,
    pub sell_signals: usize,
}

impl RatioSummary {
    /// Summarize rows in the order given, `None` for an empty slice
    pub fn from_rows(rows: &[HistoryRow]) -> Option<Self> {
        let first = rows.first()?;
        let last = rows.last()?;
        let ratios: Vec<f64> = rows.iter().map(|r| r.ratio).collect();

        let stddev = if rows.len() > 1 {
            ratios.iter().population_std_dev()
        } else {
            0.0
        };

        Some(Self {
            count: rows.len(),
            first_timestamp: first.timestamp,
            last_timestamp: last.timestamp,
            first_ratio: first.ratio,
            last_ratio: last.ratio,
            mean: ratios.iter().mean(),
            stddev,
            min: ratios.iter().copied().fold(f64::INFINITY, f64::min),
            max: ratios.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            buy_signals: rows.iter().filter(|r| r.signal == Signal::BuyLowerBand).count(),
            sell_signals: rows.iter().filter(|r| r.signal == Signal::SellUpperBand).count(),
        })
    }

    /// Relative change from the first to the last ratio, in percent
    pub fn change_pct(&self) -> f64 {
        if self.first_ratio == 0.0 {
            0.0
        } else {
            (self.last_ratio / self.first_ratio - 1.0) * 100.0
        }
    }
}
