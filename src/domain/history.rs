//! Durable Row
//!
//! The eight-field record written to the persistence gateway for every
//! processed tick. The durable log outlives the in-memory window and is
//! replayed into the store after a restart.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::observation::{Observation, Signal};
use super::tick::{RawTick, RawTimestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub timestamp: NaiveDateTime,
    pub numerator_price: f64,
    pub denominator_price: f64,
    pub ratio: f64,
    pub rolling_mean: f64,
    pub band_upper: f64,
    pub band_lower: f64,
    pub signal: Signal,
}

impl From<&Observation> for HistoryRow {
    fn from(obs: &Observation) -> Self {
        Self {
            timestamp: obs.timestamp,
            numerator_price: obs.numerator_price,
            denominator_price: obs.denominator_price,
            ratio: obs.ratio,
            rolling_mean: obs.rolling_mean,
            band_upper: obs.band_upper,
            band_lower: obs.band_lower,
            signal: obs.signal,
        }
    }
}

impl HistoryRow {
    /// Rebuild the tick that produced this row; statistics are recomputed on replay
    pub fn to_raw_tick(&self) -> RawTick {
        RawTick {
            timestamp: RawTimestamp::Naive(self.timestamp),
            numerator_price: self.numerator_price,
            denominator_price: self.denominator_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_json_shape() {
        let row = HistoryRow {
            timestamp: NaiveDateTime::parse_from_str("2026-10-16 11:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            numerator_price: 100.0,
            denominator_price: 50.0,
            ratio: 2.0,
            rolling_mean: 2.0,
            band_upper: 2.0,
            band_lower: 2.0,
            signal: Signal::BuyLowerBand,
        };

        let json: serde_json::Value = serde_json::to_value(&row).unwrap();
        let fields = json.as_object().unwrap();
        assert_eq!(fields.len(), 8);
        assert_eq!(fields["timestamp"], "2026-10-16T11:00:00");
        assert_eq!(fields["signal"], "buy_lower_band");

        let back: HistoryRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_replay_tick_keeps_local_timestamp() {
        let ts = NaiveDateTime::parse_from_str("2026-10-16 11:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let row = HistoryRow {
            timestamp: ts,
            numerator_price: 98.0,
            denominator_price: 50.0,
            ratio: 1.96,
            rolling_mean: 1.98,
            band_upper: 2.01,
            band_lower: 1.95,
            signal: Signal::None,
        };
        let tick = row.to_raw_tick();
        assert_eq!(tick.timestamp, RawTimestamp::Naive(ts));
        assert_eq!(tick.numerator_price, 98.0);
    }
}
