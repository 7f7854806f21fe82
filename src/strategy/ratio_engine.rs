//! Ratio Engine
//!
//! Entry point for ticks. Normalizes the timestamp, validates the price
//! pair, then hands the sample to the observation store. Both checks run
//! before anything is mutated, so a rejected tick leaves the engine
//! exactly as it was.

use serde::Serialize;
use thiserror::Error;

use crate::domain::{normalize, Observation, PriceSample, RawTick, Signal, TickRejection, TimestampParseError};

use super::observation_store::ObservationStore;
use super::params::EngineConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    #[error("Tick rejected: {0}")]
    Rejected(#[from] TickRejection),
    #[error("Bad timestamp: {0}")]
    Timestamp(#[from] TimestampParseError),
}

/// Outcome of seeding the engine from a batch of past ticks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub accepted: usize,
    pub rejected: usize,
}

/// Read-only view handed to presentation
#[derive(Debug, Clone, Serialize)]
pub struct EngineSnapshot {
    pub observations: Vec<Observation>,
    pub latest_signal: Signal,
    /// Mean of every retained ratio, not just the rolling window
    pub overall_mean: Option<f64>,
    pub window_size: usize,
    pub band_k: f64,
}

impl EngineSnapshot {
    pub fn latest(&self) -> Option<&Observation> {
        self.observations.last()
    }
}

#[derive(Debug, Clone)]
pub struct RatioEngine {
    store: ObservationStore,
}

impl RatioEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            store: ObservationStore::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.store.config()
    }

    /// Validate, annotate and store one tick
    pub fn ingest(&mut self, tick: &RawTick) -> Result<Observation, IngestError> {
        let timestamp = normalize(&tick.timestamp)?;
        let sample = PriceSample::new(tick.numerator_price, tick.denominator_price)?;

        let observation = self.store.append(timestamp, sample);

        tracing::debug!(
            timestamp = %observation.timestamp,
            ratio = observation.ratio,
            mean = observation.rolling_mean,
            lower = observation.band_lower,
            upper = observation.band_upper,
            signal = %observation.signal,
            "tick ingested"
        );

        Ok(observation)
    }

    /// Load past ticks, skipping invalid ones, and finish in timestamp order
    pub fn seed<'a, I>(&mut self, ticks: I) -> SeedReport
    where
        I: IntoIterator<Item = &'a RawTick>,
    {
        let mut report = SeedReport::default();

        for tick in ticks {
            match self.ingest(tick) {
                Ok(_) => report.accepted += 1,
                Err(e) => {
                    report.rejected += 1;
                    tracing::warn!(error = %e, "skipping seed tick");
                }
            }
        }

        if report.accepted > 0 && !self.store.is_sorted_by_timestamp() {
            self.store.reorder_by_timestamp();
        }

        tracing::info!(
            accepted = report.accepted,
            rejected = report.rejected,
            retained = self.store.len(),
            "engine seeded"
        );
        report
    }

    pub fn reorder_by_timestamp(&mut self) {
        self.store.reorder_by_timestamp();
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let observations: Vec<Observation> = self.store.observations().cloned().collect();
        let overall_mean = if observations.is_empty() {
            None
        } else {
            Some(observations.iter().map(|o| o.ratio).sum::<f64>() / observations.len() as f64)
        };
        let config = self.store.config();

        EngineSnapshot {
            latest_signal: self.store.latest_signal(),
            observations,
            overall_mean,
            window_size: config.window_size,
            band_k: config.band_k,
        }
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.store.latest()
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.store.observations()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl Default for RatioEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Leg, RawTimestamp};
    use approx::assert_relative_eq;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn tick(ts: &str, num: f64, den: f64) -> RawTick {
        RawTick::new(ts, num, den)
    }

    #[test]
    fn test_ingest_normalizes_utc_to_market_zone() {
        let mut engine = RatioEngine::default();
        let obs = engine
            .ingest(&tick("2026-10-16T14:00:00Z", 100.0, 50.0))
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(11, 0, 0)
            .unwrap();
        assert_eq!(obs.timestamp, expected);
    }

    #[test]
    fn test_ingest_accepts_aware_instants() {
        let mut engine = RatioEngine::default();
        let instant = Utc.with_ymd_and_hms(2026, 10, 16, 3, 0, 0).unwrap();
        let obs = engine.ingest(&RawTick::new(instant, 100.0, 50.0)).unwrap();
        // 03:00 UTC is midnight in the market zone
        assert_eq!(obs.timestamp.format("%H:%M").to_string(), "00:00");
    }

    #[test]
    fn test_zero_denominator_leaves_engine_untouched() {
        let mut engine = RatioEngine::default();
        engine.ingest(&tick("2026-10-16T14:00:00Z", 100.0, 50.0)).unwrap();
        engine.ingest(&tick("2026-10-16T14:00:06Z", 101.0, 50.0)).unwrap();
        let before = engine.snapshot();

        let err = engine
            .ingest(&tick("2026-10-16T14:00:12Z", 100.0, 0.0))
            .unwrap_err();
        assert_eq!(err, IngestError::Rejected(TickRejection::ZeroDenominator));

        let after = engine.snapshot();
        assert_eq!(before.observations, after.observations);
        assert_eq!(engine.len(), 2);
    }

    #[test]
    fn test_non_positive_numerator_rejected() {
        let mut engine = RatioEngine::default();
        let err = engine
            .ingest(&tick("2026-10-16T14:00:00Z", -1.0, 50.0))
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::Rejected(TickRejection::NonPositivePrice { leg: Leg::Numerator, .. })
        ));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_unparseable_timestamp_rejected() {
        let mut engine = RatioEngine::default();
        let bad = RawTick {
            timestamp: RawTimestamp::Text("yesterday-ish".into()),
            numerator_price: 100.0,
            denominator_price: 50.0,
        };
        assert!(matches!(engine.ingest(&bad), Err(IngestError::Timestamp(_))));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_seed_skips_invalid_and_sorts() {
        let mut engine = RatioEngine::default();
        let ticks = vec![
            tick("2026-10-16T14:00:12Z", 98.0, 50.0),
            tick("2026-10-16T14:00:00Z", 100.0, 50.0),
            tick("2026-10-16T14:00:03Z", 100.0, 0.0),
            tick("2026-10-16T14:00:06Z", 102.0, 51.0),
        ];
        let report = engine.seed(&ticks);
        assert_eq!(report, SeedReport { accepted: 3, rejected: 1 });

        let ratios: Vec<f64> = engine.observations().map(|o| o.ratio).collect();
        assert_eq!(ratios, vec![2.0, 2.0, 1.96]);
        let last = engine.latest().unwrap();
        assert_relative_eq!(last.rolling_mean, 1.986_666_666_666_667, epsilon = 1e-9);
        assert_eq!(last.signal, Signal::None);
    }

    #[test]
    fn test_snapshot_reports_overall_mean() {
        let mut engine = RatioEngine::new(EngineConfig::default().with_window(2));
        assert!(engine.snapshot().overall_mean.is_none());
        assert_eq!(engine.snapshot().latest_signal, Signal::None);

        engine.ingest(&tick("2026-10-16T14:00:00Z", 100.0, 50.0)).unwrap();
        engine.ingest(&tick("2026-10-16T14:00:06Z", 110.0, 50.0)).unwrap();
        engine.ingest(&tick("2026-10-16T14:00:12Z", 120.0, 50.0)).unwrap();

        let snapshot = engine.snapshot();
        assert_relative_eq!(snapshot.overall_mean.unwrap(), 2.2, epsilon = 1e-12);
        // Rolling window of two only sees 2.2 and 2.4
        assert_relative_eq!(snapshot.latest().unwrap().rolling_mean, 2.3, epsilon = 1e-12);
        assert_eq!(snapshot.window_size, 2);
        assert_eq!(snapshot.latest_signal, snapshot.latest().unwrap().signal);
    }
}
