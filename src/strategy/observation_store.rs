//! Observation Store
//!
//! Bounded, insertion-ordered buffer of annotated ratio observations.
//!
//! Appending computes the new observation's statistics from the trailing
//! window in insertion order; earlier observations are never touched.
//! `reorder_by_timestamp` stable-sorts by `(timestamp, arrival)` and
//! recomputes the whole series.
//!
//! On overflow the entry with the smallest `(timestamp, arrival)` key is
//! evicted. Evicted keys always sort before every survivor, so the largest
//! evicted ratios are kept as a sorted lookback prefix. Both the append path
//! and `recompute` read the window through that prefix, which keeps survivor
//! statistics identical to what an unbounded store would produce.

use std::collections::VecDeque;

use chrono::NaiveDateTime;

use crate::domain::{Observation, PriceSample, Signal};

use super::params::EngineConfig;
use super::rolling_stats::{self, WindowStats};

/// Window of the short moving-average overlay
pub const SHORT_MA_WINDOW: usize = 21;

#[derive(Debug, Clone)]
struct Entry {
    /// Arrival sequence, breaks timestamp ties
    seq: u64,
    observation: Observation,
}

impl Entry {
    fn sort_key(&self) -> (NaiveDateTime, u64) {
        (self.observation.timestamp, self.seq)
    }
}

#[derive(Debug, Clone)]
pub struct ObservationStore {
    entries: VecDeque<Entry>,
    /// Most recent evicted entries in sort order, at most `lookback_capacity()`
    lookback: VecDeque<Entry>,
    config: EngineConfig,
    next_seq: u64,
    evicted: u64,
}

impl ObservationStore {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.retention.saturating_add(1)),
            lookback: VecDeque::new(),
            config,
            next_seq: 0,
            evicted: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Append a validated sample and return its annotated observation
    pub fn append(&mut self, timestamp: NaiveDateTime, sample: PriceSample) -> Observation {
        let config = self.config;

        let history = self.lookback.len() + self.entries.len();
        let window_len = config.window_size.min(history + 1);
        let window = self.trailing_ratios(window_len, sample.ratio);
        let stats = rolling_stats::window_stats(&window).unwrap_or(WindowStats::flat(sample.ratio));
        let bands = stats.bands(config.band_k);

        let short_mean = if history + 1 >= SHORT_MA_WINDOW {
            let tail = self.trailing_ratios(SHORT_MA_WINDOW, sample.ratio);
            Some(tail.iter().sum::<f64>() / SHORT_MA_WINDOW as f64)
        } else {
            None
        };

        let previous = self
            .entries
            .back()
            .or_else(|| self.lookback.back())
            .map(|e| e.observation.ratio);
        let signal = config
            .signal_mode
            .classify(previous, sample.ratio, bands.lower, bands.upper);

        let observation = Observation {
            timestamp,
            numerator_price: sample.numerator_price,
            denominator_price: sample.denominator_price,
            ratio: sample.ratio,
            rolling_mean: bands.mean,
            rolling_stddev: bands.stddev,
            band_upper: bands.upper,
            band_lower: bands.lower,
            short_mean,
            signal,
        };

        self.entries.push_back(Entry {
            seq: self.next_seq,
            observation: observation.clone(),
        });
        self.next_seq += 1;
        self.enforce_retention();

        observation
    }

    /// Stable sort by timestamp (ties keep arrival order) and recompute everything
    pub fn reorder_by_timestamp(&mut self) {
        self.entries
            .make_contiguous()
            .sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        self.recompute();
    }

    /// Recompute statistics and signals for every observation in current order,
    /// with the evicted lookback as leading history
    pub fn recompute(&mut self) {
        let config = self.config;
        let prefix = self.lookback.len();
        let series: Vec<f64> = self
            .lookback
            .iter()
            .chain(self.entries.iter())
            .map(|e| e.observation.ratio)
            .collect();
        let stats = rolling_stats::recompute(&series, config.window_size);
        let shorts = rolling_stats::trailing_means(&series, SHORT_MA_WINDOW);

        let mut previous = self.lookback.back().map(|e| e.observation.ratio);
        let annotations = stats.into_iter().zip(shorts).skip(prefix);
        for (entry, (stats, short_mean)) in self.entries.iter_mut().zip(annotations) {
            let obs = &mut entry.observation;
            let bands = stats.bands(config.band_k);
            obs.set_bands(bands);
            obs.short_mean = short_mean;
            obs.signal = config
                .signal_mode
                .classify(previous, obs.ratio, bands.lower, bands.upper);
            previous = Some(obs.ratio);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total observations evicted since creation
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    pub fn latest(&self) -> Option<&Observation> {
        self.entries.back().map(|e| &e.observation)
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> + '_ {
        self.entries.iter().map(|e| &e.observation)
    }

    pub fn ratios(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.observation.ratio)
    }

    pub fn is_sorted_by_timestamp(&self) -> bool {
        self.entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .all(|(a, b)| a.sort_key() <= b.sort_key())
    }

    pub fn latest_signal(&self) -> Signal {
        self.latest().map(|o| o.signal).unwrap_or_default()
    }

    /// Last `n - 1` ratios of lookback then store, followed by `current`
    fn trailing_ratios(&self, n: usize, current: f64) -> Vec<f64> {
        let mut window: Vec<f64> = self
            .lookback
            .iter()
            .chain(self.entries.iter())
            .rev()
            .take(n.saturating_sub(1))
            .map(|e| e.observation.ratio)
            .collect();
        window.reverse();
        window.push(current);
        window
    }

    /// Longest history any survivor's window can reach back into
    fn lookback_capacity(&self) -> usize {
        self.config.window_size.max(SHORT_MA_WINDOW) - 1
    }

    fn remember_evicted(&mut self, entry: Entry) {
        let key = entry.sort_key();
        let pos = self.lookback.partition_point(|e| e.sort_key() < key);
        self.lookback.insert(pos, entry);
        while self.lookback.len() > self.lookback_capacity() {
            self.lookback.pop_front();
        }
    }

    fn enforce_retention(&mut self) {
        while self.entries.len() > self.config.retention {
            let oldest = self
                .entries
                .iter()
                .enumerate()
                .min_by_key(|(_, e)| e.sort_key())
                .map(|(idx, _)| idx);

            match oldest.and_then(|idx| self.entries.remove(idx)) {
                Some(entry) => {
                    self.evicted += 1;
                    tracing::trace!(timestamp = %entry.observation.timestamp, "observation evicted");
                    self.remember_evicted(entry);
                }
                None => break,
            }
        }
    }
}
