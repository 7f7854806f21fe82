//! Rolling Statistics
//!
//! Windowed mean and population standard deviation over the ratio series.
//! The effective window at index i is `min(window, i + 1)`: short history
//! shrinks the window, it is never padded.
//!
//! Two paths produce the same numbers:
//! - `window_stats`: two-pass statistics over one explicit window (statrs)
//! - `recompute`: O(n) sliding Welford accumulator over a whole series
//!
//! A window holding a single repeated value is reported as exactly
//! `(value, 0.0)` by both paths, so flat markets classify identically
//! whichever path produced the bands.

use statrs::statistics::Statistics;

use crate::domain::Bands;

/// Mean and population standard deviation of one window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    pub mean: f64,
    pub stddev: f64,
}

impl WindowStats {
    /// Statistics of a window whose values are all `value`
    pub fn flat(value: f64) -> Self {
        Self { mean: value, stddev: 0.0 }
    }

    pub fn bands(&self, k: f64) -> Bands {
        Bands::new(self.mean, self.stddev, k)
    }
}

/// Statistics over an explicit window, `None` when empty
pub fn window_stats(window: &[f64]) -> Option<WindowStats> {
    let first = *window.first()?;
    if window.iter().all(|&x| x == first) {
        return Some(WindowStats::flat(first));
    }

    Some(WindowStats {
        mean: window.iter().mean(),
        stddev: window.iter().population_std_dev(),
    })
}

/// Incremental mean/variance accumulator supporting removal (Welford)
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    count: usize,
    mean: f64,
    m2: f64,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Remove a value previously pushed
    pub fn pop(&mut self, x: f64) {
        match self.count {
            0 => {}
            1 => *self = Self::default(),
            _ => {
                let delta = x - self.mean;
                self.count -= 1;
                self.mean -= delta / self.count as f64;
                self.m2 -= delta * (x - self.mean);
                // Cancellation can leave a tiny negative residue
                if self.m2 < 0.0 {
                    self.m2 = 0.0;
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn stats(&self) -> Option<WindowStats> {
        if self.count == 0 {
            return None;
        }
        Some(WindowStats {
            mean: self.mean,
            stddev: (self.m2 / self.count as f64).sqrt(),
        })
    }
}

/// Statistics for every index of `series` with a trailing window of `window`
pub fn recompute(series: &[f64], window: usize) -> Vec<WindowStats> {
    let window = window.max(1);
    let mut acc = SlidingWindow::new();
    let mut out = Vec::with_capacity(series.len());
    // Length of the run of identical values ending at the current index
    let mut run = 0usize;

    for (i, &x) in series.iter().enumerate() {
        acc.push(x);
        if i >= window {
            acc.pop(series[i - window]);
        }

        run = if i > 0 && series[i - 1] == x { run + 1 } else { 1 };

        let stats = if run >= acc.len() {
            WindowStats::flat(x)
        } else {
            acc.stats().unwrap_or(WindowStats::flat(x))
        };
        out.push(stats);
    }

    out
}

/// Naive reference: `window_stats` over every trailing window
pub fn recompute_naive(series: &[f64], window: usize) -> Vec<WindowStats> {
    let window = window.max(1);
    (0..series.len())
        .filter_map(|i| {
            let start = (i + 1).saturating_sub(window);
            window_stats(&series[start..=i])
        })
        .collect()
}

/// Simple moving average requiring a full window, `None` before that
pub fn trailing_means(series: &[f64], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(series.len());
    let mut sum = 0.0;

    for (i, &x) in series.iter().enumerate() {
        sum += x;
        if i >= window {
            sum -= series[i - window];
        }
        out.push(if i + 1 >= window {
            Some(sum / window as f64)
        } else {
            None
        });
    }

    out
}
