//! Ratio Monitor
//!
//! Coordinates the tick source, the band engine and the durable history.
//! Main loop that fetches the board, derives the ratio, annotates it and
//! persists the resulting row.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::config::Config;
use crate::domain::{market_now, HistoryRow, Observation, RawTick, RawTimestamp, TickRejection, TimestampParseError};
use crate::ports::{FetchError, HistoryPort, PersistenceError, TickSource};
use crate::strategy::{EngineConfig, EngineSnapshot, IngestError, RatioEngine, RatioSummary, SeedReport};

#[derive(Debug, Error)]
pub enum TickError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
    #[error("Tick rejected: {0}")]
    Rejected(#[from] TickRejection),
    #[error("Timestamp error: {0}")]
    Timestamp(#[from] TimestampParseError),
}

impl From<IngestError> for TickError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Rejected(e) => TickError::Rejected(e),
            IngestError::Timestamp(e) => TickError::Timestamp(e),
        }
    }
}

/// Result of one processed tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub observation: Observation,
    /// Persistence failures are reported here, the observation is kept regardless
    pub persisted: Result<(), PersistenceError>,
}

/// Loop and bootstrap settings
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub numerator_symbol: String,
    pub denominator_symbol: String,
    pub poll_interval: Duration,
    pub error_backoff: Duration,
    pub write_timeout: Duration,
    pub history_seed_rows: usize,
    pub restore_lookback: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            numerator_symbol: "GD30".to_string(),
            denominator_symbol: "AL30".to_string(),
            poll_interval: Duration::from_secs(6),
            error_backoff: Duration::from_secs(10),
            write_timeout: Duration::from_millis(2000),
            history_seed_rows: 100,
            restore_lookback: Duration::from_secs(24 * 3600),
        }
    }
}

impl From<&Config> for MonitorSettings {
    fn from(config: &Config) -> Self {
        Self {
            numerator_symbol: config.feed.numerator_symbol.clone(),
            denominator_symbol: config.feed.denominator_symbol.clone(),
            poll_interval: Duration::from_secs(config.feed.poll_interval_secs),
            error_backoff: Duration::from_secs(config.feed.error_backoff_secs),
            write_timeout: Duration::from_millis(config.persistence.write_timeout_ms),
            history_seed_rows: config.feed.history_seed_rows,
            restore_lookback: Duration::from_secs(config.persistence.restore_lookback_hours * 3600),
        }
    }
}

/// Status snapshot of the monitor
#[derive(Debug, Clone)]
pub struct MonitorStatus {
    pub is_running: bool,
    pub observations: usize,
    pub last_ratio: Option<f64>,
    pub last_signal: Option<String>,
}

/// Main monitor that owns the engine and drives the poll loop
pub struct RatioMonitor {
    engine: Arc<Mutex<RatioEngine>>,
    source: Arc<dyn TickSource>,
    history: Arc<dyn HistoryPort>,
    settings: MonitorSettings,
    is_running: Arc<RwLock<bool>>,
}

impl RatioMonitor {
    pub fn new(
        engine_config: EngineConfig,
        source: Arc<dyn TickSource>,
        history: Arc<dyn HistoryPort>,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            engine: Arc::new(Mutex::new(RatioEngine::new(engine_config))),
            source,
            history,
            settings,
            is_running: Arc::new(RwLock::new(false)),
        }
    }

    /// Warm the window from daily closes and the durable log
    pub async fn bootstrap(&self) -> SeedReport {
        let mut ticks: Vec<RawTick> = Vec::new();

        if self.settings.history_seed_rows > 0 {
            match self.source.fetch_history(self.settings.history_seed_rows).await {
                Ok(history) => ticks.extend(history),
                Err(e) => tracing::warn!(error = %e, "historical closes unavailable, starting without them"),
            }
        }

        if !self.settings.restore_lookback.is_zero() {
            let cutoff = market_now()
                - chrono::Duration::from_std(self.settings.restore_lookback)
                    .unwrap_or_else(|_| chrono::Duration::hours(24));
            match self.history.query_since(cutoff).await {
                Ok(rows) => {
                    tracing::info!(rows = rows.len(), %cutoff, "restoring persisted observations");
                    ticks.extend(rows.iter().map(HistoryRow::to_raw_tick));
                }
                Err(e) => tracing::warn!(error = %e, "durable history unavailable, nothing restored"),
            }
        }

        self.engine.lock().await.seed(&ticks)
    }

    /// Run the poll loop until `stop` is called
    pub async fn run(&self) {
        *self.is_running.write().await = true;

        tracing::info!(
            "Starting ratio monitor {}/{} - Poll interval: {:?}",
            self.settings.numerator_symbol,
            self.settings.denominator_symbol,
            self.settings.poll_interval
        );

        while *self.is_running.read().await {
            let delay = match self.process_tick().await {
                Ok(outcome) => {
                    if let Err(e) = &outcome.persisted {
                        tracing::warn!(error = %e, "observation kept in memory but not persisted");
                    }
                    self.settings.poll_interval
                }
                Err(e) => {
                    tracing::warn!(error = %e, "tick skipped");
                    self.settings.error_backoff
                }
            };
            tokio::time::sleep(delay).await;
        }

        tracing::info!("Ratio monitor stopped");
    }

    /// Fetch, annotate and persist one tick stamped with the current instant
    pub async fn process_tick(&self) -> Result<TickOutcome, TickError> {
        self.process_tick_at(Utc::now().into()).await
    }

    pub async fn process_tick_at(&self, at: RawTimestamp) -> Result<TickOutcome, TickError> {
        let board = self.source.fetch().await?;
        let numerator = board.require(&self.settings.numerator_symbol)?;
        let denominator = board.require(&self.settings.denominator_symbol)?;

        let tick = RawTick::new(at, numerator, denominator);
        let observation = self.engine.lock().await.ingest(&tick)?;

        tracing::info!(
            ratio = observation.ratio,
            mean = observation.rolling_mean,
            lower = observation.band_lower,
            upper = observation.band_upper,
            signal = %observation.signal,
            "{}",
            observation.signal.action()
        );

        let persisted = self.persist(&observation).await;
        Ok(TickOutcome {
            observation,
            persisted,
        })
    }

    async fn persist(&self, observation: &Observation) -> Result<(), PersistenceError> {
        let row = HistoryRow::from(observation);
        match tokio::time::timeout(self.settings.write_timeout, self.history.append_row(&row)).await {
            Ok(result) => result,
            Err(_) => Err(PersistenceError::Timeout(self.settings.write_timeout)),
        }
    }

    /// Stop the poll loop after the current tick
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        tracing::info!("Stop signal sent to ratio monitor");
    }

    pub async fn snapshot(&self) -> EngineSnapshot {
        self.engine.lock().await.snapshot()
    }

    pub async fn status(&self) -> MonitorStatus {
        let is_running = *self.is_running.read().await;
        let engine = self.engine.lock().await;
        let latest = engine.latest();

        MonitorStatus {
            is_running,
            observations: engine.len(),
            last_ratio: latest.map(|o| o.ratio),
            last_signal: latest.map(|o| o.signal.to_string()),
        }
    }

    /// Aggregate over every persisted row of a market-zone day
    pub async fn day_summary(&self, date: NaiveDate) -> Result<Option<RatioSummary>, PersistenceError> {
        let rows = self.history.query_by_date(date).await?;
        Ok(RatioSummary::from_rows(&rows))
    }

    /// Persisted rows at or after `since`
    pub async fn rows_since(&self, since: NaiveDateTime) -> Result<Vec<HistoryRow>, PersistenceError> {
        self.history.query_since(since).await
    }
}

impl Clone for RatioMonitor {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            source: Arc::clone(&self.source),
            history: Arc::clone(&self.history),
            settings: self.settings.clone(),
            is_running: Arc::clone(&self.is_running),
        }
    }
}
