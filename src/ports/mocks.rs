//! In-process stand-ins for the tick source and the persistence gateway

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::domain::{HistoryRow, RawTick};

use super::history::{HistoryPort, PersistenceError};
use super::tick_source::{FetchError, PriceBoard, TickSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Tick source replaying a scripted sequence of boards and errors
#[derive(Debug, Default, Clone)]
pub struct ScriptedTickSource {
    script: Arc<Mutex<VecDeque<Result<PriceBoard, FetchError>>>>,
    history: Arc<Mutex<Vec<RawTick>>>,
    calls: Arc<Mutex<usize>>,
}

impl ScriptedTickSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to queue a board holding two prices
    pub fn with_board(self, numerator: (&str, f64), denominator: (&str, f64)) -> Self {
        let board = PriceBoard::new()
            .with_price(numerator.0, numerator.1)
            .with_price(denominator.0, denominator.1);
        self.push(Ok(board));
        self
    }

    pub fn with_error(self, error: FetchError) -> Self {
        self.push(Err(error));
        self
    }

    pub fn with_history(self, ticks: Vec<RawTick>) -> Self {
        *lock(&self.history) = ticks;
        self
    }

    pub fn push(&self, result: Result<PriceBoard, FetchError>) {
        lock(&self.script).push_back(result);
    }

    pub fn fetch_count(&self) -> usize {
        *lock(&self.calls)
    }
}

#[async_trait]
impl TickSource for ScriptedTickSource {
    async fn fetch(&self) -> Result<PriceBoard, FetchError> {
        *lock(&self.calls) += 1;
        lock(&self.script)
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Http("script exhausted".into())))
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawTick>, FetchError> {
        let history = lock(&self.history);
        let start = history.len().saturating_sub(limit);
        Ok(history[start..].to_vec())
    }
}

/// History gateway backed by a vector, with failure injection
#[derive(Debug, Default, Clone)]
pub struct InMemoryHistory {
    rows: Arc<Mutex<Vec<HistoryRow>>>,
    fail_writes: Arc<Mutex<Option<PersistenceError>>>,
    write_delay: Option<Duration>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: Vec<HistoryRow>) -> Self {
        *lock(&self.rows) = rows;
        self
    }

    /// Delay every write, to exercise caller timeouts
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn fail_writes_with(&self, error: Option<PersistenceError>) {
        *lock(&self.fail_writes) = error;
    }

    pub fn rows(&self) -> Vec<HistoryRow> {
        lock(&self.rows).clone()
    }
}

#[async_trait]
impl HistoryPort for InMemoryHistory {
    async fn append_row(&self, row: &HistoryRow) -> Result<(), PersistenceError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = lock(&self.fail_writes).clone() {
            return Err(err);
        }
        lock(&self.rows).push(row.clone());
        Ok(())
    }

    async fn query_since(&self, since: NaiveDateTime) -> Result<Vec<HistoryRow>, PersistenceError> {
        let mut rows: Vec<HistoryRow> = lock(&self.rows)
            .iter()
            .filter(|r| r.timestamp >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }

    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<HistoryRow>, PersistenceError> {
        let mut rows: Vec<HistoryRow> = lock(&self.rows)
            .iter()
            .filter(|r| r.timestamp.date() == date)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }
}
