use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::HistoryRow;

/// Persistence gateway error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistenceError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Write timed out after {0:?}")]
    Timeout(Duration),
}

/// Durable append-only log of processed ticks
///
/// Rows come back in timestamp order. Timestamps are market-zone local.
#[async_trait]
pub trait HistoryPort: Send + Sync {
    async fn append_row(&self, row: &HistoryRow) -> Result<(), PersistenceError>;

    /// Rows at or after `since`
    async fn query_since(&self, since: NaiveDateTime) -> Result<Vec<HistoryRow>, PersistenceError>;

    /// Rows whose timestamp falls on `date`
    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<HistoryRow>, PersistenceError>;
}
