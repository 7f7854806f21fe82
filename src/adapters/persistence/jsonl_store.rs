//! JSON Lines history store
//!
//! One `HistoryRow` per line, appended as ticks are processed. Reads
//! tolerate a torn or hand-edited line: it is logged and skipped.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::HistoryRow;
use crate::ports::{HistoryPort, PersistenceError};

/// Default history file name
pub const DEFAULT_HISTORY_FILE: &str = "ratio_history.jsonl";

#[derive(Debug)]
pub struct JsonlHistoryStore {
    path: PathBuf,
    /// Serializes appends from concurrent writers
    write_lock: Mutex<()>,
}

impl JsonlHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows<F>(&self, keep: F) -> Result<Vec<HistoryRow>, PersistenceError>
    where
        F: Fn(&HistoryRow) -> bool,
    {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::Io(e.to_string())),
        };

        let mut rows = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<HistoryRow>(line) {
                Ok(row) if keep(&row) => rows.push(row),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = line_no + 1,
                        error = %e,
                        "skipping malformed history line"
                    );
                }
            }
        }

        rows.sort_by_key(|r| r.timestamp);
        Ok(rows)
    }
}

#[async_trait]
impl HistoryPort for JsonlHistoryStore {
    async fn append_row(&self, row: &HistoryRow) -> Result<(), PersistenceError> {
        let mut line = serde_json::to_string(row)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::Io(e.to_string()))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PersistenceError::Io(e.to_string()))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| PersistenceError::Io(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| PersistenceError::Io(e.to_string()))?;

        Ok(())
    }

    async fn query_since(&self, since: NaiveDateTime) -> Result<Vec<HistoryRow>, PersistenceError> {
        self.read_rows(|row| row.timestamp >= since).await
    }

    async fn query_by_date(&self, date: NaiveDate) -> Result<Vec<HistoryRow>, PersistenceError> {
        self.read_rows(|row| row.timestamp.date() == date).await
    }
}
