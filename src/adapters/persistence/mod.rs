//! Persistence Adapters
//!
//! Durable history for processed ticks:
//! - `JsonlHistoryStore`: append-only JSON Lines file

mod jsonl_store;

pub use jsonl_store::{JsonlHistoryStore, DEFAULT_HISTORY_FILE};
