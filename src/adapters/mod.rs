//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Market Data: data912 live board and daily close history
//! - Persistence: JSON Lines durable history
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod market_data;
pub mod persistence;

pub use cli::CliApp;
pub use market_data::Data912Feed;
pub use persistence::JsonlHistoryStore;
