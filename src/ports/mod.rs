//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - The live price board and its daily history
//! - The durable log of processed ticks

pub mod history;
pub mod mocks;
pub mod tick_source;

// Re-export main traits and types
pub use history::{HistoryPort, PersistenceError};
pub use tick_source::{FetchError, PriceBoard, TickSource};
