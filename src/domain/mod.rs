//! Domain Layer - Core types for the ratio band monitor
//!
//! Pure domain types and logic with no I/O. All external interactions
//! happen through the ports layer.
//!
//! - `tick`: raw price pairs and their validation
//! - `observation`: annotated ratio samples, bands and signals
//! - `timestamp`: market-zone timestamp normalization
//! - `history`: the durable eight-field row

pub mod history;
pub mod observation;
pub mod tick;
pub mod timestamp;

pub use history::HistoryRow;
pub use observation::{Bands, Observation, Signal};
pub use tick::{Leg, PriceSample, RawTick, RawTimestamp, TickRejection};
pub use timestamp::{market_now, market_today, normalize, TimestampParseError};
