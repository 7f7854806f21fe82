//! Strategy Layer - Rolling bands and signal classification
//!
//! Turns validated price pairs into annotated observations:
//! - Rolling mean and population standard deviation over a trailing window
//! - k-sigma bands around the rolling mean
//! - Buy/sell classification against the bands (level or crossing rule)
//! - Bounded retention with timestamp-ordered recompute
//!
//! Entry point: `RatioEngine`.

pub mod band_classifier;
pub mod observation_store;
pub mod params;
pub mod ratio_engine;
pub mod rolling_stats;
pub mod summary;

pub use band_classifier::{classify, classify_crossing, SignalMode};
pub use observation_store::{ObservationStore, SHORT_MA_WINDOW};
pub use params::{EngineConfig, ParamError};
pub use ratio_engine::{EngineSnapshot, IngestError, RatioEngine, SeedReport};
pub use rolling_stats::{window_stats, SlidingWindow, WindowStats};
pub use summary::RatioSummary;
