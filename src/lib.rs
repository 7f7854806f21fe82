//! ratio-bands - GD30/AL30 Ratio Band Monitor Library
//!
//! Rolling mean / standard deviation bands over a bond price ratio, with
//! buy/sell classification at the band edges.
//!
//! # Modules
//!
//! - `domain`: Core types (RawTick, Observation, Signal, HistoryRow, timestamps)
//! - `ports`: Trait abstractions (TickSource, HistoryPort)
//! - `strategy`: Rolling statistics, bands and classification (RatioEngine)
//! - `adapters`: External implementations (data912 feed, JSONL history, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Poll loop and bootstrap (RatioMonitor)

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod strategy;
