use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::RawTick;

/// Tick source error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Payload error: {0}")]
    Payload(String),

    #[error("Symbol missing from board: {0}")]
    MissingSymbol(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Latest close per symbol, as published by a live board
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBoard {
    prices: HashMap<String, f64>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a price; the first entry for a symbol wins
    pub fn insert(&mut self, symbol: impl Into<String>, price: f64) {
        self.prices.entry(symbol.into()).or_insert(price);
    }

    pub fn with_price(mut self, symbol: impl Into<String>, price: f64) -> Self {
        self.insert(symbol, price);
        self
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn require(&self, symbol: &str) -> Result<f64, FetchError> {
        self.price(symbol)
            .ok_or_else(|| FetchError::MissingSymbol(symbol.to_string()))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

/// Tick source port trait
#[async_trait]
pub trait TickSource: Send + Sync {
    /// Fetch the current board of last prices
    async fn fetch(&self) -> Result<PriceBoard, FetchError>;

    /// Past ratio ticks used to warm the window, oldest first
    async fn fetch_history(&self, _limit: usize) -> Result<Vec<RawTick>, FetchError> {
        Ok(Vec::new())
    }
}
