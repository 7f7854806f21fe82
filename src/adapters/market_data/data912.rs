use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::config::FeedSection;
use crate::domain::{normalize, RawTick, RawTimestamp};
use crate::ports::{FetchError, PriceBoard, TickSource};

pub const DATA912_LIVE_BONDS: &str = "https://data912.com/live/arg_bonds";
pub const DATA912_HISTORICAL_BONDS: &str = "https://data912.com/historical/bonds";

/// Live board and daily history client for data912
#[derive(Debug, Clone)]
pub struct Data912Feed {
    http: Client,
    live_url: String,
    historical_base_url: String,
    numerator_symbol: String,
    denominator_symbol: String,
}

impl Data912Feed {
    pub fn new(
        live_url: impl Into<String>,
        historical_base_url: impl Into<String>,
        numerator_symbol: impl Into<String>,
        denominator_symbol: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            http,
            live_url: live_url.into(),
            historical_base_url: historical_base_url.into(),
            numerator_symbol: numerator_symbol.into(),
            denominator_symbol: denominator_symbol.into(),
        })
    }

    pub fn from_config(config: &FeedSection) -> Result<Self, FetchError> {
        Self::new(
            config.get_live_url(),
            config.historical_base_url.clone(),
            config.numerator_symbol.clone(),
            config.denominator_symbol.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(format!("{} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(e.to_string()))
    }

    async fn fetch_closes(&self, symbol: &str) -> Result<Vec<HistoricalClose>, FetchError> {
        let url = format!("{}/{}", self.historical_base_url.trim_end_matches('/'), symbol);
        let body = self.get_text(&url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Payload(format!("{}: {}", symbol, e)))
    }
}

#[async_trait]
impl TickSource for Data912Feed {
    async fn fetch(&self) -> Result<PriceBoard, FetchError> {
        let body = self.get_text(&self.live_url).await?;
        parse_live_board(&body)
    }

    async fn fetch_history(&self, limit: usize) -> Result<Vec<RawTick>, FetchError> {
        let (numerator, denominator) = tokio::try_join!(
            self.fetch_closes(&self.numerator_symbol),
            self.fetch_closes(&self.denominator_symbol),
        )?;

        let ticks = merge_history(&numerator, &denominator, limit);
        tracing::info!(
            numerator_rows = numerator.len(),
            denominator_rows = denominator.len(),
            merged = ticks.len(),
            "historical closes merged"
        );
        Ok(ticks)
    }
}

#[derive(Debug, Deserialize)]
struct LiveQuote {
    symbol: String,
    /// Last close, null while a bond has not traded
    c: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoricalClose {
    pub date: String,
    pub c: Option<f64>,
}

/// Parse the live bond board into last prices per symbol
pub fn parse_live_board(body: &str) -> Result<PriceBoard, FetchError> {
    let quotes: Vec<LiveQuote> =
        serde_json::from_str(body).map_err(|e| FetchError::Payload(e.to_string()))?;

    let mut board = PriceBoard::new();
    for quote in quotes {
        if let Some(close) = quote.c {
            board.insert(quote.symbol, close);
        }
    }
    Ok(board)
}

/// Inner-join two daily close series on date and keep the latest `limit` rows
pub fn merge_history(
    numerator: &[HistoricalClose],
    denominator: &[HistoricalClose],
    limit: usize,
) -> Vec<RawTick> {
    let mut by_date: HashMap<NaiveDateTime, f64> = HashMap::with_capacity(denominator.len());
    for row in denominator {
        if let Some((date, close)) = parse_close(row) {
            by_date.entry(date).or_insert(close);
        }
    }

    let mut joined: Vec<(NaiveDateTime, f64, f64)> = numerator
        .iter()
        .filter_map(parse_close)
        .filter_map(|(date, close)| by_date.get(&date).map(|&den| (date, close, den)))
        .collect();
    joined.sort_by_key(|(date, _, _)| *date);
    joined.dedup_by_key(|(date, _, _)| *date);

    let start = joined.len().saturating_sub(limit);
    joined[start..]
        .iter()
        .map(|&(date, num, den)| RawTick::new(RawTimestamp::Naive(date), num, den))
        .collect()
}

fn parse_close(row: &HistoricalClose) -> Option<(NaiveDateTime, f64)> {
    let close = row.c?;
    match normalize(&RawTimestamp::Text(row.date.clone())) {
        Ok(date) => Some((date, close)),
        Err(e) => {
            tracing::debug!(error = %e, "skipping historical row");
            None
        }
    }
}
