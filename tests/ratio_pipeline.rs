//! Ratio Pipeline Integration Tests
//!
//! Integration tests that drive the monitor end to end:
//! 1. Scripted board -> RatioEngine -> durable history
//! 2. Rejected and failed ticks leaving the engine untouched
//! 3. Bootstrap from daily closes and restart recovery
//!
//! All tests are deterministic (no real network calls) and use the in-process port doubles.

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};

use ratio_bands::application::{MonitorSettings, RatioMonitor, TickError};
use ratio_bands::domain::{market_now, HistoryRow, RawTick, RawTimestamp, Signal, TickRejection};
use ratio_bands::ports::mocks::{InMemoryHistory, ScriptedTickSource};
use ratio_bands::ports::{FetchError, PersistenceError};
use ratio_bands::strategy::{EngineConfig, RatioEngine};

// ============================================================================
// Test Fixtures
// ============================================================================

const NUM: &str = "GD30";
const DEN: &str = "AL30";

fn stamp(secs: u32) -> RawTimestamp {
    RawTimestamp::Text(format!("2026-10-16T14:{:02}:{:02}Z", secs / 60, secs % 60))
}

fn settings() -> MonitorSettings {
    MonitorSettings {
        poll_interval: Duration::from_millis(5),
        error_backoff: Duration::from_millis(5),
        write_timeout: Duration::from_millis(500),
        ..MonitorSettings::default()
    }
}

fn build(source: &ScriptedTickSource, history: &InMemoryHistory, settings: MonitorSettings) -> RatioMonitor {
    RatioMonitor::new(
        EngineConfig::default(),
        Arc::new(source.clone()),
        Arc::new(history.clone()),
        settings,
    )
}

fn local(date: &str, time: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M:%S").unwrap()
}

// ============================================================================
// Live ticks
// ============================================================================

#[tokio::test]
async fn test_three_tick_sequence_end_to_end() {
    let source = ScriptedTickSource::new()
        .with_board((NUM, 100.0), (DEN, 50.0))
        .with_board((NUM, 102.0), (DEN, 51.0))
        .with_board((NUM, 98.0), (DEN, 50.0));
    let history = InMemoryHistory::new();
    let monitor = build(&source, &history, settings());

    let mut signals = Vec::new();
    for i in 0..3 {
        let outcome = monitor.process_tick_at(stamp(i * 6)).await.unwrap();
        assert!(outcome.persisted.is_ok());
        signals.push(outcome.observation.signal);
    }

    // Collapsed bands on the first two ticks put the ratio on the lower band
    assert_eq!(signals, vec![Signal::BuyLowerBand, Signal::BuyLowerBand, Signal::None]);

    let rows = history.rows();
    assert_eq!(rows.len(), 3);
    let ratios: Vec<f64> = rows.iter().map(|r| r.ratio).collect();
    assert_relative_eq!(ratios[0], 2.0);
    assert_relative_eq!(ratios[1], 2.0);
    assert_relative_eq!(ratios[2], 1.96);
    assert_relative_eq!(rows[2].rolling_mean, 1.986_666_666_666_667, epsilon = 1e-9);
    assert_relative_eq!(rows[2].band_lower, 1.958_382, epsilon = 1e-5);
    assert_eq!(rows[2].timestamp, local("2026-10-16", "11:00:12"));
}

#[tokio::test]
async fn test_zero_denominator_leaves_statistics_unchanged() {
    let source = ScriptedTickSource::new()
        .with_board((NUM, 100.0), (DEN, 50.0))
        .with_board((NUM, 101.0), (DEN, 50.0))
        .with_board((NUM, 100.0), (DEN, 0.0));
    let history = InMemoryHistory::new();
    let monitor = build(&source, &history, settings());

    monitor.process_tick_at(stamp(0)).await.unwrap();
    monitor.process_tick_at(stamp(6)).await.unwrap();
    let before = monitor.snapshot().await;

    let err = monitor.process_tick_at(stamp(12)).await.unwrap_err();
    assert!(matches!(err, TickError::Rejected(TickRejection::ZeroDenominator)));

    let after = monitor.snapshot().await;
    assert_eq!(before.observations, after.observations);
    assert_eq!(history.rows().len(), 2);
}

#[tokio::test]
async fn test_fetch_failure_then_recovery() {
    let source = ScriptedTickSource::new()
        .with_error(FetchError::Http("connection reset".into()))
        .with_board((NUM, 71.0), (DEN, 65.0));
    let history = InMemoryHistory::new();
    let monitor = build(&source, &history, settings());

    assert!(matches!(
        monitor.process_tick_at(stamp(0)).await,
        Err(TickError::Fetch(FetchError::Http(_)))
    ));
    assert!(monitor.snapshot().await.observations.is_empty());

    let outcome = monitor.process_tick_at(stamp(10)).await.unwrap();
    assert_relative_eq!(outcome.observation.ratio, 71.0 / 65.0);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn test_persistence_failure_does_not_roll_back() {
    let source = ScriptedTickSource::new()
        .with_board((NUM, 100.0), (DEN, 50.0))
        .with_board((NUM, 101.0), (DEN, 50.0));
    let history = InMemoryHistory::new();
    let monitor = build(&source, &history, settings());

    history.fail_writes_with(Some(PersistenceError::Io("disk full".into())));
    let outcome = monitor.process_tick_at(stamp(0)).await.unwrap();
    assert!(matches!(outcome.persisted, Err(PersistenceError::Io(_))));

    history.fail_writes_with(None);
    let outcome = monitor.process_tick_at(stamp(6)).await.unwrap();
    assert!(outcome.persisted.is_ok());

    assert_eq!(monitor.snapshot().await.observations.len(), 2);
    assert_eq!(history.rows().len(), 1);
}

#[tokio::test]
async fn test_slow_persistence_times_out() {
    let source = ScriptedTickSource::new().with_board((NUM, 100.0), (DEN, 50.0));
    let history = InMemoryHistory::new().with_write_delay(Duration::from_millis(200));
    let monitor = build(
        &source,
        &history,
        MonitorSettings {
            write_timeout: Duration::from_millis(20),
            ..settings()
        },
    );

    let outcome = monitor.process_tick_at(stamp(0)).await.unwrap();
    assert_eq!(
        outcome.persisted,
        Err(PersistenceError::Timeout(Duration::from_millis(20)))
    );
    assert_eq!(monitor.snapshot().await.observations.len(), 1);
}

#[tokio::test]
async fn test_run_loop_stops_on_request() {
    let source = ScriptedTickSource::new()
        .with_board((NUM, 100.0), (DEN, 50.0))
        .with_board((NUM, 101.0), (DEN, 50.0));
    let history = InMemoryHistory::new();
    let monitor = build(&source, &history, settings());

    let runner = monitor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    monitor.stop().await;
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("run loop did not stop")
        .unwrap();

    // Two boards, then the exhausted script keeps failing without touching the engine
    assert_eq!(monitor.snapshot().await.observations.len(), 2);
    assert!(source.fetch_count() >= 3);
    assert!(!monitor.status().await.is_running);
}

// ============================================================================
// Bootstrap and recovery
// ============================================================================

#[tokio::test]
async fn test_bootstrap_merges_closes_and_persisted_rows() {
    let closes: Vec<RawTick> = (1..=5)
        .map(|d| {
            RawTick::new(
                NaiveDate::from_ymd_opt(2026, 9, d)
                    .unwrap()
                    .and_hms_opt(0, 0, 0)
                    .unwrap(),
                70.0 + d as f64,
                65.0,
            )
        })
        .collect();

    let now = market_now();
    let persisted: Vec<HistoryRow> = (1..=3)
        .rev()
        .map(|m| HistoryRow {
            timestamp: now - chrono::Duration::minutes(m),
            numerator_price: 72.0,
            denominator_price: 65.0,
            ratio: 72.0 / 65.0,
            rolling_mean: 0.0,
            band_upper: 0.0,
            band_lower: 0.0,
            signal: Signal::None,
        })
        .collect();

    let source = ScriptedTickSource::new().with_history(closes);
    let history = InMemoryHistory::new().with_rows(persisted);
    let monitor = build(&source, &history, settings());

    let report = monitor.bootstrap().await;
    assert_eq!(report.accepted, 8);
    assert_eq!(report.rejected, 0);

    let snapshot = monitor.snapshot().await;
    let stamps: Vec<NaiveDateTime> = snapshot.observations.iter().map(|o| o.timestamp).collect();
    let mut sorted = stamps.clone();
    sorted.sort();
    assert_eq!(stamps, sorted);

    // Replayed rows get fresh statistics, not the stored placeholders
    let last = snapshot.latest().unwrap();
    assert!(last.rolling_mean > 1.0);
    assert!(last.band_lower <= last.rolling_mean && last.rolling_mean <= last.band_upper);
}

#[tokio::test]
async fn test_day_summary_from_history() {
    let source = ScriptedTickSource::new()
        .with_board((NUM, 100.0), (DEN, 50.0))
        .with_board((NUM, 105.0), (DEN, 50.0))
        .with_board((NUM, 95.0), (DEN, 50.0));
    let history = InMemoryHistory::new();
    let monitor = build(&source, &history, settings());

    for i in 0..3 {
        monitor.process_tick_at(stamp(i * 6)).await.unwrap();
    }

    let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
    let summary = monitor.day_summary(day).await.unwrap().unwrap();
    assert_eq!(summary.count, 3);
    assert_relative_eq!(summary.mean, 2.0, epsilon = 1e-12);
    assert_relative_eq!(summary.min, 1.9);
    assert_relative_eq!(summary.max, 2.1);

    let other = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    assert!(monitor.day_summary(other).await.unwrap().is_none());
}

// ============================================================================
// Engine properties
// ============================================================================

#[test]
fn test_retention_bound_over_long_session() {
    let mut engine = RatioEngine::new(EngineConfig::default().with_window(20).with_retention(50));
    for i in 0..500u32 {
        let tick = RawTick::new(
            format!("2026-10-16T{:02}:{:02}:{:02}Z", 13 + i / 3600, (i / 60) % 60, i % 60).as_str(),
            100.0 + (i % 7) as f64,
            50.0,
        );
        engine.ingest(&tick).unwrap();
        assert!(engine.len() <= 50);
    }
    assert_eq!(engine.len(), 50);
}

#[test]
fn test_reorder_reproduces_in_order_statistics() {
    let prices = [100.0, 101.2, 99.4, 100.8, 98.9, 101.9, 100.1, 99.0, 102.3, 100.6];

    let mut in_order = RatioEngine::new(EngineConfig::default().with_window(4));
    for (i, p) in prices.iter().enumerate() {
        in_order.ingest(&RawTick::new(stamp(i as u32 * 6), *p, 50.0)).unwrap();
    }

    let mut shuffled = RatioEngine::new(EngineConfig::default().with_window(4));
    for &i in &[4usize, 1, 8, 0, 6, 9, 2, 7, 3, 5] {
        shuffled.ingest(&RawTick::new(stamp(i as u32 * 6), prices[i], 50.0)).unwrap();
    }
    shuffled.reorder_by_timestamp();

    for (a, b) in in_order.observations().zip(shuffled.observations()) {
        assert_eq!(a.timestamp, b.timestamp);
        assert_relative_eq!(a.rolling_mean, b.rolling_mean, epsilon = 1e-9);
        assert_relative_eq!(a.rolling_stddev, b.rolling_stddev, epsilon = 1e-9);
        assert_eq!(a.signal, b.signal);
    }
}

#[test]
fn test_reorder_after_eviction_reproduces_in_order_statistics() {
    let prices = [100.0, 102.0, 98.0, 101.0, 97.0, 103.0];
    let config = EngineConfig::default().with_window(3).with_retention(4);

    let mut in_order = RatioEngine::new(config);
    for (i, p) in prices.iter().enumerate() {
        in_order.ingest(&RawTick::new(stamp(i as u32 * 6), *p, 50.0)).unwrap();
    }

    let mut shuffled = RatioEngine::new(config);
    for &i in &[5usize, 2, 0, 4, 1, 3] {
        shuffled.ingest(&RawTick::new(stamp(i as u32 * 6), prices[i], 50.0)).unwrap();
    }
    shuffled.reorder_by_timestamp();
    assert_eq!(shuffled.len(), 4);

    let first = in_order.observations().next().unwrap();
    assert_relative_eq!(first.rolling_mean, 2.0, epsilon = 1e-12);
    assert_eq!(first.signal, Signal::None);

    for (a, b) in in_order.observations().zip(shuffled.observations()) {
        assert_eq!(a.timestamp, b.timestamp);
        assert_relative_eq!(a.rolling_mean, b.rolling_mean, epsilon = 1e-9);
        assert_relative_eq!(a.rolling_stddev, b.rolling_stddev, epsilon = 1e-9);
        assert_eq!(a.signal, b.signal);
    }
}
