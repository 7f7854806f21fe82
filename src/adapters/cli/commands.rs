//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the ratio band monitor.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::adapters::market_data::Data912Feed;
use crate::adapters::persistence::JsonlHistoryStore;
use crate::application::{MonitorSettings, RatioMonitor};
use crate::config::{load_config, Config};
use crate::domain::{market_now, market_today, HistoryRow};
use crate::ports::HistoryPort;
use crate::strategy::{EngineConfig, RatioSummary};

/// ratio-bands - Rolling band monitor for the GD30/AL30 bond ratio
#[derive(Parser, Debug)]
#[command(
    name = "ratio-bands",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Rolling band monitor for the GD30/AL30 bond ratio",
    long_about = "ratio-bands polls the live bond board, tracks the GD30/AL30 price ratio \
                  against rolling mean +/- k sigma bands and flags band touches as \
                  buy or sell signals."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the polling loop
    Run(RunCmd),

    /// Summarize one day of persisted observations
    Summary(SummaryCmd),

    /// Print recent persisted observations
    Tail(TailCmd),
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Run(cmd) => &cmd.config,
            Command::Summary(cmd) => &cmd.config,
            Command::Tail(cmd) => &cmd.config,
        }
    }
}

/// Start polling loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Skip the historical and durable-log warm-up
    #[arg(long)]
    pub no_bootstrap: bool,
}

/// Day summary
#[derive(Parser, Debug)]
pub struct SummaryCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Market-zone date (YYYY-MM-DD), today by default
    #[arg(short, long, value_name = "DATE")]
    pub date: Option<NaiveDate>,
}

/// Recent rows
#[derive(Parser, Debug)]
pub struct TailCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Look back this many minutes
    #[arg(short, long, value_name = "MINUTES", default_value = "60")]
    pub minutes: i64,

    /// Print at most this many rows
    #[arg(short, long, value_name = "ROWS", default_value = "20")]
    pub limit: usize,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_config(app.command.config_path())
        .with_context(|| format!("Failed to load configuration from {}", app.command.config_path().display()))?;

    init_logging(&config.logging.level, app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, &config).await,
        Command::Summary(cmd) => summary_command(cmd, &config).await,
        Command::Tail(cmd) => tail_command(cmd, &config).await,
    }
}

/// Initialize logging system
fn init_logging(level: &str, verbose: bool, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        level
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

fn history_store(config: &Config) -> JsonlHistoryStore {
    JsonlHistoryStore::new(config.persistence.get_path())
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: &Config) -> Result<()> {
    tracing::info!("Starting ratio-bands monitor...");
    tracing::info!("Config: {}", cmd.config.display());

    let feed = Data912Feed::from_config(&config.feed).context("Failed to create price feed")?;
    let store = history_store(config);
    tracing::info!("History: {}", store.path().display());

    let monitor = RatioMonitor::new(
        EngineConfig::from(config),
        Arc::new(feed),
        Arc::new(store),
        MonitorSettings::from(config),
    );

    if cmd.no_bootstrap {
        tracing::warn!("Bootstrap skipped - bands start from an empty window");
    } else {
        let report = monitor.bootstrap().await;
        println!(
            "Seeded {} observations ({} rejected)",
            report.accepted, report.rejected
        );
    }

    // Setup Ctrl+C handler
    let handle = monitor.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop().await;
    });

    monitor.run().await;

    let snapshot = monitor.snapshot().await;
    if let Some(latest) = snapshot.latest() {
        println!(
            "Last ratio {:.4} ({} observations, overall mean {:.4}, signal {})",
            latest.ratio,
            snapshot.observations.len(),
            snapshot.overall_mean.unwrap_or(latest.ratio),
            snapshot.latest_signal
        );
    }
    tracing::info!("ratio-bands stopped");
    Ok(())
}

/// Handle summary command
async fn summary_command(cmd: SummaryCmd, config: &Config) -> Result<()> {
    let date = cmd.date.unwrap_or_else(market_today);
    let store = history_store(config);
    let rows = store
        .query_by_date(date)
        .await
        .context("Failed to read history")?;

    match RatioSummary::from_rows(&rows) {
        Some(summary) => print_summary(date, &summary),
        None => println!("No observations recorded on {}", date),
    }
    Ok(())
}

fn print_summary(date: NaiveDate, summary: &RatioSummary) {
    println!("Ratio summary for {}", date);
    println!(
        "  Window:   {} -> {} ({} observations)",
        summary.first_timestamp.format("%H:%M:%S"),
        summary.last_timestamp.format("%H:%M:%S"),
        summary.count
    );
    println!(
        "  Ratio:    open {:.4}  close {:.4}  ({:+.2}%)",
        summary.first_ratio,
        summary.last_ratio,
        summary.change_pct()
    );
    println!("  Mean:     {:.4}  (sigma {:.4})", summary.mean, summary.stddev);
    println!("  Range:    {:.4} - {:.4}", summary.min, summary.max);
    println!(
        "  Signals:  {} buy / {} sell",
        summary.buy_signals, summary.sell_signals
    );
}

/// Handle tail command
async fn tail_command(cmd: TailCmd, config: &Config) -> Result<()> {
    let since = market_now() - Duration::minutes(cmd.minutes.max(0));
    let store = history_store(config);
    let rows = store
        .query_since(since)
        .await
        .context("Failed to read history")?;

    if rows.is_empty() {
        println!("No observations since {}", since.format("%Y-%m-%d %H:%M:%S"));
        return Ok(());
    }

    let start = rows.len().saturating_sub(cmd.limit);
    println!(
        "{:<19}  {:>9}  {:>9}  {:>8}  {:>8}  {:>8}  {:>8}  signal",
        "timestamp", "num", "den", "ratio", "mean", "lower", "upper"
    );
    for row in &rows[start..] {
        println!("{}", format_row(row));
    }
    Ok(())
}

fn format_row(row: &HistoryRow) -> String {
    format!(
        "{:<19}  {:>9.2}  {:>9.2}  {:>8.4}  {:>8.4}  {:>8.4}  {:>8.4}  {}",
        row.timestamp.format("%Y-%m-%d %H:%M:%S"),
        row.numerator_price,
        row.denominator_price,
        row.ratio,
        row.rolling_mean,
        row.band_lower,
        row.band_upper,
        row.signal
    )
}
