pub mod monitor;

pub use monitor::{MonitorSettings, MonitorStatus, RatioMonitor, TickError, TickOutcome};
