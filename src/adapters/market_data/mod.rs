//! Market Data Adapters
//!
//! External data sources for bond prices:
//! - `Data912Feed`: live board of Argentine bonds plus daily close history
//!
//! Feed Notes:
//! - Live board is a flat JSON array of `{symbol, c, ...}` quotes
//! - Bonds without a trade report a null close and are skipped
//! - History is fetched per symbol and inner-joined on date

mod data912;

pub use data912::{
    merge_history, parse_live_board, Data912Feed, HistoricalClose, DATA912_HISTORICAL_BONDS,
    DATA912_LIVE_BONDS,
};
