//! Timestamp Normalization
//!
//! Every instant the engine stores is a naive wall-clock time in the market
//! zone (Buenos Aires, fixed UTC-03:00, no DST). Aware instants are shifted
//! into that zone, naive ones are taken as already local, and text is parsed
//! strictly: anything unrecognised is an error, never a guess.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use thiserror::Error;

use super::tick::RawTimestamp;

/// Market zone offset east of UTC, in seconds
pub const MARKET_UTC_OFFSET_SECS: i32 = -3 * 3600;

/// Offset-bearing layouts tried after RFC 3339
const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

/// Local layouts; `%.f` also matches an absent fraction
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unparsable timestamp: {input:?}")]
pub struct TimestampParseError {
    pub input: String,
}

pub fn market_offset() -> FixedOffset {
    FixedOffset::east_opt(MARKET_UTC_OFFSET_SECS).expect("market offset is within one day")
}

/// Current wall-clock time in the market zone
pub fn market_now() -> NaiveDateTime {
    to_market(&Utc::now())
}

/// Current calendar date in the market zone
pub fn market_today() -> NaiveDate {
    market_now().date()
}

/// Canonical market-local instant for any accepted timestamp form
pub fn normalize(raw: &RawTimestamp) -> Result<NaiveDateTime, TimestampParseError> {
    match raw {
        RawTimestamp::Aware(instant) => Ok(to_market(instant)),
        RawTimestamp::Naive(local) => Ok(*local),
        RawTimestamp::Text(text) => parse_text(text),
    }
}

fn to_market<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDateTime {
    instant.with_timezone(&market_offset()).naive_local()
}

fn parse_text(input: &str) -> Result<NaiveDateTime, TimestampParseError> {
    let text = input.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(to_market(&instant));
    }
    for format in AWARE_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(text, format) {
            return Ok(to_market(&instant));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(local);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(TimestampParseError {
        input: input.to_string(),
    })
}
