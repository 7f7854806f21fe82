use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which side of the ratio a price belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Leg {
    Numerator,
    Denominator,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Numerator => write!(f, "numerator"),
            Leg::Denominator => write!(f, "denominator"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TickRejection {
    #[error("Denominator price is zero")]
    ZeroDenominator,
    #[error("Non-positive {leg} price: {value}")]
    NonPositivePrice { leg: Leg, value: f64 },
    #[error("Non-numeric {leg} price: {value}")]
    NonFinitePrice { leg: Leg, value: f64 },
}

/// Timestamp as it arrives from a feed or from the durable log
#[derive(Debug, Clone, PartialEq)]
pub enum RawTimestamp {
    /// Instant carrying its own offset
    Aware(DateTime<FixedOffset>),
    /// Instant already expressed in the market zone
    Naive(NaiveDateTime),
    /// ISO-8601 / RFC 3339 text, optionally with a `Z` marker
    Text(String),
}

impl From<DateTime<Utc>> for RawTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        RawTimestamp::Aware(value.fixed_offset())
    }
}

impl From<DateTime<FixedOffset>> for RawTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        RawTimestamp::Aware(value)
    }
}

impl From<NaiveDateTime> for RawTimestamp {
    fn from(value: NaiveDateTime) -> Self {
        RawTimestamp::Naive(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        RawTimestamp::Text(value.to_string())
    }
}

impl From<String> for RawTimestamp {
    fn from(value: String) -> Self {
        RawTimestamp::Text(value)
    }
}

/// One unvalidated price pair captured at some instant
#[derive(Debug, Clone, PartialEq)]
pub struct RawTick {
    pub timestamp: RawTimestamp,
    pub numerator_price: f64,
    pub denominator_price: f64,
}

impl RawTick {
    pub fn new(timestamp: impl Into<RawTimestamp>, numerator_price: f64, denominator_price: f64) -> Self {
        Self {
            timestamp: timestamp.into(),
            numerator_price,
            denominator_price,
        }
    }
}

/// A validated price pair with its derived ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub numerator_price: f64,
    pub denominator_price: f64,
    pub ratio: f64,
}

impl PriceSample {
    pub fn new(numerator_price: f64, denominator_price: f64) -> Result<Self, TickRejection> {
        check_finite(Leg::Numerator, numerator_price)?;
        check_finite(Leg::Denominator, denominator_price)?;

        if denominator_price == 0.0 {
            return Err(TickRejection::ZeroDenominator);
        }
        if numerator_price <= 0.0 {
            return Err(TickRejection::NonPositivePrice {
                leg: Leg::Numerator,
                value: numerator_price,
            });
        }
        if denominator_price < 0.0 {
            return Err(TickRejection::NonPositivePrice {
                leg: Leg::Denominator,
                value: denominator_price,
            });
        }

        Ok(Self {
            numerator_price,
            denominator_price,
            ratio: numerator_price / denominator_price,
        })
    }
}

fn check_finite(leg: Leg, value: f64) -> Result<(), TickRejection> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TickRejection::NonFinitePrice { leg, value })
    }
}
