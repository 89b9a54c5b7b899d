use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};

use crate::errors::{InvalidInterval, InvalidTimestamp};

/// Wire and file representation of a bar timestamp.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H:%M";

/// Uppercase alphanumeric symbol, e.g. `AAPL`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticker(String);

impl Ticker {
    /// Trims and uppercases `raw`. Returns `None` for empty input or any
    /// non-alphanumeric character.
    pub fn parse(raw: &str) -> Option<Self> {
        let symbol = raw.trim().to_ascii_uppercase();
        if symbol.is_empty() || !symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self(symbol))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minute-resolution bar time, rendered as `YYYY-MM-DD-HH:MM`.
///
/// Ordering is chronological, which is also the lexicographic order of the
/// rendered form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    /// Drops seconds and sub-second precision.
    pub fn from_datetime(dt: NaiveDateTime) -> Self {
        let minute = dt
            .with_second(0)
            .and_then(|d| d.with_nanosecond(0))
            .unwrap_or(dt);
        Self(minute)
    }

    pub fn datetime(&self) -> NaiveDateTime {
        self.0
    }
}

/// Only the exact zero-padded form is accepted; `2024-3-1-9:35` is not a key.
impl FromStr for Timestamp {
    type Err = InvalidTimestamp;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let ts = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
            .map(Self::from_datetime)
            .map_err(|_| InvalidTimestamp(raw.to_string()))?;

        if ts.to_string() != raw {
            return Err(InvalidTimestamp(raw.to_string()));
        }
        Ok(ts)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

/// One timestamp-price sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricePoint {
    pub timestamp: Timestamp,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp: Timestamp, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// Bar cadence shared by every ticker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    #[default]
    FiveMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    SixtyMinutes,
}

impl Interval {
    pub const ALL: [Interval; 5] = [
        Interval::OneMinute,
        Interval::FiveMinutes,
        Interval::FifteenMinutes,
        Interval::ThirtyMinutes,
        Interval::SixtyMinutes,
    ];

    pub fn from_minutes(minutes: u32) -> Result<Self, InvalidInterval> {
        match minutes {
            1 => Ok(Self::OneMinute),
            5 => Ok(Self::FiveMinutes),
            15 => Ok(Self::FifteenMinutes),
            30 => Ok(Self::ThirtyMinutes),
            60 => Ok(Self::SixtyMinutes),
            other => Err(InvalidInterval(other)),
        }
    }

    pub fn minutes(self) -> u32 {
        match self {
            Self::OneMinute => 1,
            Self::FiveMinutes => 5,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::SixtyMinutes => 60,
        }
    }

    pub fn period(self) -> Duration {
        Duration::from_secs(u64::from(self.minutes()) * 60)
    }
}

impl TryFrom<u32> for Interval {
    type Error = InvalidInterval;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes())
    }
}

/// Target of a `--price` / `--signal` query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// `now`: the last point of each series.
    Latest,
    /// Exact timestamp match.
    At(Timestamp),
    /// Not a timestamp; matches nothing.
    Unmatched(String),
}

impl Lookup {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw == "now" {
            return Self::Latest;
        }
        match raw.parse::<Timestamp>() {
            Ok(ts) => Self::At(ts),
            Err(_) => Self::Unmatched(raw.to_string()),
        }
    }
}
