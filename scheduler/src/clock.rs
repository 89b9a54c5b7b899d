//! Trading-session gate and wall-clock alignment for refresh fires.

use chrono::{NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use thiserror::Error;

pub const DEFAULT_OPEN: &str = "09:30";
pub const DEFAULT_CLOSE: &str = "16:00";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("invalid session time {0:?}; expected HH:MM")]
    BadTime(String),

    #[error("session must not wrap midnight: open {open} is not before close {close}")]
    Wrapping { open: NaiveTime, close: NaiveTime },
}

/// Session open/close in local wall-clock time, compared at minute
/// resolution with both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarketClock {
    open: NaiveTime,
    close: NaiveTime,
}

impl MarketClock {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, ClockError> {
        if open >= close {
            return Err(ClockError::Wrapping { open, close });
        }
        Ok(Self { open, close })
    }

    /// Parses `HH:MM` bounds.
    pub fn parse(open: &str, close: &str) -> Result<Self, ClockError> {
        Self::new(parse_hhmm(open)?, parse_hhmm(close)?)
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    pub fn in_session(&self, now: NaiveTime) -> bool {
        let minute = now
            .with_second(0)
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        self.open <= minute && minute <= self.close
    }

    /// Rounds `now` up to the next multiple of `interval_minutes` counted
    /// from local midnight. A time already on a boundary is returned as is.
    pub fn next_aligned_boundary(
        &self,
        now: NaiveDateTime,
        interval_minutes: u32,
    ) -> NaiveDateTime {
        let step = i64::from(interval_minutes.max(1)) * 60;
        let time = now.time();
        let secs = i64::from(time.num_seconds_from_midnight());

        if secs % step == 0 && time.nanosecond() == 0 {
            return now;
        }

        let midnight = now.date().and_time(NaiveTime::MIN);
        midnight + TimeDelta::seconds((secs / step + 1) * step)
    }
}

impl Default for MarketClock {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, ClockError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| ClockError::BadTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn clock() -> MarketClock {
        MarketClock::parse(DEFAULT_OPEN, DEFAULT_CLOSE).unwrap()
    }

    #[test]
    fn default_matches_regular_session() {
        assert_eq!(MarketClock::default(), clock());
    }

    #[test]
    fn session_bounds_are_inclusive_at_minute_resolution() {
        let c = clock();
        assert!(!c.in_session(at(9, 29, 59).time()));
        assert!(c.in_session(at(9, 30, 0).time()));
        assert!(c.in_session(at(12, 0, 0).time()));
        assert!(c.in_session(at(16, 0, 45).time()));
        assert!(!c.in_session(at(16, 1, 0).time()));
        assert!(!c.in_session(at(2, 0, 0).time()));
    }

    #[test]
    fn wrapping_sessions_are_rejected() {
        assert!(matches!(
            MarketClock::parse("22:00", "04:00"),
            Err(ClockError::Wrapping { .. })
        ));
        assert!(matches!(
            MarketClock::parse("09:30", "09:30"),
            Err(ClockError::Wrapping { .. })
        ));
    }

    #[test]
    fn bad_times_are_rejected() {
        assert_eq!(
            MarketClock::parse("9h30", "16:00"),
            Err(ClockError::BadTime("9h30".into()))
        );
    }

    #[test]
    fn boundary_rounds_up_to_cadence() {
        let c = clock();
        assert_eq!(c.next_aligned_boundary(at(9, 31, 12), 5), at(9, 35, 0));
        assert_eq!(c.next_aligned_boundary(at(9, 36, 0), 5), at(9, 40, 0));
        assert_eq!(c.next_aligned_boundary(at(9, 31, 0), 15), at(9, 45, 0));
        assert_eq!(c.next_aligned_boundary(at(9, 59, 1), 60), at(10, 0, 0));
        assert_eq!(c.next_aligned_boundary(at(9, 0, 30), 1), at(9, 1, 0));
    }

    #[test]
    fn boundary_keeps_exact_multiples() {
        assert_eq!(clock().next_aligned_boundary(at(9, 35, 0), 5), at(9, 35, 0));
    }

    #[test]
    fn boundary_rolls_into_next_day() {
        let next = clock().next_aligned_boundary(at(23, 58, 0), 5);
        assert_eq!(
            next,
            NaiveDate::from_ymd_opt(2024, 3, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap()
        );
    }
}
