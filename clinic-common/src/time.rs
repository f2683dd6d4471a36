//! Timestamp utilities
//!
//! Timestamps are persisted as unix milliseconds (UTC). "Today" for a clinic is
//! the calendar date in a fixed UTC offset, see [`ServiceDay`].

use crate::{Error, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, Timelike, Utc};
use std::sync::Mutex;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert a timestamp to the unix-millisecond column representation
pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

/// Convert a unix-millisecond column value back to a timestamp
pub fn from_millis(millis: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| Error::Internal(format!("Timestamp out of range: {}", millis)))
}

/// Optional variant of [`from_millis`] for nullable columns
pub fn from_millis_opt(millis: Option<i64>) -> Result<Option<DateTime<Utc>>> {
    millis.map(from_millis).transpose()
}

/// Whole seconds elapsed from `earlier` to `later`, clamped at zero
pub fn elapsed_seconds(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_seconds().max(0)
}

/// Whole minutes elapsed from `earlier` to `later`, clamped at zero
pub fn elapsed_minutes(earlier: DateTime<Utc>, later: DateTime<Utc>) -> i64 {
    (later - earlier).num_minutes().max(0)
}

/// Source of the current time
///
/// Injected into services so tests can control durations and the service day.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replays
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Mutex::new(start),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, ts: DateTime<Utc>) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = ts;
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Calendar rules for a clinic: which date and weekday a timestamp falls on
#[derive(Debug, Clone, Copy)]
pub struct ServiceDay {
    offset: FixedOffset,
}

impl ServiceDay {
    /// Service day in a fixed offset from UTC (e.g. -300 for UTC-05:00)
    pub fn new(offset_minutes: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
            Error::Config(format!("Invalid day offset: {} minutes", offset_minutes))
        })?;
        Ok(Self { offset })
    }

    /// Service day aligned with UTC
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// Local calendar date of a timestamp
    pub fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// `YYYY-MM-DD` key stored on flows as their service date
    pub fn date_key(&self, ts: DateTime<Utc>) -> String {
        self.date_of(ts).format("%Y-%m-%d").to_string()
    }

    /// Local weekday, 0 = Sunday through 6 = Saturday
    pub fn weekday(&self, ts: DateTime<Utc>) -> u8 {
        ts.with_timezone(&self.offset).weekday().num_days_from_sunday() as u8
    }

    /// True before local noon
    pub fn is_morning(&self, ts: DateTime<Utc>) -> bool {
        ts.with_timezone(&self.offset).hour() < 12
    }
}

impl Default for ServiceDay {
    fn default() -> Self {
        Self::utc()
    }
}
