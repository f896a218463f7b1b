//! Search inputs: date range, daily business hours, and the assembled
//! [`SearchConfig`].
//!
//! Everything here is validated up front so that a bad request is rejected
//! before any calendar data is fetched.

use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;

use crate::error::{Result, ValidationError};

/// Maximum number of slots returned by a search, across all days.
pub const MAX_SLOTS: usize = 3;

/// Default daily start of the business window.
pub const DEFAULT_DAILY_START: &str = "09:00";

/// Default daily end of the business window.
pub const DEFAULT_DAILY_END: &str = "18:00";

/// Synthetic lunch block, local wall-clock hours `[12:00, 13:00)`.
pub const LUNCH_HOURS: (u32, u32) = (12, 13);

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Parse an `HH:MM` wall-clock time.
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| ValidationError::InvalidTime(value.to_string()))
}

/// Parse an IANA timezone name (e.g. `Asia/Tokyo`, `UTC`).
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse()
        .map_err(|_| ValidationError::InvalidTimezone(name.to_string()))
}

/// An inclusive range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse both ends from `YYYY-MM-DD` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Every date from `start` to `end` inclusive, ascending. Empty when
    /// `start > end`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// The daily wall-clock window in which meetings may be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BusinessHours {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Parse both bounds from `HH:MM` strings.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self::new(parse_time(start)?, parse_time(end)?))
    }

    /// An inverted or zero-length window admits no slots.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Fully validated inputs to a slot search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub date_range: DateRange,
    pub duration: Duration,
    pub hours: BusinessHours,
    pub exclude_lunch: bool,
    pub timezone: Tz,
}

impl SearchConfig {
    /// Assemble a config, rejecting non-positive durations.
    ///
    /// # Errors
    /// Returns `ValidationError::InvalidDuration` when `duration_minutes <= 0`.
    pub fn new(
        date_range: DateRange,
        duration_minutes: i64,
        hours: BusinessHours,
        exclude_lunch: bool,
        timezone: Tz,
    ) -> Result<Self> {
        let duration = Duration::try_minutes(duration_minutes)
            .filter(|d| *d > Duration::zero())
            .ok_or(ValidationError::InvalidDuration(duration_minutes))?;
        Ok(Self {
            date_range,
            duration,
            hours,
            exclude_lunch,
            timezone,
        })
    }

    /// Build a config straight from the string-typed tool arguments.
    ///
    /// # Errors
    /// Returns the first `ValidationError` encountered: dates, then times, then
    /// duration.
    pub fn from_strings(
        start_date: &str,
        end_date: &str,
        duration_minutes: i64,
        daily_start: &str,
        daily_end: &str,
        exclude_lunch: bool,
        timezone: Tz,
    ) -> Result<Self> {
        let date_range = DateRange::parse(start_date, end_date)?;
        let hours = BusinessHours::parse(daily_start, daily_end)?;
        Self::new(date_range, duration_minutes, hours, exclude_lunch, timezone)
    }

    pub fn duration_minutes(&self) -> i64 {
        self.duration.num_minutes()
    }
}
