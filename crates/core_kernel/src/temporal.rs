//! Calendar handling for aggregation windows
//!
//! Records are stored as absolute instants (UTC). Callers, however, think in
//! local calendar days: "the last 30 days" starts at local midnight and ends
//! one millisecond before the next local midnight. This module converts
//! between the two.

use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timezone wrapper used for calendar-day normalisation and bucketing
///
/// Wraps chrono_tz::Tz with custom serialization support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timezone(pub Tz);

impl Serialize for Timezone {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.0.name())
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse()
            .map_err(|_| serde::de::Error::custom(format!("Invalid timezone: {}", s)))
    }
}

impl FromStr for Timezone {
    type Err = TemporalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tz::from_str(s.trim())
            .map(Timezone)
            .map_err(|_| TemporalError::UnknownTimezone(s.to_string()))
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.name())
    }
}

impl Timezone {
    pub fn new(tz: Tz) -> Self {
        Self(tz)
    }

    pub fn utc() -> Self {
        Self(chrono_tz::UTC)
    }

    /// Converts a UTC instant to the local calendar date
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.0).date_naive()
    }

    /// The current local calendar date at `now`
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.date_of(now)
    }

    /// Gets the start of day (00:00:00.000) in this timezone as UTC
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        self.resolve(date.and_time(NaiveTime::MIN))
    }

    /// Gets the end of day (23:59:59.999) in this timezone as UTC
    pub fn end_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let last_milli = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
        self.resolve(date.and_time(last_milli))
    }

    /// Maps a local wall-clock time to an instant.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earliest instant; times
    /// inside a DST gap move forward to the first valid hour.
    fn resolve(&self, local: NaiveDateTime) -> DateTime<Utc> {
        if let Some(dt) = self.0.from_local_datetime(&local).earliest() {
            return dt.with_timezone(&Utc);
        }
        let shifted = local + chrono::Duration::hours(1);
        match self.0.from_local_datetime(&shifted).earliest() {
            Some(dt) => dt.with_timezone(&Utc),
            None => local.and_utc(),
        }
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Self::utc()
    }
}

/// Errors related to calendar operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid window: end {end} is before start {start}")]
    InvalidWindow {
        start: String,
        end: String,
    },

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// An inclusive window of absolute instants `[start, end]`
///
/// Windows built from calendar dates always start at local midnight and end
/// at 23:59:59.999 local time of the last day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Creates a window from two instants
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        if end < start {
            return Err(TemporalError::InvalidWindow {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a window covering the local calendar days `start..=end`
    pub fn from_dates(start: NaiveDate, end: NaiveDate, tz: &Timezone) -> Result<Self, TemporalError> {
        if end < start {
            return Err(TemporalError::InvalidWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            start: tz.start_of_day(start),
            end: tz.end_of_day(end),
        })
    }

    /// Resolves optional request dates against `today`
    ///
    /// A missing end means today; a missing start means `default_days` before
    /// the end.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
        tz: &Timezone,
        default_days: u32,
    ) -> Result<Self, TemporalError> {
        let end = end.unwrap_or(today);
        let start = match start {
            Some(start) => start,
            None => end
                .checked_sub_days(Days::new(u64::from(default_days)))
                .unwrap_or(NaiveDate::MIN),
        };
        Self::from_dates(start, end, tz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_window_rejects_end_before_start() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let result = DateWindow::from_dates(start, end, &Timezone::utc());
        assert!(matches!(result, Err(TemporalError::InvalidWindow { .. })));
    }

    #[test]
    fn test_end_of_day_is_last_millisecond() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let end = Timezone::utc().end_of_day(date);
        assert_eq!(end.hour(), 23);
        assert_eq!(end.nanosecond(), 999_000_000);
    }

    #[test]
    fn test_local_midnight_converts_to_utc() {
        let tz: Timezone = "America/Mexico_City".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let start = tz.start_of_day(date);
        // UTC-6 in January
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 1, 5, 6, 0, 0).unwrap());
    }
}
