//! Pre-built Test Fixtures
//!
//! Fixed instants and dates so tests never depend on the wall clock. The
//! reference "now" is 2024-01-10 12:00 UTC; the reference work day is
//! 2024-01-05.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_kernel::{DateWindow, Timezone, UserId};
use uuid::Uuid;

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// The reference clock, usable as `with_clock(TemporalFixtures::now)`
    pub fn now() -> DateTime<Utc> {
        Self::at(2024, 1, 10, 12)
    }

    /// Today's date at the reference clock
    pub fn today() -> NaiveDate {
        Self::now().date_naive()
    }

    /// The reference work day
    pub fn work_day() -> NaiveDate {
        Self::date(2024, 1, 5)
    }

    /// An instant on the reference work day
    pub fn work_day_at(hour: u32) -> DateTime<Utc> {
        Self::at(2024, 1, 5, hour)
    }

    /// Last day of 2023, for week-boundary tests
    pub fn new_years_eve() -> DateTime<Utc> {
        Self::at(2023, 12, 31, 18)
    }

    /// First day of 2024, for week-boundary tests
    pub fn new_years_day() -> DateTime<Utc> {
        Self::at(2024, 1, 1, 9)
    }

    /// The calendar days `start..=end` in UTC
    pub fn window(start: NaiveDate, end: NaiveDate) -> DateWindow {
        DateWindow::from_dates(start, end, &Timezone::utc())
            .unwrap_or_else(|e| panic!("fixture window is invalid: {e}"))
    }

    /// The whole reference month
    pub fn january() -> DateWindow {
        Self::window(Self::date(2024, 1, 1), Self::date(2024, 1, 31))
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_else(|| panic!("invalid fixture date {y}-{m}-{d}"))
    }

    pub fn at(y: i32, m: u32, d: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, hour, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("invalid fixture instant {y}-{m}-{d} {hour}h"))
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    /// A stable user id, for snapshot-style assertions
    pub fn driver() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0001))
    }

    /// Another stable user id
    pub fn other_driver() -> UserId {
        UserId::from_uuid(Uuid::from_u128(0x0190_0000_0000_7000_8000_0000_0000_0002))
    }
}
