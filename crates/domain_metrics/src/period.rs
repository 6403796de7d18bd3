//! History bucketing periods
//!
//! Bucket keys are strings whose lexicographic order is their chronological
//! order:
//!
//! | period  | key          |
//! |---------|--------------|
//! | diario  | `YYYY-MM-DD` |
//! | semanal | `YYYY-WW`    |
//! | mensual | `YYYY-MM`    |
//! | anual   | `YYYY`       |
//!
//! Weeks are not ISO weeks. Week 1 is the partial week containing January 1
//! and weeks start on Sunday: `ceil((dow(Jan 1) + 1 + dayOfYear0) / 7)` with
//! Sunday = 0. December 31 and January 1 therefore never share a key.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bucketing granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Diario,
    Semanal,
    Mensual,
    Anual,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown period '{0}', expected diario, semanal, mensual or anual")]
pub struct UnknownPeriod(pub String);

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Diario => "diario",
            Period::Semanal => "semanal",
            Period::Mensual => "mensual",
            Period::Anual => "anual",
        }
    }

    /// Key of the bucket containing `date`
    pub fn bucket_key(&self, date: NaiveDate) -> String {
        match self {
            Period::Diario => date.format("%Y-%m-%d").to_string(),
            Period::Semanal => format!("{:04}-{:02}", date.year(), week_of_year(date)),
            Period::Mensual => date.format("%Y-%m").to_string(),
            Period::Anual => format!("{:04}", date.year()),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = UnknownPeriod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "diario" | "daily" => Ok(Period::Diario),
            "semanal" | "weekly" => Ok(Period::Semanal),
            "mensual" | "monthly" => Ok(Period::Mensual),
            "anual" | "yearly" => Ok(Period::Anual),
            _ => Err(UnknownPeriod(s.to_string())),
        }
    }
}

/// Sunday-based week number, 1 for the week containing January 1
pub fn week_of_year(date: NaiveDate) -> u32 {
    let days_since_jan1 = date.ordinal0();
    let dow = date.weekday().num_days_from_sunday();
    let jan1_dow = (dow + 7 - days_since_jan1 % 7) % 7;
    (jan1_dow + 1 + days_since_jan1).div_ceil(7)
}
