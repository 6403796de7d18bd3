//! Shift entity and its state machine
//!
//! ```text
//! ┌──────┐  close(odometerEnd, tripKm)  ┌────────┐
//! │ Open │ ───────────────────────────▶ │ Closed │
//! └──────┘                              └────────┘
//! ```
//!
//! Closed is terminal. Distances are only computed at close time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{round1, ShiftId, UserId};

use crate::error::ShiftError;

/// Shift state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftState {
    Open,
    Closed,
}

impl ShiftState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftState::Open => "open",
            ShiftState::Closed => "closed",
        }
    }
}

/// A bounded work session bracketed by odometer readings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    pub id: ShiftId,
    pub user_id: UserId,
    pub state: ShiftState,
    pub odometer_start: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub odometer_end: Option<Decimal>,
    /// odometerEnd - odometerStart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_km: Option<Decimal>,
    /// Trip distance of income records dated at or after `started_at`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_km: Option<Decimal>,
    /// totalKm - tripKm, one decimal; negative values are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dead_km: Option<Decimal>,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    /// Opens a new shift at `now`
    pub fn open(user_id: UserId, odometer_start: Decimal, now: DateTime<Utc>) -> Result<Self, ShiftError> {
        if odometer_start < Decimal::ZERO {
            return Err(ShiftError::validation("odometerStart", "must not be negative"));
        }
        Ok(Self {
            id: ShiftId::new_v7(),
            user_id,
            state: ShiftState::Open,
            odometer_start,
            odometer_end: None,
            total_km: None,
            trip_km: None,
            dead_km: None,
            started_at: now,
            ended_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_open(&self) -> bool {
        self.state == ShiftState::Open
    }

    /// Checks that the shift can be closed with this reading
    pub fn ensure_closable(&self, odometer_end: Decimal) -> Result<(), ShiftError> {
        if !self.is_open() {
            return Err(ShiftError::AlreadyClosed(self.id));
        }
        if odometer_end < self.odometer_start {
            return Err(ShiftError::InvalidOdometer {
                start: self.odometer_start,
                end: odometer_end,
            });
        }
        Ok(())
    }

    /// Closes the shift and computes its distances
    pub fn close(&mut self, odometer_end: Decimal, trip_km: Decimal, now: DateTime<Utc>) -> Result<(), ShiftError> {
        self.ensure_closable(odometer_end)?;

        let total_km = odometer_end - self.odometer_start;
        self.odometer_end = Some(odometer_end);
        self.total_km = Some(total_km);
        self.trip_km = Some(trip_km);
        self.dead_km = Some(round1(total_km - trip_km));
        self.state = ShiftState::Closed;
        self.ended_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Distance driven, zero while open
    pub fn total_km_or_zero(&self) -> Decimal {
        self.total_km.unwrap_or(Decimal::ZERO)
    }

    /// Dead kilometers, zero while open
    pub fn dead_km_or_zero(&self) -> Decimal {
        self.dead_km.unwrap_or(Decimal::ZERO)
    }
}
