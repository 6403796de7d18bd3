//! Test Data Builders
//!
//! Builders with sensible defaults so tests only spell out the fields that
//! matter. They produce entities directly, without validation, so tests can
//! also seed records the services would reject.

use chrono::{DateTime, Duration, Utc};
use core_kernel::UserId;
use domain_ledger::{NewTransaction, Platform, Transaction, TransactionStatus, TripExtras};
use domain_shift::Shift;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{IdFixtures, TemporalFixtures};

/// Builder for transactions
pub struct TransactionBuilder {
    user_id: UserId,
    new: NewTransaction,
}

impl TransactionBuilder {
    /// A completed $100 income record on the reference work day
    pub fn income() -> Self {
        Self::of(NewTransaction::income(dec!(100), TemporalFixtures::work_day_at(10), "viaje"))
    }

    /// A completed $50 fuel expense on the reference work day
    pub fn expense() -> Self {
        Self::of(NewTransaction::expense(dec!(50), TemporalFixtures::work_day_at(11), "fuel"))
    }

    fn of(new: NewTransaction) -> Self {
        Self {
            user_id: IdFixtures::driver(),
            new,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn amount(mut self, amount: Decimal) -> Self {
        self.new.amount = amount;
        self
    }

    pub fn on(mut self, date: DateTime<Utc>) -> Self {
        self.new.date = date;
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.new.category = category.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.new = self.new.with_description(description);
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.new = self.new.with_platform(platform);
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.new = self.new.with_status(status);
        self
    }

    /// Trip distance and duration
    pub fn trip(mut self, distance_km: Decimal, duration_minutes: Decimal) -> Self {
        self.new = self.new.with_trip(distance_km, duration_minutes);
        self
    }

    pub fn extras(mut self, toll: Decimal, parking: Decimal) -> Self {
        self.new = self.new.with_extras(TripExtras {
            toll: Some(toll),
            parking: Some(parking),
        });
        self
    }

    /// The submission, for tests that go through the ledger
    pub fn new_transaction(self) -> NewTransaction {
        self.new
    }

    pub fn build(self) -> Transaction {
        Transaction::from_new(self.user_id, self.new, TemporalFixtures::now())
    }
}

/// Builder for shifts
pub struct ShiftBuilder {
    user_id: UserId,
    started_at: DateTime<Utc>,
    odometer_start: Decimal,
    close: Option<(Decimal, Decimal)>,
}

impl Default for ShiftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShiftBuilder {
    /// An open shift starting at 08:00 on the reference work day at 1000 km
    pub fn new() -> Self {
        Self {
            user_id: IdFixtures::driver(),
            started_at: TemporalFixtures::work_day_at(8),
            odometer_start: dec!(1000),
            close: None,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn started_at(mut self, started_at: DateTime<Utc>) -> Self {
        self.started_at = started_at;
        self
    }

    pub fn odometer_start(mut self, odometer_start: Decimal) -> Self {
        self.odometer_start = odometer_start;
        self
    }

    /// Closes the shift after driving `total_km`, of which `trip_km` on trips
    pub fn closed(mut self, total_km: Decimal, trip_km: Decimal) -> Self {
        self.close = Some((total_km, trip_km));
        self
    }

    /// Builds the shift
    ///
    /// # Panics
    ///
    /// Panics on a negative odometer or a negative total distance.
    pub fn build(self) -> Shift {
        let mut shift = Shift::open(self.user_id, self.odometer_start, self.started_at)
            .unwrap_or_else(|e| panic!("invalid shift fixture: {e}"));
        if let Some((total_km, trip_km)) = self.close {
            shift
                .close(self.odometer_start + total_km, trip_km, self.started_at + Duration::hours(8))
                .unwrap_or_else(|e| panic!("invalid shift fixture: {e}"));
        }
        shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_ledger::TransactionKind;

    #[test]
    fn test_transaction_defaults() {
        let tx = TransactionBuilder::income().build();
        assert_eq!(tx.user_id, IdFixtures::driver());
        assert_eq!(tx.amount, dec!(100));
        assert!(tx.is_completed());
    }

    #[test]
    fn test_builder_overrides() {
        let tx = TransactionBuilder::expense()
            .amount(dec!(12.5))
            .category("peaje")
            .status(TransactionStatus::Pending)
            .build();
        assert_eq!(tx.kind, TransactionKind::Expense);
        assert_eq!(tx.category, "peaje");
        assert!(!tx.is_completed());
    }

    #[test]
    fn test_closed_shift_distances() {
        let shift = ShiftBuilder::new().closed(dec!(60), dec!(42.5)).build();
        assert!(!shift.is_open());
        assert_eq!(shift.total_km, Some(dec!(60)));
        assert_eq!(shift.dead_km, Some(dec!(17.5)));
    }
}
