//! Property-Based Test Generators
//!
//! Proptest strategies for records confined to the reference month
//! (January 2024), so every generated set falls inside
//! `TemporalFixtures::january()`.

use chrono::{DateTime, Duration, Utc};
use core_kernel::UserId;
use domain_ledger::{Transaction, TransactionStatus};
use domain_shift::Shift;
use proptest::prelude::*;
use rust_decimal::Decimal;

use crate::builders::{ShiftBuilder, TransactionBuilder};
use crate::fixtures::{IdFixtures, TemporalFixtures};

/// Non-negative amounts with two decimals, up to 10,000.00
pub fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Distances with one decimal, up to 1,000.0 km
pub fn km_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000i64).prop_map(|tenths| Decimal::new(tenths, 1))
}

/// Any instant in January 2024, minute resolution
pub fn january_instant_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..31 * 24 * 60).prop_map(|minutes| TemporalFixtures::at(2024, 1, 1, 0) + Duration::minutes(minutes))
}

pub fn category_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("fuel"),
        Just("Fuel"),
        Just("peaje"),
        Just("lavado"),
        Just("viaje"),
        Just("propina"),
    ]
}

pub fn status_strategy() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        6 => Just(TransactionStatus::Completed),
        1 => Just(TransactionStatus::Pending),
        1 => Just(TransactionStatus::Cancelled),
    ]
}

/// A transaction of the reference driver in January 2024
pub fn transaction_strategy() -> impl Strategy<Value = Transaction> {
    (
        any::<bool>(),
        amount_strategy(),
        january_instant_strategy(),
        category_strategy(),
        status_strategy(),
    )
        .prop_map(|(income, amount, date, category, status)| {
            let builder = if income { TransactionBuilder::income() } else { TransactionBuilder::expense() };
            builder
                .for_user(IdFixtures::driver())
                .amount(amount)
                .on(date)
                .category(category)
                .status(status)
                .build()
        })
}

/// A closed shift of the reference driver started in January 2024
pub fn closed_shift_strategy() -> impl Strategy<Value = Shift> {
    (january_instant_strategy(), km_strategy(), km_strategy())
        .prop_map(|(started_at, total_km, trip_km)| {
            ShiftBuilder::new()
                .for_user(IdFixtures::driver())
                .started_at(started_at)
                .closed(total_km, trip_km)
                .build()
        })
}

/// Up to `max` transactions
pub fn transactions_strategy(max: usize) -> impl Strategy<Value = Vec<Transaction>> {
    prop::collection::vec(transaction_strategy(), 0..=max)
}

/// Up to `max` closed shifts
pub fn shifts_strategy(max: usize) -> impl Strategy<Value = Vec<Shift>> {
    prop::collection::vec(closed_shift_strategy(), 0..=max)
}

/// A random user, for isolation properties
pub fn user_strategy() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
}
