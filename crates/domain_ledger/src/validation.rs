//! Transaction validation rules
//!
//! Every failing field is reported, not just the first one.
//!
//! # Rules
//!
//! - `amount` must lie in `0..=MAX_AMOUNT`
//! - `date` must not be in the future
//! - `category` must be non-empty after trimming and at most 64 characters
//! - `distanceKm` must lie in `0..=MAX_DISTANCE_KM`
//! - trip extras must lie in `0..=MAX_AMOUNT`
//! - `durationMinutes` must not be negative
//!
//! The upper bounds keep window sums far inside the decimal range.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::transaction::Transaction;

/// Maximum category length in characters
pub const MAX_CATEGORY_LEN: usize = 64;

/// Largest accepted amount or trip extra
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Largest accepted trip distance
pub const MAX_DISTANCE_KM: Decimal = Decimal::from_parts(100_000, 0, 0, false, 0);

/// A single failing field, named as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// All validation failures of one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns true if the named field failed
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", fields.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Validator for transaction records
pub struct TransactionValidator;

impl TransactionValidator {
    /// Validates a transaction as it is about to be persisted
    pub fn validate(transaction: &Transaction, now: DateTime<Utc>) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        Self::bounded(&mut errors, "amount", Some(transaction.amount), MAX_AMOUNT);
        if transaction.date > now {
            errors.add("date", "must not be in the future");
        }

        let category = transaction.category.trim();
        if category.is_empty() {
            errors.add("category", "is required");
        } else if category.chars().count() > MAX_CATEGORY_LEN {
            errors.add("category", format!("must be at most {} characters", MAX_CATEGORY_LEN));
        }

        Self::bounded(&mut errors, "distanceKm", transaction.distance_km, MAX_DISTANCE_KM);
        if transaction.duration_minutes.is_some_and(|v| v < Decimal::ZERO) {
            errors.add("durationMinutes", "must not be negative");
        }
        if let Some(extras) = transaction.extras {
            Self::bounded(&mut errors, "extras.toll", extras.toll, MAX_AMOUNT);
            Self::bounded(&mut errors, "extras.parking", extras.parking, MAX_AMOUNT);
        }

        errors.into_result()
    }

    fn bounded(errors: &mut ValidationErrors, field: &str, value: Option<Decimal>, max: Decimal) {
        match value {
            Some(v) if v < Decimal::ZERO => errors.add(field, "must not be negative"),
            Some(v) if v > max => errors.add(field, format!("must be at most {}", max)),
            _ => {}
        }
    }
}
