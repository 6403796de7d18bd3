//! Shift domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{ErrorCategory, PortError, ShiftId};

/// Errors that can occur in the shift domain
#[derive(Debug, Error)]
pub enum ShiftError {
    /// The user already has an open shift
    #[error("A shift is already open for this user")]
    AlreadyOpen,

    /// Closing requires an open shift
    #[error("No open shift")]
    NoOpenShift,

    /// The closing reading is below the opening reading
    #[error("Invalid odometer: end {end} is below start {start}")]
    InvalidOdometer {
        start: Decimal,
        end: Decimal,
    },

    /// The shift has already been closed
    #[error("Shift {0} is already closed")]
    AlreadyClosed(ShiftId),

    /// Unknown id, or a shift owned by someone else
    #[error("Shift not found: {0}")]
    NotFound(ShiftId),

    /// Validation error
    #[error("Validation error on {field}: {message}")]
    Validation {
        field: String,
        message: String,
    },

    /// Record store failure
    #[error(transparent)]
    Store(#[from] PortError),
}

impl ShiftError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ShiftError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ShiftError::AlreadyOpen | ShiftError::AlreadyClosed(_) => ErrorCategory::Conflict,
            ShiftError::NoOpenShift | ShiftError::NotFound(_) => ErrorCategory::NotFound,
            ShiftError::InvalidOdometer { .. } | ShiftError::Validation { .. } => {
                ErrorCategory::Validation
            }
            ShiftError::Store(e) => e.category(),
        }
    }
}
