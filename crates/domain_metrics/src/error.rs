//! Metrics domain errors

use thiserror::Error;

use core_kernel::{ErrorCategory, TemporalError};
use domain_ledger::LedgerError;
use domain_shift::ShiftError;

/// Errors that can occur while aggregating
///
/// A failure in either fetch aborts the whole aggregation; there are no
/// partial reports.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// The requested window is malformed (end before start)
    #[error("Invalid window: {0}")]
    InvalidWindow(#[from] TemporalError),

    /// The transaction fetch failed
    #[error("Transaction fetch failed: {0}")]
    Ledger(#[from] LedgerError),

    /// The shift fetch failed
    #[error("Shift fetch failed: {0}")]
    Shift(#[from] ShiftError),

    /// A sum or quotient left the decimal range
    #[error("Arithmetic overflow computing {0}")]
    Overflow(&'static str),
}

impl MetricsError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            MetricsError::InvalidWindow(_) => ErrorCategory::Validation,
            MetricsError::Ledger(e) => e.category(),
            MetricsError::Shift(e) => e.category(),
            MetricsError::Overflow(_) => ErrorCategory::Internal,
        }
    }
}
