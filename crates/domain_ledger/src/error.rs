//! Ledger domain errors

use thiserror::Error;

use core_kernel::{ErrorCategory, PortError, TransactionId};

use crate::validation::ValidationErrors;

/// Errors that can occur in the ledger domain
#[derive(Debug, Error)]
pub enum LedgerError {
    /// One or more fields failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Unknown id, or a record owned by someone else
    #[error("Transaction not found: {0}")]
    NotFound(TransactionId),

    /// Record store failure
    #[error(transparent)]
    Store(#[from] PortError),
}

impl LedgerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LedgerError::Validation(_) => ErrorCategory::Validation,
            LedgerError::NotFound(_) => ErrorCategory::NotFound,
            LedgerError::Store(e) => e.category(),
        }
    }

    /// Field-level detail for validation failures
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            LedgerError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
