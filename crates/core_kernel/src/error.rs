//! Error taxonomy shared across the system

use serde::{Deserialize, Serialize};

/// Coarse error taxonomy shared by every domain crate
///
/// The request layer maps these to its own responses without having to know
/// each crate's error variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed input; never retried
    Validation,
    /// Unknown id, or id/owner mismatch
    NotFound,
    /// The operation conflicts with current state (e.g. a shift already open)
    Conflict,
    /// Transient store failure; the caller owns the retry policy
    StoreUnavailable,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// Returns true if the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::StoreUnavailable)
    }
}
