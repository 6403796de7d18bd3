//! Ports and Adapters Infrastructure
//!
//! Foundational types for the hexagonal split between the domain services
//! (shift manager, ledger, metrics engine) and the record store adapters.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Services                           │
//! │      (ShiftManager, TransactionLedger, MetricsEngine)        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  RecordStore port                            │
//! │          (infra_store, depends only on core_kernel)          │
//! └─────────────────────────────────────────────────────────────┘
//!                    ▲                         ▲
//!                    │                         │
//!         ┌─────────┴─────────┐     ┌────────┴────────┐
//!         │  Memory Adapter   │     │ Postgres Adapter │
//!         │  (tests, demos)   │     │  (JSONB docs)    │
//!         └───────────────────┘     └──────────────────┘
//! ```
//!
//! Adapters never retry. A transport failure surfaces as
//! `PortError::Unavailable` and the retry policy belongs to the caller.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCategory;

/// Error type for port operations
///
/// Provides a unified error type that all store adapters must use,
/// ensuring consistent error handling across backends.
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// A validation error occurred, including queries the store cannot express
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// The backing store could not be reached or failed mid-request
    #[error("Store unavailable ({store}): {message}")]
    Unavailable {
        store: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored document could not be mapped to or from a domain type
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates an Unavailable error for the named store
    pub fn unavailable(store: impl Into<String>, message: impl Into<String>) -> Self {
        PortError::Unavailable {
            store: store.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        PortError::Serialization {
            message: message.into(),
        }
    }

    /// Returns true if this error indicates a transient failure that may succeed on retry
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Unavailable { .. })
    }

    /// Maps the error onto the shared taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            PortError::NotFound { .. } => ErrorCategory::NotFound,
            PortError::Validation { .. } => ErrorCategory::Validation,
            PortError::Conflict { .. } => ErrorCategory::Conflict,
            PortError::Unavailable { .. } => ErrorCategory::StoreUnavailable,
            PortError::Serialization { .. } | PortError::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
    /// Health status is unknown
    Unknown,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    ///
    /// # Returns
    ///
    /// A `HealthCheckResult` indicating the current health status
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Shift", "123");
        assert!(matches!(error, PortError::NotFound { .. }));
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Shift"));
        assert!(error.to_string().contains("123"));
        assert_eq!(error.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_port_error_transient() {
        let unavailable = PortError::unavailable("postgres", "connection refused");
        assert!(unavailable.is_transient());
        assert_eq!(unavailable.category(), ErrorCategory::StoreUnavailable);

        let validation = PortError::validation_field("range on two fields", "startedAt");
        assert!(!validation.is_transient());
        assert_eq!(validation.category(), ErrorCategory::Validation);
    }
}
