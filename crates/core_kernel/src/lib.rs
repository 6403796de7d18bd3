//! Core Kernel - Foundational types shared by every driver-ledger crate
//!
//! This crate provides the building blocks used across the domain modules:
//! - Strongly-typed identifiers for users, transactions and shifts
//! - Calendar helpers: timezones and inclusive date windows
//! - The port error taxonomy shared by store adapters and services
//! - Decimal rounding helpers used by the derived metrics

pub mod identifiers;
pub mod temporal;
pub mod ports;
pub mod numeric;
pub mod error;

pub use identifiers::{UserId, TransactionId, ShiftId};
pub use temporal::{Timezone, DateWindow, TemporalError};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
};
pub use numeric::{round1, round2, ratio};
pub use error::ErrorCategory;
