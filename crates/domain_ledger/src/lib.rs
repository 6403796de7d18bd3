//! Ledger Domain - Income and Expense Records
//!
//! This crate owns the driver's financial records: validation at the
//! boundary, derived per-record figures and the change feed consumed by the
//! realtime notifier.
//!
//! # Derived fields
//!
//! - **platform**: explicit value, else inferred from category/description
//!   (uber, didi, indrive), else private
//! - **tripMetrics**: earnings per km and per hour for income trips
//! - **profitabilityRatio**: amount / (toll + parking) when those are positive
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_ledger::{NewTransaction, TransactionLedger};
//!
//! let ledger = TransactionLedger::new(store);
//! let tx = ledger
//!     .create(user_id, NewTransaction::expense(dec!(50), now, "fuel"))
//!     .await?;
//! ```

pub mod transaction;
pub mod validation;
pub mod filter;
pub mod events;
pub mod ledger;
pub mod error;

pub use transaction::{
    NewTransaction, Platform, Transaction, TransactionKind, TransactionStatus, TransactionUpdate,
    TripExtras, TripMetrics,
};
pub use validation::{FieldError, TransactionValidator, ValidationErrors, MAX_AMOUNT, MAX_DISTANCE_KM};
pub use filter::TransactionFilter;
pub use events::LedgerEvent;
pub use ledger::TransactionLedger;
pub use error::LedgerError;
