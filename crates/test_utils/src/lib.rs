//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! driver ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed dates and ids for predictable tests
//! - `builders`: Builder patterns for transactions and shifts
//! - `stores`: Seeded in-memory stores and a store that fails on demand
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod stores;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use stores::*;
pub use generators::*;
