//! Record store adapters backed by external systems
//!
//! The in-memory adapter lives in [`crate::memory`]; this module holds the
//! adapters that talk to a real database.

pub mod postgres;

pub use postgres::PostgresRecordStore;
