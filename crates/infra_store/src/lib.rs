//! Infrastructure Record Store Layer
//!
//! This crate provides the persistence layer for the driver ledger. The backing
//! store is a flat document store: it can filter on field equality and on a
//! range over a single field, and nothing more. There is no server-side
//! grouping, no global ordering and every fetch is capped.
//!
//! # Layers
//!
//! - [`RecordStore`]: the adapter port. Typed predicates in, capped batches of
//!   raw documents out. Implemented by [`MemoryRecordStore`] and
//!   [`PostgresRecordStore`].
//! - [`Collection`]: the emulation layer built on top of the port. It sorts,
//!   counts and pages the fetched batch in memory.
//!
//! # Safety cap
//!
//! Every query returns at most `fetch_cap` documents (500 by default). When
//! the cap is hit the batch is flagged `truncated` and every count derived
//! from it is a floor, not the true total.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_store::{Collection, CollectionName, MemoryRecordStore, StoreQuery, SortSpec, PageRequest};
//!
//! let store = Arc::new(MemoryRecordStore::new());
//! let transactions = Collection::<Transaction>::new(store, CollectionName::Transactions);
//! let page = transactions
//!     .list(&StoreQuery::new().eq("userId", user_id), &[], &SortSpec::default(), PageRequest::new(1, 20))
//!     .await?;
//! ```

pub mod pool;
pub mod error;
pub mod schema;
pub mod document;
pub mod query;
pub mod store;
pub mod memory;
pub mod collection;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, DatabaseConfig};
pub use error::DatabaseError;
pub use schema::{CollectionName, fields};
pub use document::Document;
pub use query::{FieldValue, Predicate, StoreQuery};
pub use store::{RecordStore, Batch, DEFAULT_FETCH_CAP};
pub use memory::MemoryRecordStore;
pub use collection::{
    Collection, Counted, Page, PageRequest, Refinement, Snapshot, SortDirection, SortSpec,
};
pub use adapters::PostgresRecordStore;
