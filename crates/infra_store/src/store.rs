//! The record store port

use async_trait::async_trait;
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckable, PortError};

use crate::document::Document;
use crate::query::StoreQuery;
use crate::schema::CollectionName;

/// Default maximum number of documents returned by a single query
pub const DEFAULT_FETCH_CAP: usize = 500;

/// The result of a capped query
///
/// `truncated` is true when more documents matched than the cap allowed; the
/// length of `documents` is then a floor, not the true match count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    pub documents: Vec<Document>,
    pub truncated: bool,
}

impl Batch {
    /// Trims an over-fetched result (`cap + 1` rows requested) to the cap
    pub fn from_overfetch(mut documents: Vec<Document>, cap: usize) -> Self {
        let truncated = documents.len() > cap;
        documents.truncate(cap);
        Self { documents, truncated }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Port for the flat document store
///
/// Implementations translate [`StoreQuery`] into their native query form.
/// They validate queries before any I/O, cap every result at
/// [`fetch_cap`](RecordStore::fetch_cap), never retry, and report transport
/// failures as [`PortError::Unavailable`].
#[async_trait]
pub trait RecordStore: DomainPort + HealthCheckable {
    /// Maximum number of documents a single query returns
    fn fetch_cap(&self) -> usize;

    /// Returns up to `fetch_cap` documents matching the query, in no
    /// guaranteed order
    async fn query(&self, collection: CollectionName, query: &StoreQuery) -> Result<Batch, PortError>;

    /// Fetches a document by id
    async fn get(&self, collection: CollectionName, id: Uuid) -> Result<Option<Document>, PortError>;

    /// Inserts a new document; an existing id is a conflict
    async fn insert(&self, collection: CollectionName, document: Document) -> Result<(), PortError>;

    /// Inserts the document only if no document matches `guard`
    ///
    /// The check and the write are atomic with respect to other conditional
    /// writes on the same guard. Returns false when the guard matched.
    async fn insert_if_absent(
        &self,
        collection: CollectionName,
        document: Document,
        guard: &StoreQuery,
    ) -> Result<bool, PortError>;

    /// Replaces an existing document; a missing id is NotFound
    async fn replace(&self, collection: CollectionName, document: Document) -> Result<(), PortError>;

    /// Removes a document, returning whether it existed
    async fn delete(&self, collection: CollectionName, id: Uuid) -> Result<bool, PortError>;
}
