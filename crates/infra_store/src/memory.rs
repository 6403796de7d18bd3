//! In-memory record store
//!
//! Keeps documents per collection in insertion order behind a tokio
//! `RwLock`. It applies the same query validation and fetch cap as the
//! PostgreSQL adapter, so it is a faithful stand-in for tests and for the
//! `memory` backend of the diagnostic binary.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::document::Document;
use crate::query::StoreQuery;
use crate::schema::CollectionName;
use crate::store::{Batch, RecordStore, DEFAULT_FETCH_CAP};

const STORE_NAME: &str = "memory";

/// In-memory implementation of [`RecordStore`]
#[derive(Debug)]
pub struct MemoryRecordStore {
    collections: Arc<RwLock<HashMap<CollectionName, Vec<Document>>>>,
    fetch_cap: usize,
    available: AtomicBool,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    /// Creates an empty store with the default fetch cap
    pub fn new() -> Self {
        Self::with_fetch_cap(DEFAULT_FETCH_CAP)
    }

    /// Creates an empty store with a custom fetch cap (minimum 1)
    pub fn with_fetch_cap(fetch_cap: usize) -> Self {
        Self {
            collections: Arc::new(RwLock::new(HashMap::new())),
            fetch_cap: fetch_cap.max(1),
            available: AtomicBool::new(true),
        }
    }

    /// Simulates a transport outage: while unavailable every call fails
    /// with `PortError::Unavailable`
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of documents held in a collection
    pub async fn len(&self, collection: CollectionName) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }

    fn ensure_available(&self) -> Result<(), PortError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            warn!(store = STORE_NAME, "record store unavailable");
            Err(PortError::unavailable(STORE_NAME, "store is offline"))
        }
    }
}

impl DomainPort for MemoryRecordStore {}

#[async_trait]
impl HealthCheckable for MemoryRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        let available = self.available.load(Ordering::SeqCst);
        HealthCheckResult {
            adapter_id: "memory-record-store".to_string(),
            status: if available { AdapterHealth::Healthy } else { AdapterHealth::Unhealthy },
            latency_ms: 0,
            message: (!available).then(|| "store is offline".to_string()),
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn fetch_cap(&self) -> usize {
        self.fetch_cap
    }

    async fn query(&self, collection: CollectionName, query: &StoreQuery) -> Result<Batch, PortError> {
        query.validate()?;
        self.ensure_available()?;

        let collections = self.collections.read().await;
        let matched: Vec<Document> = collections
            .get(&collection)
            .into_iter()
            .flatten()
            .filter(|doc| query.matches(&doc.body))
            .take(self.fetch_cap + 1)
            .cloned()
            .collect();

        let batch = Batch::from_overfetch(matched, self.fetch_cap);
        if batch.truncated {
            debug!(%collection, cap = self.fetch_cap, "query hit fetch cap");
        }
        Ok(batch)
    }

    async fn get(&self, collection: CollectionName, id: Uuid) -> Result<Option<Document>, PortError> {
        self.ensure_available()?;
        Ok(self
            .collections
            .read()
            .await
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    async fn insert(&self, collection: CollectionName, document: Document) -> Result<(), PortError> {
        self.ensure_available()?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| d.id == document.id) {
            return Err(PortError::conflict(format!(
                "{} {} already exists",
                collection.entity(),
                document.id
            )));
        }
        docs.push(document);
        Ok(())
    }

    async fn insert_if_absent(
        &self,
        collection: CollectionName,
        document: Document,
        guard: &StoreQuery,
    ) -> Result<bool, PortError> {
        guard.validate()?;
        self.ensure_available()?;
        // check and write under one write lock
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| guard.matches(&d.body)) {
            return Ok(false);
        }
        if docs.iter().any(|d| d.id == document.id) {
            return Err(PortError::conflict(format!(
                "{} {} already exists",
                collection.entity(),
                document.id
            )));
        }
        docs.push(document);
        Ok(true)
    }

    async fn replace(&self, collection: CollectionName, document: Document) -> Result<(), PortError> {
        self.ensure_available()?;
        let mut collections = self.collections.write().await;
        let slot = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == document.id))
            .ok_or_else(|| PortError::not_found(collection.entity(), document.id))?;
        *slot = document;
        Ok(())
    }

    async fn delete(&self, collection: CollectionName, id: Uuid) -> Result<bool, PortError> {
        self.ensure_available()?;
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(user: &str, state: &str) -> Document {
        Document::new(Uuid::new_v4(), json!({"userId": user, "state": state})).unwrap()
    }

    #[tokio::test]
    async fn test_query_filters_by_collection_and_predicate() {
        let store = MemoryRecordStore::new();
        store.insert(CollectionName::Shifts, doc("u1", "open")).await.unwrap();
        store.insert(CollectionName::Shifts, doc("u1", "closed")).await.unwrap();
        store.insert(CollectionName::Transactions, doc("u1", "open")).await.unwrap();

        let query = StoreQuery::new().eq("userId", "u1").eq("state", "open");
        let batch = store.query(CollectionName::Shifts, &query).await.unwrap();

        assert_eq!(batch.len(), 1);
        assert!(!batch.truncated);
    }

    #[tokio::test]
    async fn test_query_is_capped() {
        let store = MemoryRecordStore::with_fetch_cap(3);
        for _ in 0..5 {
            store.insert(CollectionName::Shifts, doc("u1", "closed")).await.unwrap();
        }

        let batch = store.query(CollectionName::Shifts, &StoreQuery::new()).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.truncated);
    }

    #[tokio::test]
    async fn test_insert_if_absent_respects_guard() {
        let store = MemoryRecordStore::new();
        let guard = StoreQuery::new().eq("userId", "u1").eq("state", "open");

        assert!(store.insert_if_absent(CollectionName::Shifts, doc("u1", "open"), &guard).await.unwrap());
        assert!(!store.insert_if_absent(CollectionName::Shifts, doc("u1", "open"), &guard).await.unwrap());
        assert_eq!(store.len(CollectionName::Shifts).await, 1);
    }

    #[tokio::test]
    async fn test_replace_missing_is_not_found() {
        let store = MemoryRecordStore::new();
        let err = store.replace(CollectionName::Shifts, doc("u1", "open")).await.unwrap_err();
        assert!(matches!(err, PortError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryRecordStore::new();
        let d = doc("u1", "open");
        let id = d.id;
        store.insert(CollectionName::Shifts, d).await.unwrap();

        assert!(store.delete(CollectionName::Shifts, id).await.unwrap());
        assert!(!store.delete(CollectionName::Shifts, id).await.unwrap());
    }

    #[tokio::test]
    async fn test_offline_store_reports_unavailable() {
        let store = MemoryRecordStore::new();
        store.set_available(false);

        let err = store.query(CollectionName::Shifts, &StoreQuery::new()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(store.health_check().await.status, AdapterHealth::Unhealthy);
    }

    #[tokio::test]
    async fn test_unsupported_query_fails_before_io() {
        let store = MemoryRecordStore::new();
        store.set_available(false);
        let query = StoreQuery::new().gte("date", Utc::now()).gte("startedAt", Utc::now());

        let err = store.query(CollectionName::Shifts, &query).await.unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
    }
}
