//! Store helpers
//!
//! `seeded_store` writes entities straight into a [`MemoryRecordStore`],
//! bypassing service validation. [`FailingStore`] wraps one and reports
//! `PortError::Unavailable` for the collections it is told to fail.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
use domain_ledger::Transaction;
use domain_shift::Shift;
use infra_store::{Batch, CollectionName, Document, MemoryRecordStore, RecordStore, StoreQuery};

/// A memory store holding the given records
///
/// # Panics
///
/// Panics if a record cannot be written, e.g. on a duplicate id.
pub async fn seeded_store(transactions: &[Transaction], shifts: &[Shift]) -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::new());
    seed(&store, transactions, shifts).await;
    store
}

/// Writes records into an existing store
pub async fn seed(store: &MemoryRecordStore, transactions: &[Transaction], shifts: &[Shift]) {
    for tx in transactions {
        let doc = Document::from_entity(*tx.id.as_uuid(), tx)
            .unwrap_or_else(|e| panic!("unserializable transaction: {e}"));
        store
            .insert(CollectionName::Transactions, doc)
            .await
            .unwrap_or_else(|e| panic!("seeding transactions failed: {e}"));
    }
    for shift in shifts {
        let doc = Document::from_entity(*shift.id.as_uuid(), shift)
            .unwrap_or_else(|e| panic!("unserializable shift: {e}"));
        store
            .insert(CollectionName::Shifts, doc)
            .await
            .unwrap_or_else(|e| panic!("seeding shifts failed: {e}"));
    }
}

/// A record store whose chosen collections are offline
#[derive(Debug)]
pub struct FailingStore {
    inner: Arc<MemoryRecordStore>,
    failing: HashSet<CollectionName>,
}

impl FailingStore {
    /// Every call fails
    pub fn offline() -> Self {
        Self::failing(Arc::new(MemoryRecordStore::new()), &[CollectionName::Transactions, CollectionName::Shifts])
    }

    /// Calls on `collections` fail; everything else reaches `inner`
    pub fn failing(inner: Arc<MemoryRecordStore>, collections: &[CollectionName]) -> Self {
        Self {
            inner,
            failing: collections.iter().copied().collect(),
        }
    }

    fn check(&self, collection: CollectionName) -> Result<(), PortError> {
        if self.failing.contains(&collection) {
            Err(PortError::unavailable("failing", format!("{collection} is offline")))
        } else {
            Ok(())
        }
    }
}

impl DomainPort for FailingStore {}

#[async_trait]
impl HealthCheckable for FailingStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "failing-record-store".to_string(),
            status: if self.failing.is_empty() { AdapterHealth::Healthy } else { AdapterHealth::Degraded },
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    fn fetch_cap(&self) -> usize {
        self.inner.fetch_cap()
    }

    async fn query(&self, collection: CollectionName, query: &StoreQuery) -> Result<Batch, PortError> {
        self.check(collection)?;
        self.inner.query(collection, query).await
    }

    async fn get(&self, collection: CollectionName, id: Uuid) -> Result<Option<Document>, PortError> {
        self.check(collection)?;
        self.inner.get(collection, id).await
    }

    async fn insert(&self, collection: CollectionName, document: Document) -> Result<(), PortError> {
        self.check(collection)?;
        self.inner.insert(collection, document).await
    }

    async fn insert_if_absent(
        &self,
        collection: CollectionName,
        document: Document,
        guard: &StoreQuery,
    ) -> Result<bool, PortError> {
        self.check(collection)?;
        self.inner.insert_if_absent(collection, document, guard).await
    }

    async fn replace(&self, collection: CollectionName, document: Document) -> Result<(), PortError> {
        self.check(collection)?;
        self.inner.replace(collection, document).await
    }

    async fn delete(&self, collection: CollectionName, id: Uuid) -> Result<bool, PortError> {
        self.check(collection)?;
        self.inner.delete(collection, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{ShiftBuilder, TransactionBuilder};

    #[tokio::test]
    async fn test_seeded_store_holds_records() {
        let store = seeded_store(
            &[TransactionBuilder::income().build(), TransactionBuilder::expense().build()],
            &[ShiftBuilder::new().build()],
        )
        .await;
        assert_eq!(store.len(CollectionName::Transactions).await, 2);
        assert_eq!(store.len(CollectionName::Shifts).await, 1);
    }

    #[tokio::test]
    async fn test_failing_store_fails_only_chosen_collections() {
        let inner = seeded_store(&[TransactionBuilder::income().build()], &[]).await;
        let store = FailingStore::failing(inner, &[CollectionName::Shifts]);

        let shifts = store.query(CollectionName::Shifts, &StoreQuery::new()).await;
        assert!(shifts.unwrap_err().is_transient());

        let txs = store.query(CollectionName::Transactions, &StoreQuery::new()).await.unwrap();
        assert_eq!(txs.len(), 1);
    }
}
