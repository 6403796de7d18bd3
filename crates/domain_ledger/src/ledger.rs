//! Transaction ledger service
//!
//! Validates and persists income/expense records and publishes a
//! [`LedgerEvent`] after every successful write.
//!
//! # Invariants
//!
//! - `amount >= 0` for every persisted record
//! - `kind` never changes after creation
//! - reads and writes are scoped to `(id, userId)`; a foreign id is NotFound

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use core_kernel::{DateWindow, TransactionId, UserId};
use infra_store::{
    Collection, CollectionName, Document, Page, PageRequest, RecordStore, SortSpec, Snapshot,
};

use crate::error::LedgerError;
use crate::events::LedgerEvent;
use crate::filter::TransactionFilter;
use crate::transaction::{NewTransaction, Transaction, TransactionUpdate};
use crate::validation::TransactionValidator;

/// Capacity of the event channel; slow subscribers miss older events
const EVENT_CAPACITY: usize = 256;

/// The transaction ledger
pub struct TransactionLedger {
    store: Arc<dyn RecordStore>,
    transactions: Collection<Transaction>,
    events: broadcast::Sender<LedgerEvent>,
    clock: fn() -> DateTime<Utc>,
}

impl std::fmt::Debug for TransactionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionLedger")
            .field("subscribers", &self.events.receiver_count())
            .finish()
    }
}

impl TransactionLedger {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            transactions: Collection::new(Arc::clone(&store), CollectionName::Transactions),
            store,
            events,
            clock: Utc::now,
        }
    }

    /// Replaces the wall clock used for timestamps and the future-date check
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Subscribes to ledger events
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn publish(&self, event: LedgerEvent) {
        if self.events.send(event).is_err() {
            debug!("no ledger subscribers");
        }
    }

    /// Records a new transaction
    #[instrument(skip(self, new), fields(user_id = %user_id, kind = new.kind.as_str()))]
    pub async fn create(&self, user_id: UserId, new: NewTransaction) -> Result<Transaction, LedgerError> {
        let now = (self.clock)();
        let transaction = Transaction::from_new(user_id, new, now);
        TransactionValidator::validate(&transaction, now)?;

        self.store
            .insert(
                CollectionName::Transactions,
                Document::from_entity(*transaction.id.as_uuid(), &transaction)?,
            )
            .await?;

        info!(transaction_id = %transaction.id, "transaction recorded");
        self.publish(LedgerEvent::Created {
            transaction: transaction.clone(),
            timestamp: now,
        });
        Ok(transaction)
    }

    /// Fetches a transaction owned by the user
    pub async fn get(&self, user_id: UserId, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions
            .get(*id.as_uuid())
            .await?
            .filter(|tx| tx.user_id == user_id)
            .ok_or(LedgerError::NotFound(id))
    }

    /// Updates the editable fields of a transaction
    #[instrument(skip(self, update), fields(user_id = %user_id, transaction_id = %id))]
    pub async fn update(
        &self,
        user_id: UserId,
        id: TransactionId,
        update: TransactionUpdate,
    ) -> Result<Transaction, LedgerError> {
        let mut transaction = self.get(user_id, id).await?;
        if update.is_empty() {
            return Ok(transaction);
        }

        let now = (self.clock)();
        transaction.apply(update, now);
        TransactionValidator::validate(&transaction, now)?;

        self.store
            .replace(
                CollectionName::Transactions,
                Document::from_entity(*transaction.id.as_uuid(), &transaction)?,
            )
            .await?;

        info!("transaction updated");
        self.publish(LedgerEvent::Updated {
            transaction: transaction.clone(),
            timestamp: now,
        });
        Ok(transaction)
    }

    /// Hard-deletes a transaction
    #[instrument(skip(self), fields(user_id = %user_id, transaction_id = %id))]
    pub async fn delete(&self, user_id: UserId, id: TransactionId) -> Result<(), LedgerError> {
        self.get(user_id, id).await?;

        if !self.store.delete(CollectionName::Transactions, *id.as_uuid()).await? {
            return Err(LedgerError::NotFound(id));
        }

        info!("transaction deleted");
        self.publish(LedgerEvent::Deleted {
            user_id,
            transaction_id: id,
            timestamp: (self.clock)(),
        });
        Ok(())
    }

    /// Lists the user's transactions, newest first
    #[instrument(skip(self, filter), fields(user_id = %user_id))]
    pub async fn list(
        &self,
        user_id: UserId,
        filter: &TransactionFilter,
        request: PageRequest,
    ) -> Result<Page<Transaction>, LedgerError> {
        Ok(self
            .transactions
            .list(&filter.to_query(user_id), &filter.refinements(), &SortSpec::default(), request)
            .await?)
    }

    /// Every transaction of the user dated inside the window, within one
    /// capped fetch
    pub async fn in_window(&self, user_id: UserId, window: &DateWindow) -> Result<Snapshot<Transaction>, LedgerError> {
        let query = TransactionFilter::new().window(*window).to_query(user_id);
        Ok(self
            .transactions
            .snapshot(&query, &[], &SortSpec::default())
            .await?)
    }
}
