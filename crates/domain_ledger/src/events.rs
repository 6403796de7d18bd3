//! Domain events emitted by the ledger
//!
//! Published after every successful write so a realtime notifier can push
//! the change to the owner's session. The ledger does not care whether
//! anyone is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{TransactionId, UserId};

use crate::transaction::Transaction;

/// A change to a user's ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A transaction has been recorded
    Created {
        transaction: Transaction,
        timestamp: DateTime<Utc>,
    },

    /// Editable fields of a transaction changed
    Updated {
        transaction: Transaction,
        timestamp: DateTime<Utc>,
    },

    /// A transaction has been removed
    Deleted {
        user_id: UserId,
        transaction_id: TransactionId,
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Owner of the affected record
    pub fn user_id(&self) -> UserId {
        match self {
            LedgerEvent::Created { transaction, .. } | LedgerEvent::Updated { transaction, .. } => {
                transaction.user_id
            }
            LedgerEvent::Deleted { user_id, .. } => *user_id,
        }
    }

    pub fn transaction_id(&self) -> TransactionId {
        match self {
            LedgerEvent::Created { transaction, .. } | LedgerEvent::Updated { transaction, .. } => {
                transaction.id
            }
            LedgerEvent::Deleted { transaction_id, .. } => *transaction_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LedgerEvent::Created { timestamp, .. }
            | LedgerEvent::Updated { timestamp, .. }
            | LedgerEvent::Deleted { timestamp, .. } => *timestamp,
        }
    }
}
