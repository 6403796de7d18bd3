//! Persisted layout: collection names, field names and the SQL schema
//!
//! Both logical collections live in one `documents` table keyed by
//! `(collection, id)`. Document bodies use camelCase field names; the
//! constants below are the only place those names are spelled out.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two logical collections of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionName {
    Transactions,
    Shifts,
}

impl CollectionName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionName::Transactions => "transactions",
            CollectionName::Shifts => "shifts",
        }
    }

    /// Entity label used in NotFound errors
    pub fn entity(&self) -> &'static str {
        match self {
            CollectionName::Transactions => "Transaction",
            CollectionName::Shifts => "Shift",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document field names
pub mod fields {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "userId";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";

    // transactions
    pub const KIND: &str = "kind";
    pub const AMOUNT: &str = "amount";
    pub const DATE: &str = "date";
    pub const CATEGORY: &str = "category";
    pub const DESCRIPTION: &str = "description";
    pub const PLATFORM: &str = "platform";
    pub const STATUS: &str = "status";
    pub const DISTANCE_KM: &str = "distanceKm";

    // shifts
    pub const STATE: &str = "state";
    pub const STARTED_AT: &str = "startedAt";
    pub const ENDED_AT: &str = "endedAt";
}

/// Schema for the PostgreSQL adapter
///
/// The expression indexes mirror the composite indexes the adapter relies on:
/// `(userId, date)` and `(userId, kind, date)` for transactions,
/// `(userId, state)` for shifts.
pub const DOCUMENTS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id UUID NOT NULL,
    body JSONB NOT NULL,
    inserted_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    seq BIGSERIAL,
    PRIMARY KEY (collection, id)
);

CREATE INDEX IF NOT EXISTS documents_tx_user_date
    ON documents ((body->>'userId'), (body->>'date'))
    WHERE collection = 'transactions';

CREATE INDEX IF NOT EXISTS documents_tx_user_kind_date
    ON documents ((body->>'userId'), (body->>'kind'), (body->>'date'))
    WHERE collection = 'transactions';

CREATE INDEX IF NOT EXISTS documents_shift_user_state
    ON documents ((body->>'userId'), (body->>'state'))
    WHERE collection = 'shifts';
"#;
