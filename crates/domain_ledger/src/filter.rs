//! Listing filters
//!
//! Kind, platform and status are pushed down as equality predicates and the
//! date window as the single range predicate. Category and free-text search
//! cannot be expressed by the store and become in-memory refinements.

use serde::{Deserialize, Serialize};

use core_kernel::{DateWindow, UserId};
use infra_store::{fields, Refinement, StoreQuery};

use crate::transaction::{Platform, TransactionKind, TransactionStatus};

/// Criteria for listing a user's transactions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub platform: Option<Platform>,
    pub status: Option<TransactionStatus>,
    pub window: Option<DateWindow>,
    /// Case-insensitive category match
    pub category: Option<String>,
    /// Substring searched in description and category
    pub search: Option<String>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn window(mut self, window: DateWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// The store-side part of the filter, always scoped to the owner
    pub fn to_query(&self, user_id: UserId) -> StoreQuery {
        let mut query = StoreQuery::new().eq(fields::USER_ID, user_id);
        if let Some(kind) = self.kind {
            query = query.eq(fields::KIND, kind.as_str());
        }
        if let Some(platform) = self.platform {
            query = query.eq(fields::PLATFORM, platform.as_str());
        }
        if let Some(status) = self.status {
            query = query.eq(fields::STATUS, status.as_str());
        }
        if let Some(window) = self.window {
            query = query.between(fields::DATE, window.start, window.end);
        }
        query
    }

    /// The in-memory part of the filter
    pub fn refinements(&self) -> Vec<Refinement> {
        let mut refinements = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            refinements.push(Refinement::equals_ignore_case(fields::CATEGORY, category));
        }
        if let Some(term) = self.search.as_deref().filter(|t| !t.trim().is_empty()) {
            refinements.push(Refinement::search(term, &[fields::DESCRIPTION, fields::CATEGORY]));
        }
        refinements
    }
}
