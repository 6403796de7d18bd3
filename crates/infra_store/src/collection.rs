//! Collection emulation layer
//!
//! The store returns unordered, capped batches and cannot count. This module
//! rebuilds list/count/page semantics in memory on top of one fetch:
//!
//! 1. fetch up to the cap through [`RecordStore::query`]
//! 2. apply in-memory [`Refinement`]s (text search, case-folded equality)
//! 3. stable-sort the whole batch by the requested field
//! 4. slice `[(page - 1) * page_size, page * page_size)`
//!
//! `total` is the number of documents that survived step 2, so once the cap
//! is hit it undercounts the real number of matches. Pages beyond the cap are
//! unreachable through this interface; [`Page::truncated`] tells callers
//! when that is the case.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument};

use core_kernel::PortError;

use crate::document::Document;
use crate::query::{decimal_of, timestamp_of, StoreQuery};
use crate::schema::{fields, CollectionName};
use crate::store::RecordStore;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// Field ordering applied to the fetched batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }

    /// Compares two document bodies; documents missing the field sort last
    /// in either direction
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match (a.get(&self.field), b.get(&self.field)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                match self.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            }
        }
    }
}

impl Default for SortSpec {
    /// Most recent first
    fn default() -> Self {
        Self::desc(fields::DATE)
    }
}

/// Sort key of one stored value
///
/// Each value is classified on its own, so mixed fields still sort totally:
/// first by class in declaration order, then within the class.
#[derive(Debug, PartialEq, PartialOrd)]
enum SortKey<'a> {
    Null,
    Bool(bool),
    Decimal(Decimal),
    Float(TotalF64),
    Timestamp(DateTime<Utc>),
    Text(&'a str),
    Composite(String),
}

/// `f64` ordered by `total_cmp`
#[derive(Debug)]
struct TotalF64(f64);

impl PartialEq for TotalF64 {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl PartialOrd for TotalF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.0.total_cmp(&other.0))
    }
}

impl<'a> SortKey<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::Null => SortKey::Null,
            Value::Bool(b) => SortKey::Bool(*b),
            Value::Number(n) => match decimal_of(value) {
                Some(d) => SortKey::Decimal(d),
                None => SortKey::Float(TotalF64(n.as_f64().unwrap_or(f64::NAN))),
            },
            Value::String(s) => {
                if let Some(d) = decimal_of(value) {
                    SortKey::Decimal(d)
                } else if let Some(t) = timestamp_of(value) {
                    SortKey::Timestamp(t)
                } else {
                    SortKey::Text(s)
                }
            }
            Value::Array(_) | Value::Object(_) => SortKey::Composite(value.to_string()),
        }
    }
}

fn compare_values(x: &Value, y: &Value) -> Ordering {
    SortKey::of(x)
        .partial_cmp(&SortKey::of(y))
        .unwrap_or(Ordering::Equal)
}

/// Filters the store cannot express, applied after the fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Refinement {
    /// Case-insensitive substring match on any of the fields
    Search { term: String, fields: Vec<String> },
    /// Case-insensitive equality on a string field
    EqualsIgnoreCase { field: String, value: String },
}

impl Refinement {
    pub fn search(term: impl Into<String>, fields: &[&str]) -> Self {
        Refinement::Search {
            term: term.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn equals_ignore_case(field: impl Into<String>, value: impl Into<String>) -> Self {
        Refinement::EqualsIgnoreCase { field: field.into(), value: value.into() }
    }

    pub fn matches(&self, body: &Value) -> bool {
        match self {
            Refinement::Search { term, fields } => {
                let needle = term.trim().to_lowercase();
                if needle.is_empty() {
                    return true;
                }
                fields.iter().any(|f| {
                    body.get(f)
                        .and_then(Value::as_str)
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
            Refinement::EqualsIgnoreCase { field, value } => body
                .get(field)
                .and_then(Value::as_str)
                .is_some_and(|s| s.trim().to_lowercase() == value.trim().to_lowercase()),
        }
    }
}

/// A 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    fn normalized(self, cap: usize) -> (usize, usize) {
        let page = self.page.max(1) as usize;
        let page_size = (self.page_size as usize).clamp(1, cap.max(1));
        (page, page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Matches within the fetched batch; a floor when `truncated`
    pub total: usize,
    pub page: u32,
    pub page_count: u32,
    pub page_size: u32,
    /// The fetch hit the safety cap
    pub truncated: bool,
}

/// Every entity of one capped fetch, sorted
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub items: Vec<T>,
    pub truncated: bool,
}

/// A count over one capped fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counted {
    pub count: usize,
    pub truncated: bool,
}

/// Typed view over one collection of the store
pub struct Collection<T> {
    store: Arc<dyn RecordStore>,
    name: CollectionName,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            name: self.name,
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}

impl<T: DeserializeOwned> Collection<T> {
    pub fn new(store: Arc<dyn RecordStore>, name: CollectionName) -> Self {
        Self { store, name, _entity: PhantomData }
    }

    pub fn name(&self) -> CollectionName {
        self.name
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Fetches, refines and sorts one batch of raw documents
    async fn fetch_sorted(
        &self,
        query: &StoreQuery,
        refinements: &[Refinement],
        sort: &SortSpec,
    ) -> Result<(Vec<Document>, bool), PortError> {
        let batch = self.store.query(self.name, query).await?;
        let truncated = batch.truncated;
        if truncated {
            debug!(collection = %self.name, cap = self.store.fetch_cap(), "listing from a capped batch");
        }

        let mut documents: Vec<Document> = batch
            .documents
            .into_iter()
            .filter(|doc| refinements.iter().all(|r| r.matches(&doc.body)))
            .collect();
        // stable: equal keys keep fetch order
        documents.sort_by(|a, b| sort.compare(&a.body, &b.body));
        Ok((documents, truncated))
    }

    /// Lists one page of the sorted, refined batch
    #[instrument(skip(self, query, refinements), fields(collection = %self.name))]
    pub async fn list(
        &self,
        query: &StoreQuery,
        refinements: &[Refinement],
        sort: &SortSpec,
        request: PageRequest,
    ) -> Result<Page<T>, PortError> {
        let (documents, truncated) = self.fetch_sorted(query, refinements, sort).await?;
        let (page, page_size) = request.normalized(self.store.fetch_cap());

        let total = documents.len();
        let page_count = total.div_ceil(page_size).max(1);
        let items = documents
            .iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .map(Document::to_entity)
            .collect::<Result<Vec<T>, _>>()?;

        Ok(Page {
            items,
            total,
            page: page as u32,
            page_count: page_count as u32,
            page_size: page_size as u32,
            truncated,
        })
    }

    /// Returns every entity of one capped fetch, sorted
    pub async fn snapshot(
        &self,
        query: &StoreQuery,
        refinements: &[Refinement],
        sort: &SortSpec,
    ) -> Result<Snapshot<T>, PortError> {
        let (documents, truncated) = self.fetch_sorted(query, refinements, sort).await?;
        let items = documents
            .iter()
            .map(Document::to_entity)
            .collect::<Result<Vec<T>, _>>()?;
        Ok(Snapshot { items, truncated })
    }

    /// Counts matches within one capped fetch
    pub async fn count(&self, query: &StoreQuery, refinements: &[Refinement]) -> Result<Counted, PortError> {
        let batch = self.store.query(self.name, query).await?;
        let count = batch
            .documents
            .iter()
            .filter(|doc| refinements.iter().all(|r| r.matches(&doc.body)))
            .count();
        Ok(Counted { count, truncated: batch.truncated })
    }

    /// Returns the first match in fetch order
    pub async fn find_one(&self, query: &StoreQuery) -> Result<Option<T>, PortError> {
        let batch = self.store.query(self.name, query).await?;
        batch.documents.first().map(Document::to_entity).transpose()
    }

    /// Fetches one entity by id
    pub async fn get(&self, id: uuid::Uuid) -> Result<Option<T>, PortError> {
        self.store
            .get(self.name, id)
            .await?
            .as_ref()
            .map(Document::to_entity)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_sort_is_date_descending() {
        let sort = SortSpec::default();
        let older = json!({"date": "2024-01-01T00:00:00Z"});
        let newer = json!({"date": "2024-01-02T00:00:00Z"});
        assert_eq!(sort.compare(&newer, &older), Ordering::Less);
    }

    #[test]
    fn test_missing_sort_key_goes_last_both_ways() {
        let with = json!({"date": "2024-01-01T00:00:00Z"});
        let without = json!({});
        assert_eq!(SortSpec::desc("date").compare(&without, &with), Ordering::Greater);
        assert_eq!(SortSpec::asc("date").compare(&without, &with), Ordering::Greater);
    }

    #[test]
    fn test_decimal_strings_sort_numerically() {
        let sort = SortSpec::asc("amount");
        assert_eq!(sort.compare(&json!({"amount": "50"}), &json!({"amount": "300.00"})), Ordering::Less);
    }

    #[test]
    fn test_mixed_types_sort_by_class() {
        let values = [
            json!("viaje"),
            json!("2024-01-01T00:00:00Z"),
            json!(12),
            json!({"nested": true}),
            json!("3.5"),
            json!(null),
            json!(false),
            json!([1]),
            json!(1e300),
        ];
        let mut sorted = values.to_vec();
        sorted.sort_by(compare_values);

        assert_eq!(
            sorted,
            vec![
                json!(null),
                json!(false),
                json!("3.5"),
                json!(12),
                json!(1e300),
                json!("2024-01-01T00:00:00Z"),
                json!("viaje"),
                json!([1]),
                json!({"nested": true}),
            ]
        );
    }

    #[test]
    fn test_comparator_is_consistent_on_mixed_values() {
        let values = [json!("abc"), json!("10"), json!(2), json!(true), json!(null), json!("2024-01-01T00:00:00Z")];
        for a in &values {
            assert_eq!(compare_values(a, a), Ordering::Equal);
            for b in &values {
                assert_eq!(compare_values(a, b), compare_values(b, a).reverse());
                for c in &values {
                    if compare_values(a, b) == Ordering::Less && compare_values(b, c) == Ordering::Less {
                        assert_eq!(compare_values(a, c), Ordering::Less);
                    }
                }
            }
        }
    }

    #[test]
    fn test_search_is_case_insensitive_over_fields() {
        let refinement = Refinement::search("GAS", &["description", "category"]);
        assert!(refinement.matches(&json!({"description": "Gasolina premium"})));
        assert!(refinement.matches(&json!({"category": "gas"})));
        assert!(!refinement.matches(&json!({"description": "tolls"})));
    }

    #[test]
    fn test_empty_search_matches_everything() {
        assert!(Refinement::search("  ", &["description"]).matches(&json!({})));
    }

    #[test]
    fn test_page_request_normalisation() {
        assert_eq!(PageRequest::new(0, 0).normalized(500), (1, 1));
        assert_eq!(PageRequest::new(3, 10_000).normalized(500), (3, 500));
    }
}
