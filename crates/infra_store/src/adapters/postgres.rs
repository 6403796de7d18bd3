//! PostgreSQL Record Store Adapter
//!
//! Stores both collections in the `documents` table as JSONB bodies and
//! translates [`StoreQuery`] predicates into `body->>'field'` comparisons.
//!
//! Every query is issued with `LIMIT cap + 1` so the adapter can tell an
//! exactly-full batch from a truncated one. Rows come back in insertion
//! order; callers must not rely on it.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_store::{create_pool, DatabaseConfig, PostgresRecordStore, RecordStore};
//! use std::sync::Arc;
//!
//! let config = DatabaseConfig::new("postgres://localhost/driver_ledger");
//! let pool = create_pool(&config).await?;
//! let store = PostgresRecordStore::new(pool, config.fetch_cap);
//! store.ensure_schema().await?;
//! let store: Arc<dyn RecordStore> = Arc::new(store);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::document::Document;
use crate::error::DatabaseError;
use crate::query::{FieldValue, Predicate, StoreQuery};
use crate::schema::{CollectionName, DOCUMENTS_DDL};
use crate::store::{Batch, RecordStore};

/// PostgreSQL-backed implementation of [`RecordStore`]
#[derive(Debug, Clone)]
pub struct PostgresRecordStore {
    pool: PgPool,
    fetch_cap: usize,
}

impl PostgresRecordStore {
    pub fn new(pool: PgPool, fetch_cap: usize) -> Self {
        Self {
            pool,
            fetch_cap: fetch_cap.max(1),
        }
    }

    /// Creates the `documents` table and its indexes if missing
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), DatabaseError> {
        sqlx::raw_sql(DOCUMENTS_DDL)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        debug!("documents schema ready");
        Ok(())
    }
}

fn store_error(error: sqlx::Error) -> PortError {
    let error = PortError::from(DatabaseError::from(error));
    if error.is_transient() {
        warn!(error = %error, "record store unavailable");
    }
    error
}

/// Appends `collection = $1 AND <predicates>` to the builder
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, collection: CollectionName, query: &StoreQuery) {
    builder.push(" WHERE collection = ");
    builder.push_bind(collection.as_str());

    for predicate in query.predicates() {
        match predicate {
            Predicate::Eq { field, value } => {
                builder.push(" AND ");
                push_comparison(builder, field, "=", value);
            }
            Predicate::Range { field, lower, upper } => {
                if let Some(lower) = lower {
                    builder.push(" AND ");
                    push_comparison(builder, field, ">=", lower);
                }
                if let Some(upper) = upper {
                    builder.push(" AND ");
                    push_comparison(builder, field, "<=", upper);
                }
            }
        }
    }
}

fn push_comparison(builder: &mut QueryBuilder<'_, Postgres>, field: &str, op: &str, value: &FieldValue) {
    let cast = value.sql_cast();
    builder.push("(body->>");
    builder.push_bind(field.to_string());
    builder.push(format!(")::{cast} {op} "));
    builder.push_bind(value.as_text());
    builder.push(format!("::{cast}"));
}

fn document_from_row(row: &sqlx::postgres::PgRow) -> Result<Document, PortError> {
    let id: Uuid = row.try_get("id").map_err(store_error)?;
    let body: serde_json::Value = row.try_get("body").map_err(store_error)?;
    Document::new(id, body)
}

impl DomainPort for PostgresRecordStore {}

#[async_trait]
impl HealthCheckable for PostgresRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: "postgres-record-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: "postgres-record-store".to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    fn fetch_cap(&self) -> usize {
        self.fetch_cap
    }

    #[instrument(skip(self, query), fields(collection = %collection))]
    async fn query(&self, collection: CollectionName, query: &StoreQuery) -> Result<Batch, PortError> {
        query.validate()?;

        let mut builder = QueryBuilder::<Postgres>::new("SELECT id, body FROM documents");
        push_filters(&mut builder, collection, query);
        builder.push(" ORDER BY seq LIMIT ");
        builder.push_bind((self.fetch_cap + 1) as i64);

        let rows = builder.build().fetch_all(&self.pool).await.map_err(store_error)?;
        let documents = rows.iter().map(document_from_row).collect::<Result<Vec<_>, _>>()?;

        let batch = Batch::from_overfetch(documents, self.fetch_cap);
        if batch.truncated {
            debug!(cap = self.fetch_cap, "query hit fetch cap");
        }
        Ok(batch)
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn get(&self, collection: CollectionName, id: Uuid) -> Result<Option<Document>, PortError> {
        let row = sqlx::query("SELECT id, body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;
        row.as_ref().map(document_from_row).transpose()
    }

    #[instrument(skip(self, document), fields(collection = %collection, id = %document.id))]
    async fn insert(&self, collection: CollectionName, document: Document) -> Result<(), PortError> {
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(document.id)
            .bind(sqlx::types::Json(&document.body))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }

    /// Serialises conditional writes on the same guard with a transaction
    /// scoped advisory lock keyed by the guard's predicates
    #[instrument(skip(self, document, guard), fields(collection = %collection, id = %document.id))]
    async fn insert_if_absent(
        &self,
        collection: CollectionName,
        document: Document,
        guard: &StoreQuery,
    ) -> Result<bool, PortError> {
        guard.validate()?;
        let lock_key = serde_json::to_string(guard)
            .map(|g| format!("{collection}:{g}"))
            .map_err(|e| PortError::serialization(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(store_error)?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(lock_key.as_str())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        let mut existing_check = QueryBuilder::<Postgres>::new("SELECT 1 FROM documents");
        push_filters(&mut existing_check, collection, guard);
        existing_check.push(" LIMIT 1");
        let existing = existing_check.build().fetch_optional(&mut *tx).await.map_err(store_error)?;

        if existing.is_some() {
            tx.rollback().await.map_err(store_error)?;
            debug!("guard matched, insert skipped");
            return Ok(false);
        }

        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection.as_str())
            .bind(document.id)
            .bind(sqlx::types::Json(&document.body))
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)?;
        Ok(true)
    }

    #[instrument(skip(self, document), fields(collection = %collection, id = %document.id))]
    async fn replace(&self, collection: CollectionName, document: Document) -> Result<(), PortError> {
        let result = sqlx::query("UPDATE documents SET body = $3 WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(document.id)
            .bind(sqlx::types::Json(&document.body))
            .execute(&self.pool)
            .await
            .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(PortError::not_found(collection.entity(), document.id));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn delete(&self, collection: CollectionName, id: Uuid) -> Result<bool, PortError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }
}
