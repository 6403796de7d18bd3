//! Process wiring for the driver ledger
//!
//! This crate turns an [`AppConfig`] into running components:
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter` and a pretty or
//!   JSON fmt layer on stderr
//! - **Store**: the memory backend (optionally seeded from a JSON file) or
//!   the PostgreSQL backend with its schema ensured
//! - **Engine**: a [`MetricsEngine`] over that store
//!
//! The `cpk-diagnose` binary is a thin clap front end over these helpers.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_cli::{build_engine, config::AppConfig, init_tracing};
//!
//! let config = AppConfig::from_env()?;
//! init_tracing(&config);
//! let engine = build_engine(&config).await?;
//! ```

pub mod config;
pub mod error;

use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_ledger::Transaction;
use domain_metrics::MetricsEngine;
use domain_shift::Shift;
use infra_store::{
    create_pool, CollectionName, Document, MemoryRecordStore, PostgresRecordStore, RecordStore,
};

use crate::config::{AppConfig, LogFormat, StoreBackend};
use crate::error::CliError;

/// Initializes the tracing subscriber
///
/// `RUST_LOG` wins over the configured level. Does nothing if a subscriber
/// is already installed.
pub fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.log_format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Records loaded into the memory backend
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub shifts: Vec<Shift>,
}

impl SeedData {
    /// Parses a seed document
    pub fn from_json(json: &str) -> Result<Self, CliError> {
        serde_json::from_str(json).map_err(|e| CliError::Seed(e.to_string()))
    }

    /// Writes every record into the store
    pub async fn load_into(&self, store: &dyn RecordStore) -> Result<(), CliError> {
        let seed_error = |e: core_kernel::PortError| CliError::Seed(e.to_string());

        for tx in &self.transactions {
            let doc = Document::from_entity(*tx.id.as_uuid(), tx).map_err(seed_error)?;
            store.insert(CollectionName::Transactions, doc).await.map_err(seed_error)?;
        }
        for shift in &self.shifts {
            let doc = Document::from_entity(*shift.id.as_uuid(), shift).map_err(seed_error)?;
            store.insert(CollectionName::Shifts, doc).await.map_err(seed_error)?;
        }
        Ok(())
    }
}

async fn read_seed(path: &Path) -> Result<SeedData, CliError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::Seed(format!("{}: {e}", path.display())))?;
    SeedData::from_json(&json)
}

/// Builds the configured record store
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>, CliError> {
    match config.store_backend {
        StoreBackend::Memory => {
            let store = MemoryRecordStore::with_fetch_cap(config.fetch_cap);
            if let Some(path) = &config.seed_file {
                let seed = read_seed(path).await?;
                seed.load_into(&store).await?;
                info!(
                    path = %path.display(),
                    transactions = seed.transactions.len(),
                    shifts = seed.shifts.len(),
                    "memory store seeded"
                );
            }
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database_config()).await?;
            let store = PostgresRecordStore::new(pool, config.fetch_cap);
            store.ensure_schema().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Builds a metrics engine over the configured store
pub async fn build_engine(config: &AppConfig) -> Result<MetricsEngine, CliError> {
    let store = build_store(config).await?;
    Ok(MetricsEngine::from_store(store, config.engine_config()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::{ShiftBuilder, TransactionBuilder};

    #[test]
    fn test_seed_accepts_partial_documents() {
        let seed = SeedData::from_json(r#"{"shifts": []}"#).unwrap();
        assert!(seed.transactions.is_empty());
        assert!(SeedData::from_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_seed_round_trips_through_memory_store() {
        let seed = SeedData {
            transactions: vec![TransactionBuilder::income().build()],
            shifts: vec![ShiftBuilder::new().build()],
        };
        let store = MemoryRecordStore::new();
        seed.load_into(&store).await.unwrap();

        assert_eq!(store.len(CollectionName::Transactions).await, 1);
        assert_eq!(store.len(CollectionName::Shifts).await, 1);
    }

    #[tokio::test]
    async fn test_missing_seed_file_is_reported() {
        let config = AppConfig {
            seed_file: Some("/nonexistent/seed.json".into()),
            ..AppConfig::default()
        };
        let err = build_store(&config).await.err().unwrap();
        assert!(matches!(err, CliError::Seed(_)));
    }

    #[tokio::test]
    async fn test_memory_backend_without_seed_is_empty() {
        let store = build_store(&AppConfig::default()).await.unwrap();
        assert_eq!(store.fetch_cap(), 500);
    }
}
