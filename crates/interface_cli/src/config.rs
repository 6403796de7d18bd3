//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use core_kernel::Timezone;
use domain_metrics::EngineConfig;
use infra_store::{DatabaseConfig, DEFAULT_FETCH_CAP};

/// Which record store backs the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Application configuration, read from `CPK_*` environment variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    /// PostgreSQL connection string, used by the postgres backend
    pub database_url: String,
    pub max_connections: u32,
    /// Safety cap on documents per query
    pub fetch_cap: usize,
    /// JSON file of `{transactions, shifts}` loaded into the memory backend
    pub seed_file: Option<PathBuf>,
    pub default_window_days: u32,
    pub history_limit: usize,
    /// Calendar basis for request dates
    pub timezone: Timezone,
    /// Calendar basis for history bucket keys
    pub bucket_timezone: Timezone,
    /// Expense category reported as fuel
    pub fuel_label: String,
    /// Ignore pending and cancelled transactions
    pub completed_only: bool,
    /// Filter used when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            store_backend: StoreBackend::Memory,
            database_url: "postgres://localhost/cpk".to_string(),
            max_connections: 10,
            fetch_cap: DEFAULT_FETCH_CAP,
            seed_file: None,
            default_window_days: engine.default_window_days,
            history_limit: engine.history_limit,
            timezone: engine.timezone,
            bucket_timezone: engine.bucket_timezone,
            fuel_label: engine.fuel_label,
            completed_only: engine.completed_only,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment
    ///
    /// Unset keys keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("CPK").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_window_days: self.default_window_days,
            history_limit: self.history_limit,
            timezone: self.timezone,
            bucket_timezone: self.bucket_timezone,
            fuel_label: self.fuel_label.clone(),
            completed_only: self.completed_only,
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .fetch_cap(self.fetch_cap)
    }
}
