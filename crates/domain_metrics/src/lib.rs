//! Metrics Domain - Cost per Kilometer and Financial Rollups
//!
//! The store cannot group or sum, so every figure here is computed in
//! memory from one capped snapshot of the window:
//!
//! - **totals**: income and expense sums, with fuel split out
//! - **categories**: total, count, min, max and average per category
//! - **history**: income, expense, profit and shift distance per date bucket
//! - **summary**: CPK, profit per km and dead-km efficiency
//!
//! Only completed transactions count. The denominator for per-km figures is
//! the distance of closed shifts started in the window, or 1 when there is
//! none.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_metrics::{EngineConfig, MetricsEngine, Period, StatsQuery};
//!
//! let engine = MetricsEngine::from_store(store, EngineConfig::default());
//! let report = engine
//!     .stats(user_id, StatsQuery { period: Period::Semanal, ..Default::default() })
//!     .await?;
//! println!("cpk: {}", report.summary.cpk);
//! ```

pub mod period;
pub mod aggregate;
pub mod report;
pub mod engine;
pub mod error;

pub use period::{Period, UnknownPeriod};
pub use aggregate::{Bucket, CategoryStat, CpkSummary, ShiftDistance, Totals, FUEL_CATEGORY};
pub use report::{
    BreakdownReport, CategoryEntry, HistoryEntry, HistoryReport, StatsReport, SummaryReport,
};
pub use engine::{EngineConfig, HistoryQuery, MetricsEngine, StatsQuery};
pub use error::MetricsError;
