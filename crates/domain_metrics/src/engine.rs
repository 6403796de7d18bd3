//! Aggregation engine
//!
//! Fetches one capped snapshot of transactions and one of closed shifts for
//! a window, concurrently, and reduces them with [`crate::aggregate`]. The
//! window is validated before any I/O and a failure in either fetch fails
//! the whole call.
//!
//! Every transaction counts regardless of status unless
//! [`EngineConfig::completed_only`] is set, in which case pending and
//! cancelled records are dropped everywhere, trip attribution included.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use core_kernel::{DateWindow, Timezone, UserId};
use domain_ledger::{Transaction, TransactionLedger};
use domain_shift::{Shift, ShiftManager};
use infra_store::RecordStore;

use crate::aggregate::{self, CategoryStat, CpkSummary, FUEL_CATEGORY};
use crate::error::MetricsError;
use crate::period::Period;
use crate::report::{BreakdownReport, HistoryReport, StatsReport, SummaryReport};

/// Engine-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Trailing window length when the request has no start date
    pub default_window_days: u32,
    /// Buckets kept by bounded history
    pub history_limit: usize,
    /// Calendar basis for resolving request dates into a window
    pub timezone: Timezone,
    /// Calendar basis for bucket keys
    pub bucket_timezone: Timezone,
    /// Expense category reported as fuel
    pub fuel_label: String,
    /// Count only completed transactions
    #[serde(default)]
    pub completed_only: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_window_days: 30,
            history_limit: 30,
            timezone: Timezone::utc(),
            bucket_timezone: Timezone::utc(),
            fuel_label: FUEL_CATEGORY.to_string(),
            completed_only: false,
        }
    }
}

/// Stats request; missing dates fall back to the trailing window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub period: Period,
}

/// Bounded history request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub period: Period,
    /// Overrides the configured history limit
    pub limit: Option<usize>,
}

/// One consistent pair of fetches
struct Fetched {
    transactions: Vec<Transaction>,
    shifts: Vec<Shift>,
    truncated: bool,
}

/// The metrics engine
pub struct MetricsEngine {
    ledger: Arc<TransactionLedger>,
    shifts: Arc<ShiftManager>,
    config: EngineConfig,
    clock: fn() -> DateTime<Utc>,
}

impl std::fmt::Debug for MetricsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl MetricsEngine {
    pub fn new(ledger: Arc<TransactionLedger>, shifts: Arc<ShiftManager>, config: EngineConfig) -> Self {
        Self {
            ledger,
            shifts,
            config,
            clock: Utc::now,
        }
    }

    /// Builds the ledger and shift manager over one store
    ///
    /// The shift manager attributes trip distance under the same status rule
    /// the engine sums with.
    pub fn from_store(store: Arc<dyn RecordStore>, config: EngineConfig) -> Self {
        let shifts = ShiftManager::new(Arc::clone(&store)).completed_trips_only(config.completed_only);
        Self::new(
            Arc::new(TransactionLedger::new(store)),
            Arc::new(shifts),
            config,
        )
    }

    /// Replaces the wall clock that decides "today"
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolves request dates into a window in the configured timezone
    pub fn resolve_window(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<DateWindow, MetricsError> {
        let tz = &self.config.timezone;
        Ok(DateWindow::resolve(
            start,
            end,
            tz.today((self.clock)()),
            tz,
            self.config.default_window_days,
        )?)
    }

    async fn fetch(&self, user_id: UserId, window: &DateWindow) -> Result<Fetched, MetricsError> {
        let result = tokio::try_join!(
            async {
                self.ledger
                    .in_window(user_id, window)
                    .await
                    .map_err(MetricsError::from)
            },
            async {
                self.shifts
                    .closed_in_window(user_id, window)
                    .await
                    .map_err(MetricsError::from)
            },
        );

        let (transactions, shifts) = match result {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(%user_id, error = %e, "aggregation aborted");
                return Err(e);
            }
        };

        let truncated = transactions.truncated || shifts.truncated;
        let mut records = transactions.items;
        if self.config.completed_only {
            records.retain(Transaction::is_completed);
        }
        if truncated {
            debug!(
                %user_id,
                transactions = records.len(),
                shifts = shifts.items.len(),
                "aggregating a capped snapshot"
            );
        }

        Ok(Fetched {
            transactions: records,
            shifts: shifts.items,
            truncated,
        })
    }

    /// Full report for the window: summary, breakdowns and complete history
    #[instrument(skip(self), fields(user_id = %user_id, period = %query.period))]
    pub async fn stats(&self, user_id: UserId, query: StatsQuery) -> Result<StatsReport, MetricsError> {
        let window = self.resolve_window(query.start, query.end)?;
        let fetched = self.fetch(user_id, &window).await?;

        let totals = aggregate::totals(&fetched.transactions, &self.config.fuel_label)?;
        let distance = aggregate::shift_distance(&fetched.shifts)?;
        let summary = aggregate::summarize(&totals, &distance)?;
        let buckets = aggregate::history(
            &fetched.transactions,
            &fetched.shifts,
            query.period,
            &self.config.bucket_timezone,
        )?;
        let categories = aggregate::category_breakdown(&fetched.transactions)?;

        Ok(StatsReport {
            window,
            period: query.period,
            summary: SummaryReport::from(&summary),
            breakdown: BreakdownReport::from(&totals),
            categories: categories.into_iter().map(Into::into).collect(),
            history: buckets.into_values().map(Into::into).collect(),
            truncated: fetched.truncated,
        })
    }

    /// The most recent buckets of the window, ascending
    #[instrument(skip(self), fields(user_id = %user_id, period = %query.period))]
    pub async fn history(&self, user_id: UserId, query: HistoryQuery) -> Result<HistoryReport, MetricsError> {
        let window = self.resolve_window(query.start, query.end)?;
        let fetched = self.fetch(user_id, &window).await?;

        let buckets = aggregate::history(
            &fetched.transactions,
            &fetched.shifts,
            query.period,
            &self.config.bucket_timezone,
        )?;
        let limit = query.limit.unwrap_or(self.config.history_limit);

        Ok(HistoryReport {
            window,
            period: query.period,
            history: aggregate::recent_buckets(buckets, limit)
                .into_iter()
                .map(Into::into)
                .collect(),
            truncated: fetched.truncated,
        })
    }

    /// Per-category statistics for the window
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn category_breakdown(
        &self,
        user_id: UserId,
        window: &DateWindow,
    ) -> Result<Vec<CategoryStat>, MetricsError> {
        let fetched = self.fetch(user_id, window).await?;
        aggregate::category_breakdown(&fetched.transactions)
    }

    /// The cost-per-kilometer summary alone
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn summary(&self, user_id: UserId, window: &DateWindow) -> Result<CpkSummary, MetricsError> {
        let fetched = self.fetch(user_id, window).await?;
        let totals = aggregate::totals(&fetched.transactions, &self.config.fuel_label)?;
        aggregate::summarize(&totals, &aggregate::shift_distance(&fetched.shifts)?)
    }
}
