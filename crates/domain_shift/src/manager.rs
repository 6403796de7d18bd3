//! Shift lifecycle service
//!
//! Owns the single-open-shift rule. Starting a shift is a conditional write
//! guarded on `(userId, state = open)`, so the store refuses a second open
//! shift even across processes. Within one process, mutations for the same
//! user are additionally serialised through a per-user async mutex.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use core_kernel::{DateWindow, ShiftId, UserId};
use infra_store::{
    fields, Collection, CollectionName, Document, Page, PageRequest, RecordStore, SortSpec,
    Snapshot, StoreQuery,
};

use crate::error::ShiftError;
use crate::shift::{Shift, ShiftState};

/// Only the trip distance and status of a transaction are read when
/// closing a shift
#[derive(Debug, Deserialize)]
struct TripDistance {
    #[serde(default, rename = "distanceKm")]
    distance_km: Option<Decimal>,
    #[serde(default)]
    status: Option<String>,
}

impl TripDistance {
    /// Records without a status are completed
    fn is_completed(&self) -> bool {
        self.status.as_deref().map_or(true, |s| s == "completed")
    }
}

/// Manages shift creation, closing and lookups
pub struct ShiftManager {
    store: Arc<dyn RecordStore>,
    shifts: Collection<Shift>,
    trips: Collection<TripDistance>,
    locks: DashMap<UserId, Arc<Mutex<()>>>,
    clock: fn() -> DateTime<Utc>,
    completed_trips_only: bool,
}

impl std::fmt::Debug for ShiftManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShiftManager")
            .field("locked_users", &self.locks.len())
            .finish()
    }
}

fn open_shift_query(user_id: UserId) -> StoreQuery {
    StoreQuery::new()
        .eq(fields::USER_ID, user_id)
        .eq(fields::STATE, ShiftState::Open.as_str())
}

impl ShiftManager {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            shifts: Collection::new(Arc::clone(&store), CollectionName::Shifts),
            trips: Collection::new(Arc::clone(&store), CollectionName::Transactions),
            store,
            locks: DashMap::new(),
            clock: Utc::now,
            completed_trips_only: false,
        }
    }

    /// Replaces the wall clock used to stamp `startedAt`/`endedAt`
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Attributes only completed income records to a closing shift
    pub fn completed_trips_only(mut self, enabled: bool) -> Self {
        self.completed_trips_only = enabled;
        self
    }

    fn user_lock(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user_id).or_default().clone()
    }

    /// Opens a shift for the user
    ///
    /// # Errors
    ///
    /// `AlreadyOpen` if the user has an open shift, `Validation` for a
    /// negative reading.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn start(&self, user_id: UserId, odometer_start: Decimal) -> Result<Shift, ShiftError> {
        let shift = Shift::open(user_id, odometer_start, (self.clock)())?;

        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let document = Document::from_entity(*shift.id.as_uuid(), &shift)?;
        let inserted = self
            .store
            .insert_if_absent(CollectionName::Shifts, document, &open_shift_query(user_id))
            .await?;
        if !inserted {
            debug!("start refused, shift already open");
            return Err(ShiftError::AlreadyOpen);
        }

        info!(shift_id = %shift.id, "shift started");
        Ok(shift)
    }

    /// Closes the user's open shift
    ///
    /// Trip distance is the sum of `distanceKm` over the user's income
    /// records dated at or after the shift start, within one capped fetch.
    /// Every status counts unless [`Self::completed_trips_only`] is set.
    ///
    /// # Errors
    ///
    /// `NoOpenShift` when nothing is open, `InvalidOdometer` when the reading
    /// is below the opening one.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn close(&self, user_id: UserId, odometer_end: Decimal) -> Result<Shift, ShiftError> {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let mut shift = self.current(user_id).await?.ok_or(ShiftError::NoOpenShift)?;
        shift.ensure_closable(odometer_end)?;

        let trip_km = self.trip_km_since(user_id, shift.started_at).await?;
        shift.close(odometer_end, trip_km, (self.clock)())?;

        if shift.dead_km_or_zero() < Decimal::ZERO {
            debug!(
                shift_id = %shift.id,
                dead_km = %shift.dead_km_or_zero(),
                "trip distance exceeds odometer delta"
            );
        }

        self.store
            .replace(CollectionName::Shifts, Document::from_entity(*shift.id.as_uuid(), &shift)?)
            .await?;

        info!(shift_id = %shift.id, total_km = %shift.total_km_or_zero(), "shift closed");
        Ok(shift)
    }

    async fn trip_km_since(&self, user_id: UserId, started_at: DateTime<Utc>) -> Result<Decimal, ShiftError> {
        let query = StoreQuery::new()
            .eq(fields::USER_ID, user_id)
            .eq(fields::KIND, "income")
            .gte(fields::DATE, started_at);
        let trips = self.trips.snapshot(&query, &[], &SortSpec::default()).await?;
        if trips.truncated {
            debug!(%user_id, "trip distance computed from a capped batch");
        }
        trips
            .items
            .iter()
            .filter(|t| !self.completed_trips_only || t.is_completed())
            .filter_map(|t| t.distance_km)
            .try_fold(Decimal::ZERO, |acc, km| acc.checked_add(km))
            .ok_or_else(|| ShiftError::validation("distanceKm", "trip distances overflow"))
    }

    /// The user's open shift, if any
    pub async fn current(&self, user_id: UserId) -> Result<Option<Shift>, ShiftError> {
        Ok(self.shifts.find_one(&open_shift_query(user_id)).await?)
    }

    /// Fetches a shift owned by the user; foreign ids are NotFound
    pub async fn get(&self, user_id: UserId, id: ShiftId) -> Result<Shift, ShiftError> {
        self.shifts
            .get(*id.as_uuid())
            .await?
            .filter(|shift| shift.user_id == user_id)
            .ok_or(ShiftError::NotFound(id))
    }

    /// Pages through the user's shifts, most recent start first
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn history(&self, user_id: UserId, request: PageRequest) -> Result<Page<Shift>, ShiftError> {
        let query = StoreQuery::new().eq(fields::USER_ID, user_id);
        Ok(self
            .shifts
            .list(&query, &[], &SortSpec::desc(fields::STARTED_AT), request)
            .await?)
    }

    /// Closed shifts whose start falls inside the window, oldest first
    pub async fn closed_in_window(&self, user_id: UserId, window: &DateWindow) -> Result<Snapshot<Shift>, ShiftError> {
        let query = StoreQuery::new()
            .eq(fields::USER_ID, user_id)
            .eq(fields::STATE, ShiftState::Closed.as_str())
            .between(fields::STARTED_AT, window.start, window.end);
        Ok(self
            .shifts
            .snapshot(&query, &[], &SortSpec::asc(fields::STARTED_AT))
            .await?)
    }
}
