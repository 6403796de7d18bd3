//! Integration tests for the shift lifecycle
//!
//! Runs the manager against the in-memory record store.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use core_kernel::{DateWindow, ErrorCategory, ShiftId, UserId};
use domain_shift::{ShiftError, ShiftManager, ShiftState};
use infra_store::{CollectionName, Document, MemoryRecordStore, PageRequest, RecordStore};

fn shift_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap()
}

fn manager(store: &Arc<MemoryRecordStore>) -> ShiftManager {
    ShiftManager::new(store.clone()).with_clock(shift_start)
}

async fn insert_trip(store: &MemoryRecordStore, user: UserId, kind: &str, distance: Option<&str>, at: DateTime<Utc>) {
    let mut body = json!({
        "userId": user.as_uuid().to_string(),
        "kind": kind,
        "amount": "100",
        "category": "viaje",
        "date": at.to_rfc3339(),
    });
    if let Some(distance) = distance {
        body["distanceKm"] = json!(distance);
    }
    store
        .insert(CollectionName::Transactions, Document::new(Uuid::new_v4(), body).unwrap())
        .await
        .unwrap();
}

mod starting {
    use super::*;

    #[tokio::test]
    async fn test_second_start_fails_with_already_open() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let user = UserId::new();

        let first = manager.start(user, dec!(1000)).await.unwrap();
        assert_eq!(first.state, ShiftState::Open);
        assert_eq!(first.started_at, shift_start());

        let err = manager.start(user, dec!(1000)).await.unwrap_err();
        assert!(matches!(err, ShiftError::AlreadyOpen));
        assert_eq!(err.category(), ErrorCategory::Conflict);
        assert_eq!(store.len(CollectionName::Shifts).await, 1);
    }

    #[tokio::test]
    async fn test_users_do_not_block_each_other() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);

        manager.start(UserId::new(), dec!(10)).await.unwrap();
        manager.start(UserId::new(), dec!(10)).await.unwrap();

        assert_eq!(store.len(CollectionName::Shifts).await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_open_exactly_one_shift() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = Arc::new(manager(&store));
        let user = UserId::new();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.start(user, dec!(500)).await })
            })
            .collect();

        let mut opened = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => opened += 1,
                Err(ShiftError::AlreadyOpen) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(opened, 1);
        assert_eq!(store.len(CollectionName::Shifts).await, 1);
    }

    #[tokio::test]
    async fn test_negative_odometer_is_validation_error() {
        let store = Arc::new(MemoryRecordStore::new());
        let err = manager(&store).start(UserId::new(), dec!(-5)).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
    }
}

mod closing {
    use super::*;

    #[tokio::test]
    async fn test_close_below_start_fails_with_invalid_odometer() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let user = UserId::new();
        manager.start(user, dec!(1000)).await.unwrap();

        let err = manager.close(user, dec!(900)).await.unwrap_err();

        assert!(matches!(err, ShiftError::InvalidOdometer { start, end } if start == dec!(1000) && end == dec!(900)));
        assert!(manager.current(user).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_close_without_open_shift() {
        let store = Arc::new(MemoryRecordStore::new());
        let err = manager(&store).close(UserId::new(), dec!(10)).await.unwrap_err();
        assert!(matches!(err, ShiftError::NoOpenShift));
    }

    #[tokio::test]
    async fn test_close_attributes_income_trips_after_start() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let user = UserId::new();
        manager.start(user, dec!(1000)).await.unwrap();

        insert_trip(&store, user, "income", Some("30.5"), shift_start() + Duration::hours(1)).await;
        insert_trip(&store, user, "income", Some("12"), shift_start()).await;
        insert_trip(&store, user, "income", None, shift_start() + Duration::hours(2)).await;
        // not attributed: before start, expense, other user
        insert_trip(&store, user, "income", Some("99"), shift_start() - Duration::minutes(1)).await;
        insert_trip(&store, user, "expense", Some("99"), shift_start() + Duration::hours(1)).await;
        insert_trip(&store, UserId::new(), "income", Some("99"), shift_start() + Duration::hours(1)).await;

        let closed = manager.close(user, dec!(1060)).await.unwrap();

        assert_eq!(closed.state, ShiftState::Closed);
        assert_eq!(closed.total_km, Some(dec!(60)));
        assert_eq!(closed.trip_km, Some(dec!(42.5)));
        assert_eq!(closed.dead_km, Some(dec!(17.5)));
        assert!(manager.current(user).await.unwrap().is_none());
    }

    async fn insert_cancelled_trip(store: &MemoryRecordStore, user: UserId, distance: &str) {
        let body = json!({
            "userId": user.as_uuid().to_string(),
            "kind": "income",
            "amount": "100",
            "category": "viaje",
            "date": shift_start().to_rfc3339(),
            "status": "cancelled",
            "distanceKm": distance,
        });
        store
            .insert(CollectionName::Transactions, Document::new(Uuid::new_v4(), body).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_trip_status_rule_is_configurable() {
        let user = UserId::new();

        let store = Arc::new(MemoryRecordStore::new());
        let every_status = manager(&store);
        every_status.start(user, dec!(0)).await.unwrap();
        insert_trip(&store, user, "income", Some("10"), shift_start()).await;
        insert_cancelled_trip(&store, user, "5").await;
        let closed = every_status.close(user, dec!(20)).await.unwrap();
        assert_eq!(closed.trip_km, Some(dec!(15)));

        let store = Arc::new(MemoryRecordStore::new());
        let completed_only = manager(&store).completed_trips_only(true);
        completed_only.start(user, dec!(0)).await.unwrap();
        insert_trip(&store, user, "income", Some("10"), shift_start()).await;
        insert_cancelled_trip(&store, user, "5").await;
        let closed = completed_only.close(user, dec!(20)).await.unwrap();
        assert_eq!(closed.trip_km, Some(dec!(10)));
        assert_eq!(closed.dead_km, Some(dec!(10)));
    }

    #[tokio::test]
    async fn test_negative_dead_km_is_kept() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let user = UserId::new();
        manager.start(user, dec!(1000)).await.unwrap();
        insert_trip(&store, user, "income", Some("25"), shift_start()).await;

        let closed = manager.close(user, dec!(1010)).await.unwrap();
        assert_eq!(closed.dead_km, Some(dec!(-15)));
    }

    #[tokio::test]
    async fn test_can_start_again_after_close() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let user = UserId::new();
        manager.start(user, dec!(0)).await.unwrap();
        manager.close(user, dec!(10)).await.unwrap();

        assert!(manager.start(user, dec!(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_store_outage_surfaces_as_retryable() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let user = UserId::new();
        manager.start(user, dec!(0)).await.unwrap();
        store.set_available(false);

        let err = manager.close(user, dec!(10)).await.unwrap_err();
        assert!(err.category().is_retryable());
    }
}

mod lookups {
    use super::*;

    #[tokio::test]
    async fn test_get_hides_foreign_shifts() {
        let store = Arc::new(MemoryRecordStore::new());
        let manager = manager(&store);
        let owner = UserId::new();
        let shift = manager.start(owner, dec!(0)).await.unwrap();

        assert_eq!(manager.get(owner, shift.id).await.unwrap().id, shift.id);
        let err = manager.get(UserId::new(), shift.id).await.unwrap_err();
        assert!(matches!(err, ShiftError::NotFound(id) if id == shift.id));
        assert!(matches!(manager.get(owner, ShiftId::new()).await, Err(ShiftError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_and_window() {
        let store = Arc::new(MemoryRecordStore::new());
        let user = UserId::new();

        let day1 = ShiftManager::new(store.clone()).with_clock(|| Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        day1.start(user, dec!(0)).await.unwrap();
        day1.close(user, dec!(40)).await.unwrap();

        let day3 = ShiftManager::new(store.clone()).with_clock(|| Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap());
        day3.start(user, dec!(40)).await.unwrap();
        day3.close(user, dec!(100)).await.unwrap();
        day3.start(user, dec!(100)).await.unwrap();

        let page = day3.history(user, PageRequest::new(1, 10)).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items[2].odometer_start, Decimal::ZERO);

        let window = DateWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 23, 59, 59).unwrap(),
        )
        .unwrap();
        let closed = day3.closed_in_window(user, &window).await.unwrap();
        assert_eq!(closed.items.len(), 1);
        assert_eq!(closed.items[0].total_km, Some(dec!(60)));
    }
}
