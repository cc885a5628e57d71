//! Acknowledge/resolve transitions and alert queries.
//!
//! Run with: cargo test --test lifecycle_test

mod common;

use std::sync::Arc;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{actuator, at, manual, sensor, store_with, threshold};
use iot_monitor::alerting::InMemoryStore;
use iot_monitor::alerting::lifecycle::{self, MAX_COMMENT_LEN};
use iot_monitor::entity::{AlertStatus, Severity, ThresholdKind, alerts};
use iot_monitor::error::AppError;
use iot_monitor::services::ingest_reading_at;

/// Store with one sensor and one open Minimum/Alert alert.
async fn open_alert() -> (Arc<InMemoryStore>, alerts::Model) {
    let s = sensor("lab");
    let min = threshold(s.id, ThresholdKind::Minimum, Severity::Alert, dec!(15.00));
    let store = store_with(&s, &[min]).await;
    let mut outcome = ingest_reading_at(store.as_ref(), manual(s.id, dec!(12.50)), at(1))
        .await
        .unwrap();
    let alert = outcome.evaluation.created.remove(0);
    (store, alert)
}

#[tokio::test]
async fn acknowledge_then_resolve() {
    let (store, alert) = open_alert().await;

    let acked = lifecycle::acknowledge_at(store.as_ref(), alert.id, None, at(2))
        .await
        .unwrap();
    assert_eq!(acked.status, AlertStatus::Acknowledged);
    assert_eq!(acked.acknowledged_at, Some(at(2)));
    assert_eq!(acked.resolved_at, None);

    let resolved = lifecycle::resolve_at(store.as_ref(), alert.id, None, at(3))
        .await
        .unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.acknowledged_at, Some(at(2)));
    assert_eq!(resolved.resolved_at, Some(at(3)));
}

#[tokio::test]
async fn active_alert_can_be_resolved_directly() {
    let (store, alert) = open_alert().await;

    let resolved = lifecycle::resolve_at(store.as_ref(), alert.id, None, at(2))
        .await
        .unwrap();

    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.acknowledged_at, None);
}

#[tokio::test]
async fn resolving_twice_fails() {
    let (store, alert) = open_alert().await;
    lifecycle::resolve_at(store.as_ref(), alert.id, None, at(2))
        .await
        .unwrap();

    let err = lifecycle::resolve_at(store.as_ref(), alert.id, None, at(3))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::InvalidStateTransition {
            from: "resolved",
            action: "resolve",
            ..
        }
    ));
    // First resolution timestamp is kept
    let stored = store.alerts().await.remove(0);
    assert_eq!(stored.resolved_at, Some(at(2)));
}

#[tokio::test]
async fn acknowledging_a_resolved_alert_fails() {
    let (store, alert) = open_alert().await;
    lifecycle::resolve_at(store.as_ref(), alert.id, None, at(2))
        .await
        .unwrap();

    let err = lifecycle::acknowledge_at(store.as_ref(), alert.id, None, at(3))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
    assert_eq!(store.alerts().await[0].acknowledged_at, None);
}

#[tokio::test]
async fn acknowledging_twice_fails() {
    let (store, alert) = open_alert().await;
    lifecycle::acknowledge_at(store.as_ref(), alert.id, None, at(2))
        .await
        .unwrap();

    let err = lifecycle::acknowledge_at(store.as_ref(), alert.id, None, at(3))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::InvalidStateTransition {
            from: "acknowledged",
            ..
        }
    ));
}

#[tokio::test]
async fn unknown_alert_is_not_found() {
    let store = InMemoryStore::new();
    let missing = Uuid::new_v4();

    assert!(matches!(
        lifecycle::acknowledge(&store, missing, None).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        lifecycle::resolve(&store, missing, None).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        lifecycle::get_details(&store, missing).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn comments_are_appended_to_the_message() {
    let (store, alert) = open_alert().await;

    let acked = lifecycle::acknowledge_at(store.as_ref(), alert.id, Some("  on my way "), at(2))
        .await
        .unwrap();
    assert_eq!(
        acked.message.as_deref(),
        Some("12.50 detected, below threshold of 15.00 | Acknowledged: on my way")
    );

    let resolved = lifecycle::resolve_at(store.as_ref(), alert.id, Some("heater replaced"), at(3))
        .await
        .unwrap();
    assert_eq!(
        resolved.message.as_deref(),
        Some(
            "12.50 detected, below threshold of 15.00 | Acknowledged: on my way | Resolved: heater replaced"
        )
    );
}

#[tokio::test]
async fn blank_comment_leaves_message_untouched() {
    let (store, alert) = open_alert().await;

    let acked = lifecycle::acknowledge_at(store.as_ref(), alert.id, Some("   "), at(2))
        .await
        .unwrap();

    assert_eq!(acked.message, alert.message);
}

#[tokio::test]
async fn oversized_comment_is_rejected_before_any_change() {
    let (store, alert) = open_alert().await;
    let comment = "x".repeat(MAX_COMMENT_LEN + 1);

    let err = lifecycle::acknowledge_at(store.as_ref(), alert.id, Some(&comment), at(2))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.alerts().await[0].status, AlertStatus::Active);
}

#[tokio::test]
async fn details_include_sensor_and_threshold() {
    let (store, alert) = open_alert().await;

    let details = lifecycle::get_details(store.as_ref(), alert.id).await.unwrap();

    assert_eq!(details.alert, alert);
    assert_eq!(details.sensor.map(|s| s.id), Some(alert.sensor_id));
    assert_eq!(details.threshold.map(|t| t.value), Some(dec!(15.00)));
}

#[tokio::test]
async fn dashboard_lists_only_active_alerts_newest_first() {
    let s = sensor("dashboard");
    let min = threshold(s.id, ThresholdKind::Minimum, Severity::Alert, dec!(15.00));
    let max = threshold(s.id, ThresholdKind::Maximum, Severity::Warning, dec!(30.00));
    let other = sensor("dashboard-2");
    let other_max = threshold(other.id, ThresholdKind::Maximum, Severity::Alert, dec!(50.00));
    let store = store_with(&s, &[min, max]).await;
    store.add_device(other.clone()).await;
    store.add_threshold(other_max).await;

    let low = ingest_reading_at(store.as_ref(), manual(s.id, dec!(10.00)), at(1))
        .await
        .unwrap()
        .evaluation
        .created
        .remove(0);
    ingest_reading_at(store.as_ref(), manual(other.id, dec!(60.00)), at(2))
        .await
        .unwrap();
    lifecycle::acknowledge_at(store.as_ref(), low.id, None, at(3))
        .await
        .unwrap();
    ingest_reading_at(store.as_ref(), manual(s.id, dec!(31.00)), at(4))
        .await
        .unwrap();

    let active = lifecycle::dashboard(store.as_ref()).await.unwrap();

    assert_eq!(active.len(), 2);
    assert!(active.iter().all(|a| a.status == AlertStatus::Active));
    assert_eq!(active[0].created_at, at(4));
    assert_eq!(active[1].created_at, at(2));
}

#[tokio::test]
async fn sensor_alerts_filter_by_status_and_kind() {
    let s = sensor("history");
    let min = threshold(s.id, ThresholdKind::Minimum, Severity::Alert, dec!(15.00));
    let max = threshold(s.id, ThresholdKind::Maximum, Severity::Alert, dec!(30.00));
    let store = store_with(&s, &[min, max]).await;

    for (minute, value) in [(1, dec!(10.00)), (2, dec!(20.00)), (3, dec!(35.00))] {
        ingest_reading_at(store.as_ref(), manual(s.id, value), at(minute))
            .await
            .unwrap();
    }

    let all = lifecycle::alerts_for_sensor(store.as_ref(), s.id, None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let resolved = lifecycle::alerts_for_sensor(store.as_ref(), s.id, Some(AlertStatus::Resolved), None)
        .await
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].kind, ThresholdKind::Minimum);

    let maximum = lifecycle::alerts_for_sensor(
        store.as_ref(),
        s.id,
        Some(AlertStatus::Active),
        Some(ThresholdKind::Maximum),
    )
    .await
    .unwrap();
    assert_eq!(maximum.len(), 1);

    let none = lifecycle::alerts_for_sensor(
        store.as_ref(),
        s.id,
        Some(AlertStatus::Acknowledged),
        None,
    )
    .await
    .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn sensor_alerts_for_unknown_or_actuator_is_not_found() {
    let store = InMemoryStore::new();
    let valve = actuator("valve");
    store.add_device(valve.clone()).await;

    assert!(matches!(
        lifecycle::alerts_for_sensor(&store, Uuid::new_v4(), None, None).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        lifecycle::alerts_for_sensor(&store, valve.id, None, None).await,
        Err(AppError::NotFound(_))
    ));
}
