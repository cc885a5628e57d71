//! Reading ingestion validation and persistence.
//!
//! Run with: cargo test --test ingestion_test

mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{actuator, at, manual, sensor, store_with, threshold};
use iot_monitor::alerting::{InMemoryStore, evaluate_reading_at};
use iot_monitor::entity::{ReadingOrigin, Severity, ThresholdKind};
use iot_monitor::error::AppError;
use iot_monitor::services::{NewReading, ingest_reading_at};

#[tokio::test]
async fn missing_value_is_rejected_without_writing() {
    let s = sensor("no-value");
    let store = store_with(&s, &[]).await;

    let err = ingest_reading_at(
        store.as_ref(),
        NewReading {
            sensor_id: s.id,
            value: None,
            time: None,
            origin: ReadingOrigin::Manual,
        },
        at(1),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Validation(ref msg) if msg.contains("value")));
    assert!(store.readings().await.is_empty());
}

#[tokio::test]
async fn unknown_sensor_is_not_found() {
    let store = InMemoryStore::new();

    let err = ingest_reading_at(&store, manual(Uuid::new_v4(), dec!(1.00)), at(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn actuator_cannot_receive_readings() {
    let store = InMemoryStore::new();
    let valve = actuator("valve");
    store.add_device(valve.clone()).await;

    let err = ingest_reading_at(&store, manual(valve.id, dec!(1.00)), at(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(store.readings().await.is_empty());
}

#[tokio::test]
async fn value_is_rounded_to_two_decimals() {
    let s = sensor("rounding");
    let store = store_with(&s, &[]).await;

    let ingested = ingest_reading_at(store.as_ref(), manual(s.id, dec!(21.455)), at(1))
        .await
        .unwrap();

    assert_eq!(ingested.reading.value, dec!(21.46));
}

#[tokio::test]
async fn out_of_range_value_is_rejected() {
    let s = sensor("overflow");
    let store = store_with(&s, &[]).await;

    let err = ingest_reading_at(store.as_ref(), manual(s.id, dec!(100000000.00)), at(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn time_defaults_to_ingestion_time() {
    let s = sensor("clock");
    let store = store_with(&s, &[]).await;

    let defaulted = ingest_reading_at(store.as_ref(), manual(s.id, dec!(1.00)), at(5))
        .await
        .unwrap();
    assert_eq!(defaulted.reading.time, at(5));

    let explicit = ingest_reading_at(
        store.as_ref(),
        NewReading {
            time: Some(at(2)),
            ..manual(s.id, dec!(1.00))
        },
        at(5),
    )
    .await
    .unwrap();
    assert_eq!(explicit.reading.time, at(2));
    assert_eq!(store.readings().await.len(), 2);
}

#[tokio::test]
async fn manual_readings_are_accepted_for_inactive_sensors() {
    let mut s = sensor("retired");
    s.is_active = false;
    let store = store_with(&s, &[]).await;

    let ingested = ingest_reading_at(store.as_ref(), manual(s.id, dec!(3.00)), at(1))
        .await
        .unwrap();

    assert_eq!(ingested.reading.origin, ReadingOrigin::Manual);
}

#[tokio::test]
async fn storage_failure_is_propagated() {
    let s = sensor("broken-db");
    let min = threshold(s.id, ThresholdKind::Minimum, Severity::Alert, dec!(15.00));
    let store = store_with(&s, &[min]).await;
    store.fail_writes(true);

    let err = ingest_reading_at(store.as_ref(), manual(s.id, dec!(10.00)), at(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    assert!(store.readings().await.is_empty());
    assert!(store.alerts().await.is_empty());
}

#[tokio::test]
async fn evaluation_failure_keeps_the_stored_reading() {
    let s = sensor("half-written");
    let min = threshold(s.id, ThresholdKind::Minimum, Severity::Alert, dec!(15.00));
    let store = store_with(&s, &[min]).await;
    store.fail_alert_writes(true);

    let err = ingest_reading_at(store.as_ref(), manual(s.id, dec!(10.00)), at(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Database(_)));
    let readings = store.readings().await;
    assert_eq!(readings.len(), 1);
    assert!(store.alerts().await.is_empty());

    // Re-evaluating the stored reading catches up without a second insert
    store.fail_alert_writes(false);
    let outcome = evaluate_reading_at(store.as_ref(), &readings[0], at(2))
        .await
        .unwrap();

    assert_eq!(outcome.created.len(), 1);
    assert_eq!(store.readings().await.len(), 1);
    assert_eq!(store.alerts().await.len(), 1);
}
