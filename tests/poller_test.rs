//! Sensor polling with a scripted reading source.
//!
//! Run with: cargo test --test poller_test

mod common;

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::{at, sensor, store_with, threshold};
use iot_monitor::device::{DeviceReading, ReadingSource};
use iot_monitor::entity::{ReadingOrigin, Severity, ThresholdKind, devices};
use iot_monitor::error::{AppError, AppResult};
use iot_monitor::sync::worker::{PollSummary, poll_sensors};

/// Answers from a fixed table; unknown sensors get a device error.
struct ScriptedSource {
    answers: HashMap<Uuid, DeviceReading>,
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    async fn fetch(&self, sensor: &devices::Model) -> AppResult<DeviceReading> {
        self.answers
            .get(&sensor.id)
            .cloned()
            .ok_or_else(|| AppError::DeviceApi("connection refused".to_string()))
    }
}

#[tokio::test]
async fn one_failing_sensor_does_not_stop_the_cycle() {
    let healthy = sensor("healthy");
    let offline = sensor("offline");
    let hot = sensor("hot");
    let max = threshold(hot.id, ThresholdKind::Maximum, Severity::Alert, dec!(30.00));

    let store = store_with(&healthy, &[max]).await;
    store.add_device(offline.clone()).await;
    store.add_device(hot.clone()).await;

    let source = ScriptedSource {
        answers: HashMap::from([
            (
                healthy.id,
                DeviceReading {
                    value: dec!(21.40),
                    timestamp: Some(at(1)),
                },
            ),
            (
                hot.id,
                DeviceReading {
                    value: dec!(42.00),
                    timestamp: None,
                },
            ),
        ]),
    };

    let summary = poll_sensors(
        store.as_ref(),
        &source,
        vec![healthy.clone(), offline, hot.clone()],
        2,
    )
    .await;

    assert_eq!(
        summary,
        PollSummary {
            polled: 3,
            succeeded: 2,
            failed: 1,
            alerts_created: 1,
            alerts_resolved: 0,
        }
    );

    let readings = store.readings().await;
    assert_eq!(readings.len(), 2);
    assert!(readings.iter().all(|r| r.origin == ReadingOrigin::Automatic));
    let from_healthy = readings.iter().find(|r| r.sensor_id == healthy.id).unwrap();
    assert_eq!(from_healthy.time, at(1));

    let alerts = store.alerts().await;
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].sensor_id, hot.id);
}

#[tokio::test]
async fn storage_failure_counts_every_sensor_as_failed() {
    let a = sensor("a");
    let b = sensor("b");
    let store = store_with(&a, &[]).await;
    store.add_device(b.clone()).await;
    store.fail_writes(true);

    let source = ScriptedSource {
        answers: HashMap::from([
            (
                a.id,
                DeviceReading {
                    value: dec!(1.00),
                    timestamp: None,
                },
            ),
            (
                b.id,
                DeviceReading {
                    value: dec!(2.00),
                    timestamp: None,
                },
            ),
        ]),
    };

    let summary = poll_sensors(store.as_ref(), &source, vec![a, b], 4).await;

    assert_eq!(summary.polled, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 0);
}

#[tokio::test]
async fn empty_cycle_reports_nothing() {
    let store = iot_monitor::alerting::InMemoryStore::new();
    let source = ScriptedSource {
        answers: HashMap::new(),
    };

    let summary = poll_sensors(&store, &source, Vec::new(), 0).await;

    assert_eq!(summary, PollSummary::default());
}
