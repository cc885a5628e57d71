//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use iot_monitor::alerting::InMemoryStore;
use iot_monitor::config::{Config, Deployment};
use iot_monitor::entity::{DeviceKind, ReadingOrigin, Severity, ThresholdKind, devices, thresholds};
use iot_monitor::services::NewReading;

/// Fixed instant, `minute` minutes after 2026-03-01 10:00 UTC.
pub fn at(minute: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap() + chrono::Duration::minutes(minute)
}

pub fn sensor(name: &str) -> devices::Model {
    devices::Model {
        id: Uuid::new_v4(),
        kind: DeviceKind::Sensor,
        name: name.to_string(),
        location_id: None,
        is_active: true,
        measurement_type: Some("temperature".to_string()),
        unit: Some("°C".to_string()),
        endpoint_url: Some(format!("http://devices.local/{name}")),
        actuator_type: None,
        is_on: None,
        created_at: at(0),
        updated_at: at(0),
    }
}

pub fn actuator(name: &str) -> devices::Model {
    devices::Model {
        id: Uuid::new_v4(),
        kind: DeviceKind::Actuator,
        name: name.to_string(),
        location_id: None,
        is_active: true,
        measurement_type: None,
        unit: None,
        endpoint_url: None,
        actuator_type: Some("valve".to_string()),
        is_on: Some(false),
        created_at: at(0),
        updated_at: at(0),
    }
}

pub fn threshold(
    sensor_id: Uuid,
    kind: ThresholdKind,
    severity: Severity,
    value: Decimal,
) -> thresholds::Model {
    thresholds::Model {
        id: Uuid::new_v4(),
        sensor_id,
        kind,
        severity,
        value,
        is_active: true,
        created_at: at(0),
    }
}

pub fn manual(sensor_id: Uuid, value: Decimal) -> NewReading {
    NewReading {
        sensor_id,
        value: Some(value),
        time: None,
        origin: ReadingOrigin::Manual,
    }
}

/// Store holding one sensor with the given thresholds.
pub async fn store_with(
    sensor: &devices::Model,
    limits: &[thresholds::Model],
) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.add_device(sensor.clone()).await;
    for limit in limits {
        store.add_threshold(limit.clone()).await;
    }
    store
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        poll_enabled: false,
        poll_interval_seconds: 300,
        poll_concurrency: 4,
        device_request_timeout_seconds: 1,
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        cors_allowed_origin: None,
        deployment: Deployment::Local,
    }
}
