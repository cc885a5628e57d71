//! Unit tests for value handling, error mapping and payload decoding.
//!
//! Run with: cargo test --test unit_test

use axum::http::StatusCode;
use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;
use uuid::Uuid;

use iot_monitor::alerting::evaluator::breach_message;
use iot_monitor::common::values::{max_abs_value, normalize_value};
use iot_monitor::device::parse_reading;
use iot_monitor::entity::{Severity, ThresholdKind, thresholds};
use iot_monitor::error::AppError;
use iot_monitor::routes::alerts::format_duration;
use iot_monitor::routes::devices::validate_endpoint;

#[test]
fn values_round_half_away_from_zero() {
    assert_eq!(normalize_value(dec!(12.345), "value").unwrap(), dec!(12.35));
    assert_eq!(normalize_value(dec!(-12.345), "value").unwrap(), dec!(-12.35));
    assert_eq!(normalize_value(dec!(7), "value").unwrap(), dec!(7.00));
}

#[test]
fn values_outside_numeric_10_2_are_rejected() {
    assert_eq!(max_abs_value(), dec!(99999999.99));
    assert!(normalize_value(dec!(99999999.99), "value").is_ok());
    assert!(normalize_value(dec!(-99999999.99), "value").is_ok());

    let err = normalize_value(dec!(99999999.995), "threshold").unwrap_err();
    assert!(matches!(err, AppError::Validation(ref msg) if msg.starts_with("threshold")));
}

#[test]
fn thresholds_compare_strictly() {
    let min = thresholds::Model {
        id: Uuid::new_v4(),
        sensor_id: Uuid::new_v4(),
        kind: ThresholdKind::Minimum,
        severity: Severity::Warning,
        value: dec!(15.00),
        is_active: true,
        created_at: Utc::now(),
    };
    let max = thresholds::Model {
        kind: ThresholdKind::Maximum,
        ..min.clone()
    };

    assert!(min.is_breached_by(dec!(14.99)));
    assert!(!min.is_breached_by(dec!(15.00)));
    assert!(max.is_breached_by(dec!(15.01)));
    assert!(!max.is_breached_by(dec!(15.00)));

    assert_eq!(
        breach_message(dec!(16.5), &max),
        "16.50 detected, above threshold of 15.00"
    );
}

#[test]
fn error_status_codes() {
    let id = Uuid::new_v4();
    let cases = [
        (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
        (AppError::Validation("x".into()), StatusCode::BAD_REQUEST),
        (
            AppError::InvalidStateTransition {
                alert_id: id,
                from: "resolved",
                action: "resolve",
            },
            StatusCode::BAD_REQUEST,
        ),
        (AppError::DeviceApi("x".into()), StatusCode::BAD_GATEWAY),
        (
            AppError::Database(sea_orm::DbErr::Custom("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
        (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (err, expected) in cases {
        assert_eq!(err.status_code(), expected, "{err}");
    }
}

#[test]
fn invalid_transition_message_names_alert_and_state() {
    let id = Uuid::nil();
    let err = AppError::InvalidStateTransition {
        alert_id: id,
        from: "resolved",
        action: "acknowledge",
    };

    assert_eq!(
        err.to_string(),
        format!("Cannot acknowledge alert {id}: alert is resolved")
    );
}

#[test]
fn duration_formatting() {
    let start = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();

    assert_eq!(format_duration(start, None), "ongoing");
    assert_eq!(format_duration(start, Some(start + Duration::seconds(20))), "1m");
    assert_eq!(format_duration(start, Some(start + Duration::minutes(125))), "2h 5m");
    assert_eq!(
        format_duration(start, Some(start + Duration::hours(27))),
        "1d 3h 0m"
    );
}

#[test]
fn device_payload_decoding() {
    let with_time = parse_reading(r#"{"value": 21.4, "timestamp": "2026-03-01T10:00:00Z"}"#).unwrap();
    assert_eq!(with_time.value, dec!(21.4));
    assert_eq!(
        with_time.timestamp,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap())
    );

    let as_string = parse_reading(r#"{"value": "-3.25"}"#).unwrap();
    assert_eq!(as_string.value, dec!(-3.25));
    assert_eq!(as_string.timestamp, None);

    let aliased = parse_reading(r#"{"value": 1, "time": "2026-03-01T10:00:00Z"}"#).unwrap();
    assert!(aliased.timestamp.is_some());

    assert!(matches!(
        parse_reading(r#"{"temperature": 21.4}"#),
        Err(AppError::DeviceApi(_))
    ));
    assert!(matches!(parse_reading("<html>"), Err(AppError::DeviceApi(_))));
}

#[test]
fn endpoint_urls_must_be_http() {
    assert_eq!(
        validate_endpoint(" http://10.0.0.5/reading ").unwrap(),
        "http://10.0.0.5/reading"
    );
    assert!(validate_endpoint("https://sensors.example.org/t1").is_ok());
    assert!(validate_endpoint("ftp://sensors.example.org/t1").is_err());
    assert!(validate_endpoint("http://").is_err());
    assert!(validate_endpoint("sensors.example.org").is_err());
}
