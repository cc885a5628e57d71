//! HTTP-level tests for the alert, threshold and reading ingestion endpoints.
//!
//! The router runs against the in-memory store; the database handle is
//! disconnected, so only routes served by the alert engine are exercised.
//!
//! Run with: cargo test --test api_test

mod common;

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use common::{actuator, sensor, store_with, test_config, threshold};
use iot_monitor::alerting::InMemoryStore;
use iot_monitor::common::AppState;
use iot_monitor::device::DeviceClient;
use iot_monitor::entity::{Severity, ThresholdKind, devices};
use iot_monitor::routes::build_router;

fn app(store: Arc<InMemoryStore>) -> Router {
    let config = test_config();
    let client = DeviceClient::new(&config).unwrap();
    build_router(AppState::with_store(
        DatabaseConnection::Disconnected,
        config,
        client,
        store,
    ))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn monitored_sensor() -> (Arc<InMemoryStore>, devices::Model) {
    let s = sensor("api");
    let min = threshold(s.id, ThresholdKind::Minimum, Severity::Alert, dec!(15.00));
    (store_with(&s, &[min]).await, s)
}

#[tokio::test]
async fn healthz_returns_ok() {
    let app = app(Arc::new(InMemoryStore::new()));

    let response = send(&app, Method::GET, "/healthz", None).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn manual_reading_raises_alert_and_shows_on_dashboard() {
    let (store, s) = monitored_sensor().await;
    let app = app(store);

    let response = send(
        &app,
        Method::POST,
        &format!("/api/sensors/{}/readings", s.id),
        Some(json!({ "value": 12.5 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert_eq!(json["reading"]["origin"], "manual");
    assert_eq!(json["alerts_created"].as_array().unwrap().len(), 1);
    assert_eq!(json["alerts_created"][0]["status"], "active");
    assert_eq!(json["alerts_created"][0]["kind"], "minimum");
    assert_eq!(json["alerts_created"][0]["duration"], "ongoing");

    let dashboard = body_json(send(&app, Method::GET, "/api/alerts/dashboard", None).await).await;
    assert_eq!(dashboard.as_array().unwrap().len(), 1);
    assert_eq!(dashboard[0]["id"], json["alerts_created"][0]["id"]);
}

#[tokio::test]
async fn acknowledge_and_resolve_over_http() {
    let (store, s) = monitored_sensor().await;
    let app = app(store);

    let created = body_json(
        send(
            &app,
            Method::POST,
            &format!("/api/sensors/{}/readings", s.id),
            Some(json!({ "value": "10.00" })),
        )
        .await,
    )
    .await;
    let alert_id = created["alerts_created"][0]["id"].as_str().unwrap().to_string();

    let response = send(
        &app,
        Method::POST,
        &format!("/api/alerts/{alert_id}/acknowledge"),
        Some(json!({ "comment": "checking heater" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let acked = body_json(response).await;
    assert_eq!(acked["status"], "acknowledged");
    assert!(acked["acknowledged_at"].is_string());
    assert!(
        acked["message"]
            .as_str()
            .unwrap()
            .ends_with("| Acknowledged: checking heater")
    );

    let response = send(
        &app,
        Method::POST,
        &format!("/api/alerts/{alert_id}/resolve"),
        Some(json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "resolved");

    let response = send(
        &app,
        Method::POST,
        &format!("/api/alerts/{alert_id}/resolve"),
        Some(json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("resolved"));

    let history = body_json(
        send(
            &app,
            Method::GET,
            &format!("/api/sensors/{}/alerts?status=resolved", s.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_ne!(history[0]["duration"], "ongoing");
}

#[tokio::test]
async fn alert_details_embed_sensor_and_threshold() {
    let (store, s) = monitored_sensor().await;
    let app = app(store);

    let created = body_json(
        send(
            &app,
            Method::POST,
            &format!("/api/sensors/{}/readings", s.id),
            Some(json!({ "value": 1 })),
        )
        .await,
    )
    .await;
    let alert_id = created["alerts_created"][0]["id"].as_str().unwrap().to_string();

    let response = send(&app, Method::GET, &format!("/api/alerts/{alert_id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let details = body_json(response).await;
    assert_eq!(details["id"], alert_id.as_str());
    assert_eq!(details["sensor"]["name"], "api");
    assert_eq!(details["threshold"]["kind"], "minimum");
}

#[tokio::test]
async fn error_responses() {
    let (store, s) = monitored_sensor().await;
    let valve = actuator("valve");
    store.add_device(valve.clone()).await;
    let app = app(store);

    let missing_alert = send(
        &app,
        Method::GET,
        &format!("/api/alerts/{}", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(missing_alert.status(), StatusCode::NOT_FOUND);

    let unknown_sensor = send(
        &app,
        Method::POST,
        &format!("/api/sensors/{}/readings", Uuid::new_v4()),
        Some(json!({ "value": 1 })),
    )
    .await;
    assert_eq!(unknown_sensor.status(), StatusCode::NOT_FOUND);

    let no_value = send(
        &app,
        Method::POST,
        &format!("/api/sensors/{}/readings", s.id),
        Some(json!({})),
    )
    .await;
    assert_eq!(no_value.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(no_value).await["error"], "value is required");

    let to_actuator = send(
        &app,
        Method::POST,
        &format!("/api/sensors/{}/readings", valve.id),
        Some(json!({ "value": 1 })),
    )
    .await;
    assert_eq!(to_actuator.status(), StatusCode::BAD_REQUEST);

    let actuator_alerts = send(
        &app,
        Method::GET,
        &format!("/api/sensors/{}/alerts", valve.id),
        None,
    )
    .await;
    assert_eq!(actuator_alerts.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn threshold_with_alert_history_cannot_be_deleted() {
    let (store, s) = monitored_sensor().await;
    let app = app(store);

    let created = body_json(
        send(
            &app,
            Method::POST,
            &format!("/api/sensors/{}/readings", s.id),
            Some(json!({ "value": 3 })),
        )
        .await,
    )
    .await;
    let alert_id = created["alerts_created"][0]["id"].as_str().unwrap().to_string();
    let threshold_id = created["alerts_created"][0]["threshold_id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = send(
        &app,
        Method::POST,
        &format!("/api/alerts/{alert_id}/resolve"),
        Some(json!({})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        &app,
        Method::DELETE,
        &format!("/api/thresholds/{threshold_id}"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let history = body_json(
        send(
            &app,
            Method::GET,
            &format!("/api/sensors/{}/alerts?status=resolved", s.id),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    let response = send(
        &app,
        Method::PUT,
        &format!("/api/thresholds/{threshold_id}/active"),
        Some(json!({ "is_active": false })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["is_active"], false);
}
