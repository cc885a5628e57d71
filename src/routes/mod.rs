pub mod alerts;
pub mod devices;
pub mod health;
pub mod locations;
pub mod readings;
pub mod thresholds;

use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post, put},
};
use sea_orm::{Condition, DatabaseConnection, EntityTrait, QueryFilter, sea_query::Expr};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};
use uuid::Uuid;

use crate::alerting::thresholds::{NewThreshold, ThresholdUpdate};
use crate::common::AppState;
use crate::entity::locations as location_entity;
use crate::entity::{AlertStatus, DeviceKind, ReadingOrigin, Severity, ThresholdKind};
use crate::error::{AppError, AppResult};

/// Resolve a location by UUID or name (case-insensitive)
pub async fn resolve_location(
    db: &DatabaseConnection,
    id_or_name: &str,
) -> AppResult<location_entity::Model> {
    if let Ok(uuid) = id_or_name.parse::<Uuid>() {
        return location_entity::Entity::find_by_id(uuid)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Location '{id_or_name}' not found")));
    }

    location_entity::Entity::find()
        .filter(
            Condition::all().add(Expr::cust_with_values(
                "LOWER(name) = LOWER($1)",
                [id_or_name],
            )),
        )
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location '{id_or_name}' not found")))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        locations::list_locations,
        locations::get_location,
        locations::create_location,
        locations::update_location,
        locations::delete_location,
        devices::list_devices,
        devices::list_sensors,
        devices::list_actuators,
        devices::get_device,
        devices::create_device,
        devices::update_device,
        devices::set_actuator_state,
        devices::delete_device,
        readings::list_sensor_readings,
        readings::create_sensor_reading,
        readings::get_reading,
        readings::update_reading,
        readings::delete_reading,
        thresholds::list_thresholds,
        thresholds::list_sensor_thresholds,
        thresholds::get_threshold,
        thresholds::create_threshold,
        thresholds::update_threshold,
        thresholds::set_threshold_active,
        thresholds::delete_threshold,
        alerts::dashboard,
        alerts::list_sensor_alerts,
        alerts::get_alert,
        alerts::acknowledge_alert,
        alerts::resolve_alert,
    ),
    components(
        schemas(
            AlertStatus,
            DeviceKind,
            ReadingOrigin,
            Severity,
            ThresholdKind,
            locations::LocationResponse,
            locations::CreateLocationRequest,
            locations::UpdateLocationRequest,
            devices::DeviceResponse,
            devices::DeviceDetails,
            devices::CreateDeviceRequest,
            devices::UpdateDeviceRequest,
            devices::ActuatorStateRequest,
            readings::ReadingResponse,
            readings::CreateReadingRequest,
            readings::UpdateReadingRequest,
            readings::IngestResponse,
            thresholds::ThresholdResponse,
            thresholds::SetActiveRequest,
            NewThreshold,
            ThresholdUpdate,
            alerts::AlertResponse,
            alerts::AlertDetailsResponse,
            alerts::SensorRef,
            alerts::ThresholdSnapshot,
            alerts::AlertActionRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "locations", description = "Physical locations of devices"),
        (name = "devices", description = "Sensors and actuators"),
        (name = "readings", description = "Sensor measurements"),
        (name = "thresholds", description = "Per-sensor alert limits"),
        (name = "alerts", description = "Threshold breach alerts and their lifecycle"),
    ),
    info(
        title = "IoT Monitor API",
        description = "Device monitoring with threshold-based alerting",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route(
            "/locations",
            get(locations::list_locations).post(locations::create_location),
        )
        .route(
            "/locations/{location_id}",
            get(locations::get_location)
                .put(locations::update_location)
                .delete(locations::delete_location),
        )
        .route(
            "/devices",
            get(devices::list_devices).post(devices::create_device),
        )
        .route(
            "/devices/{device_id}",
            get(devices::get_device)
                .put(devices::update_device)
                .delete(devices::delete_device),
        )
        .route("/sensors", get(devices::list_sensors))
        .route("/actuators", get(devices::list_actuators))
        .route(
            "/actuators/{actuator_id}/state",
            put(devices::set_actuator_state),
        )
        .route(
            "/sensors/{sensor_id}/readings",
            get(readings::list_sensor_readings).post(readings::create_sensor_reading),
        )
        .route(
            "/readings/{reading_id}",
            get(readings::get_reading)
                .put(readings::update_reading)
                .delete(readings::delete_reading),
        )
        .route(
            "/sensors/{sensor_id}/thresholds",
            get(thresholds::list_sensor_thresholds),
        )
        .route(
            "/thresholds",
            get(thresholds::list_thresholds).post(thresholds::create_threshold),
        )
        .route(
            "/thresholds/{threshold_id}",
            get(thresholds::get_threshold)
                .put(thresholds::update_threshold)
                .delete(thresholds::delete_threshold),
        )
        .route(
            "/thresholds/{threshold_id}/active",
            put(thresholds::set_threshold_active),
        )
        .route("/alerts/dashboard", get(alerts::dashboard))
        .route("/alerts/{alert_id}", get(alerts::get_alert))
        .route(
            "/alerts/{alert_id}/acknowledge",
            post(alerts::acknowledge_alert),
        )
        .route("/alerts/{alert_id}/resolve", post(alerts::resolve_alert))
        .route(
            "/sensors/{sensor_id}/alerts",
            get(alerts::list_sensor_alerts),
        )
        .layer(RequestBodyLimitLayer::new(1024 * 1024)); // 1MB body limit

    let health_routes = Router::new().route("/healthz", get(health::healthz));

    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    let cors = cors_layer(state.config.cors_allowed_origin.as_deref());

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            tracing::warn!("CORS_ALLOWED_ORIGIN is not a valid header value, allowing any origin");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
