use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::alerting::lifecycle;
use crate::common::AppState;
use crate::error::AppResult;

use super::types::{AlertActionRequest, AlertDetailsResponse, AlertResponse, SensorAlertsQuery};

/// List every currently active alert
#[utoipa::path(
    get,
    path = "/api/alerts/dashboard",
    responses(
        (status = 200, description = "Active alerts retrieved successfully", body = Vec<AlertResponse>),
    ),
    tag = "alerts"
)]
pub async fn dashboard(State(state): State<AppState>) -> AppResult<Json<Vec<AlertResponse>>> {
    let alerts = lifecycle::dashboard(state.store.as_ref()).await?;
    Ok(Json(alerts.into_iter().map(AlertResponse::from).collect()))
}

/// List alerts raised for a sensor
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/alerts",
    params(
        ("sensor_id" = Uuid, Path, description = "Sensor UUID"),
        SensorAlertsQuery,
    ),
    responses(
        (status = 200, description = "Sensor alerts retrieved successfully", body = Vec<AlertResponse>),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "alerts"
)]
pub async fn list_sensor_alerts(
    State(state): State<AppState>,
    Path(sensor_id): Path<Uuid>,
    Query(query): Query<SensorAlertsQuery>,
) -> AppResult<Json<Vec<AlertResponse>>> {
    let alerts =
        lifecycle::alerts_for_sensor(state.store.as_ref(), sensor_id, query.status, query.kind)
            .await?;
    Ok(Json(alerts.into_iter().map(AlertResponse::from).collect()))
}

/// Get an alert with its sensor and threshold
#[utoipa::path(
    get,
    path = "/api/alerts/{alert_id}",
    params(
        ("alert_id" = Uuid, Path, description = "Alert UUID"),
    ),
    responses(
        (status = 200, description = "Alert retrieved successfully", body = AlertDetailsResponse),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn get_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
) -> AppResult<Json<AlertDetailsResponse>> {
    let details = lifecycle::get_details(state.store.as_ref(), alert_id).await?;
    Ok(Json(details.into()))
}

/// Acknowledge an active alert
#[utoipa::path(
    post,
    path = "/api/alerts/{alert_id}/acknowledge",
    params(
        ("alert_id" = Uuid, Path, description = "Alert UUID"),
    ),
    request_body = AlertActionRequest,
    responses(
        (status = 200, description = "Alert acknowledged", body = AlertResponse),
        (status = 400, description = "Alert is not active"),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(body): Json<AlertActionRequest>,
) -> AppResult<Json<AlertResponse>> {
    let alert =
        lifecycle::acknowledge(state.store.as_ref(), alert_id, body.comment.as_deref()).await?;
    Ok(Json(alert.into()))
}

/// Resolve an active or acknowledged alert
#[utoipa::path(
    post,
    path = "/api/alerts/{alert_id}/resolve",
    params(
        ("alert_id" = Uuid, Path, description = "Alert UUID"),
    ),
    request_body = AlertActionRequest,
    responses(
        (status = 200, description = "Alert resolved", body = AlertResponse),
        (status = 400, description = "Alert is already resolved"),
        (status = 404, description = "Alert not found"),
    ),
    tag = "alerts"
)]
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(body): Json<AlertActionRequest>,
) -> AppResult<Json<AlertResponse>> {
    let alert = lifecycle::resolve(state.store.as_ref(), alert_id, body.comment.as_deref()).await?;
    Ok(Json(alert.into()))
}
