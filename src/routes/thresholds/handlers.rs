use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::alerting::thresholds::{self, NewThreshold, ThresholdUpdate};
use crate::common::AppState;
use crate::error::AppResult;

use super::types::{SetActiveRequest, ThresholdResponse, ThresholdsQuery};

/// List thresholds
#[utoipa::path(
    get,
    path = "/api/thresholds",
    params(ThresholdsQuery),
    responses(
        (status = 200, description = "Thresholds retrieved successfully", body = Vec<ThresholdResponse>),
    ),
    tag = "thresholds"
)]
pub async fn list_thresholds(
    State(state): State<AppState>,
    Query(query): Query<ThresholdsQuery>,
) -> AppResult<Json<Vec<ThresholdResponse>>> {
    let list = thresholds::list(state.store.as_ref(), query.sensor_id, query.active).await?;
    Ok(Json(list.into_iter().map(ThresholdResponse::from).collect()))
}

/// List thresholds configured for a sensor
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/thresholds",
    params(
        ("sensor_id" = Uuid, Path, description = "Sensor UUID"),
    ),
    responses(
        (status = 200, description = "Thresholds retrieved successfully", body = Vec<ThresholdResponse>),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "thresholds"
)]
pub async fn list_sensor_thresholds(
    State(state): State<AppState>,
    Path(sensor_id): Path<Uuid>,
) -> AppResult<Json<Vec<ThresholdResponse>>> {
    thresholds::require_sensor(state.store.as_ref(), sensor_id).await?;
    let list = thresholds::list(state.store.as_ref(), Some(sensor_id), None).await?;
    Ok(Json(list.into_iter().map(ThresholdResponse::from).collect()))
}

/// Get a threshold by ID
#[utoipa::path(
    get,
    path = "/api/thresholds/{threshold_id}",
    params(
        ("threshold_id" = Uuid, Path, description = "Threshold UUID"),
    ),
    responses(
        (status = 200, description = "Threshold retrieved successfully", body = ThresholdResponse),
        (status = 404, description = "Threshold not found"),
    ),
    tag = "thresholds"
)]
pub async fn get_threshold(
    State(state): State<AppState>,
    Path(threshold_id): Path<Uuid>,
) -> AppResult<Json<ThresholdResponse>> {
    let threshold = thresholds::get(state.store.as_ref(), threshold_id).await?;
    Ok(Json(threshold.into()))
}

/// Create a threshold for a sensor
#[utoipa::path(
    post,
    path = "/api/thresholds",
    request_body = NewThreshold,
    responses(
        (status = 201, description = "Threshold created", body = ThresholdResponse),
        (status = 400, description = "Invalid threshold"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "thresholds"
)]
pub async fn create_threshold(
    State(state): State<AppState>,
    Json(body): Json<NewThreshold>,
) -> AppResult<(StatusCode, Json<ThresholdResponse>)> {
    let threshold = thresholds::create(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(threshold.into())))
}

/// Update a threshold
#[utoipa::path(
    put,
    path = "/api/thresholds/{threshold_id}",
    params(
        ("threshold_id" = Uuid, Path, description = "Threshold UUID"),
    ),
    request_body = ThresholdUpdate,
    responses(
        (status = 200, description = "Threshold updated", body = ThresholdResponse),
        (status = 400, description = "Invalid threshold"),
        (status = 404, description = "Threshold not found"),
    ),
    tag = "thresholds"
)]
pub async fn update_threshold(
    State(state): State<AppState>,
    Path(threshold_id): Path<Uuid>,
    Json(body): Json<ThresholdUpdate>,
) -> AppResult<Json<ThresholdResponse>> {
    let threshold = thresholds::update(state.store.as_ref(), threshold_id, body).await?;
    Ok(Json(threshold.into()))
}

/// Enable or disable a threshold
#[utoipa::path(
    put,
    path = "/api/thresholds/{threshold_id}/active",
    params(
        ("threshold_id" = Uuid, Path, description = "Threshold UUID"),
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Threshold updated", body = ThresholdResponse),
        (status = 404, description = "Threshold not found"),
    ),
    tag = "thresholds"
)]
pub async fn set_threshold_active(
    State(state): State<AppState>,
    Path(threshold_id): Path<Uuid>,
    Json(body): Json<SetActiveRequest>,
) -> AppResult<Json<ThresholdResponse>> {
    let threshold =
        thresholds::set_active(state.store.as_ref(), threshold_id, body.is_active).await?;
    Ok(Json(threshold.into()))
}

/// Delete a threshold that has never raised an alert
#[utoipa::path(
    delete,
    path = "/api/thresholds/{threshold_id}",
    params(
        ("threshold_id" = Uuid, Path, description = "Threshold UUID"),
    ),
    responses(
        (status = 204, description = "Threshold deleted"),
        (status = 400, description = "Threshold has alerts; deactivate it instead"),
        (status = 404, description = "Threshold not found"),
    ),
    tag = "thresholds"
)]
pub async fn delete_threshold(
    State(state): State<AppState>,
    Path(threshold_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    thresholds::delete(state.store.as_ref(), threshold_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
