use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::alerting::thresholds::require_sensor;
use crate::common::AppState;
use crate::common::values::normalize_value;
use crate::entity::{ReadingOrigin, readings};
use crate::error::{AppError, AppResult};
use crate::services::{NewReading, ingest_reading};

use super::types::{
    CreateReadingRequest, IngestResponse, ReadingResponse, ReadingsQuery, UpdateReadingRequest,
};

const MAX_LIMIT: u64 = 10_000;

/// List readings of a sensor, newest first
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/readings",
    params(
        ("sensor_id" = Uuid, Path, description = "Sensor UUID"),
        ReadingsQuery,
    ),
    responses(
        (status = 200, description = "Readings retrieved successfully", body = Vec<ReadingResponse>),
        (status = 400, description = "Invalid time range"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "readings"
)]
pub async fn list_sensor_readings(
    State(state): State<AppState>,
    Path(sensor_id): Path<Uuid>,
    Query(query): Query<ReadingsQuery>,
) -> AppResult<Json<Vec<ReadingResponse>>> {
    if let (Some(start), Some(end)) = (query.start, query.end)
        && start > end
    {
        return Err(AppError::Validation("start must be before end".to_string()));
    }

    require_sensor(state.store.as_ref(), sensor_id).await?;

    let mut db_query = readings::Entity::find().filter(readings::Column::SensorId.eq(sensor_id));
    if let Some(start) = query.start {
        db_query = db_query.filter(readings::Column::Time.gte(start));
    }
    if let Some(end) = query.end {
        db_query = db_query.filter(readings::Column::Time.lte(end));
    }

    let list = db_query
        .order_by_desc(readings::Column::Time)
        .limit(query.limit.clamp(1, MAX_LIMIT))
        .all(&state.db)
        .await?;

    Ok(Json(list.into_iter().map(ReadingResponse::from).collect()))
}

/// Record a manual reading and evaluate it against the sensor's thresholds
#[utoipa::path(
    post,
    path = "/api/sensors/{sensor_id}/readings",
    params(
        ("sensor_id" = Uuid, Path, description = "Sensor UUID"),
    ),
    request_body = CreateReadingRequest,
    responses(
        (status = 201, description = "Reading stored and evaluated", body = IngestResponse),
        (status = 400, description = "Missing or invalid value"),
        (status = 404, description = "Sensor not found"),
    ),
    tag = "readings"
)]
pub async fn create_sensor_reading(
    State(state): State<AppState>,
    Path(sensor_id): Path<Uuid>,
    Json(body): Json<CreateReadingRequest>,
) -> AppResult<(StatusCode, Json<IngestResponse>)> {
    let ingested = ingest_reading(
        state.store.as_ref(),
        NewReading {
            sensor_id,
            value: body.value,
            time: body.time,
            origin: ReadingOrigin::Manual,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(ingested.into())))
}

/// Get a reading by ID
#[utoipa::path(
    get,
    path = "/api/readings/{reading_id}",
    params(
        ("reading_id" = Uuid, Path, description = "Reading UUID"),
    ),
    responses(
        (status = 200, description = "Reading retrieved successfully", body = ReadingResponse),
        (status = 404, description = "Reading not found"),
    ),
    tag = "readings"
)]
pub async fn get_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<Uuid>,
) -> AppResult<Json<ReadingResponse>> {
    let reading = find_reading(&state, reading_id).await?;
    Ok(Json(reading.into()))
}

/// Correct a stored reading
#[utoipa::path(
    put,
    path = "/api/readings/{reading_id}",
    params(
        ("reading_id" = Uuid, Path, description = "Reading UUID"),
    ),
    request_body = UpdateReadingRequest,
    responses(
        (status = 200, description = "Reading updated", body = ReadingResponse),
        (status = 400, description = "Invalid value"),
        (status = 404, description = "Reading not found"),
    ),
    tag = "readings"
)]
pub async fn update_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<Uuid>,
    Json(body): Json<UpdateReadingRequest>,
) -> AppResult<Json<ReadingResponse>> {
    let value = body
        .value
        .map(|v| normalize_value(v, "value"))
        .transpose()?;
    let existing = find_reading(&state, reading_id).await?;

    let mut model = existing.into_active_model();
    if let Some(value) = value {
        model.value = Set(value);
    }
    if let Some(time) = body.time {
        model.time = Set(time);
    }

    let updated = model.update(&state.db).await?;
    tracing::info!(reading_id = %updated.id, "Reading updated");
    Ok(Json(updated.into()))
}

/// Delete a reading
#[utoipa::path(
    delete,
    path = "/api/readings/{reading_id}",
    params(
        ("reading_id" = Uuid, Path, description = "Reading UUID"),
    ),
    responses(
        (status = 204, description = "Reading deleted"),
        (status = 404, description = "Reading not found"),
    ),
    tag = "readings"
)]
pub async fn delete_reading(
    State(state): State<AppState>,
    Path(reading_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let existing = find_reading(&state, reading_id).await?;
    existing.delete(&state.db).await?;
    tracing::info!(reading_id = %reading_id, "Reading deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_reading(state: &AppState, reading_id: Uuid) -> AppResult<readings::Model> {
    readings::Entity::find_by_id(reading_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading '{reading_id}' not found")))
}
