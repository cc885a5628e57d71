use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::{DeviceKind, devices, locations};
use crate::error::{AppError, AppResult};

use super::types::{
    ActuatorStateRequest, CreateDeviceRequest, DeviceDetails, DeviceListQuery, DeviceResponse,
    DevicesQuery, UpdateDeviceRequest,
};

/// List devices
#[utoipa::path(
    get,
    path = "/api/devices",
    params(DevicesQuery),
    responses(
        (status = 200, description = "Devices retrieved successfully", body = Vec<DeviceResponse>),
    ),
    tag = "devices"
)]
pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DevicesQuery>,
) -> AppResult<Json<Vec<DeviceResponse>>> {
    let list = find_devices(
        &state.db,
        query.kind,
        query.location_id,
        query.include_inactive,
    )
    .await?;
    Ok(Json(list))
}

/// List sensors
#[utoipa::path(
    get,
    path = "/api/sensors",
    params(DeviceListQuery),
    responses(
        (status = 200, description = "Sensors retrieved successfully", body = Vec<DeviceResponse>),
    ),
    tag = "devices"
)]
pub async fn list_sensors(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> AppResult<Json<Vec<DeviceResponse>>> {
    let list = find_devices(
        &state.db,
        Some(DeviceKind::Sensor),
        query.location_id,
        query.include_inactive,
    )
    .await?;
    Ok(Json(list))
}

/// List actuators
#[utoipa::path(
    get,
    path = "/api/actuators",
    params(DeviceListQuery),
    responses(
        (status = 200, description = "Actuators retrieved successfully", body = Vec<DeviceResponse>),
    ),
    tag = "devices"
)]
pub async fn list_actuators(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> AppResult<Json<Vec<DeviceResponse>>> {
    let list = find_devices(
        &state.db,
        Some(DeviceKind::Actuator),
        query.location_id,
        query.include_inactive,
    )
    .await?;
    Ok(Json(list))
}

/// Get a device by ID
#[utoipa::path(
    get,
    path = "/api/devices/{device_id}",
    params(
        ("device_id" = Uuid, Path, description = "Device UUID"),
    ),
    responses(
        (status = 200, description = "Device retrieved successfully", body = DeviceResponse),
        (status = 404, description = "Device not found"),
    ),
    tag = "devices"
)]
pub async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> AppResult<Json<DeviceResponse>> {
    let device = find_device(&state.db, device_id).await?;
    Ok(Json(device.into()))
}

/// Register a sensor or actuator
#[utoipa::path(
    post,
    path = "/api/devices",
    request_body = CreateDeviceRequest,
    responses(
        (status = 201, description = "Device created", body = DeviceResponse),
        (status = 400, description = "Invalid device"),
        (status = 404, description = "Location not found"),
    ),
    tag = "devices"
)]
pub async fn create_device(
    State(state): State<AppState>,
    Json(body): Json<CreateDeviceRequest>,
) -> AppResult<(StatusCode, Json<DeviceResponse>)> {
    let name = require_text(&body.name, "name")?;
    if let Some(location_id) = body.location_id {
        require_location(&state.db, location_id).await?;
    }

    let now = Utc::now();
    let mut model = devices::ActiveModel {
        id: Set(Uuid::new_v4()),
        kind: Set(body.details.kind()),
        name: Set(name),
        location_id: Set(body.location_id),
        is_active: Set(body.is_active),
        measurement_type: Set(None),
        unit: Set(None),
        endpoint_url: Set(None),
        actuator_type: Set(None),
        is_on: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match body.details {
        DeviceDetails::Sensor {
            measurement_type,
            unit,
            endpoint_url,
        } => {
            model.measurement_type = Set(Some(require_text(&measurement_type, "measurement_type")?));
            model.unit = Set(Some(require_text(&unit, "unit")?));
            model.endpoint_url = Set(endpoint_url.as_deref().map(validate_endpoint).transpose()?);
        }
        DeviceDetails::Actuator {
            actuator_type,
            is_on,
        } => {
            model.actuator_type = Set(Some(require_text(&actuator_type, "actuator_type")?));
            model.is_on = Set(Some(is_on));
        }
    }

    let created = model.insert(&state.db).await?;
    tracing::info!(
        device_id = %created.id,
        kind = ?created.kind,
        name = %created.name,
        "Device created"
    );
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a device
#[utoipa::path(
    put,
    path = "/api/devices/{device_id}",
    params(
        ("device_id" = Uuid, Path, description = "Device UUID"),
    ),
    request_body = UpdateDeviceRequest,
    responses(
        (status = 200, description = "Device updated", body = DeviceResponse),
        (status = 400, description = "Invalid update"),
        (status = 404, description = "Device or location not found"),
    ),
    tag = "devices"
)]
pub async fn update_device(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
    Json(body): Json<UpdateDeviceRequest>,
) -> AppResult<Json<DeviceResponse>> {
    let existing = find_device(&state.db, device_id).await?;
    check_fields_match_kind(existing.kind, &body)?;
    if let Some(location_id) = body.location_id {
        require_location(&state.db, location_id).await?;
    }

    let mut model = existing.into_active_model();
    if let Some(name) = &body.name {
        model.name = Set(require_text(name, "name")?);
    }
    if let Some(location_id) = body.location_id {
        model.location_id = Set(Some(location_id));
    }
    if let Some(is_active) = body.is_active {
        model.is_active = Set(is_active);
    }
    if let Some(measurement_type) = &body.measurement_type {
        model.measurement_type = Set(Some(require_text(measurement_type, "measurement_type")?));
    }
    if let Some(unit) = &body.unit {
        model.unit = Set(Some(require_text(unit, "unit")?));
    }
    if let Some(endpoint_url) = &body.endpoint_url {
        model.endpoint_url = Set(Some(validate_endpoint(endpoint_url)?));
    }
    if let Some(actuator_type) = &body.actuator_type {
        model.actuator_type = Set(Some(require_text(actuator_type, "actuator_type")?));
    }
    model.updated_at = Set(Utc::now());

    let updated = model.update(&state.db).await?;
    tracing::info!(device_id = %updated.id, "Device updated");
    Ok(Json(updated.into()))
}

/// Switch an actuator on or off
#[utoipa::path(
    put,
    path = "/api/actuators/{actuator_id}/state",
    params(
        ("actuator_id" = Uuid, Path, description = "Actuator UUID"),
    ),
    request_body = ActuatorStateRequest,
    responses(
        (status = 200, description = "Actuator state updated", body = DeviceResponse),
        (status = 400, description = "Device is not an actuator"),
        (status = 404, description = "Actuator not found"),
    ),
    tag = "devices"
)]
pub async fn set_actuator_state(
    State(state): State<AppState>,
    Path(actuator_id): Path<Uuid>,
    Json(body): Json<ActuatorStateRequest>,
) -> AppResult<Json<DeviceResponse>> {
    let existing = find_device(&state.db, actuator_id).await?;
    if existing.kind != DeviceKind::Actuator {
        return Err(AppError::Validation(format!(
            "Device '{actuator_id}' is a sensor, not an actuator"
        )));
    }

    let mut model = existing.into_active_model();
    model.is_on = Set(Some(body.is_on));
    model.updated_at = Set(Utc::now());

    let updated = model.update(&state.db).await?;
    tracing::info!(actuator_id = %updated.id, is_on = body.is_on, "Actuator state changed");
    Ok(Json(updated.into()))
}

/// Delete a device with its readings, thresholds and alerts
#[utoipa::path(
    delete,
    path = "/api/devices/{device_id}",
    params(
        ("device_id" = Uuid, Path, description = "Device UUID"),
    ),
    responses(
        (status = 204, description = "Device deleted"),
        (status = 404, description = "Device not found"),
    ),
    tag = "devices"
)]
pub async fn delete_device(
    State(state): State<AppState>,
    Path(device_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let existing = find_device(&state.db, device_id).await?;
    existing.delete(&state.db).await?;
    tracing::info!(device_id = %device_id, "Device deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn find_devices(
    db: &DatabaseConnection,
    kind: Option<DeviceKind>,
    location_id: Option<Uuid>,
    include_inactive: bool,
) -> AppResult<Vec<DeviceResponse>> {
    let mut query = devices::Entity::find();
    if let Some(kind) = kind {
        query = query.filter(devices::Column::Kind.eq(kind));
    }
    if let Some(location_id) = location_id {
        query = query.filter(devices::Column::LocationId.eq(location_id));
    }
    if !include_inactive {
        query = query.filter(devices::Column::IsActive.eq(true));
    }

    let list = query
        .order_by_asc(devices::Column::Name)
        .all(db)
        .await?;

    Ok(list.into_iter().map(DeviceResponse::from).collect())
}

async fn find_device(db: &DatabaseConnection, device_id: Uuid) -> AppResult<devices::Model> {
    devices::Entity::find_by_id(device_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Device '{device_id}' not found")))
}

async fn require_location(db: &DatabaseConnection, location_id: Uuid) -> AppResult<()> {
    locations::Entity::find_by_id(location_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location '{location_id}' not found")))?;
    Ok(())
}

fn check_fields_match_kind(kind: DeviceKind, body: &UpdateDeviceRequest) -> AppResult<()> {
    let sensor_fields =
        body.measurement_type.is_some() || body.unit.is_some() || body.endpoint_url.is_some();
    let actuator_fields = body.actuator_type.is_some();

    match kind {
        DeviceKind::Sensor if actuator_fields => Err(AppError::Validation(
            "actuator_type cannot be set on a sensor".to_string(),
        )),
        DeviceKind::Actuator if sensor_fields => Err(AppError::Validation(
            "measurement_type, unit and endpoint_url cannot be set on an actuator".to_string(),
        )),
        _ => Ok(()),
    }
}

fn require_text(value: &str, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Endpoint URLs must be absolute http(s) URLs.
pub fn validate_endpoint(url: &str) -> AppResult<String> {
    let url = url.trim();
    let host = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"));
    match host {
        Some(rest) if !rest.is_empty() => Ok(url.to_string()),
        _ => Err(AppError::Validation(format!(
            "endpoint_url must be an http:// or https:// URL, got '{url}'"
        ))),
    }
}
