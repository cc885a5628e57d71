use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::{devices, locations};
use crate::error::{AppError, AppResult};
use crate::routes::resolve_location;

use super::types::{CreateLocationRequest, LocationResponse, UpdateLocationRequest};

/// List all locations
#[utoipa::path(
    get,
    path = "/api/locations",
    responses(
        (status = 200, description = "Locations retrieved successfully", body = Vec<LocationResponse>),
    ),
    tag = "locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<LocationResponse>>> {
    let list = locations::Entity::find()
        .order_by_asc(locations::Column::Name)
        .all(&state.db)
        .await?;

    Ok(Json(list.into_iter().map(LocationResponse::from).collect()))
}

/// Get a specific location by ID or name
#[utoipa::path(
    get,
    path = "/api/locations/{location_id}",
    params(
        ("location_id" = String, Path, description = "Location UUID or name"),
    ),
    responses(
        (status = 200, description = "Location retrieved successfully", body = LocationResponse),
        (status = 404, description = "Location not found"),
    ),
    tag = "locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> AppResult<Json<LocationResponse>> {
    let location = resolve_location(&state.db, &location_id).await?;
    Ok(Json(location.into()))
}

/// Create a location
#[utoipa::path(
    post,
    path = "/api/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid or duplicate name"),
    ),
    tag = "locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(body): Json<CreateLocationRequest>,
) -> AppResult<(StatusCode, Json<LocationResponse>)> {
    let name = require_name(&body.name)?;

    let created = locations::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.clone()),
        description: Set(body.description),
        created_at: Set(Utc::now()),
    }
    .insert(&state.db)
    .await
    .map_err(|e| duplicate_name(e, &name))?;

    tracing::info!(location_id = %created.id, name = %created.name, "Location created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Update a location
#[utoipa::path(
    put,
    path = "/api/locations/{location_id}",
    params(
        ("location_id" = String, Path, description = "Location UUID or name"),
    ),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 400, description = "Invalid or duplicate name"),
        (status = 404, description = "Location not found"),
    ),
    tag = "locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Json(body): Json<UpdateLocationRequest>,
) -> AppResult<Json<LocationResponse>> {
    let name = body.name.as_deref().map(require_name).transpose()?;
    let existing = resolve_location(&state.db, &location_id).await?;

    let mut model = existing.into_active_model();
    if let Some(name) = &name {
        model.name = Set(name.clone());
    }
    if let Some(description) = body.description {
        model.description = Set(Some(description));
    }

    let updated = model
        .update(&state.db)
        .await
        .map_err(|e| duplicate_name(e, name.as_deref().unwrap_or_default()))?;

    tracing::info!(location_id = %updated.id, "Location updated");
    Ok(Json(updated.into()))
}

/// Delete a location that no device references
#[utoipa::path(
    delete,
    path = "/api/locations/{location_id}",
    params(
        ("location_id" = String, Path, description = "Location UUID or name"),
    ),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 400, description = "Location still has devices"),
        (status = 404, description = "Location not found"),
    ),
    tag = "locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> AppResult<StatusCode> {
    let location = resolve_location(&state.db, &location_id).await?;

    let device_count = devices::Entity::find()
        .filter(devices::Column::LocationId.eq(location.id))
        .count(&state.db)
        .await?;
    if device_count > 0 {
        return Err(AppError::Validation(format!(
            "Location '{}' still has {device_count} device(s)",
            location.name
        )));
    }

    let id = location.id;
    location.delete(&state.db).await?;
    tracing::info!(location_id = %id, "Location deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn require_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn duplicate_name(err: DbErr, name: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Validation(format!("Location '{name}' already exists"))
        }
        _ => AppError::Database(err),
    }
}
