//! Threshold registry: per-sensor min/max limits.
//!
//! The evaluator only ever reads [`active_for_sensor`]. Everything else here
//! is CRUD for the API layer and never runs during evaluation.
//!
//! A threshold that has raised alerts cannot be deleted, only deactivated, so
//! alert history always points at an existing threshold.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::alerting::store::AlertStore;
use crate::common::values::normalize_value;
use crate::entity::{Severity, ThresholdKind, devices, thresholds};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewThreshold {
    pub sensor_id: Uuid,
    pub kind: ThresholdKind,
    pub severity: Severity,
    #[schema(value_type = String, example = "15.00")]
    pub value: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update; absent fields are left unchanged.
///
/// Editing a threshold does not touch alerts already raised from it: those
/// keep the kind and severity copied at creation time.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ThresholdUpdate {
    pub kind: Option<ThresholdKind>,
    pub severity: Option<Severity>,
    #[schema(value_type = Option<String>, example = "18.00")]
    pub value: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// Active thresholds of a sensor, oldest first.
///
/// # Errors
///
/// Returns an error if the store query fails.
pub async fn active_for_sensor<S>(store: &S, sensor_id: Uuid) -> AppResult<Vec<thresholds::Model>>
where
    S: AlertStore + ?Sized,
{
    store.active_thresholds(sensor_id).await
}

/// # Errors
///
/// Returns an error if the store query fails.
pub async fn list<S>(
    store: &S,
    sensor_id: Option<Uuid>,
    is_active: Option<bool>,
) -> AppResult<Vec<thresholds::Model>>
where
    S: AlertStore + ?Sized,
{
    store.list_thresholds(sensor_id, is_active).await
}

/// # Errors
///
/// `NotFound` if no threshold has this id.
pub async fn get<S>(store: &S, id: Uuid) -> AppResult<thresholds::Model>
where
    S: AlertStore + ?Sized,
{
    store
        .get_threshold(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Threshold '{id}' not found")))
}

/// # Errors
///
/// `NotFound` if the sensor does not exist, `Validation` if the device is an
/// actuator or the value does not fit `NUMERIC(10, 2)`.
pub async fn create<S>(store: &S, new: NewThreshold) -> AppResult<thresholds::Model>
where
    S: AlertStore + ?Sized,
{
    require_sensor(store, new.sensor_id).await?;
    let value = normalize_value(new.value, "value")?;

    let created = store
        .insert_threshold(thresholds::Model {
            id: Uuid::new_v4(),
            sensor_id: new.sensor_id,
            kind: new.kind,
            severity: new.severity,
            value,
            is_active: new.is_active,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(
        threshold_id = %created.id,
        sensor_id = %created.sensor_id,
        kind = created.kind.as_str(),
        severity = created.severity.as_str(),
        value = %created.value,
        "Threshold created"
    );
    Ok(created)
}

/// # Errors
///
/// `NotFound` if the threshold does not exist, `Validation` for an
/// out-of-range value.
pub async fn update<S>(store: &S, id: Uuid, changes: ThresholdUpdate) -> AppResult<thresholds::Model>
where
    S: AlertStore + ?Sized,
{
    let existing = get(store, id).await?;
    let value = changes
        .value
        .map(|v| normalize_value(v, "value"))
        .transpose()?;

    let updated = store
        .save_threshold(thresholds::Model {
            kind: changes.kind.unwrap_or(existing.kind),
            severity: changes.severity.unwrap_or(existing.severity),
            value: value.unwrap_or(existing.value),
            is_active: changes.is_active.unwrap_or(existing.is_active),
            ..existing
        })
        .await?;

    tracing::info!(threshold_id = %updated.id, "Threshold updated");
    Ok(updated)
}

/// Toggle the active flag.
///
/// # Errors
///
/// `NotFound` if the threshold does not exist.
pub async fn set_active<S>(store: &S, id: Uuid, is_active: bool) -> AppResult<thresholds::Model>
where
    S: AlertStore + ?Sized,
{
    update(
        store,
        id,
        ThresholdUpdate {
            is_active: Some(is_active),
            ..ThresholdUpdate::default()
        },
    )
    .await
}

/// Delete a threshold that has never raised an alert.
///
/// # Errors
///
/// `NotFound` if the threshold does not exist, `Validation` while any alert,
/// resolved or not, still references it.
pub async fn delete<S>(store: &S, id: Uuid) -> AppResult<()>
where
    S: AlertStore + ?Sized,
{
    get(store, id).await?;

    let raised = store.count_alerts_for_threshold(id).await?;
    if raised > 0 {
        return Err(AppError::Validation(format!(
            "Threshold '{id}' has {raised} alert(s); deactivate it instead"
        )));
    }

    store.delete_threshold(id).await?;
    tracing::info!(threshold_id = %id, "Threshold deleted");
    Ok(())
}

/// Load a device and make sure it is a sensor.
///
/// # Errors
///
/// `NotFound` if the device does not exist, `Validation` if it is an actuator.
pub async fn require_sensor<S>(store: &S, id: Uuid) -> AppResult<devices::Model>
where
    S: AlertStore + ?Sized,
{
    let device = store
        .get_device(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Sensor '{id}' not found")))?;
    ensure_sensor(device)
}

/// # Errors
///
/// `Validation` if `device` is an actuator.
pub fn ensure_sensor(device: devices::Model) -> AppResult<devices::Model> {
    if !device.is_sensor() {
        return Err(AppError::Validation(format!(
            "Device '{}' is an actuator, not a sensor",
            device.id
        )));
    }
    Ok(device)
}
