//! Manual alert transitions and alert queries.
//!
//! ```text
//! Active --acknowledge--> Acknowledged --resolve--> Resolved
//! Active --resolve----------------------------------> Resolved
//! ```
//!
//! Resolved is terminal. Every transition is written with a compare-and-swap
//! on the previous status, so two operators acting on the same alert cannot
//! both succeed.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::alerting::store::{AlertFilter, AlertStore};
use crate::entity::{AlertStatus, ThresholdKind, alerts, devices, thresholds};
use crate::error::{AppError, AppResult};

/// Longest operator comment accepted on acknowledge/resolve.
pub const MAX_COMMENT_LEN: usize = 500;

/// An alert together with the sensor and threshold it refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDetails {
    pub alert: alerts::Model,
    pub sensor: Option<devices::Model>,
    pub threshold: Option<thresholds::Model>,
}

/// Acknowledge an active alert.
///
/// # Errors
///
/// `NotFound` if the alert does not exist, `InvalidStateTransition` unless it
/// is Active, `Validation` for an oversized comment.
pub async fn acknowledge<S>(store: &S, alert_id: Uuid, comment: Option<&str>) -> AppResult<alerts::Model>
where
    S: AlertStore + ?Sized,
{
    acknowledge_at(store, alert_id, comment, Utc::now()).await
}

/// [`acknowledge`] with an explicit clock.
///
/// # Errors
///
/// See [`acknowledge`].
pub async fn acknowledge_at<S>(
    store: &S,
    alert_id: Uuid,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<alerts::Model>
where
    S: AlertStore + ?Sized,
{
    let comment = validate_comment(comment)?;
    let alert = load(store, alert_id).await?;

    if alert.status != AlertStatus::Active {
        return Err(AppError::invalid_transition(alert_id, alert.status, "acknowledge"));
    }

    let expected = alert.status;
    let message = with_comment(alert.message.clone(), "Acknowledged", comment);
    let updated = alerts::Model {
        status: AlertStatus::Acknowledged,
        acknowledged_at: Some(now),
        message,
        ..alert
    };

    commit(store, updated, expected, "acknowledge").await
}

/// Resolve an active or acknowledged alert.
///
/// # Errors
///
/// `NotFound` if the alert does not exist, `InvalidStateTransition` if it is
/// already resolved, `Validation` for an oversized comment.
pub async fn resolve<S>(store: &S, alert_id: Uuid, comment: Option<&str>) -> AppResult<alerts::Model>
where
    S: AlertStore + ?Sized,
{
    resolve_at(store, alert_id, comment, Utc::now()).await
}

/// [`resolve`] with an explicit clock.
///
/// # Errors
///
/// See [`resolve`].
pub async fn resolve_at<S>(
    store: &S,
    alert_id: Uuid,
    comment: Option<&str>,
    now: DateTime<Utc>,
) -> AppResult<alerts::Model>
where
    S: AlertStore + ?Sized,
{
    let comment = validate_comment(comment)?;
    let alert = load(store, alert_id).await?;

    if !alert.status.is_open() {
        return Err(AppError::invalid_transition(alert_id, alert.status, "resolve"));
    }

    let expected = alert.status;
    let message = with_comment(alert.message.clone(), "Resolved", comment);
    let updated = alerts::Model {
        status: AlertStatus::Resolved,
        resolved_at: Some(now),
        message,
        ..alert
    };

    commit(store, updated, expected, "resolve").await
}

/// Alert with its sensor and threshold snapshot.
///
/// # Errors
///
/// `NotFound` if the alert does not exist.
pub async fn get_details<S>(store: &S, alert_id: Uuid) -> AppResult<AlertDetails>
where
    S: AlertStore + ?Sized,
{
    let alert = load(store, alert_id).await?;
    let sensor = store.get_device(alert.sensor_id).await?;
    let threshold = store.get_threshold(alert.threshold_id).await?;

    Ok(AlertDetails {
        alert,
        sensor,
        threshold,
    })
}

/// All currently Active alerts, newest first.
///
/// # Errors
///
/// Propagates storage failures.
pub async fn dashboard<S>(store: &S) -> AppResult<Vec<alerts::Model>>
where
    S: AlertStore + ?Sized,
{
    store
        .list_alerts(&AlertFilter {
            status: Some(AlertStatus::Active),
            ..AlertFilter::default()
        })
        .await
}

/// Alerts of one sensor, optionally narrowed by status and kind.
///
/// # Errors
///
/// `NotFound` if the sensor does not exist.
pub async fn alerts_for_sensor<S>(
    store: &S,
    sensor_id: Uuid,
    status: Option<AlertStatus>,
    kind: Option<ThresholdKind>,
) -> AppResult<Vec<alerts::Model>>
where
    S: AlertStore + ?Sized,
{
    match store.get_device(sensor_id).await? {
        Some(device) if device.is_sensor() => {}
        _ => return Err(AppError::NotFound(format!("Sensor '{sensor_id}' not found"))),
    }

    store
        .list_alerts(&AlertFilter {
            sensor_id: Some(sensor_id),
            status,
            kind,
        })
        .await
}

async fn load<S>(store: &S, alert_id: Uuid) -> AppResult<alerts::Model>
where
    S: AlertStore + ?Sized,
{
    store
        .get_alert(alert_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Alert '{alert_id}' not found")))
}

async fn commit<S>(
    store: &S,
    updated: alerts::Model,
    expected: AlertStatus,
    action: &'static str,
) -> AppResult<alerts::Model>
where
    S: AlertStore + ?Sized,
{
    if store.update_alert(&updated, expected).await? {
        tracing::info!(
            alert_id = %updated.id,
            status = updated.status.as_str(),
            "Alert {action}d"
        );
        return Ok(updated);
    }

    // Someone else moved the alert since we read it; report its current state
    let current = load(store, updated.id).await?;
    Err(AppError::invalid_transition(updated.id, current.status, action))
}

fn validate_comment(comment: Option<&str>) -> AppResult<Option<&str>> {
    let Some(comment) = comment.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };
    if comment.chars().count() > MAX_COMMENT_LEN {
        return Err(AppError::Validation(format!(
            "comment must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(Some(comment))
}

fn with_comment(message: Option<String>, label: &str, comment: Option<&str>) -> Option<String> {
    match (message, comment) {
        (Some(message), Some(comment)) => Some(format!("{message} | {label}: {comment}")),
        (None, Some(comment)) => Some(format!("{label}: {comment}")),
        (message, None) => message,
    }
}
