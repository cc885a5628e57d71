//! Threshold evaluation for newly ingested readings.
//!
//! For every active threshold of the reading's sensor:
//!
//! - breached (`value < min` or `value > max`): make sure exactly one open
//!   alert exists for `(sensor, threshold, severity)`;
//! - not breached: resolve whatever alert is still open for
//!   `(sensor, threshold)`.
//!
//! Re-evaluating the same reading is a no-op. Storage errors are returned to
//! the caller untouched; retrying is the caller's business.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::alerting::store::AlertStore;
use crate::alerting::thresholds::active_for_sensor;
use crate::entity::{AlertStatus, ThresholdKind, alerts, readings, thresholds};
use crate::error::AppResult;

/// What a single evaluation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationOutcome {
    /// Alerts opened by this reading.
    pub created: Vec<alerts::Model>,
    /// Alerts closed by this reading, in their resolved state.
    pub resolved: Vec<alerts::Model>,
}

impl EvaluationOutcome {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.resolved.is_empty()
    }
}

/// Evaluate `reading` against its sensor's active thresholds, timestamped now.
///
/// # Errors
///
/// Propagates any storage failure.
pub async fn evaluate_reading<S>(store: &S, reading: &readings::Model) -> AppResult<EvaluationOutcome>
where
    S: AlertStore + ?Sized,
{
    evaluate_reading_at(store, reading, Utc::now()).await
}

/// Same as [`evaluate_reading`] with an explicit clock.
///
/// # Errors
///
/// Propagates any storage failure.
pub async fn evaluate_reading_at<S>(
    store: &S,
    reading: &readings::Model,
    now: DateTime<Utc>,
) -> AppResult<EvaluationOutcome>
where
    S: AlertStore + ?Sized,
{
    let thresholds = active_for_sensor(store, reading.sensor_id).await?;
    let mut outcome = EvaluationOutcome::default();

    if thresholds.is_empty() {
        tracing::debug!(sensor_id = %reading.sensor_id, "No active thresholds");
        return Ok(outcome);
    }

    for threshold in &thresholds {
        if threshold.is_breached_by(reading.value) {
            if let Some(alert) = raise(store, reading, threshold, now).await? {
                outcome.created.push(alert);
            }
        } else {
            let resolved = clear(store, reading.sensor_id, threshold, now).await?;
            outcome.resolved.extend(resolved);
        }
    }

    tracing::debug!(
        sensor_id = %reading.sensor_id,
        value = %reading.value,
        thresholds = thresholds.len(),
        created = outcome.created.len(),
        resolved = outcome.resolved.len(),
        "Reading evaluated"
    );

    Ok(outcome)
}

/// Open an alert for a breached threshold unless one is already open.
async fn raise<S>(
    store: &S,
    reading: &readings::Model,
    threshold: &thresholds::Model,
    now: DateTime<Utc>,
) -> AppResult<Option<alerts::Model>>
where
    S: AlertStore + ?Sized,
{
    if let Some(existing) = store
        .find_open_alert(reading.sensor_id, threshold.id, threshold.severity)
        .await?
    {
        tracing::debug!(
            alert_id = %existing.id,
            threshold_id = %threshold.id,
            "Alert already open"
        );
        return Ok(None);
    }

    let candidate = alerts::Model {
        id: Uuid::new_v4(),
        sensor_id: reading.sensor_id,
        threshold_id: threshold.id,
        kind: threshold.kind,
        severity: threshold.severity,
        status: AlertStatus::Active,
        message: Some(breach_message(reading.value, threshold)),
        created_at: now,
        acknowledged_at: None,
        resolved_at: None,
    };
    let candidate_id = candidate.id;

    let stored = store.create_alert(candidate).await?;
    if stored.id != candidate_id {
        // A concurrent evaluation opened it between our lookup and insert
        return Ok(None);
    }

    tracing::info!(
        alert_id = %stored.id,
        sensor_id = %stored.sensor_id,
        threshold_id = %threshold.id,
        kind = threshold.kind.as_str(),
        severity = threshold.severity.as_str(),
        value = %reading.value,
        "Alert raised"
    );

    Ok(Some(stored))
}

/// Resolve every open alert of a threshold that is back within bounds.
async fn clear<S>(
    store: &S,
    sensor_id: Uuid,
    threshold: &thresholds::Model,
    now: DateTime<Utc>,
) -> AppResult<Vec<alerts::Model>>
where
    S: AlertStore + ?Sized,
{
    let open = store.open_alerts_for_threshold(sensor_id, threshold.id).await?;
    let mut resolved = Vec::with_capacity(open.len());

    for alert in open {
        let expected = alert.status;
        let closed = alerts::Model {
            status: AlertStatus::Resolved,
            resolved_at: Some(now),
            ..alert
        };

        if store.update_alert(&closed, expected).await? {
            tracing::info!(
                alert_id = %closed.id,
                sensor_id = %sensor_id,
                threshold_id = %threshold.id,
                "Alert resolved, value back within threshold"
            );
            resolved.push(closed);
        } else {
            tracing::debug!(alert_id = %closed.id, "Alert changed concurrently, skipping");
        }
    }

    Ok(resolved)
}

/// Human-readable description stored on new alerts,
/// e.g. `12.50 detected, below threshold of 15.00`.
#[must_use]
pub fn breach_message(value: Decimal, threshold: &thresholds::Model) -> String {
    let direction = match threshold.kind {
        ThresholdKind::Minimum => "below",
        ThresholdKind::Maximum => "above",
    };
    format!(
        "{value:.2} detected, {direction} threshold of {:.2}",
        threshold.value
    )
}
