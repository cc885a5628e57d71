//! Reading ingestion: validate, persist, evaluate.
//!
//! Shared by the manual API endpoint and the sensor poller. Validation
//! happens before anything is written.
//!
//! # Failure after the insert
//!
//! Persisting the reading and evaluating it are two separate writes with no
//! transaction around them. The reading is committed first, so if evaluation
//! then fails the caller gets the error but the reading stays stored. Callers
//! must not retry the whole ingestion on such an error: that stores the
//! same measurement twice. The failed reading's id is logged, and
//! [`crate::alerting::evaluate_reading`] can be re-run on the stored reading
//! because evaluation is idempotent.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::alerting::thresholds::require_sensor;
use crate::alerting::{AlertStore, EvaluationOutcome, evaluate_reading_at};
use crate::common::values::normalize_value;
use crate::entity::{ReadingOrigin, readings};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct NewReading {
    pub sensor_id: Uuid,
    /// Optional so a missing value surfaces as a validation error rather than
    /// a deserialization failure.
    pub value: Option<Decimal>,
    /// Defaults to the ingestion time.
    pub time: Option<DateTime<Utc>>,
    pub origin: ReadingOrigin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedReading {
    pub reading: readings::Model,
    pub evaluation: EvaluationOutcome,
}

/// Store a reading and run alert evaluation on it.
///
/// # Errors
///
/// - `Validation` if the value is missing or out of range, or the device is
///   an actuator
/// - `NotFound` if the sensor does not exist
/// - `Database` if persisting the reading or any alert change fails. In the
///   second case the reading is already stored.
pub async fn ingest_reading<S>(store: &S, new: NewReading) -> AppResult<IngestedReading>
where
    S: AlertStore + ?Sized,
{
    ingest_reading_at(store, new, Utc::now()).await
}

/// [`ingest_reading`] with an explicit clock.
///
/// # Errors
///
/// See [`ingest_reading`].
pub async fn ingest_reading_at<S>(
    store: &S,
    new: NewReading,
    now: DateTime<Utc>,
) -> AppResult<IngestedReading>
where
    S: AlertStore + ?Sized,
{
    let value = new
        .value
        .ok_or_else(|| AppError::Validation("value is required".to_string()))?;
    let value = normalize_value(value, "value")?;

    let sensor = require_sensor(store, new.sensor_id).await?;

    let reading = store
        .insert_reading(readings::Model {
            id: Uuid::new_v4(),
            sensor_id: sensor.id,
            value,
            time: new.time.unwrap_or(now),
            origin: new.origin,
        })
        .await?;

    let evaluation = evaluate_reading_at(store, &reading, now)
        .await
        .inspect_err(|e| {
            tracing::warn!(
                reading_id = %reading.id,
                sensor_id = %reading.sensor_id,
                error = %e,
                "Reading stored but alert evaluation failed"
            );
        })?;

    tracing::debug!(
        reading_id = %reading.id,
        sensor_id = %reading.sensor_id,
        value = %reading.value,
        origin = ?reading.origin,
        alerts_created = evaluation.created.len(),
        alerts_resolved = evaluation.resolved.len(),
        "Reading ingested"
    );

    Ok(IngestedReading {
        reading,
        evaluation,
    })
}
