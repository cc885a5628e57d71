use futures::{StreamExt, stream};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::alerting::AlertStore;
use crate::device::ReadingSource;
use crate::entity::{DeviceKind, ReadingOrigin, devices};
use crate::error::AppResult;
use crate::services::{NewReading, ingest_reading};

/// Counters for one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub polled: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub alerts_created: usize,
    pub alerts_resolved: usize,
}

/// Active sensors that expose a pull endpoint.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn pollable_sensors(db: &DatabaseConnection) -> AppResult<Vec<devices::Model>> {
    Ok(devices::Entity::find()
        .filter(devices::Column::Kind.eq(DeviceKind::Sensor))
        .filter(devices::Column::IsActive.eq(true))
        .filter(devices::Column::EndpointUrl.is_not_null())
        .order_by_asc(devices::Column::Name)
        .all(db)
        .await?)
}

/// Pull one value from each sensor and feed it through ingestion.
///
/// Sensors are independent: a failed fetch or ingestion is logged and
/// counted, and the remaining sensors still run. Nothing is retried within
/// the cycle. At most `concurrency` sensors are in flight at once.
pub async fn poll_sensors<S, R>(
    store: &S,
    source: &R,
    sensors: Vec<devices::Model>,
    concurrency: usize,
) -> PollSummary
where
    S: AlertStore + ?Sized,
    R: ReadingSource + ?Sized,
{
    let results: Vec<_> = stream::iter(sensors)
        .map(|sensor| async move {
            let outcome = poll_one(store, source, &sensor).await;
            (sensor, outcome)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut summary = PollSummary::default();
    for (sensor, outcome) in results {
        summary.polled += 1;
        match outcome {
            Ok((created, resolved)) => {
                summary.succeeded += 1;
                summary.alerts_created += created;
                summary.alerts_resolved += resolved;
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!(
                    sensor_id = %sensor.id,
                    name = %sensor.name,
                    error = %e,
                    "Failed to poll sensor"
                );
            }
        }
    }

    summary
}

async fn poll_one<S, R>(store: &S, source: &R, sensor: &devices::Model) -> AppResult<(usize, usize)>
where
    S: AlertStore + ?Sized,
    R: ReadingSource + ?Sized,
{
    let sample = source.fetch(sensor).await?;

    let ingested = ingest_reading(
        store,
        NewReading {
            sensor_id: sensor.id,
            value: Some(sample.value),
            time: sample.timestamp,
            origin: ReadingOrigin::Automatic,
        },
    )
    .await?;

    Ok((
        ingested.evaluation.created.len(),
        ingested.evaluation.resolved.len(),
    ))
}
