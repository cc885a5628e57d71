use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::{ReadingOrigin, readings};
use crate::routes::alerts::AlertResponse;
use crate::services::IngestedReading;

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingResponse {
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub value: Decimal,
    pub time: DateTime<Utc>,
    pub origin: ReadingOrigin,
}

impl From<readings::Model> for ReadingResponse {
    fn from(r: readings::Model) -> Self {
        Self {
            id: r.id,
            sensor_id: r.sensor_id,
            value: r.value,
            time: r.time,
            origin: r.origin,
        }
    }
}

/// Manual reading entry
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReadingRequest {
    /// Measured value, rounded to two decimals
    #[schema(value_type = Option<String>, example = "21.40")]
    pub value: Option<Decimal>,
    /// Measurement time (ISO 8601), defaults to now
    #[serde(alias = "timestamp")]
    pub time: Option<DateTime<Utc>>,
}

/// Stored reading plus the alert changes it caused
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub reading: ReadingResponse,
    pub alerts_created: Vec<AlertResponse>,
    pub alerts_resolved: Vec<AlertResponse>,
}

impl From<IngestedReading> for IngestResponse {
    fn from(ingested: IngestedReading) -> Self {
        Self {
            reading: ingested.reading.into(),
            alerts_created: ingested
                .evaluation
                .created
                .into_iter()
                .map(AlertResponse::from)
                .collect(),
            alerts_resolved: ingested
                .evaluation
                .resolved
                .into_iter()
                .map(AlertResponse::from)
                .collect(),
        }
    }
}

/// Correction of a stored reading. Does not re-run alert evaluation.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReadingRequest {
    #[schema(value_type = Option<String>, example = "21.40")]
    pub value: Option<Decimal>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ReadingsQuery {
    /// Start of time range (ISO 8601)
    pub start: Option<DateTime<Utc>>,
    /// End of time range (ISO 8601)
    pub end: Option<DateTime<Utc>>,
    /// Maximum number of readings, newest first (max 10000)
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_limit() -> u64 {
    500
}
