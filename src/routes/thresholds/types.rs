use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::{Severity, ThresholdKind, thresholds};

#[derive(Debug, Serialize, ToSchema)]
pub struct ThresholdResponse {
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub kind: ThresholdKind,
    pub severity: Severity,
    pub value: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<thresholds::Model> for ThresholdResponse {
    fn from(t: thresholds::Model) -> Self {
        Self {
            id: t.id,
            sensor_id: t.sensor_id,
            kind: t.kind,
            severity: t.severity,
            value: t.value,
            is_active: t.is_active,
            created_at: t.created_at,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ThresholdsQuery {
    /// Filter by sensor ID
    pub sensor_id: Option<Uuid>,
    /// Filter by active flag
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}
