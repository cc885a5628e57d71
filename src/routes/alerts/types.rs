use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::alerting::AlertDetails;
use crate::entity::{AlertStatus, Severity, ThresholdKind, alerts, devices, thresholds};

/// Alert as shown in lists and returned by lifecycle actions
#[derive(Debug, Serialize, ToSchema)]
pub struct AlertResponse {
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub threshold_id: Uuid,
    pub kind: ThresholdKind,
    pub severity: Severity,
    pub status: AlertStatus,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    /// Human-readable duration, "ongoing" while unresolved
    pub duration: String,
}

impl From<alerts::Model> for AlertResponse {
    fn from(a: alerts::Model) -> Self {
        let duration = format_duration(a.created_at, a.resolved_at);
        Self {
            id: a.id,
            sensor_id: a.sensor_id,
            threshold_id: a.threshold_id,
            kind: a.kind,
            severity: a.severity,
            status: a.status,
            message: a.message,
            created_at: a.created_at,
            acknowledged_at: a.acknowledged_at,
            resolved_at: a.resolved_at,
            duration,
        }
    }
}

/// Brief sensor reference for embedding in alert details
#[derive(Debug, Serialize, ToSchema)]
pub struct SensorRef {
    pub id: Uuid,
    pub name: String,
    pub measurement_type: Option<String>,
    pub unit: Option<String>,
    pub location_id: Option<Uuid>,
}

impl From<devices::Model> for SensorRef {
    fn from(d: devices::Model) -> Self {
        Self {
            id: d.id,
            name: d.name,
            measurement_type: d.measurement_type,
            unit: d.unit,
            location_id: d.location_id,
        }
    }
}

/// Current state of the threshold an alert was raised from
#[derive(Debug, Serialize, ToSchema)]
pub struct ThresholdSnapshot {
    pub id: Uuid,
    pub kind: ThresholdKind,
    pub severity: Severity,
    pub value: Decimal,
    pub is_active: bool,
}

impl From<thresholds::Model> for ThresholdSnapshot {
    fn from(t: thresholds::Model) -> Self {
        Self {
            id: t.id,
            kind: t.kind,
            severity: t.severity,
            value: t.value,
            is_active: t.is_active,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AlertDetailsResponse {
    #[serde(flatten)]
    pub alert: AlertResponse,
    pub sensor: Option<SensorRef>,
    pub threshold: Option<ThresholdSnapshot>,
}

impl From<AlertDetails> for AlertDetailsResponse {
    fn from(details: AlertDetails) -> Self {
        Self {
            alert: details.alert.into(),
            sensor: details.sensor.map(SensorRef::from),
            threshold: details.threshold.map(ThresholdSnapshot::from),
        }
    }
}

/// Query parameters for a sensor's alert history
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SensorAlertsQuery {
    /// Filter by status (active, acknowledged, resolved)
    pub status: Option<AlertStatus>,
    /// Filter by threshold kind (minimum, maximum)
    pub kind: Option<ThresholdKind>,
}

/// Body of acknowledge/resolve requests
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct AlertActionRequest {
    /// Operator note appended to the alert message
    pub comment: Option<String>,
}

/// Format the time an alert has been (or was) open
pub fn format_duration(created_at: DateTime<Utc>, resolved_at: Option<DateTime<Utc>>) -> String {
    let Some(resolved_at) = resolved_at else {
        return "ongoing".to_string();
    };

    let total_secs = (resolved_at - created_at).num_seconds().max(0);
    let days = total_secs / 86400;
    let hours = (total_secs % 86400) / 3600;
    let mins = (total_secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {mins}m")
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{}m", mins.max(1))
    }
}
