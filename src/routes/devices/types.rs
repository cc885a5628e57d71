use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::{DeviceKind, devices};

/// Kind-specific attributes, tagged by `kind` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DeviceDetails {
    Sensor {
        measurement_type: String,
        unit: String,
        /// Pull endpoint; sensors without one only receive manual readings
        #[serde(default)]
        endpoint_url: Option<String>,
    },
    Actuator {
        actuator_type: String,
        #[serde(default)]
        is_on: bool,
    },
}

impl DeviceDetails {
    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Sensor { .. } => DeviceKind::Sensor,
            Self::Actuator { .. } => DeviceKind::Actuator,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceResponse {
    pub id: Uuid,
    pub name: String,
    pub location_id: Option<Uuid>,
    pub is_active: bool,
    #[serde(flatten)]
    pub details: DeviceDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<devices::Model> for DeviceResponse {
    fn from(d: devices::Model) -> Self {
        let details = match d.kind {
            DeviceKind::Sensor => DeviceDetails::Sensor {
                measurement_type: d.measurement_type.unwrap_or_default(),
                unit: d.unit.unwrap_or_default(),
                endpoint_url: d.endpoint_url,
            },
            DeviceKind::Actuator => DeviceDetails::Actuator {
                actuator_type: d.actuator_type.unwrap_or_default(),
                is_on: d.is_on.unwrap_or(false),
            },
        };

        Self {
            id: d.id,
            name: d.name,
            location_id: d.location_id,
            is_active: d.is_active,
            details,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDeviceRequest {
    pub name: String,
    pub location_id: Option<Uuid>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(flatten)]
    pub details: DeviceDetails,
}

fn default_active() -> bool {
    true
}

/// Partial update; absent fields are left unchanged. The device kind is
/// fixed at creation, and fields of the other kind are rejected.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDeviceRequest {
    pub name: Option<String>,
    pub location_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub measurement_type: Option<String>,
    pub unit: Option<String>,
    pub endpoint_url: Option<String>,
    pub actuator_type: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActuatorStateRequest {
    pub is_on: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DevicesQuery {
    /// Filter by device kind
    pub kind: Option<DeviceKind>,
    /// Filter by location UUID
    pub location_id: Option<Uuid>,
    /// Include inactive devices (default: false)
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DeviceListQuery {
    /// Filter by location UUID
    pub location_id: Option<Uuid>,
    /// Include inactive devices (default: false)
    #[serde(default)]
    pub include_inactive: bool,
}
