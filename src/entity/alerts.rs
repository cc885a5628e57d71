use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{AlertStatus, Severity, ThresholdKind};

/// Alert raised when a reading breaches a threshold.
///
/// `kind` and `severity` are copied from the threshold when the alert is
/// created and are never refreshed afterwards.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub threshold_id: Uuid,
    pub kind: ThresholdKind,
    pub severity: Severity,
    pub status: AlertStatus,
    pub message: Option<String>,
    pub created_at: DateTimeUtc,
    pub acknowledged_at: Option<DateTimeUtc>,
    pub resolved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::devices::Entity",
        from = "Column::SensorId",
        to = "super::devices::Column::Id"
    )]
    Sensor,
    #[sea_orm(
        belongs_to = "super::thresholds::Entity",
        from = "Column::ThresholdId",
        to = "super::thresholds::Column::Id"
    )]
    Threshold,
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensor.def()
    }
}

impl Related<super::thresholds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Threshold.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
