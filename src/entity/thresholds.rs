use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{Severity, ThresholdKind};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "thresholds")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sensor_id: Uuid,
    pub kind: ThresholdKind,
    pub severity: Severity,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub value: Decimal,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Whether `reading` lies outside this threshold. Comparison is strict
    /// and exact: a reading equal to the threshold is within bounds.
    #[must_use]
    pub fn is_breached_by(&self, reading: Decimal) -> bool {
        match self.kind {
            ThresholdKind::Minimum => reading < self.value,
            ThresholdKind::Maximum => reading > self.value,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::devices::Entity",
        from = "Column::SensorId",
        to = "super::devices::Column::Id"
    )]
    Sensor,
    #[sea_orm(has_many = "super::alerts::Entity")]
    Alerts,
}

impl Related<super::devices::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sensor.def()
    }
}

impl Related<super::alerts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
