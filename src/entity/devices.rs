use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DeviceKind;

/// Sensors and actuators in one table. Sensor-only columns are `None` for
/// actuators and the other way round.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "devices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub kind: DeviceKind,
    pub name: String,
    pub location_id: Option<Uuid>,
    pub is_active: bool,
    // Sensor
    pub measurement_type: Option<String>,
    pub unit: Option<String>,
    pub endpoint_url: Option<String>,
    // Actuator
    pub actuator_type: Option<String>,
    pub is_on: Option<bool>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl Model {
    #[must_use]
    pub fn is_sensor(&self) -> bool {
        self.kind == DeviceKind::Sensor
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::locations::Entity",
        from = "Column::LocationId",
        to = "super::locations::Column::Id"
    )]
    Location,
    #[sea_orm(has_many = "super::readings::Entity")]
    Readings,
    #[sea_orm(has_many = "super::thresholds::Entity")]
    Thresholds,
    #[sea_orm(has_many = "super::alerts::Entity")]
    Alerts,
}

impl Related<super::locations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

impl Related<super::readings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Readings.def()
    }
}

impl Related<super::thresholds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Thresholds.def()
    }
}

impl Related<super::alerts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Alerts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
