pub mod alerts;
pub mod devices;
pub mod locations;
pub mod readings;
pub mod sea_orm_active_enums;
pub mod thresholds;

pub use sea_orm_active_enums::{AlertStatus, DeviceKind, ReadingOrigin, Severity, ThresholdKind};
