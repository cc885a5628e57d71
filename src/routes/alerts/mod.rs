mod handlers;
mod types;

pub use handlers::{acknowledge_alert, dashboard, get_alert, list_sensor_alerts, resolve_alert};
pub use types::{
    AlertActionRequest, AlertDetailsResponse, AlertResponse, SensorAlertsQuery, SensorRef,
    ThresholdSnapshot, format_duration,
};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_acknowledge_alert, __path_dashboard, __path_get_alert, __path_list_sensor_alerts,
    __path_resolve_alert,
};
