mod handlers;
mod types;

pub use handlers::{
    create_threshold, delete_threshold, get_threshold, list_sensor_thresholds, list_thresholds,
    set_threshold_active, update_threshold,
};
pub use types::{SetActiveRequest, ThresholdResponse, ThresholdsQuery};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_create_threshold, __path_delete_threshold, __path_get_threshold,
    __path_list_sensor_thresholds, __path_list_thresholds, __path_set_threshold_active,
    __path_update_threshold,
};
