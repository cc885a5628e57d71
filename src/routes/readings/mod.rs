mod handlers;
mod types;

pub use handlers::{
    create_sensor_reading, delete_reading, get_reading, list_sensor_readings, update_reading,
};
pub use types::{
    CreateReadingRequest, IngestResponse, ReadingResponse, ReadingsQuery, UpdateReadingRequest,
};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_create_sensor_reading, __path_delete_reading, __path_get_reading,
    __path_list_sensor_readings, __path_update_reading,
};
