mod handlers;
mod types;

pub use handlers::{
    create_location, delete_location, get_location, list_locations, update_location,
};
pub use types::{CreateLocationRequest, LocationResponse, UpdateLocationRequest};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_create_location, __path_delete_location, __path_get_location, __path_list_locations,
    __path_update_location,
};
