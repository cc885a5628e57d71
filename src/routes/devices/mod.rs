mod handlers;
mod types;

pub use handlers::{
    create_device, delete_device, get_device, list_actuators, list_devices, list_sensors,
    set_actuator_state, update_device, validate_endpoint,
};
pub use types::{
    ActuatorStateRequest, CreateDeviceRequest, DeviceDetails, DeviceListQuery, DeviceResponse,
    DevicesQuery, UpdateDeviceRequest,
};

// Re-export utoipa path structs for OpenAPI documentation
pub use handlers::{
    __path_create_device, __path_delete_device, __path_get_device, __path_list_actuators,
    __path_list_devices, __path_list_sensors, __path_set_actuator_state, __path_update_device,
};
