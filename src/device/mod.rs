mod client;
pub mod models;

pub use client::{DeviceClient, ReadingSource, parse_reading};
pub use models::DeviceReading;
