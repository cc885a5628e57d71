//! IoT Monitor - device monitoring with threshold-based alerting
//!
//! This library exposes the core modules for testing and reuse.

pub mod alerting;
pub mod common;
pub mod config;
pub mod device;
pub mod entity;
pub mod error;
pub mod routes;
pub mod services;
pub mod sync;
