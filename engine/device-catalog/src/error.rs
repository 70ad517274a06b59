//! Error types for the device catalog

use crate::types::SensorType;
use thiserror::Error;

/// Errors that can occur while building or querying the catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("No sensor-type profile registered for {0}")]
    UnknownType(SensorType),

    #[error("Device '{0}' not found in catalog")]
    UnknownDevice(String),

    #[error("Device '{0}' is registered more than once")]
    DuplicateDevice(String),

    #[error("Profile for {sensor_type} has an invalid range [{min}, {max}]")]
    InvalidRange { sensor_type: SensorType, min: f64, max: f64 },

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),
}
