//! Device Catalog - static registry of simulated IoT devices
//!
//! Holds the immutable device descriptors and the per-sensor-type profiles
//! (unit, icon, valid value range) that the telemetry engine simulates
//! against.

pub mod catalog;
pub mod error;
pub mod types;

pub use catalog::{default_profiles, CatalogFile, DeviceCatalog};
pub use error::CatalogError;
pub use types::{Criticality, DeviceDescriptor, SensorType, SensorTypeProfile};
