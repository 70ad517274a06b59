//! Error types for the telemetry engine

use device_catalog::CatalogError;
use thiserror::Error;

/// Result type for telemetry engine operations
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors that can occur in the telemetry engine
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SimulationError {
    /// Configuration errors are fatal and must never be retried
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            SimulationError::Catalog(
                CatalogError::UnknownType(_)
                    | CatalogError::DuplicateDevice(_)
                    | CatalogError::InvalidRange { .. }
            ) | SimulationError::Config(_)
        )
    }
}
