//! Error types for the streaming driver

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when starting a stream
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("Invalid stream interval: {0:?} (must be greater than zero)")]
    InvalidInterval(Duration),

    #[error("No tokio runtime available to drive the stream")]
    NoRuntime,
}
