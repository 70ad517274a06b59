//! Configuration for the streaming driver

use crate::error::StreamError;
use crate::DEFAULT_STREAM_INTERVAL_MS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a telemetry stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Delay between deliveries in milliseconds
    pub interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self { interval_ms: DEFAULT_STREAM_INTERVAL_MS }
    }
}

impl StreamConfig {
    /// Get delivery interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.interval_ms == 0 {
            return Err(StreamError::InvalidInterval(self.interval()));
        }
        Ok(())
    }
}
