//! # TelemetryStream
//!
//! Periodic delivery of composite telemetry payloads.
//!
//! A [`StreamDriver`] runs each stream as its own cancellable tokio task.
//! Every interval the task advances the engine, builds a [`StreamPayload`]
//! of device snapshots and KPI figures and hands it to the subscriber.
//! Stopping a stream is synchronous: once [`StreamDriver::stop`] returns,
//! the subscriber is never called again for that stream.

pub mod config;
pub mod driver;
pub mod error;

#[cfg(test)]
mod tests;

pub use config::StreamConfig;
pub use driver::{StreamDriver, StreamHandle, StreamPayload, StreamStats};
pub use error::StreamError;

/// Current version of the TelemetryStream
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default delay between deliveries, matching the device table refresh
pub const DEFAULT_STREAM_INTERVAL_MS: u64 = 5000;
