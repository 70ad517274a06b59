//! # TelemetryEngine
//!
//! Stateful synthetic telemetry for simulated industrial devices.
//!
//! The engine keeps per-device state across calls, advances it with bounded
//! random-walk dynamics and sticky online/offline flips, and derives device
//! snapshots, chart time series and KPI summaries from that state. All
//! randomness flows through an injectable [`RandomSource`], so seeded runs
//! replay exactly.

pub mod config;
pub mod engine;
pub mod error;
pub mod kpi;
pub mod metrics;
pub mod notifications;
pub mod random;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod timeseries;
pub mod transition;


pub use config::{
    KpiConfig, MetricWalkConfig, NotificationConfig, SeedingConfig, SimulationConfig,
    TimeSeriesConfig, TransitionConfig,
};
pub use engine::TelemetryEngine;
pub use error::{Result, SimulationError};
pub use kpi::{ChangeDirection, KpiSummary, KpiTrends, TrendDelta};
pub use metrics::{EngineMetrics, EngineMetricsSnapshot};
pub use notifications::{Notification, NotificationFeed};
pub use random::{RandomSource, RngSource, StdRandom};
pub use snapshot::{sort_snapshots, DeviceSnapshot, SortDirection, SortKey, SortOrder};
pub use state::{DeviceState, DeviceStatus, Trend};
pub use store::DeviceStateStore;
pub use timeseries::{TimeSeriesPoint, TimeSeriesWindow};
pub use transition::Transition;

/// Re-export commonly used catalog types
pub use device_catalog::{CatalogError, DeviceCatalog, DeviceDescriptor, SensorType};

/// Current version of the TelemetryEngine
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default probability of a status flip per device per tick
pub const DEFAULT_FLIP_PROBABILITY: f64 = 0.05;

/// Default largest value change per tick
pub const DEFAULT_MAX_DRIFT: f64 = 5.0;

/// Default probability that a newly seeded device starts online
pub const DEFAULT_ONLINE_PROBABILITY: f64 = 0.85;

/// Default cap on the number of intervals in one chart series
pub const DEFAULT_MAX_WINDOW_SIZE: usize = 10_000;

/// Default "last seen" backdate window for offline devices (two hours)
pub const DEFAULT_OFFLINE_BACKDATE_MINUTES: u32 = 120;

/// Default notification feed capacity
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 50;
