//! Mutable per-device simulation state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Online/offline status of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceStatus {
    Online,
    Offline,
}

impl DeviceStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, DeviceStatus::Online)
    }

    pub fn inverted(&self) -> Self {
        match self {
            DeviceStatus::Online => DeviceStatus::Offline,
            DeviceStatus::Offline => DeviceStatus::Online,
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Online => write!(f, "Online"),
            DeviceStatus::Offline => write!(f, "Offline"),
        }
    }
}

/// Direction of the most recent value change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

/// Simulation state of one device, owned by the state store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceState {
    /// Last observed value, always within the device's profile range.
    /// Kept while the device is offline so it resumes from the same reading.
    pub value: f64,

    pub status: DeviceStatus,

    /// Time of the last reading ("last seen" for offline devices)
    pub last_update: DateTime<Utc>,

    pub trend: Trend,

    /// Alerts raised since the state was seeded
    pub alert_count: u32,
}

impl DeviceState {
    pub fn new(value: f64, status: DeviceStatus, last_update: DateTime<Utc>) -> Self {
        Self { value, status, last_update, trend: Trend::Up, alert_count: 0 }
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }

    /// Value a consumer may display: `None` while offline
    pub fn observed_value(&self) -> Option<f64> {
        self.is_online().then_some(self.value)
    }
}
