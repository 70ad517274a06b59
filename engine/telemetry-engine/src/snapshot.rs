//! Device snapshots and device-table ordering

use crate::state::{DeviceState, DeviceStatus, Trend};
use chrono::{DateTime, Utc};
use device_catalog::{DeviceDescriptor, SensorTypeProfile};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Point-in-time view of one device: descriptor, live state and profile metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    #[serde(flatten)]
    pub device: DeviceDescriptor,

    pub status: DeviceStatus,

    /// Current reading, `None` while the device is offline
    pub value: Option<f64>,

    pub unit: String,
    pub icon: String,

    pub last_update: DateTime<Utc>,

    /// `last_update` rendered as `hh:mm:ss AM/PM`
    pub last_active: String,

    pub trend: Trend,
    pub alert_count: u32,
}

impl DeviceSnapshot {
    pub fn new(device: &DeviceDescriptor, state: &DeviceState, profile: &SensorTypeProfile) -> Self {
        Self {
            device: device.clone(),
            status: state.status,
            value: state.observed_value(),
            unit: profile.unit.clone(),
            icon: profile.icon.clone(),
            last_update: state.last_update,
            last_active: format_last_active(&state.last_update),
            trend: state.trend,
            alert_count: state.alert_count,
        }
    }

    pub fn id(&self) -> &str {
        &self.device.id
    }

    pub fn is_online(&self) -> bool {
        self.status.is_online()
    }
}

/// 12-hour clock label used by the device table
pub fn format_last_active(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%I:%M:%S %p").to_string()
}

/// Column a device table can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Id,
    Name,
    Status,
    Value,
    LastUpdate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Current ordering of a device table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self { key: SortKey::Id, direction: SortDirection::Ascending }
    }
}

impl SortOrder {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Ordering after a column header is clicked: the same key flips the
    /// direction, a different key starts ascending.
    pub fn toggle(self, key: SortKey) -> Self {
        if self.key == key && self.direction == SortDirection::Ascending {
            Self { key, direction: SortDirection::Descending }
        } else {
            Self { key, direction: SortDirection::Ascending }
        }
    }

    fn compare(&self, a: &DeviceSnapshot, b: &DeviceSnapshot) -> Ordering {
        let ordering = match self.key {
            SortKey::Id => a.device.id.cmp(&b.device.id),
            SortKey::Name => a.device.name.cmp(&b.device.name),
            SortKey::Status => a.status.cmp(&b.status),
            SortKey::Value => compare_values(a.value, b.value),
            SortKey::LastUpdate => a.last_update.cmp(&b.last_update),
        };

        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

// Missing readings sort before any number
fn compare_values(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable sort of snapshots by the given order
pub fn sort_snapshots(snapshots: &mut [DeviceSnapshot], order: SortOrder) {
    snapshots.sort_by(|a, b| order.compare(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use device_catalog::DeviceCatalog;

    fn snapshots() -> Vec<DeviceSnapshot> {
        let catalog = DeviceCatalog::default_catalog();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 13, 5, 9).unwrap();

        catalog
            .list_devices()
            .iter()
            .take(3)
            .enumerate()
            .map(|(i, device)| {
                let profile = catalog.profile_for_device(device).unwrap();
                let status = if i == 1 { DeviceStatus::Offline } else { DeviceStatus::Online };
                let state = DeviceState::new(
                    profile.max - i as f64,
                    status,
                    base + chrono::Duration::minutes(i as i64),
                );
                DeviceSnapshot::new(device, &state, profile)
            })
            .collect()
    }

    #[test]
    fn test_snapshot_hides_offline_value() {
        let snapshots = snapshots();
        assert_eq!(snapshots[0].value, Some(85.0));
        assert_eq!(snapshots[1].value, None);
        assert_eq!(snapshots[1].unit, "V");
    }

    #[test]
    fn test_last_active_format() {
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 1, 13, 5, 9).unwrap();
        assert_eq!(format_last_active(&timestamp), "01:05:09 PM");
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(&snapshots()[1]).unwrap();
        assert_eq!(json["id"], "DEV-1002");
        assert_eq!(json["status"], "Offline");
        assert!(json["value"].is_null());
        assert_eq!(json["lastActive"], "01:06:09 PM");
    }

    #[test]
    fn test_sort_toggle() {
        let order = SortOrder::default();
        let order = order.toggle(SortKey::Id);
        assert_eq!(order.direction, SortDirection::Descending);

        let order = order.toggle(SortKey::Id);
        assert_eq!(order.direction, SortDirection::Ascending);

        let order = order.toggle(SortKey::Name).toggle(SortKey::Value);
        assert_eq!(order, SortOrder::new(SortKey::Value, SortDirection::Ascending));
    }

    #[test]
    fn test_sort_by_value_puts_offline_first() {
        let mut snapshots = snapshots();

        sort_snapshots(&mut snapshots, SortOrder::new(SortKey::Value, SortDirection::Ascending));
        let ids: Vec<&str> = snapshots.iter().map(|s| s.id()).collect();
        // Pressure max 70 - 2 = 68 < temperature 85
        assert_eq!(ids, vec!["DEV-1002", "DEV-1003", "DEV-1001"]);

        sort_snapshots(&mut snapshots, SortOrder::new(SortKey::Id, SortDirection::Descending));
        let ids: Vec<&str> = snapshots.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["DEV-1003", "DEV-1002", "DEV-1001"]);
    }
}
