use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sensor family a simulated device belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SensorType {
    Temperature,
    Voltage,
    Pressure,
    Flow,
    Humidity,
    Power,
    Level,
    Speed,
}

impl SensorType {
    /// Every sensor type, in catalog display order
    pub const ALL: [SensorType; 8] = [
        SensorType::Temperature,
        SensorType::Voltage,
        SensorType::Pressure,
        SensorType::Flow,
        SensorType::Humidity,
        SensorType::Power,
        SensorType::Level,
        SensorType::Speed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorType::Temperature => "Temperature",
            SensorType::Voltage => "Voltage",
            SensorType::Pressure => "Pressure",
            SensorType::Flow => "Flow",
            SensorType::Humidity => "Humidity",
            SensorType::Power => "Power",
            SensorType::Level => "Level",
            SensorType::Speed => "Speed",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much an outage of the device matters to the plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criticality {
    Low,
    Medium,
    High,
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Criticality::Low => write!(f, "low"),
            Criticality::Medium => write!(f, "medium"),
            Criticality::High => write!(f, "high"),
        }
    }
}

/// A simulated device as registered in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    /// Unique device ID (e.g., "DEV-1001")
    pub id: String,

    /// Display name (e.g., "Temperature Sensor A1")
    pub name: String,

    /// Sensor type tag, used to look up the profile
    #[serde(rename = "type")]
    pub sensor_type: SensorType,

    /// Physical location label (e.g., "Boiler Room")
    pub location: String,

    pub criticality: Criticality,

    pub install_date: NaiveDate,
}

impl DeviceDescriptor {
    /// Create a new device descriptor
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sensor_type: SensorType,
        location: impl Into<String>,
        criticality: Criticality,
        install_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sensor_type,
            location: location.into(),
            criticality,
            install_date,
        }
    }

    pub fn is_critical(&self) -> bool {
        self.criticality == Criticality::High
    }
}

/// Display and range metadata shared by every device of one sensor type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorTypeProfile {
    pub sensor_type: SensorType,

    /// Human readable name (e.g., "Flow Rate")
    pub display_name: String,

    /// Material icon tag used by the dashboard
    pub icon: String,

    /// Unit string (e.g., "°C", "V")
    pub unit: String,

    /// Inclusive lower bound of valid readings
    pub min: f64,

    /// Inclusive upper bound of valid readings
    pub max: f64,
}

impl SensorTypeProfile {
    pub fn new(
        sensor_type: SensorType,
        display_name: impl Into<String>,
        icon: impl Into<String>,
        unit: impl Into<String>,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            sensor_type,
            display_name: display_name.into(),
            icon: icon.into(),
            unit: unit.into(),
            min,
            max,
        }
    }

    /// Clamp a reading into `[min, max]`
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_clamp() {
        let profile = SensorTypeProfile::new(
            SensorType::Temperature,
            "Temperature",
            "thermostat",
            "°C",
            18.0,
            85.0,
        );

        assert_eq!(profile.clamp(90.0), 85.0);
        assert_eq!(profile.clamp(10.0), 18.0);
        assert_eq!(profile.clamp(50.5), 50.5);
        assert!(profile.contains(18.0));
        assert!(profile.contains(85.0));
        assert!(!profile.contains(85.1));
        assert_eq!(profile.span(), 67.0);
    }

    #[test]
    fn test_descriptor_serialization() {
        let descriptor = DeviceDescriptor::new(
            "DEV-1001",
            "Temperature Sensor A1",
            SensorType::Temperature,
            "Boiler Room",
            Criticality::High,
            NaiveDate::from_ymd_opt(2022, 3, 14).unwrap(),
        );

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["id"], "DEV-1001");
        assert_eq!(json["type"], "Temperature");
        assert_eq!(json["criticality"], "high");
        assert_eq!(json["installDate"], "2022-03-14");
        assert!(descriptor.is_critical());
    }
}
