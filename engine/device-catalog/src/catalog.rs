use crate::error::CatalogError;
use crate::types::{Criticality, DeviceDescriptor, SensorType, SensorTypeProfile};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// On-disk shape of a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub profiles: Vec<SensorTypeProfile>,
    pub devices: Vec<DeviceDescriptor>,
}

/// Device Catalog - static registry of simulated devices
///
/// Holds the device descriptors in insertion order together with one
/// profile per sensor type. A catalog is validated when it is built, so
/// every descriptor it hands out references a registered profile.
#[derive(Debug, Clone)]
pub struct DeviceCatalog {
    /// Descriptors in insertion order
    devices: Vec<DeviceDescriptor>,

    /// Map from device ID to position in `devices`
    index_by_id: HashMap<String, usize>,

    /// One profile per sensor type
    profiles: HashMap<SensorType, SensorTypeProfile>,
}

impl DeviceCatalog {
    /// Build and validate a catalog
    pub fn new(
        devices: Vec<DeviceDescriptor>,
        profiles: Vec<SensorTypeProfile>,
    ) -> Result<Self, CatalogError> {
        let profiles: HashMap<SensorType, SensorTypeProfile> =
            profiles.into_iter().map(|p| (p.sensor_type, p)).collect();

        let mut index_by_id = HashMap::with_capacity(devices.len());
        for (position, device) in devices.iter().enumerate() {
            if index_by_id.insert(device.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateDevice(device.id.clone()));
            }
        }

        let catalog = Self { devices, index_by_id, profiles };
        catalog.validate()?;

        debug!(
            "Built device catalog with {} devices and {} profiles",
            catalog.devices.len(),
            catalog.profiles.len()
        );
        Ok(catalog)
    }

    /// The built-in eight-device plant used by the dashboard
    pub fn default_catalog() -> Self {
        #[rustfmt::skip]
        let devices = vec![
            device("DEV-1001", "Temperature Sensor A1", SensorType::Temperature, "Boiler Room", Criticality::High, (2021, 3, 14)),
            device("DEV-1002", "Voltage Meter B2", SensorType::Voltage, "Substation 1", Criticality::High, (2020, 11, 2)),
            device("DEV-1003", "Pressure Sensor C3", SensorType::Pressure, "Compressor Bay", Criticality::Medium, (2022, 6, 21)),
            device("DEV-1004", "Flow Meter D4", SensorType::Flow, "Cooling Loop", Criticality::Medium, (2021, 8, 9)),
            device("DEV-1005", "Humidity Sensor E5", SensorType::Humidity, "Warehouse North", Criticality::Low, (2023, 1, 30)),
            device("DEV-1006", "Power Meter F6", SensorType::Power, "Main Switchboard", Criticality::High, (2019, 5, 17)),
            device("DEV-1007", "Level Sensor G7", SensorType::Level, "Tank Farm", Criticality::Medium, (2022, 10, 4)),
            device("DEV-1008", "Speed Sensor H8", SensorType::Speed, "Conveyor Line 2", Criticality::Low, (2023, 7, 12)),
        ];

        let catalog = Self {
            index_by_id: devices.iter().enumerate().map(|(i, d)| (d.id.clone(), i)).collect(),
            devices,
            profiles: default_profiles().into_iter().map(|p| (p.sensor_type, p)).collect(),
        };
        debug_assert!(catalog.validate().is_ok());
        catalog
    }

    /// Load a catalog from a JSON file and validate it
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        info!("Loading device catalog from: {:?}", path.as_ref());

        let content = std::fs::read_to_string(&path)?;
        let file: CatalogFile = serde_json::from_str(&content)?;

        let catalog = Self::new(file.devices, file.profiles)?;
        info!("Loaded {} devices from catalog file", catalog.len());
        Ok(catalog)
    }

    /// Save the catalog as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CatalogError> {
        let mut profiles: Vec<SensorTypeProfile> = self.profiles.values().cloned().collect();
        profiles.sort_by_key(|p| p.sensor_type);

        let file = CatalogFile { profiles, devices: self.devices.clone() };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    /// Check that every descriptor resolves to a profile with a sane range
    pub fn validate(&self) -> Result<(), CatalogError> {
        for profile in self.profiles.values() {
            if !(profile.min.is_finite() && profile.max.is_finite()) || profile.min > profile.max {
                return Err(CatalogError::InvalidRange {
                    sensor_type: profile.sensor_type,
                    min: profile.min,
                    max: profile.max,
                });
            }
        }

        for device in &self.devices {
            if !self.profiles.contains_key(&device.sensor_type) {
                return Err(CatalogError::UnknownType(device.sensor_type));
            }
        }

        Ok(())
    }

    /// All devices in insertion order
    pub fn list_devices(&self) -> &[DeviceDescriptor] {
        &self.devices
    }

    /// Get a descriptor by device ID
    pub fn descriptor(&self, device_id: &str) -> Result<&DeviceDescriptor, CatalogError> {
        self.index_by_id
            .get(device_id)
            .map(|&i| &self.devices[i])
            .ok_or_else(|| CatalogError::UnknownDevice(device_id.to_string()))
    }

    /// Get the profile registered for a sensor type
    pub fn profile_for(&self, sensor_type: SensorType) -> Result<&SensorTypeProfile, CatalogError> {
        self.profiles.get(&sensor_type).ok_or(CatalogError::UnknownType(sensor_type))
    }

    /// Get the profile for a device's sensor type
    pub fn profile_for_device(
        &self,
        device: &DeviceDescriptor,
    ) -> Result<&SensorTypeProfile, CatalogError> {
        self.profile_for(device.sensor_type)
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.index_by_id.contains_key(device_id)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl Default for DeviceCatalog {
    fn default() -> Self {
        Self::default_catalog()
    }
}

/// Built-in profile table, one entry per sensor type
#[rustfmt::skip]
pub fn default_profiles() -> Vec<SensorTypeProfile> {
    vec![
        SensorTypeProfile::new(SensorType::Temperature, "Temperature", "thermostat", "°C", 18.0, 85.0),
        SensorTypeProfile::new(SensorType::Voltage, "Voltage", "bolt", "V", 110.0, 250.0),
        SensorTypeProfile::new(SensorType::Pressure, "Pressure", "speed", "PSI", 30.0, 70.0),
        SensorTypeProfile::new(SensorType::Flow, "Flow Rate", "water", "L/min", 0.0, 120.0),
        SensorTypeProfile::new(SensorType::Humidity, "Humidity", "water_drop", "%", 30.0, 90.0),
        SensorTypeProfile::new(SensorType::Power, "Power", "power", "kW", 0.0, 500.0),
        SensorTypeProfile::new(SensorType::Level, "Level", "straighten", "%", 0.0, 100.0),
        SensorTypeProfile::new(SensorType::Speed, "Speed", "rotate_right", "RPM", 0.0, 3600.0),
    ]
}

fn device(
    id: &str,
    name: &str,
    sensor_type: SensorType,
    location: &str,
    criticality: Criticality,
    (year, month, day): (i32, u32, u32),
) -> DeviceDescriptor {
    let install_date = NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default();
    DeviceDescriptor::new(id, name, sensor_type, location, criticality, install_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temperature_device(id: &str) -> DeviceDescriptor {
        device(id, "Probe", SensorType::Temperature, "Lab", Criticality::Low, (2024, 1, 1))
    }

    #[test]
    fn test_default_catalog_order() {
        let catalog = DeviceCatalog::default_catalog();
        let ids: Vec<&str> = catalog.list_devices().iter().map(|d| d.id.as_str()).collect();

        assert_eq!(
            ids,
            vec![
                "DEV-1001", "DEV-1002", "DEV-1003", "DEV-1004", "DEV-1005", "DEV-1006",
                "DEV-1007", "DEV-1008"
            ]
        );
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_profile_lookup() {
        let catalog = DeviceCatalog::default_catalog();

        let profile = catalog.profile_for(SensorType::Temperature).unwrap();
        assert_eq!(profile.unit, "°C");
        assert_eq!((profile.min, profile.max), (18.0, 85.0));

        let device = catalog.descriptor("DEV-1002").unwrap();
        assert_eq!(catalog.profile_for_device(device).unwrap().unit, "V");
    }

    #[test]
    fn test_unknown_type() {
        let profiles = vec![SensorTypeProfile::new(
            SensorType::Temperature,
            "Temperature",
            "thermostat",
            "°C",
            18.0,
            85.0,
        )];
        let catalog = DeviceCatalog::new(vec![temperature_device("T-1")], profiles).unwrap();

        let result = catalog.profile_for(SensorType::Voltage);
        assert!(matches!(result, Err(CatalogError::UnknownType(SensorType::Voltage))));
    }

    #[test]
    fn test_descriptor_without_profile_is_rejected() {
        let result = DeviceCatalog::new(vec![temperature_device("T-1")], vec![]);
        assert!(matches!(result, Err(CatalogError::UnknownType(SensorType::Temperature))));
    }

    #[test]
    fn test_duplicate_device_is_rejected() {
        let result = DeviceCatalog::new(
            vec![temperature_device("T-1"), temperature_device("T-1")],
            default_profiles(),
        );
        assert!(matches!(result, Err(CatalogError::DuplicateDevice(id)) if id == "T-1"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let profiles =
            vec![SensorTypeProfile::new(SensorType::Temperature, "T", "t", "°C", 90.0, 10.0)];
        let result = DeviceCatalog::new(vec![temperature_device("T-1")], profiles);
        assert!(matches!(result, Err(CatalogError::InvalidRange { .. })));
    }

    #[test]
    fn test_unknown_device() {
        let catalog = DeviceCatalog::default_catalog();
        assert!(matches!(catalog.descriptor("DEV-9999"), Err(CatalogError::UnknownDevice(_))));
        assert!(!catalog.contains("DEV-9999"));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let catalog = DeviceCatalog::default_catalog();
        catalog.save_to_file(&path).unwrap();

        let loaded = DeviceCatalog::load_from_file(&path).unwrap();
        assert_eq!(loaded.list_devices(), catalog.list_devices());
        assert_eq!(
            loaded.profile_for(SensorType::Speed).unwrap(),
            catalog.profile_for(SensorType::Speed).unwrap()
        );
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(DeviceCatalog::load_from_file(&path), Err(CatalogError::Parse(_))));
        assert!(matches!(
            DeviceCatalog::load_from_file(dir.path().join("missing.json")),
            Err(CatalogError::Io(_))
        ));
    }
}
