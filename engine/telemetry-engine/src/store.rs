//! Device State Store
//!
//! Single owner of all mutable device state. Entries are created lazily on
//! first access using the seeding policy and are only ever replaced, never
//! removed, except by [`DeviceStateStore::reset_all`].

use crate::config::SeedingConfig;
use crate::error::{Result, SimulationError};
use crate::random::{round1, RandomSource};
use crate::state::{DeviceState, DeviceStatus, Trend};
use chrono::{DateTime, Utc};
use device_catalog::{DeviceCatalog, SensorTypeProfile};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Map from device ID to its simulation state
pub struct DeviceStateStore {
    catalog: Arc<DeviceCatalog>,
    seeding: SeedingConfig,
    states: Mutex<HashMap<String, DeviceState>>,
}

impl DeviceStateStore {
    /// Create an empty store for the devices of `catalog`
    pub fn new(catalog: Arc<DeviceCatalog>, seeding: SeedingConfig) -> Self {
        let capacity = catalog.len();
        Self { catalog, seeding, states: Mutex::new(HashMap::with_capacity(capacity)) }
    }

    /// Get the state of a device, seeding it on first access
    pub fn get(&self, device_id: &str, rng: &mut dyn RandomSource) -> Result<DeviceState> {
        let profile = self.profile_of(device_id)?;
        let mut states = self.states.lock();

        let state = states
            .entry(device_id.to_string())
            .or_insert_with(|| seed_state(profile, &self.seeding, rng, Utc::now()));
        Ok(state.clone())
    }

    /// Replace the state of a device
    pub fn set(&self, device_id: &str, state: DeviceState) -> Result<()> {
        let profile = self.profile_of(device_id)?;
        if !profile.contains(state.value) {
            return Err(SimulationError::InvalidArgument(format!(
                "value {} for {device_id} is outside [{}, {}]",
                state.value, profile.min, profile.max
            )));
        }

        self.states.lock().insert(device_id.to_string(), state);
        Ok(())
    }

    /// Read-modify-write one device under a single lock acquisition.
    ///
    /// `f` receives the current state (seeded if absent) and the device's
    /// profile and returns the replacement together with any extra output.
    /// The stored value is clamped back into the profile range.
    pub fn update<T, F>(&self, device_id: &str, rng: &mut dyn RandomSource, f: F) -> Result<T>
    where
        F: FnOnce(&DeviceState, &SensorTypeProfile, &mut dyn RandomSource) -> (DeviceState, T),
    {
        let profile = self.profile_of(device_id)?;
        let mut states = self.states.lock();

        let current = states
            .entry(device_id.to_string())
            .or_insert_with(|| seed_state(profile, &self.seeding, rng, Utc::now()));

        let (mut next, output) = f(current, profile, rng);
        next.value = profile.clamp(next.value);
        *current = next;
        Ok(output)
    }

    /// Re-seed every catalog device, discarding all history
    pub fn reset_all(&self, rng: &mut dyn RandomSource) -> Result<()> {
        let now = Utc::now();
        let mut fresh = HashMap::with_capacity(self.catalog.len());

        for device in self.catalog.list_devices() {
            let profile = self.catalog.profile_for_device(device)?;
            fresh.insert(device.id.clone(), seed_state(profile, &self.seeding, rng, now));
        }

        *self.states.lock() = fresh;
        debug!("Reset state of {} devices", self.catalog.len());
        Ok(())
    }

    /// Number of devices with initialized state
    pub fn len(&self) -> usize {
        self.states.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.lock().is_empty()
    }

    pub fn catalog(&self) -> &Arc<DeviceCatalog> {
        &self.catalog
    }

    fn profile_of(&self, device_id: &str) -> Result<&SensorTypeProfile> {
        let device = self.catalog.descriptor(device_id)?;
        Ok(self.catalog.profile_for_device(device)?)
    }
}

/// Seeding policy for a device seen for the first time
pub fn seed_state(
    profile: &SensorTypeProfile,
    seeding: &SeedingConfig,
    rng: &mut dyn RandomSource,
    now: DateTime<Utc>,
) -> DeviceState {
    let value = profile.clamp(round1(rng.uniform(profile.min, profile.max)));
    let status = if rng.chance(seeding.online_probability) {
        DeviceStatus::Online
    } else {
        DeviceStatus::Offline
    };
    let trend = if rng.chance(0.5) { Trend::Up } else { Trend::Down };
    let alert_count = rng.integer(0, seeding.max_initial_alerts);

    DeviceState { value, status, last_update: now, trend, alert_count }
}
