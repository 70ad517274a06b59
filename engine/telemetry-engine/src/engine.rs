//! Aggregation layer
//!
//! [`TelemetryEngine`] ties the catalog, the state store and the transition
//! engine together and reduces device state into snapshots, time series and
//! KPI summaries.

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::kpi::{summarize, KpiSummary};
use crate::metrics::{EngineMetrics, EngineMetricsSnapshot};
use crate::notifications::{Notification, NotificationFeed};
use crate::random::{RandomSource, StdRandom};
use crate::snapshot::DeviceSnapshot;
use crate::state::{DeviceState, DeviceStatus};
use crate::store::DeviceStateStore;
use crate::timeseries::{generate_series, TimeSeriesPoint, TimeSeriesWindow};
use crate::transition::{advance, Transition};
use chrono::{DateTime, Utc};
use device_catalog::DeviceCatalog;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Synthetic telemetry engine
///
/// The engine is `Send + Sync` and meant to be shared behind an `Arc`. A
/// snapshot pass holds the randomness lock for its whole duration, so two
/// passes never interleave.
pub struct TelemetryEngine {
    catalog: Arc<DeviceCatalog>,
    store: DeviceStateStore,
    config: SimulationConfig,
    rng: Mutex<Box<dyn RandomSource>>,
    notifications: Mutex<NotificationFeed>,
    metrics: EngineMetrics,
}

impl TelemetryEngine {
    /// Create an engine over `catalog`, seeded from `config.seed`
    pub fn new(catalog: Arc<DeviceCatalog>, config: SimulationConfig) -> Result<Self> {
        let rng = StdRandom::from_optional_seed(config.seed);
        Self::with_random(catalog, config, Box::new(rng))
    }

    /// Create an engine drawing from the given randomness source
    pub fn with_random(
        catalog: Arc<DeviceCatalog>,
        config: SimulationConfig,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        catalog.validate()?;

        info!(
            "Creating TelemetryEngine with {} devices (seed: {:?})",
            catalog.len(),
            config.seed
        );

        let store = DeviceStateStore::new(Arc::clone(&catalog), config.seeding.clone());
        let notifications = NotificationFeed::new(config.notifications.capacity);

        Ok(Self {
            catalog,
            store,
            config,
            rng: Mutex::new(rng),
            notifications: Mutex::new(notifications),
            metrics: EngineMetrics::new(),
        })
    }

    /// Engine over the built-in catalog with default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(Arc::new(DeviceCatalog::default_catalog()), SimulationConfig::default())
    }

    /// Advance every catalog device by one tick and return their snapshots
    pub fn snapshot_all(&self) -> Result<Vec<DeviceSnapshot>> {
        self.snapshot_all_at(Utc::now())
    }

    /// [`snapshot_all`](Self::snapshot_all) with an explicit clock reading
    pub fn snapshot_all_at(&self, now: DateTime<Utc>) -> Result<Vec<DeviceSnapshot>> {
        let started = Instant::now();
        let mut rng = self.rng.lock();

        let mut snapshots = Vec::with_capacity(self.catalog.len());
        let mut flips = 0u64;
        let mut alerts = 0u64;

        for device in self.catalog.list_devices() {
            let transition: Transition =
                self.store.update(&device.id, &mut **rng, |current, profile, rng| {
                    let transition = advance(current, profile, &self.config.transition, rng, now);
                    (transition.state.clone(), transition)
                })?;

            let profile = self.catalog.profile_for_device(device)?;

            if transition.flipped {
                flips += 1;
                self.raise_status_change(&device.id, &device.name, transition.state.status, now);
            }
            if transition.alert_raised {
                alerts += 1;
                warn!(
                    "{} alert on device {}: {}{}",
                    profile.display_name, device.id, transition.state.value, profile.unit
                );
                let message = format!("{} alert on {}", profile.display_name, device.name);
                self.notifications.lock().push(&device.id, message, now);
            }

            snapshots.push(DeviceSnapshot::new(device, &transition.state, profile));
        }
        drop(rng);

        self.metrics.record_tick(started.elapsed(), snapshots.len() as u64, flips, alerts);
        debug!(
            "Snapshot pass over {} devices ({} flips, {} alerts)",
            snapshots.len(),
            flips,
            alerts
        );

        Ok(snapshots)
    }

    /// Chart series of `window_size + 1` points ending now.
    ///
    /// Every call starts fresh walks; keep a [`TimeSeriesWindow`] for a
    /// continuous chart.
    pub fn time_series(
        &self,
        window_size: usize,
        tick_interval_hours: f64,
    ) -> Result<Vec<TimeSeriesPoint>> {
        let mut rng = self.rng.lock();
        let points = generate_series(
            &self.config.time_series,
            window_size,
            tick_interval_hours,
            Utc::now(),
            &mut **rng,
        )?;
        self.metrics.record_series();
        Ok(points)
    }

    /// Sliding window seeded with [`time_series`](Self::time_series)
    pub fn time_series_window(
        &self,
        window_size: usize,
        tick_interval_hours: f64,
    ) -> Result<TimeSeriesWindow> {
        let initial = self.time_series(window_size, tick_interval_hours)?;
        TimeSeriesWindow::new(initial, self.config.time_series.clone())
    }

    /// Append one live point to `window`, drawing from the engine's randomness
    pub fn advance_window(&self, window: &mut TimeSeriesWindow) -> TimeSeriesPoint {
        let mut rng = self.rng.lock();
        window.advance(Utc::now(), &mut **rng).clone()
    }

    /// Run a snapshot pass and reduce it to KPI figures
    pub fn kpi_summary(&self) -> Result<KpiSummary> {
        let snapshots = self.snapshot_all()?;
        Ok(self.summarize(&snapshots))
    }

    /// Reduce an existing snapshot list to KPI figures without advancing state
    pub fn summarize(&self, snapshots: &[DeviceSnapshot]) -> KpiSummary {
        let mut rng = self.rng.lock();
        let summary = summarize(snapshots, &self.config.kpi, &mut **rng);
        self.metrics.record_kpi();
        summary
    }

    /// Re-seed every device and clear the notification feed
    pub fn reset_all(&self) -> Result<()> {
        let mut rng = self.rng.lock();
        self.store.reset_all(&mut **rng)?;
        self.notifications.lock().clear();
        self.metrics.record_reset();
        info!("Reset all device state");
        Ok(())
    }

    /// Current state of one device, seeding it if it was never touched
    pub fn get_state(&self, device_id: &str) -> Result<DeviceState> {
        let mut rng = self.rng.lock();
        self.store.get(device_id, &mut **rng)
    }

    /// Overwrite the state of one device
    pub fn set_state(&self, device_id: &str, state: DeviceState) -> Result<()> {
        self.store.set(device_id, state)
    }

    /// Notification feed, newest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().list()
    }

    pub fn mark_notification_read(&self, id: u64) -> bool {
        self.notifications.lock().mark_as_read(id)
    }

    pub fn mark_all_notifications_read(&self) {
        self.notifications.lock().mark_all_read();
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.lock().unread_count()
    }

    pub fn catalog(&self) -> &Arc<DeviceCatalog> {
        &self.catalog
    }

    pub fn store(&self) -> &DeviceStateStore {
        &self.store
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn metrics(&self) -> EngineMetricsSnapshot {
        self.metrics.get_metrics()
    }

    fn raise_status_change(
        &self,
        device_id: &str,
        device_name: &str,
        status: DeviceStatus,
        now: DateTime<Utc>,
    ) {
        let message = match status {
            DeviceStatus::Offline => {
                warn!("Device {} went offline", device_id);
                format!("{device_name} went offline")
            }
            DeviceStatus::Online => {
                info!("Device {} is back online", device_id);
                format!("{device_name} is back online")
            }
        };
        self.notifications.lock().push(device_id, message, now);
    }
}
