//! Configuration for the telemetry engine

use crate::error::{Result, SimulationError};
use crate::{
    DEFAULT_FLIP_PROBABILITY, DEFAULT_MAX_DRIFT, DEFAULT_MAX_WINDOW_SIZE,
    DEFAULT_NOTIFICATION_CAPACITY,
    DEFAULT_OFFLINE_BACKDATE_MINUTES, DEFAULT_ONLINE_PROBABILITY,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the telemetry engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Fixed RNG seed for replayable runs (None = seeded from OS entropy)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Per-tick device dynamics
    pub transition: TransitionConfig,

    /// Policy for lazily created device state
    pub seeding: SeedingConfig,

    /// KPI summary randomization
    pub kpi: KpiConfig,

    /// Chart time-series walks
    pub time_series: TimeSeriesConfig,

    /// Status-change notification feed
    pub notifications: NotificationConfig,
}

/// Parameters of the state transition engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Probability that a device inverts its online/offline status on a tick
    pub flip_probability: f64,

    /// Largest absolute value change applied to an online device per tick
    pub max_drift: f64,

    /// Offline devices report a "last seen" up to this many minutes ago
    pub offline_backdate_minutes: u32,

    /// Readings within this percentage of a range edge raise an alert
    pub alert_margin_pct: f64,
}

/// Seeding policy for device state created on first access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    /// Probability that a freshly seeded device starts online
    pub online_probability: f64,

    /// Seeded alert counts are drawn from `[0, max_initial_alerts]`
    pub max_initial_alerts: u32,
}

/// Ranges for the externally measured KPI figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KpiConfig {
    pub uptime_min_pct: f64,
    pub uptime_max_pct: f64,
    pub power_min_kwh: f64,
    pub power_max_kwh: f64,
    pub trend_min_pct: f64,
    pub trend_max_pct: f64,
}

/// Bounds and dynamics of one chart metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricWalkConfig {
    pub min: f64,
    pub max: f64,

    /// Level the walk reverts towards
    pub mean: f64,

    /// Standard deviation of the per-point noise
    pub volatility: f64,

    /// Largest step a sliding window applies when it advances
    pub live_step: f64,
}

/// Time-series generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeriesConfig {
    pub temperature: MetricWalkConfig,
    pub voltage: MetricWalkConfig,
    pub pressure: MetricWalkConfig,
    pub humidity: MetricWalkConfig,

    /// Fraction of the distance to the mean closed on every point (0..=1)
    pub reversion: f64,

    /// Peak-to-mean swing of temperature over a day
    pub diurnal_amplitude: f64,

    /// Largest window a single series request may ask for
    pub max_window_size: usize,
}

/// Notification feed configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Oldest notifications are dropped beyond this many entries
    pub capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: None,
            transition: TransitionConfig::default(),
            seeding: SeedingConfig::default(),
            kpi: KpiConfig::default(),
            time_series: TimeSeriesConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            flip_probability: DEFAULT_FLIP_PROBABILITY,
            max_drift: DEFAULT_MAX_DRIFT,
            offline_backdate_minutes: DEFAULT_OFFLINE_BACKDATE_MINUTES,
            alert_margin_pct: 5.0,
        }
    }
}

impl Default for SeedingConfig {
    fn default() -> Self {
        Self { online_probability: DEFAULT_ONLINE_PROBABILITY, max_initial_alerts: 5 }
    }
}

impl Default for KpiConfig {
    fn default() -> Self {
        Self {
            uptime_min_pct: 95.0,
            uptime_max_pct: 99.9,
            power_min_kwh: 150.0,
            power_max_kwh: 300.0,
            trend_min_pct: 1.0,
            trend_max_pct: 25.0,
        }
    }
}

impl Default for TimeSeriesConfig {
    fn default() -> Self {
        Self {
            temperature: MetricWalkConfig::new(20.0, 80.0, 50.0, 2.0, 5.0),
            voltage: MetricWalkConfig::new(110.0, 250.0, 220.0, 4.0, 10.0),
            pressure: MetricWalkConfig::new(30.0, 70.0, 50.0, 1.5, 4.0),
            humidity: MetricWalkConfig::new(30.0, 90.0, 60.0, 2.5, 7.5),
            reversion: 0.3,
            diurnal_amplitude: 12.0,
            max_window_size: DEFAULT_MAX_WINDOW_SIZE,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_NOTIFICATION_CAPACITY }
    }
}

impl MetricWalkConfig {
    pub fn new(min: f64, max: f64, mean: f64, volatility: f64, live_step: f64) -> Self {
        Self { min, max, mean, volatility, live_step }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite()) || self.min > self.max {
            return Err(SimulationError::Config(format!(
                "time_series.{name}: invalid range [{}, {}]",
                self.min, self.max
            )));
        }
        if self.mean < self.min || self.mean > self.max {
            return Err(SimulationError::Config(format!(
                "time_series.{name}: mean {} outside [{}, {}]",
                self.mean, self.min, self.max
            )));
        }
        if self.volatility < 0.0 || self.live_step < 0.0 {
            return Err(SimulationError::Config(format!(
                "time_series.{name}: volatility and live_step must be non-negative"
            )));
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(SimulationError::Config(format!("{name} must be within [0, 1], got {value}")));
    }
    Ok(())
}

fn check_range(name: &str, min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Err(SimulationError::Config(format!("{name}: invalid range [{min}, {max}]")));
    }
    Ok(())
}

impl SimulationConfig {
    /// Reject values the engine cannot simulate with
    pub fn validate(&self) -> Result<()> {
        check_probability("transition.flip_probability", self.transition.flip_probability)?;
        check_probability("seeding.online_probability", self.seeding.online_probability)?;

        if !self.transition.max_drift.is_finite() || self.transition.max_drift < 0.0 {
            return Err(SimulationError::Config(format!(
                "transition.max_drift must be non-negative, got {}",
                self.transition.max_drift
            )));
        }
        if self.transition.offline_backdate_minutes == 0 {
            return Err(SimulationError::Config(
                "transition.offline_backdate_minutes must be at least 1".to_string(),
            ));
        }
        if !(0.0..=50.0).contains(&self.transition.alert_margin_pct) {
            return Err(SimulationError::Config(format!(
                "transition.alert_margin_pct must be within [0, 50], got {}",
                self.transition.alert_margin_pct
            )));
        }

        check_range("kpi.uptime", self.kpi.uptime_min_pct, self.kpi.uptime_max_pct)?;
        check_range("kpi.power", self.kpi.power_min_kwh, self.kpi.power_max_kwh)?;
        check_range("kpi.trend", self.kpi.trend_min_pct, self.kpi.trend_max_pct)?;
        if self.kpi.trend_min_pct < 0.0 {
            return Err(SimulationError::Config(format!(
                "kpi.trend_min_pct is a magnitude and must be non-negative, got {}",
                self.kpi.trend_min_pct
            )));
        }

        let series = &self.time_series;
        series.temperature.validate("temperature")?;
        series.voltage.validate("voltage")?;
        series.pressure.validate("pressure")?;
        series.humidity.validate("humidity")?;
        check_probability("time_series.reversion", series.reversion)?;
        if series.max_window_size == 0 {
            return Err(SimulationError::Config(
                "time_series.max_window_size must be at least 1".to_string(),
            ));
        }

        if self.notifications.capacity == 0 {
            return Err(SimulationError::Config(
                "notifications.capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            SimulationError::Config(format!("failed to read {:?}: {e}", path.as_ref()))
        })?;
        let config: SimulationConfig = toml::from_str(&content)
            .map_err(|e| SimulationError::Config(format!("failed to parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SimulationError::Config(format!("failed to serialize TOML: {e}")))?;
        std::fs::write(path.as_ref(), content).map_err(|e| {
            SimulationError::Config(format!("failed to write {:?}: {e}", path.as_ref()))
        })?;
        Ok(())
    }
}
