//! Chart time series
//!
//! [`generate_series`] re-seeds its four walks on every call, so two calls
//! are independent samples. Consumers that need a continuous chart keep a
//! [`TimeSeriesWindow`] and advance it one point at a time instead.

use crate::config::{MetricWalkConfig, TimeSeriesConfig};
use crate::error::{Result, SimulationError};
use crate::random::RandomSource;
use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;

/// One chart sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub time: DateTime<Utc>,
    pub temperature: f64,
    pub voltage: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// Diurnal factor in `[-1, 1]`: peaks at midday, bottoms out at midnight
pub fn diurnal_factor(time: &DateTime<Utc>) -> f64 {
    let hour = f64::from(time.hour()) + f64::from(time.minute()) / 60.0;
    (PI * (hour - 6.0) / 12.0).sin()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Convert a tick interval in hours to a strictly positive duration
pub fn interval_duration(tick_interval_hours: f64) -> Result<Duration> {
    if !tick_interval_hours.is_finite() || tick_interval_hours <= 0.0 {
        return Err(SimulationError::InvalidArgument(format!(
            "tick interval must be a positive number of hours, got {tick_interval_hours}"
        )));
    }

    let millis = (tick_interval_hours * 3_600_000.0).round();
    if millis < 1.0 || millis > i64::MAX as f64 {
        return Err(SimulationError::InvalidArgument(format!(
            "tick interval of {tick_interval_hours} hours cannot be represented"
        )));
    }
    Ok(Duration::milliseconds(millis as i64))
}

/// Mean-reverting walk for one metric
struct Walk<'a> {
    config: &'a MetricWalkConfig,
    value: f64,
}

impl<'a> Walk<'a> {
    fn seeded(config: &'a MetricWalkConfig, rng: &mut dyn RandomSource) -> Self {
        let spread = (config.max - config.min) / 4.0;
        let value = config.clamp(config.mean + rng.uniform(-spread, spread));
        Self { config, value }
    }

    fn step(&mut self, target: f64, reversion: f64, rng: &mut dyn RandomSource) -> f64 {
        let target = self.config.clamp(target);
        let next = self.value + reversion * (target - self.value) + rng.gaussian(self.config.volatility);
        self.value = self.config.clamp(next);
        round2(self.value).clamp(self.config.min, self.config.max)
    }
}

/// Generate `window_size + 1` points ending at `now`, spaced `tick_interval_hours` apart
pub fn generate_series(
    config: &TimeSeriesConfig,
    window_size: usize,
    tick_interval_hours: f64,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Result<Vec<TimeSeriesPoint>> {
    if window_size > config.max_window_size {
        return Err(SimulationError::InvalidArgument(format!(
            "window of {window_size} intervals exceeds the limit of {}",
            config.max_window_size
        )));
    }

    let step = interval_duration(tick_interval_hours)?;
    let span = i32::try_from(window_size)
        .ok()
        .and_then(|n| step.checked_mul(n))
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| {
            SimulationError::InvalidArgument(format!(
                "window of {window_size} points at {tick_interval_hours}h reaches before the epoch"
            ))
        })?;

    let mut temperature = Walk::seeded(&config.temperature, rng);
    let mut voltage = Walk::seeded(&config.voltage, rng);
    let mut pressure = Walk::seeded(&config.pressure, rng);
    let mut humidity = Walk::seeded(&config.humidity, rng);

    let mut points = Vec::with_capacity(window_size + 1);
    let mut time = span;
    for _ in 0..=window_size {
        let temperature_target =
            config.temperature.mean + config.diurnal_amplitude * diurnal_factor(&time);

        points.push(TimeSeriesPoint {
            time,
            temperature: temperature.step(temperature_target, config.reversion, rng),
            voltage: voltage.step(config.voltage.mean, config.reversion, rng),
            pressure: pressure.step(config.pressure.mean, config.reversion, rng),
            humidity: humidity.step(config.humidity.mean, config.reversion, rng),
        });
        time += step;
    }

    Ok(points)
}

/// Fixed-length sliding window of chart points.
///
/// Each [`advance`](TimeSeriesWindow::advance) appends one point derived from
/// the newest one by a bounded step and drops the oldest point.
#[derive(Debug, Clone)]
pub struct TimeSeriesWindow {
    points: VecDeque<TimeSeriesPoint>,
    capacity: usize,
    config: TimeSeriesConfig,
}

impl TimeSeriesWindow {
    /// Wrap an initial series; its length becomes the window's capacity
    pub fn new(initial: Vec<TimeSeriesPoint>, config: TimeSeriesConfig) -> Result<Self> {
        if initial.is_empty() {
            return Err(SimulationError::InvalidArgument(
                "a sliding window needs at least one point".to_string(),
            ));
        }
        let capacity = initial.len();
        Ok(Self { points: initial.into(), capacity, config })
    }

    /// Append one point at `now` and drop the oldest
    pub fn advance(&mut self, now: DateTime<Utc>, rng: &mut dyn RandomSource) -> &TimeSeriesPoint {
        let next = match self.points.back() {
            Some(last) => {
                let config = &self.config;
                let time = if now > last.time { now } else { last.time + Duration::milliseconds(1) };
                TimeSeriesPoint {
                    time,
                    temperature: live_step(&config.temperature, last.temperature, rng),
                    voltage: live_step(&config.voltage, last.voltage, rng),
                    pressure: live_step(&config.pressure, last.pressure, rng),
                    humidity: live_step(&config.humidity, last.humidity, rng),
                }
            }
            None => TimeSeriesPoint {
                time: now,
                temperature: self.config.temperature.mean,
                voltage: self.config.voltage.mean,
                pressure: self.config.pressure.mean,
                humidity: self.config.humidity.mean,
            },
        };

        self.points.push_back(next);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
        &self.points[self.points.len() - 1]
    }

    pub fn points(&self) -> impl Iterator<Item = &TimeSeriesPoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<TimeSeriesPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn live_step(config: &MetricWalkConfig, last: f64, rng: &mut dyn RandomSource) -> f64 {
    let next = last + rng.uniform(-config.live_step, config.live_step);
    round2(config.clamp(next)).clamp(config.min, config.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RngSource;
    use chrono::TimeZone;

    #[test]
    fn test_diurnal_peak_and_trough() {
        let noon = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let morning = Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap();

        assert!((diurnal_factor(&noon) - 1.0).abs() < 1e-9);
        assert!((diurnal_factor(&midnight) + 1.0).abs() < 1e-9);
        assert!(diurnal_factor(&morning).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_interval() {
        let config = TimeSeriesConfig::default();
        let mut rng = RngSource::seeded(1);

        for hours in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = generate_series(&config, 4, hours, Utc::now(), &mut rng);
            assert!(matches!(result, Err(SimulationError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_oversized_window_rejected() {
        let config = TimeSeriesConfig { max_window_size: 100, ..Default::default() };
        let mut rng = RngSource::seeded(1);

        assert_eq!(generate_series(&config, 100, 1.0, Utc::now(), &mut rng).unwrap().len(), 101);

        let result = generate_series(&config, 101, 1.0, Utc::now(), &mut rng);
        assert!(matches!(result, Err(SimulationError::InvalidArgument(_))));

        let default = TimeSeriesConfig::default();
        let result = generate_series(&default, 2_000_000_000, 0.001, Utc::now(), &mut rng);
        assert!(matches!(result, Err(SimulationError::InvalidArgument(_))));
    }

    #[test]
    fn test_window_keeps_length_and_order() {
        let config = TimeSeriesConfig::default();
        let mut rng = RngSource::seeded(9);
        let now = Utc::now();
        let initial = generate_series(&config, 12, 1.0, now, &mut rng).unwrap();
        let mut window = TimeSeriesWindow::new(initial.clone(), config.clone()).unwrap();

        for i in 1..=30 {
            let previous = window.latest().unwrap().clone();
            let point = window.advance(now + Duration::seconds(5 * i), &mut rng).clone();

            assert!(point.time > previous.time);
            assert!((point.temperature - previous.temperature).abs() <= config.temperature.live_step + 0.01);
            assert!((point.humidity - previous.humidity).abs() <= config.humidity.live_step + 0.01);
            assert_eq!(window.len(), 13);
        }

        assert_ne!(window.points().next(), initial.first());
    }

    #[test]
    fn test_window_rejects_empty_series() {
        assert!(TimeSeriesWindow::new(Vec::new(), TimeSeriesConfig::default()).is_err());
    }

    #[test]
    fn test_window_timestamp_never_goes_backwards() {
        let config = TimeSeriesConfig::default();
        let mut rng = RngSource::seeded(2);
        let now = Utc::now();
        let initial = generate_series(&config, 2, 1.0, now, &mut rng).unwrap();
        let mut window = TimeSeriesWindow::new(initial, config).unwrap();

        let stale = now - Duration::hours(5);
        let point = window.advance(stale, &mut rng).clone();
        assert_eq!(point.time, now + Duration::milliseconds(1));
    }
}
