//! Metrics collection for the TelemetryEngine

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Metrics collected by the TelemetryEngine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineMetricsSnapshot {
    /// Snapshot passes completed (calls to `snapshot_all`)
    pub ticks_processed: u64,

    /// Device transitions applied across all passes
    pub devices_advanced: u64,

    /// Online/offline status inversions
    pub status_flips: u64,

    /// Alerts raised by transitions
    pub alerts_raised: u64,

    /// KPI reductions, through `kpi_summary` or `summarize`
    pub kpi_computations: u64,

    /// Calls to `time_series`
    pub series_generated: u64,

    /// Bulk state resets
    pub resets: u64,

    /// Duration of the last snapshot pass in nanoseconds
    pub last_tick_duration_ns: u64,

    /// Maximum snapshot pass duration in nanoseconds
    pub max_tick_duration_ns: u64,

    /// Engine uptime in seconds
    pub uptime_seconds: u64,
}

/// Metrics collector for the TelemetryEngine
pub struct EngineMetrics {
    ticks_processed: AtomicU64,
    devices_advanced: AtomicU64,
    status_flips: AtomicU64,
    alerts_raised: AtomicU64,
    kpi_computations: AtomicU64,
    series_generated: AtomicU64,
    resets: AtomicU64,

    // Timing
    last_tick_duration: AtomicU64,
    max_tick_duration: AtomicU64,
    start_time: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            ticks_processed: AtomicU64::new(0),
            devices_advanced: AtomicU64::new(0),
            status_flips: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            kpi_computations: AtomicU64::new(0),
            series_generated: AtomicU64::new(0),
            resets: AtomicU64::new(0),
            last_tick_duration: AtomicU64::new(0),
            max_tick_duration: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed snapshot pass
    pub fn record_tick(&self, duration: Duration, devices: u64, flips: u64, alerts: u64) {
        let duration_ns = duration.as_nanos() as u64;

        self.ticks_processed.fetch_add(1, Ordering::Relaxed);
        self.devices_advanced.fetch_add(devices, Ordering::Relaxed);
        self.status_flips.fetch_add(flips, Ordering::Relaxed);
        self.alerts_raised.fetch_add(alerts, Ordering::Relaxed);
        self.last_tick_duration.store(duration_ns, Ordering::Relaxed);
        self.max_tick_duration.fetch_max(duration_ns, Ordering::Relaxed);
    }

    pub fn record_kpi(&self) {
        self.kpi_computations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_series(&self) {
        self.series_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reset(&self) {
        self.resets.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics
    pub fn get_metrics(&self) -> EngineMetricsSnapshot {
        EngineMetricsSnapshot {
            ticks_processed: self.ticks_processed.load(Ordering::Relaxed),
            devices_advanced: self.devices_advanced.load(Ordering::Relaxed),
            status_flips: self.status_flips.load(Ordering::Relaxed),
            alerts_raised: self.alerts_raised.load(Ordering::Relaxed),
            kpi_computations: self.kpi_computations.load(Ordering::Relaxed),
            series_generated: self.series_generated.load(Ordering::Relaxed),
            resets: self.resets.load(Ordering::Relaxed),
            last_tick_duration_ns: self.last_tick_duration.load(Ordering::Relaxed),
            max_tick_duration_ns: self.max_tick_duration.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        for counter in [
            &self.ticks_processed,
            &self.devices_advanced,
            &self.status_flips,
            &self.alerts_raised,
            &self.kpi_computations,
            &self.series_generated,
            &self.resets,
            &self.last_tick_duration,
            &self.max_tick_duration,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_reset() {
        let metrics = EngineMetrics::new();
        metrics.record_tick(Duration::from_micros(40), 8, 1, 2);
        metrics.record_tick(Duration::from_micros(10), 8, 0, 0);
        metrics.record_kpi();

        let snapshot = metrics.get_metrics();
        assert_eq!(snapshot.ticks_processed, 2);
        assert_eq!(snapshot.devices_advanced, 16);
        assert_eq!(snapshot.status_flips, 1);
        assert_eq!(snapshot.alerts_raised, 2);
        assert_eq!(snapshot.kpi_computations, 1);
        assert_eq!(snapshot.last_tick_duration_ns, 10_000);
        assert_eq!(snapshot.max_tick_duration_ns, 40_000);

        metrics.reset();
        let snapshot = metrics.get_metrics();
        assert_eq!(snapshot.ticks_processed, 0);
        assert_eq!(snapshot.max_tick_duration_ns, 0);
    }
}
