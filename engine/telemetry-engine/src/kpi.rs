//! KPI summary reduction

use crate::config::KpiConfig;
use crate::random::{round1, RandomSource};
use crate::snapshot::DeviceSnapshot;
use serde::{Deserialize, Serialize};

/// Whether a KPI went up or down against the previous period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDirection {
    Increase,
    Decrease,
}

/// Period-over-period change shown on a KPI card
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendDelta {
    #[serde(rename = "type")]
    pub direction: ChangeDirection,

    /// Magnitude of the change in percent
    pub value: f64,
}

/// Per-card trend deltas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrends {
    pub total_devices: TrendDelta,
    pub active_devices: TrendDelta,
    pub alerts_raised: TrendDelta,
    pub power_consumption: TrendDelta,
}

/// Dashboard KPI figures derived from one snapshot pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiSummary {
    pub total_devices: usize,
    pub active_devices: usize,

    /// Sum of the per-device alert counts
    pub alerts_raised: u64,

    /// Average power consumption in kWh
    pub power_consumption: f64,

    /// Devices with high criticality
    pub critical_devices: usize,

    /// Active devices as a percentage of all devices
    pub efficiency: f64,

    /// Externally measured SLA uptime in percent
    pub uptime: f64,

    pub trends: KpiTrends,
}

/// Reduce a snapshot list to KPI figures.
///
/// Uptime, power and trend deltas are not derivable from device state and
/// are drawn fresh from `rng` on every call.
pub fn summarize(
    snapshots: &[DeviceSnapshot],
    config: &KpiConfig,
    rng: &mut dyn RandomSource,
) -> KpiSummary {
    let total_devices = snapshots.len();
    let active_devices = snapshots.iter().filter(|s| s.is_online()).count();
    let critical_devices = snapshots.iter().filter(|s| s.device.is_critical()).count();
    let alerts_raised = snapshots.iter().map(|s| u64::from(s.alert_count)).sum();

    let efficiency = if total_devices == 0 {
        0.0
    } else {
        round1(active_devices as f64 / total_devices as f64 * 100.0)
    };

    let uptime = round1(rng.uniform(config.uptime_min_pct, config.uptime_max_pct))
        .clamp(config.uptime_min_pct, config.uptime_max_pct);
    let power_consumption = round1(rng.uniform(config.power_min_kwh, config.power_max_kwh))
        .clamp(config.power_min_kwh, config.power_max_kwh);

    let trends = KpiTrends {
        total_devices: random_delta(config, rng),
        active_devices: random_delta(config, rng),
        alerts_raised: random_delta(config, rng),
        power_consumption: random_delta(config, rng),
    };

    KpiSummary {
        total_devices,
        active_devices,
        alerts_raised,
        power_consumption,
        critical_devices,
        efficiency,
        uptime,
        trends,
    }
}

fn random_delta(config: &KpiConfig, rng: &mut dyn RandomSource) -> TrendDelta {
    let direction =
        if rng.chance(0.5) { ChangeDirection::Increase } else { ChangeDirection::Decrease };
    let value = round1(rng.uniform(config.trend_min_pct, config.trend_max_pct))
        .clamp(config.trend_min_pct, config.trend_max_pct);
    TrendDelta { direction, value }
}
