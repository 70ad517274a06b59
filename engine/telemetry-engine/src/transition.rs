//! State Transition Engine
//!
//! Advances one device by one tick: a sticky status flip followed by a
//! clamped random-walk step. The function is pure apart from the injected
//! randomness and the supplied `now`, so a fixed seed replays a run exactly.

use crate::config::TransitionConfig;
use crate::random::{round1, RandomSource};
use crate::state::{DeviceState, Trend};
use chrono::{DateTime, Duration, Utc};
use device_catalog::SensorTypeProfile;

/// Result of advancing one device by one tick
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: DeviceState,

    /// Whether the online/offline status was inverted on this tick
    pub flipped: bool,

    /// Change actually applied to the value after clamping (0 when offline)
    pub drift: f64,

    /// Whether this tick raised a new alert
    pub alert_raised: bool,
}

/// Compute the next state of a device
pub fn advance(
    current: &DeviceState,
    profile: &SensorTypeProfile,
    params: &TransitionConfig,
    rng: &mut dyn RandomSource,
    now: DateTime<Utc>,
) -> Transition {
    let flipped = rng.chance(params.flip_probability);
    let status = if flipped { current.status.inverted() } else { current.status };

    let mut next = DeviceState { status, ..current.clone() };

    if !status.is_online() {
        // No reading while offline; the cached value carries over unchanged
        let minutes_ago = rng.integer(1, params.offline_backdate_minutes.max(1));
        next.last_update = now - Duration::minutes(i64::from(minutes_ago));
        return Transition { state: next, flipped, drift: 0.0, alert_raised: false };
    }

    let delta = round1(rng.uniform(-params.max_drift, params.max_drift));
    next.value = profile.clamp(round1(current.value + delta));
    next.last_update = now;

    let drift = next.value - current.value;
    if drift > 0.0 {
        next.trend = Trend::Up;
    } else if drift < 0.0 {
        next.trend = Trend::Down;
    }

    let alert_raised = near_range_edge(next.value, profile, params.alert_margin_pct);
    if alert_raised {
        next.alert_count = next.alert_count.saturating_add(1);
    }

    Transition { state: next, flipped, drift, alert_raised }
}

/// Whether `value` lies within `margin_pct` percent of either range edge
pub fn near_range_edge(value: f64, profile: &SensorTypeProfile, margin_pct: f64) -> bool {
    if margin_pct <= 0.0 {
        return false;
    }
    let margin = profile.span() * margin_pct / 100.0;
    value <= profile.min + margin || value >= profile.max - margin
}
