//! Random-walk telemetry simulator for the robot dashboard.
//!
//! Every tick nudges each channel by a uniform step in `[-delta, +delta)` and
//! clamps the result back into the channel's bounds, so no reading ever leaves
//! its domain regardless of what the random source produces.

use std::fmt;

use crate::reading::TelemetryReading;

/// Default outer edge of the geofence, metres.
pub const DEFAULT_MAX_DISTANCE_M: f64 = 50.0;

// ---------------------------------------------------------------------------
// Scenario presets
// ---------------------------------------------------------------------------

/// Step-size presets selectable via the `sim.scenario` config key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// The stock dashboard deltas: water +-1, battery +-0.25, distance +-0.4.
    Dashboard,
    /// Half-size steps.  Readings barely move; good for eyeballing layout.
    Calm,
    /// Triple-size steps.  Hits the clamps quickly.
    Stormy,
}

impl Scenario {
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "calm" => Self::Calm,
            "stormy" => Self::Stormy,
            _ => Self::Dashboard, // default
        }
    }

    /// Multiplier applied to every channel's delta.
    fn delta_scale(self) -> f64 {
        match self {
            Self::Dashboard => 1.0,
            Self::Calm => 0.5,
            Self::Stormy => 3.0,
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dashboard => write!(f, "dashboard"),
            Self::Calm => write!(f, "calm"),
            Self::Stormy => write!(f, "stormy"),
        }
    }
}

// ---------------------------------------------------------------------------
// Channels
// ---------------------------------------------------------------------------

/// Bounds and maximum per-tick step for one reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Channel {
    pub min: f64,
    pub max: f64,
    pub delta: f64,
}

impl Channel {
    pub const fn new(min: f64, max: f64, delta: f64) -> Self {
        Self { min, max, delta }
    }

    /// Move `value` by a step derived from `unit` (a sample in `[0, 1)`) and
    /// clamp into `[min, max]`.
    pub fn step(&self, value: f64, unit: f64) -> f64 {
        let offset = (unit * 2.0 - 1.0) * self.delta;
        (value + offset).clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn scaled(self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            ..self
        }
    }
}

/// One channel per field of [`TelemetryReading`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimProfile {
    pub water_level: Channel,
    pub battery: Channel,
    pub geofence: Channel,
}

impl SimProfile {
    /// Dashboard defaults.  The water and battery floors (10 % and 5 %) keep
    /// the gauges from ever reading empty.
    pub fn new(max_distance: f64) -> Self {
        Self {
            water_level: Channel::new(10.0, 100.0, 1.0),
            battery: Channel::new(5.0, 100.0, 0.25),
            geofence: Channel::new(0.0, max_distance, 0.4),
        }
    }

    pub fn for_scenario(scenario: Scenario, max_distance: f64) -> Self {
        let factor = scenario.delta_scale();
        let base = Self::new(max_distance);
        Self {
            water_level: base.water_level.scaled(factor),
            battery: base.battery.scaled(factor),
            geofence: base.geofence.scaled(factor),
        }
    }

    /// Whether every field of `reading` lies inside its channel.
    pub fn admits(&self, reading: &TelemetryReading) -> bool {
        self.water_level.contains(reading.water_level_percent)
            && self.battery.contains(reading.battery_percent)
            && self.geofence.contains(reading.geofence_distance)
    }
}

impl Default for SimProfile {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE_M)
    }
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

/// Produce the reading that follows `previous`.
///
/// Pure apart from drawing three samples from `rng`.
pub fn tick(previous: &TelemetryReading, profile: &SimProfile, rng: &mut fastrand::Rng) -> TelemetryReading {
    TelemetryReading {
        water_level_percent: profile.water_level.step(previous.water_level_percent, rng.f64()),
        battery_percent: profile.battery.step(previous.battery_percent, rng.f64()),
        geofence_distance: profile.geofence.step(previous.geofence_distance, rng.f64()),
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// A profile bound to its own random source.
pub struct TelemetrySimulator {
    profile: SimProfile,
    rng: fastrand::Rng,
}

impl TelemetrySimulator {
    /// Simulator seeded from entropy.
    pub fn new(profile: SimProfile) -> Self {
        Self {
            profile,
            rng: fastrand::Rng::new(),
        }
    }

    /// Simulator whose trajectory is fully determined by `seed`.
    pub fn seeded(profile: SimProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn tick(&mut self, previous: &TelemetryReading) -> TelemetryReading {
        tick(previous, &self.profile, &mut self.rng)
    }

    pub fn profile(&self) -> &SimProfile {
        &self.profile
    }
}

// ===========================================================================
// Tests
// ===========================================================================
