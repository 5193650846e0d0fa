//! Robot telemetry snapshot and the status tiers derived from it.

use serde::Serialize;
use std::fmt;
use time::OffsetDateTime;

/// Default water tank capacity in litres.
pub const DEFAULT_TANK_CAPACITY_L: f64 = 50.0;

/// One snapshot of the robot's simulated sensors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TelemetryReading {
    /// Tank fill level, percent.
    pub water_level_percent: f64,
    /// Battery charge, percent.
    pub battery_percent: f64,
    /// Distance from the geofence anchor, metres.
    pub geofence_distance: f64,
}

impl TelemetryReading {
    pub fn new(water_level_percent: f64, battery_percent: f64, geofence_distance: f64) -> Self {
        Self {
            water_level_percent,
            battery_percent,
            geofence_distance,
        }
    }

    /// Litres left in a tank of `capacity_l`.
    pub fn tank_volume_l(&self, capacity_l: f64) -> f64 {
        self.water_level_percent * capacity_l / 100.0
    }

    pub fn tank_status(&self) -> TankStatus {
        TankStatus::classify(self.water_level_percent)
    }

    pub fn battery_tier(&self) -> BatteryTier {
        BatteryTier::classify(self.battery_percent)
    }
}

impl Default for TelemetryReading {
    /// The reading the dashboard starts from before the first tick.
    fn default() -> Self {
        Self::new(78.0, 85.0, 12.0)
    }
}

/// A reading together with when it was produced.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StampedReading {
    #[serde(flatten)]
    pub reading: TelemetryReading,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    /// Number of ticks applied since the simulator started.
    pub tick: u64,
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TankStatus {
    Optimal,
    Good,
    Low,
}

impl TankStatus {
    pub fn classify(level_percent: f64) -> Self {
        if level_percent > 70.0 {
            Self::Optimal
        } else if level_percent > 30.0 {
            Self::Good
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for TankStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "Optimal"),
            Self::Good => write!(f, "Good"),
            Self::Low => write!(f, "Low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryTier {
    Good,
    Fair,
    Low,
}

impl BatteryTier {
    pub fn classify(percent: f64) -> Self {
        if percent > 60.0 {
            Self::Good
        } else if percent > 30.0 {
            Self::Fair
        } else {
            Self::Low
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reading_matches_dashboard_seed() {
        let r = TelemetryReading::default();
        assert_eq!(r.water_level_percent, 78.0);
        assert_eq!(r.battery_percent, 85.0);
        assert_eq!(r.geofence_distance, 12.0);
    }

    #[test]
    fn tank_volume_scales_with_capacity() {
        let r = TelemetryReading::new(50.0, 90.0, 0.0);
        assert_eq!(r.tank_volume_l(DEFAULT_TANK_CAPACITY_L), 25.0);
        assert_eq!(r.tank_volume_l(10.0), 5.0);
    }

    #[test]
    fn tank_status_boundaries() {
        assert_eq!(TankStatus::classify(70.1), TankStatus::Optimal);
        assert_eq!(TankStatus::classify(70.0), TankStatus::Good);
        assert_eq!(TankStatus::classify(30.1), TankStatus::Good);
        assert_eq!(TankStatus::classify(30.0), TankStatus::Low);
        assert_eq!(TankStatus::classify(0.0), TankStatus::Low);
    }

    #[test]
    fn battery_tier_boundaries() {
        assert_eq!(BatteryTier::classify(85.0), BatteryTier::Good);
        assert_eq!(BatteryTier::classify(60.0), BatteryTier::Fair);
        assert_eq!(BatteryTier::classify(31.0), BatteryTier::Fair);
        assert_eq!(BatteryTier::classify(30.0), BatteryTier::Low);
    }

    #[test]
    fn stamped_reading_flattens_fields() {
        let stamped = StampedReading {
            reading: TelemetryReading::default(),
            updated_at: OffsetDateTime::UNIX_EPOCH,
            tick: 3,
        };
        let json = serde_json::to_value(stamped).unwrap();

        assert_eq!(json["water_level_percent"], 78.0);
        assert_eq!(json["tick"], 3);
        assert_eq!(json["updated_at"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn tank_status_display() {
        assert_eq!(TankStatus::Optimal.to_string(), "Optimal");
        assert_eq!(TankStatus::Low.to_string(), "Low");
    }
}
