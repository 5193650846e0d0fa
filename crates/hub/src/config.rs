//! TOML config file loading and validation for the simulator, the seed crop
//! grid, and the web listener.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use agribot_sim::reading::DEFAULT_TANK_CAPACITY_L;
use agribot_sim::sim::DEFAULT_MAX_DISTANCE_M;
use agribot_sim::{CropGrid, GridCell, Scenario, SimProfile, TelemetryReading};

// ---------------------------------------------------------------------------
// Config file structures
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sim: SimConfig,
    #[serde(default)]
    pub grid: Option<GridConfig>,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub tick_ms: u64,
    /// Fixes the random walk when set.
    pub seed: Option<u64>,
    pub scenario: String,
    pub tank_capacity_l: f64,
    pub max_distance_m: f64,
    pub initial: InitialReading,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_ms: 2000,
            seed: None,
            scenario: "dashboard".to_string(),
            tank_capacity_l: DEFAULT_TANK_CAPACITY_L,
            max_distance_m: DEFAULT_MAX_DISTANCE_M,
            initial: InitialReading::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct InitialReading {
    pub water_level_percent: f64,
    pub battery_percent: f64,
    pub geofence_distance: f64,
}

impl Default for InitialReading {
    fn default() -> Self {
        let r = TelemetryReading::default();
        Self {
            water_level_percent: r.water_level_percent,
            battery_percent: r.battery_percent,
            geofence_distance: r.geofence_distance,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GridConfig {
    pub rows: Vec<Vec<GridCell>>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

// ---------------------------------------------------------------------------
// Derived values
// ---------------------------------------------------------------------------

impl Config {
    pub fn scenario(&self) -> Scenario {
        Scenario::from_str_lossy(&self.sim.scenario)
    }

    pub fn profile(&self) -> SimProfile {
        SimProfile::for_scenario(self.scenario(), self.sim.max_distance_m)
    }

    pub fn initial_reading(&self) -> TelemetryReading {
        let i = &self.sim.initial;
        TelemetryReading::new(i.water_level_percent, i.battery_percent, i.geofence_distance)
    }

    /// The seed grid from `[grid]`, or the built-in sample field.
    pub fn build_grid(&self) -> Result<CropGrid> {
        match &self.grid {
            Some(g) => CropGrid::from_rows(g.rows.clone()).context("invalid [grid] rows"),
            None => Ok(CropGrid::demo()),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl Config {
    /// Validate all config entries. Returns `Ok(())` or an error describing
    /// every violation found (not just the first one).
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        self.validate_sim(&mut errors);
        self.validate_grid(&mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "config validation failed ({} error{}):\n  - {}",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" },
                errors.join("\n  - ")
            );
        }
    }

    fn validate_sim(&self, errors: &mut Vec<String>) {
        let s = &self.sim;

        if s.tick_ms == 0 {
            errors.push("sim: tick_ms must be positive, got 0".to_string());
        }
        if !(s.tank_capacity_l > 0.0) {
            errors.push(format!(
                "sim: tank_capacity_l must be positive, got {}",
                s.tank_capacity_l
            ));
        }
        let distance_ok = s.max_distance_m > 0.0;
        if !distance_ok {
            errors.push(format!(
                "sim: max_distance_m must be positive, got {}",
                s.max_distance_m
            ));
        }

        // ── Initial reading must sit inside the channel bounds ──────
        let profile = self.profile();
        let initial = &s.initial;
        let mut checks = vec![
            ("water_level_percent", initial.water_level_percent, profile.water_level),
            ("battery_percent", initial.battery_percent, profile.battery),
        ];
        // Without a valid max distance the geofence channel has no bounds.
        if distance_ok {
            checks.push(("geofence_distance", initial.geofence_distance, profile.geofence));
        }
        for (name, value, channel) in checks {
            if !channel.contains(value) {
                errors.push(format!(
                    "sim.initial: {name} {value} out of range [{}, {}]",
                    channel.min, channel.max
                ));
            }
        }
    }

    fn validate_grid(&self, errors: &mut Vec<String>) {
        let Some(grid) = &self.grid else {
            return;
        };

        if let Err(e) = CropGrid::from_rows(grid.rows.clone()) {
            errors.push(format!("grid: {e}"));
        }

        for (r, row) in grid.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                if !(0.0..=100.0).contains(&cell.moisture) {
                    errors.push(format!(
                        "grid[{r}][{c}]: moisture {} out of range [0, 100]",
                        cell.moisture
                    ));
                }
                if !(0.0..=14.0).contains(&cell.ph) {
                    errors.push(format!(
                        "grid[{r}][{c}]: ph {} out of range [0, 14]",
                        cell.ph
                    ));
                }
                if !cell.temperature_c.is_finite() {
                    errors.push(format!("grid[{r}][{c}]: temperature_c is not finite"));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Read, parse, and validate a TOML config file.
pub fn load(path: &str) -> Result<Config> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("failed to read config: {path}"))?;
    let config: Config =
        toml::from_str(&contents).with_context(|| format!("failed to parse config: {path}"))?;
    config
        .validate()
        .with_context(|| format!("invalid config: {path}"))?;
    Ok(config)
}

/// Like [`load`], but falls back to built-in defaults when `path` does not
/// exist.
pub fn load_or_default(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        return load(path);
    }
    tracing::info!(path, "no config file, using defaults");
    Ok(Config::default())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Assert validation fails and the error message contains `needle`.
    fn assert_validation_err(cfg: &Config, needle: &str) {
        let err = cfg.validate().unwrap_err();
        let msg = format!("{err:#}");
        assert!(
            msg.contains(needle),
            "expected error containing {needle:?}, got: {msg}"
        );
    }

    fn cell(moisture: f64, ph: f64) -> GridCell {
        GridCell::new(24.0, moisture, ph, None)
    }

    // -- Parsing ----------------------------------------------------------

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[sim]
tick_ms = 500
seed = 42
scenario = "calm"
tank_capacity_l = 80.0
max_distance_m = 25.0

[sim.initial]
water_level_percent = 60.0
battery_percent = 40.0
geofence_distance = 3.5

[grid]
rows = [
  [ { temperature_c = 22.0, moisture = 35.0, ph = 6.5, last_checked_minutes_ago = 5 },
    { temperature_c = 24.0, moisture = 45.0, ph = 6.8 } ],
  [ { temperature_c = 21.0, moisture = 40.0, ph = 6.2 },
    { temperature_c = 23.0, moisture = 50.0, ph = 6.5, last_checked_minutes_ago = 0 } ],
]

[web]
port = 9000
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        config.validate().unwrap();

        assert_eq!(config.sim.tick_ms, 500);
        assert_eq!(config.sim.seed, Some(42));
        assert_eq!(config.scenario(), Scenario::Calm);
        assert_eq!(config.web.port, 9000);
        assert_eq!(config.initial_reading().geofence_distance, 3.5);
        assert_eq!(config.profile().geofence.max, 25.0);

        let grid = config.build_grid().unwrap();
        assert_eq!((grid.rows(), grid.cols()), (2, 2));
        assert_eq!(grid.get(0, 0).unwrap().last_checked_minutes_ago, Some(5));
        assert_eq!(grid.get(0, 1).unwrap().last_checked_minutes_ago, None);
    }

    #[test]
    fn parse_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        config.validate().unwrap();

        assert_eq!(config.sim.tick_ms, 2000);
        assert_eq!(config.sim.seed, None);
        assert_eq!(config.scenario(), Scenario::Dashboard);
        assert_eq!(config.web.port, 8080);
        assert_eq!(config.initial_reading(), TelemetryReading::default());
        assert_eq!(config.build_grid().unwrap(), CropGrid::demo());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: Config = toml::from_str("[sim]\ntick_ms = 100\n").unwrap();
        assert_eq!(config.sim.tick_ms, 100);
        assert_eq!(config.sim.tank_capacity_l, 50.0);
        assert_eq!(config.sim.initial.battery_percent, 85.0);
    }

    #[test]
    fn unknown_scenario_falls_back() {
        let config: Config = toml::from_str("[sim]\nscenario = \"hurricane\"\n").unwrap();
        assert_eq!(config.scenario(), Scenario::Dashboard);
    }

    // -- Validation: sim --------------------------------------------------

    #[test]
    fn zero_tick_rejected() {
        let mut cfg = Config::default();
        cfg.sim.tick_ms = 0;
        assert_validation_err(&cfg, "tick_ms must be positive");
    }

    #[test]
    fn non_positive_capacity_rejected() {
        let mut cfg = Config::default();
        cfg.sim.tank_capacity_l = 0.0;
        assert_validation_err(&cfg, "tank_capacity_l must be positive");
    }

    #[test]
    fn non_positive_distance_rejected() {
        let mut cfg = Config::default();
        cfg.sim.max_distance_m = -1.0;
        assert_validation_err(&cfg, "max_distance_m must be positive");
    }

    #[test]
    fn bad_distance_still_checks_other_initial_values() {
        let mut cfg = Config::default();
        cfg.sim.max_distance_m = -1.0;
        cfg.sim.initial.water_level_percent = 5.0;
        let msg = format!("{:#}", cfg.validate().unwrap_err());
        assert!(msg.contains("2 errors"), "{msg}");
        assert!(msg.contains("max_distance_m must be positive"), "{msg}");
        assert!(msg.contains("water_level_percent 5 out of range [10, 100]"), "{msg}");
        assert!(!msg.contains("geofence_distance"), "{msg}");
    }

    #[test]
    fn initial_water_below_floor_rejected() {
        let mut cfg = Config::default();
        cfg.sim.initial.water_level_percent = 5.0;
        assert_validation_err(&cfg, "water_level_percent 5 out of range [10, 100]");
    }

    #[test]
    fn initial_distance_beyond_geofence_rejected() {
        let mut cfg = Config::default();
        cfg.sim.max_distance_m = 10.0;
        assert_validation_err(&cfg, "geofence_distance 12 out of range [0, 10]");
    }

    #[test]
    fn all_errors_reported_together() {
        let mut cfg = Config::default();
        cfg.sim.tick_ms = 0;
        cfg.sim.initial.battery_percent = 150.0;
        let msg = format!("{:#}", cfg.validate().unwrap_err());
        assert!(msg.contains("2 errors"), "{msg}");
    }

    // -- Validation: grid -------------------------------------------------

    #[test]
    fn ragged_grid_rejected() {
        let cfg = Config {
            grid: Some(GridConfig {
                rows: vec![vec![cell(50.0, 6.5), cell(50.0, 6.5)], vec![cell(50.0, 6.5)]],
            }),
            ..Config::default()
        };
        assert_validation_err(&cfg, "grid row 1 has 1 cells, expected 2");
    }

    #[test]
    fn empty_grid_rejected() {
        let cfg = Config {
            grid: Some(GridConfig { rows: vec![] }),
            ..Config::default()
        };
        assert_validation_err(&cfg, "grid has no cells");
    }

    #[test]
    fn cell_moisture_out_of_range_rejected() {
        let cfg = Config {
            grid: Some(GridConfig {
                rows: vec![vec![cell(101.0, 6.5)]],
            }),
            ..Config::default()
        };
        assert_validation_err(&cfg, "grid[0][0]: moisture 101 out of range");
    }

    #[test]
    fn cell_ph_out_of_range_rejected() {
        let cfg = Config {
            grid: Some(GridConfig {
                rows: vec![vec![cell(50.0, 15.0)]],
            }),
            ..Config::default()
        };
        assert_validation_err(&cfg, "grid[0][0]: ph 15 out of range");
    }

    // -- Load -------------------------------------------------------------

    #[test]
    fn load_missing_file_errors() {
        assert!(load("/nonexistent/agribot.toml").is_err());
    }

    #[test]
    fn load_or_default_missing_file_uses_defaults() {
        let cfg = load_or_default("/nonexistent/agribot.toml").unwrap();
        assert_eq!(cfg.sim.tick_ms, 2000);
    }

    #[test]
    fn load_reads_and_validates_file() {
        let path = std::env::temp_dir().join(format!("agribot-cfg-{}.toml", std::process::id()));
        std::fs::write(&path, "[sim]\ntick_ms = 0\n").unwrap();

        let err = load(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("invalid config"));

        std::fs::remove_file(&path).unwrap();
    }
}
