//! Simulated telemetry and crop-grid model for the Agribottz field robot.
//!
//! Everything here is local and in-memory: readings come from a seeded or
//! entropy-backed random walk, and the crop grid changes only when a cell is
//! watered.

pub mod grid;
pub mod reading;
pub mod sim;
pub mod ticker;

pub use grid::{CellTier, CropGrid, CropKind, GridCell, GridError};
pub use reading::{StampedReading, TelemetryReading};
pub use sim::{Scenario, SimProfile, TelemetrySimulator};
pub use ticker::Ticker;
