use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use agribot_sim::grid::{MoistureStatus, PhStatus, TemperatureStatus};
use agribot_sim::reading::{BatteryTier, TankStatus};
use agribot_sim::{
    CellTier, CropGrid, CropKind, GridCell, GridError, StampedReading, TelemetryReading,
    TelemetrySimulator,
};

use crate::control::Ack;

/// Maximum number of events retained in the ring buffer.
const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

pub type SharedState = Arc<RwLock<DashboardState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Everything the dashboard renders.  Owned by the hub; the ticker advances
/// the reading, and watering requests replace the grid.
pub struct DashboardState {
    pub started_at: Instant,
    simulator: TelemetrySimulator,
    reading: StampedReading,
    tank_capacity_l: f64,
    grid: CropGrid,
    events: VecDeque<DashboardEvent>,
}

#[derive(Clone, Serialize)]
pub struct DashboardEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Watering,
    Move,
    Error,
    System,
}

// ---------------------------------------------------------------------------
// JSON responses (what the API returns)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub uptime_secs: u64,
    pub reading: StampedReading,
    pub tank: TankView,
    pub battery: BatteryView,
    pub geofence_distance_m: f64,
    pub grid: GridSummary,
    pub events: Vec<DashboardEvent>,
}

#[derive(Serialize)]
pub struct TankView {
    pub level_percent: f64,
    pub volume_l: f64,
    pub capacity_l: f64,
    pub status: TankStatus,
}

#[derive(Serialize)]
pub struct BatteryView {
    pub percent: f64,
    pub tier: BatteryTier,
}

#[derive(Serialize)]
pub struct GridSummary {
    pub rows: usize,
    pub cols: usize,
    pub dry: usize,
    pub moderate: usize,
    pub good: usize,
    pub needs_water: usize,
}

/// One heatmap cell as the crop detail view shows it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CellView {
    pub row: usize,
    pub col: usize,
    pub crop: CropKind,
    #[serde(flatten)]
    pub cell: GridCell,
    pub tier: CellTier,
    pub moisture_status: MoistureStatus,
    pub temperature_status: TemperatureStatus,
    pub ph_status: PhStatus,
    pub needs_water: bool,
    pub last_checked: String,
}

impl CellView {
    pub fn new(row: usize, col: usize, cell: &GridCell) -> Self {
        Self {
            row,
            col,
            crop: CropKind::for_column(col),
            cell: *cell,
            tier: cell.tier(),
            moisture_status: cell.moisture_status(),
            temperature_status: cell.temperature_status(),
            ph_status: cell.ph_status(),
            needs_water: cell.needs_water(),
            last_checked: cell.last_checked_label(),
        }
    }
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl DashboardState {
    pub fn new(
        simulator: TelemetrySimulator,
        initial: TelemetryReading,
        grid: CropGrid,
        tank_capacity_l: f64,
    ) -> Self {
        Self {
            started_at: Instant::now(),
            simulator,
            reading: StampedReading {
                reading: initial,
                updated_at: OffsetDateTime::now_utc(),
                tick: 0,
            },
            tank_capacity_l,
            grid,
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    pub fn into_shared(self) -> SharedState {
        Arc::new(RwLock::new(self))
    }

    /// Apply one simulator tick to the current reading.
    pub fn advance(&mut self) -> TelemetryReading {
        let next = self.simulator.tick(&self.reading.reading);
        self.reading = StampedReading {
            reading: next,
            updated_at: OffsetDateTime::now_utc(),
            tick: self.reading.tick + 1,
        };
        next
    }

    pub fn reading(&self) -> &StampedReading {
        &self.reading
    }

    pub fn grid(&self) -> &CropGrid {
        &self.grid
    }

    /// Water one cell.  On an out-of-range index the grid is left as it was.
    pub fn water(&mut self, row: usize, col: usize) -> Result<GridCell, GridError> {
        let next = match self.grid.watered(row, col) {
            Ok(next) => next,
            Err(e) => {
                self.record_error(format!("water rejected: {e}"));
                return Err(e);
            }
        };
        let cell = *next.cell(row, col)?;
        self.grid = next;

        let crop = CropKind::for_column(col);
        self.push_event(EventKind::Watering, format!("{crop} at [{row}, {col}] watered"));
        Ok(cell)
    }

    /// Record an acknowledged move command.
    pub fn record_move(&mut self, ack: &Ack) {
        self.push_event(
            EventKind::Move,
            format!("move {} (seq {})", ack.direction, ack.seq),
        );
    }

    /// Record an error event.
    pub fn record_error(&mut self, detail: String) {
        self.push_event(EventKind::Error, detail);
    }

    /// Record a generic system event.
    pub fn record_system(&mut self, detail: String) {
        self.push_event(EventKind::System, detail);
    }

    pub fn grid_view(&self) -> Vec<CellView> {
        self.grid
            .iter()
            .map(|(row, col, cell)| CellView::new(row, col, cell))
            .collect()
    }

    /// Build the JSON-serialisable status snapshot.
    pub fn to_status(&self) -> StatusResponse {
        let r = &self.reading.reading;
        let (dry, moderate, good) = self.grid.tier_counts();

        StatusResponse {
            uptime_secs: self.started_at.elapsed().as_secs(),
            reading: self.reading,
            tank: TankView {
                level_percent: r.water_level_percent,
                volume_l: r.tank_volume_l(self.tank_capacity_l),
                capacity_l: self.tank_capacity_l,
                status: r.tank_status(),
            },
            battery: BatteryView {
                percent: r.battery_percent,
                tier: r.battery_tier(),
            },
            geofence_distance_m: r.geofence_distance,
            grid: GridSummary {
                rows: self.grid.rows(),
                cols: self.grid.cols(),
                dry,
                moderate,
                good,
                needs_water: self.grid.iter().filter(|(_, _, c)| c.needs_water()).count(),
            },
            events: self.events.iter().rev().cloned().collect(),
        }
    }

    fn push_event(&mut self, kind: EventKind, detail: String) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(DashboardEvent {
            ts: OffsetDateTime::now_utc(),
            kind,
            detail,
        });
    }
}

// ===========================================================================
// Tests
// ===========================================================================
