//! Crop grid: per-cell soil readings and the watering transition.
//!
//! The grid is only ever changed by [`CropGrid::watered`], which returns a new
//! grid and leaves the receiver untouched.  Tiers and statuses are derived on
//! demand from cell state and never stored.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Moisture a cell reads right after it has been watered, percent.
pub const WATERED_MOISTURE: f64 = 80.0;

/// Below this moisture the crop detail view raises a low-moisture alert.
pub const LOW_MOISTURE_ALERT: f64 = 40.0;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// `(row, col)` lies outside a `rows x cols` grid.
    InvalidIndex {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    /// Row `row` has `found` cells where the first row has `expected`.
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    /// No rows, or rows with no cells.
    Empty,
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidIndex { row, col, rows, cols } => {
                write!(f, "cell [{row}, {col}] is outside the {rows}x{cols} grid")
            }
            Self::Ragged { row, expected, found } => {
                write!(f, "grid row {row} has {found} cells, expected {expected}")
            }
            Self::Empty => write!(f, "grid has no cells"),
        }
    }
}

impl std::error::Error for GridError {}

// ---------------------------------------------------------------------------
// Cell
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Soil temperature, degrees Celsius.
    pub temperature_c: f64,
    /// Soil moisture, percent.
    pub moisture: f64,
    pub ph: f64,
    /// Minutes since the robot last checked this cell; `None` if never.
    #[serde(default)]
    pub last_checked_minutes_ago: Option<u32>,
}

impl GridCell {
    pub fn new(temperature_c: f64, moisture: f64, ph: f64, last_checked_minutes_ago: Option<u32>) -> Self {
        Self {
            temperature_c,
            moisture,
            ph,
            last_checked_minutes_ago,
        }
    }

    pub fn just_watered(&self) -> bool {
        self.last_checked_minutes_ago == Some(0)
    }

    pub fn tier(&self) -> CellTier {
        CellTier::classify(self)
    }

    pub fn moisture_status(&self) -> MoistureStatus {
        MoistureStatus::classify(self.moisture)
    }

    pub fn temperature_status(&self) -> TemperatureStatus {
        TemperatureStatus::classify(self.temperature_c)
    }

    pub fn ph_status(&self) -> PhStatus {
        PhStatus::classify(self.ph)
    }

    pub fn needs_water(&self) -> bool {
        self.moisture < LOW_MOISTURE_ALERT
    }

    /// Human-readable "last analysed" text.
    pub fn last_checked_label(&self) -> String {
        match self.last_checked_minutes_ago {
            None => "Never checked".to_string(),
            Some(0) => "Just now".to_string(),
            Some(n) => format!("{n} minutes ago"),
        }
    }
}

// ---------------------------------------------------------------------------
// Classifications
// ---------------------------------------------------------------------------

/// Heatmap colour band of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CellTier {
    Dry,
    Moderate,
    Good,
}

impl CellTier {
    pub fn classify(cell: &GridCell) -> Self {
        if cell.just_watered() {
            Self::Good
        } else if cell.moisture < 30.0 {
            Self::Dry
        } else if cell.moisture < 60.0 {
            Self::Moderate
        } else {
            Self::Good
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MoistureStatus {
    Low,
    Moderate,
    Optimal,
}

impl MoistureStatus {
    pub fn classify(moisture: f64) -> Self {
        if moisture < LOW_MOISTURE_ALERT {
            Self::Low
        } else if moisture < 60.0 {
            Self::Moderate
        } else {
            Self::Optimal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureStatus {
    Cold,
    Optimal,
    Hot,
}

impl TemperatureStatus {
    pub fn classify(temperature_c: f64) -> Self {
        if temperature_c < 20.0 {
            Self::Cold
        } else if temperature_c < 28.0 {
            Self::Optimal
        } else {
            Self::Hot
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PhStatus {
    Acidic,
    Neutral,
    Alkaline,
}

impl PhStatus {
    pub fn classify(ph: f64) -> Self {
        if ph < 6.0 {
            Self::Acidic
        } else if ph <= 7.5 {
            Self::Neutral
        } else {
            Self::Alkaline
        }
    }
}

/// Crop planted in a column.  Columns 0-1 tomato, 2-3 onion, the rest carrot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CropKind {
    Tomato,
    Onion,
    Carrot,
}

impl CropKind {
    pub fn for_column(col: usize) -> Self {
        match col {
            0 | 1 => Self::Tomato,
            2 | 3 => Self::Onion,
            _ => Self::Carrot,
        }
    }
}

impl fmt::Display for CropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tomato => write!(f, "Tomato"),
            Self::Onion => write!(f, "Onion"),
            Self::Carrot => write!(f, "Carrot"),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Fixed-size, row-major grid of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct CropGrid {
    rows: usize,
    cols: usize,
    cells: Vec<GridCell>,
}

impl CropGrid {
    /// Build a grid from nested rows.  Every row must have the same, non-zero
    /// number of cells.
    pub fn from_rows(rows: Vec<Vec<GridCell>>) -> Result<Self, GridError> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(GridError::Empty);
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(GridError::Ragged {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            cells: rows.into_iter().flatten().collect(),
        })
    }

    /// The 3 x 5 sample field the dashboard opens with.
    pub fn demo() -> Self {
        const TEMPERATURES: [[f64; 5]; 3] = [
            [22.0, 24.0, 26.0, 28.0, 30.0],
            [21.0, 23.0, 25.0, 27.0, 29.0],
            [20.0, 22.0, 24.0, 26.0, 28.0],
        ];
        const MOISTURES: [[f64; 5]; 3] = [
            [35.0, 45.0, 50.0, 60.0, 70.0],
            [40.0, 50.0, 55.0, 65.0, 75.0],
            [30.0, 40.0, 45.0, 55.0, 65.0],
        ];
        const PH: [[f64; 5]; 3] = [
            [6.5, 6.8, 7.0, 7.2, 7.5],
            [6.2, 6.5, 6.8, 7.0, 7.3],
            [6.0, 6.3, 6.5, 6.8, 7.0],
        ];
        const LAST_CHECKED: [[Option<u32>; 5]; 3] = [
            [Some(5), Some(10), Some(15), None, Some(2)],
            [Some(3), Some(8), Some(12), Some(20), None],
            [None, Some(5), Some(10), Some(15), Some(25)],
        ];

        let mut cells = Vec::with_capacity(15);
        for r in 0..3 {
            for c in 0..5 {
                cells.push(GridCell::new(
                    TEMPERATURES[r][c],
                    MOISTURES[r][c],
                    PH[r][c],
                    LAST_CHECKED[r][c],
                ));
            }
        }

        Self { rows: 3, cols: 5, cells }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&GridCell> {
        self.cell(row, col).ok()
    }

    /// Like [`CropGrid::get`], but reports a missing cell as an error.
    pub fn cell(&self, row: usize, col: usize) -> Result<&GridCell, GridError> {
        self.index(row, col).map(|i| &self.cells[i])
    }

    /// Cells in row-major order with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &GridCell)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / self.cols, i % self.cols, cell))
    }

    /// A copy of this grid with cell `(row, col)` freshly watered.
    ///
    /// Fails with [`GridError::InvalidIndex`] when the cell does not exist;
    /// `self` is never modified either way.
    pub fn watered(&self, row: usize, col: usize) -> Result<Self, GridError> {
        let i = self.index(row, col)?;
        let mut next = self.clone();
        let cell = &mut next.cells[i];
        cell.moisture = WATERED_MOISTURE;
        cell.last_checked_minutes_ago = Some(0);
        Ok(next)
    }

    /// Count of cells per heatmap tier: `(dry, moderate, good)`.
    pub fn tier_counts(&self) -> (usize, usize, usize) {
        self.cells.iter().fold((0, 0, 0), |(d, m, g), cell| match cell.tier() {
            CellTier::Dry => (d + 1, m, g),
            CellTier::Moderate => (d, m + 1, g),
            CellTier::Good => (d, m, g + 1),
        })
    }

    fn index(&self, row: usize, col: usize) -> Result<usize, GridError> {
        if row < self.rows && col < self.cols {
            Ok(row * self.cols + col)
        } else {
            Err(GridError::InvalidIndex {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }
}

impl Default for CropGrid {
    fn default() -> Self {
        Self::demo()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
