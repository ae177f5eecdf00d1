//! Distance-based ripple timing
//!
//! Each cell's animation is delayed and stretched by its Euclidean distance
//! from the trigger cell, giving a smooth, decaying wavefront.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Cell, GridSpec};
use crate::consts::*;

/// Animation timing for a single cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellTiming {
    pub delay_ms: f64,
    pub duration_ms: f64,
}

#[inline]
fn cell_pos(cell: Cell) -> DVec2 {
    DVec2::new(cell.row as f64, cell.col as f64)
}

/// Timing for `cell` given the most recent trigger (no trigger = no stagger)
pub fn cell_timing(trigger: Option<Cell>, cell: Cell) -> CellTiming {
    let distance = trigger.map_or(0.0, |origin| cell_pos(origin).distance(cell_pos(cell)));
    CellTiming {
        delay_ms: (distance * DELAY_PER_UNIT_MS).max(0.0),
        duration_ms: BASE_DURATION_MS + distance * DURATION_PER_UNIT_MS,
    }
}

/// Row-major timing table for a whole grid
pub fn grid_timings(grid: &GridSpec, trigger: Option<Cell>) -> Vec<CellTiming> {
    grid.cells().map(|cell| cell_timing(trigger, cell)).collect()
}
