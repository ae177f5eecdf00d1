//! Grid geometry
//!
//! Cells are a derived enumeration of coordinates, never stored entities.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A grid cell coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

/// Grid dimensions, immutable for the lifetime of a scheduler
///
/// `rows` and `cols` must be positive; [`RippleConfig::validate`](crate::RippleConfig::validate)
/// enforces this before a grid is ever built from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
    /// Cell edge length in pixels
    pub cell_size: f32,
}

impl GridSpec {
    pub fn new(rows: u32, cols: u32, cell_size: f32) -> Self {
        Self {
            rows,
            cols,
            cell_size,
        }
    }

    /// The designated center cell (rounds toward the top-left on even sizes)
    pub fn center_cell(&self) -> Cell {
        Cell::new(self.rows.saturating_sub(1) / 2, self.cols.saturating_sub(1) / 2)
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All cells in row-major order
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows).flat_map(move |row| (0..self.cols).map(move |col| Cell::new(row, col)))
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Row-major index of a cell
    pub fn index_of(&self, cell: Cell) -> Option<usize> {
        self.contains(cell)
            .then(|| cell.row as usize * self.cols as usize + cell.col as usize)
    }

    /// Cell at a row-major index
    pub fn cell_at(&self, index: usize) -> Option<Cell> {
        if index >= self.len() {
            return None;
        }
        let cols = self.cols as usize;
        Some(Cell::new((index / cols) as u32, (index % cols) as u32))
    }

    /// Rendered grid size in pixels (width, height)
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.cols as f32, self.rows as f32) * self.cell_size
    }

    /// Top-left corner of a cell in pixels
    pub fn cell_origin_px(&self, cell: Cell) -> Vec2 {
        Vec2::new(cell.col as f32, cell.row as f32) * self.cell_size
    }

    /// Hit-test a point (pixels, grid-local) against the grid
    pub fn cell_at_px(&self, point: Vec2) -> Option<Cell> {
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let scaled = point / self.cell_size;
        let cell = Cell::new(scaled.y.floor() as u32, scaled.x.floor() as u32);
        self.contains(cell).then_some(cell)
    }
}
