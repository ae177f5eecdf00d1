//! Error types for the ripple core
//!
//! Everything here is a precondition violation: construction is rejected
//! up front, and operations after teardown are refused.

use thiserror::Error;

use crate::ripple::Cell;

/// Root error type for the ripple grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RippleError {
    /// Grid must have at least one row and one column.
    #[error("invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: u32, cols: u32 },

    /// Cell size must be a positive, finite pixel count.
    #[error("invalid cell size: {0}px")]
    InvalidCellSize(f32),

    /// Pulse interval must be finite and at least one millisecond.
    #[error("invalid pulse interval: {0}ms")]
    InvalidPulseInterval(f64),

    /// Activated cell lies outside the grid.
    #[error("cell ({}, {}) is outside the {rows}x{cols} grid", .cell.row, .cell.col)]
    CellOutOfBounds { cell: Cell, rows: u32, cols: u32 },

    /// The scheduler has been torn down.
    #[error("ripple scheduler has been torn down")]
    TornDown,

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

pub type RippleResult<T> = Result<T, RippleError>;
