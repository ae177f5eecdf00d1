//! Ripple session state
//!
//! The single source of truth for where the latest ripple started and
//! whether a newer ripple has superseded the one currently animating.

use serde::{Deserialize, Serialize};

use super::geometry::Cell;

/// What caused a ripple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RippleSource {
    /// One-shot startup timer
    Startup,
    /// Recurring auto-pulse timer
    Pulse,
    /// User activated a cell
    Manual,
    /// Render surface reported the center pop finished
    CenterComplete,
}

/// A triggered ripple
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RippleEvent {
    pub origin: Cell,
    pub generation: u64,
    pub source: RippleSource,
}

/// Latest trigger cell plus generation counter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RippleSession {
    clicked_cell: Option<Cell>,
    generation: u64,
}

impl RippleSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new ripple at `cell`, superseding any in flight
    pub fn trigger(&mut self, cell: Cell, source: RippleSource) -> RippleEvent {
        self.clicked_cell = Some(cell);
        self.generation += 1;
        RippleEvent {
            origin: cell,
            generation: self.generation,
            source,
        }
    }

    pub fn clicked_cell(&self) -> Option<Cell> {
        self.clicked_cell
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a callback tagged with `generation` still belongs to the latest ripple
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}
