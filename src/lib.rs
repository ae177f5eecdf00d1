//! Ripple Grid - distance-staggered ripple animations on a cell grid
//!
//! Core modules:
//! - `ripple`: Deterministic core (geometry, timing, timers, pulse scheduler)
//! - `config`: Component configuration and persistence
//! - `platform`: Browser/native host clock
//! - `error`: Precondition errors

pub mod config;
pub mod error;
pub mod platform;
pub mod ripple;

pub use config::RippleConfig;
pub use error::{RippleError, RippleResult};
pub use ripple::{Cell, CellTiming, PulsePhase, PulseScheduler, RippleEvent, RippleSource};

/// Animation contract constants
pub mod consts {
    /// Delay before the first automatic pulse after construction
    pub const STARTUP_DELAY_MS: f64 = 300.0;

    /// Ripple delay per unit of Euclidean distance from the trigger cell
    pub const DELAY_PER_UNIT_MS: f64 = 55.0;
    /// Base animation duration at the trigger cell
    pub const BASE_DURATION_MS: f64 = 200.0;
    /// Extra animation duration per unit of distance (farther cells animate slower)
    pub const DURATION_PER_UNIT_MS: f64 = 80.0;

    /// Configuration defaults
    pub const DEFAULT_ROWS: u32 = 8;
    pub const DEFAULT_COLS: u32 = 27;
    pub const DEFAULT_CELL_SIZE: f32 = 56.0;
    pub const DEFAULT_PULSE_INTERVAL_MS: f64 = 3600.0;
    pub const DEFAULT_POP_HEIGHT_PX: f32 = 28.0;

    /// Shortest accepted pulse interval
    pub const MIN_PULSE_INTERVAL_MS: f64 = 1.0;

    /// Ripples kept between drains; older ones are dropped first
    pub const MAX_BUFFERED_EVENTS: usize = 256;
}
