//! Deterministic ripple core
//!
//! Everything the render surface needs to play a ripple lives here. This module
//! must stay pure and deterministic:
//! - Virtual clock only (the host advances time)
//! - Row-major cell order
//! - No DOM or platform dependencies

pub mod geometry;
pub mod scheduler;
pub mod session;
pub mod timer;
pub mod timing;

pub use geometry::{Cell, GridSpec};
pub use scheduler::{CellFrame, PulsePhase, PulseScheduler, RippleSnapshot};
pub use session::{RippleEvent, RippleSession, RippleSource};
pub use timer::{TimerHandle, TimerKind, TimerQueue, TimerStats};
pub use timing::{CellTiming, cell_timing, grid_timings};
