//! Ripple grid configuration
//!
//! Supplied once per mounted grid. Changing it means rebuilding the
//! scheduler (see [`PulseScheduler::reconfigure`](crate::PulseScheduler::reconfigure)).

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{RippleError, RippleResult};
use crate::ripple::GridSpec;

/// Configuration for one ripple grid instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleConfig {
    /// Number of cell rows
    pub rows: u32,
    /// Number of cell columns
    pub cols: u32,
    /// Cell edge length in pixels
    pub cell_size: f32,

    // === Auto pulse ===
    /// Emit center ripples on a recurring cadence
    pub auto_pulse: bool,
    /// Time between automatic pulses
    pub pulse_interval_ms: f64,

    /// How far the center cell pops up (pixels)
    pub pop_height_px: f32,
}

impl Default for RippleConfig {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            cell_size: DEFAULT_CELL_SIZE,

            auto_pulse: true,
            pulse_interval_ms: DEFAULT_PULSE_INTERVAL_MS,

            pop_height_px: DEFAULT_POP_HEIGHT_PX,
        }
    }
}

impl RippleConfig {
    /// Check construction preconditions
    pub fn validate(&self) -> RippleResult<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RippleError::InvalidDimensions {
                rows: self.rows,
                cols: self.cols,
            });
        }
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(RippleError::InvalidCellSize(self.cell_size));
        }
        let interval = self.pulse_interval_ms;
        if !(interval.is_finite() && interval >= MIN_PULSE_INTERVAL_MS) {
            return Err(RippleError::InvalidPulseInterval(interval));
        }
        Ok(())
    }

    /// Grid geometry described by this configuration
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.rows, self.cols, self.cell_size)
    }

    /// Parse a (possibly partial) JSON configuration and validate it
    pub fn from_json(json: &str) -> RippleResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RippleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse stored JSON, falling back to defaults when it is missing or invalid
    fn from_stored(json: Option<String>, origin: &str) -> Self {
        match json.as_deref().map(Self::from_json) {
            Some(Ok(config)) => {
                log::info!("Loaded ripple config from {}", origin);
                config
            }
            Some(Err(e)) => {
                log::warn!("Ignoring ripple config from {}: {}", origin, e);
                Self::default()
            }
            None => {
                log::info!("Using default ripple config");
                Self::default()
            }
        }
    }

    /// Load configuration from LocalStorage key `ripple_grid_config`
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let json = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .and_then(|storage| storage.get_item("ripple_grid_config").ok().flatten());
        Self::from_stored(json, "LocalStorage")
    }

    /// Load configuration from the `RIPPLE_GRID_CONFIG` environment variable (JSON)
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::from_stored(std::env::var("RIPPLE_GRID_CONFIG").ok(), "RIPPLE_GRID_CONFIG")
    }
}
