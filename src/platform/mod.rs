//! Platform abstraction layer
//!
//! Turns host timestamps (`performance.now()` on web, simulated time on
//! native) into the elapsed milliseconds the ripple scheduler advances by.

/// Largest delta a single frame may advance the clock by.
///
/// `requestAnimationFrame` stops while the tab is hidden; without a cap the
/// first frame after returning would replay every missed pulse at once.
pub const MAX_FRAME_DELTA_MS: f64 = 1000.0;

/// Converts absolute host timestamps into clamped frame deltas
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed time since the previous frame. The first frame yields 0.
    pub fn tick(&mut self, now_ms: f64) -> f64 {
        let delta = match self.last_ms {
            Some(last) => (now_ms - last).clamp(0.0, MAX_FRAME_DELTA_MS),
            None => 0.0,
        };
        self.last_ms = Some(now_ms);
        delta
    }

    /// Forget the previous timestamp (e.g. after the host was suspended)
    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}
