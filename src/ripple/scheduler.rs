//! Auto-pulse scheduler
//!
//! Owns the ripple session and at most two pending timers: the one-shot
//! startup timer and the recurring pulse timer. Every transition that arms a
//! timer first cancels whatever is in the slot, so two timers of the same kind
//! can never be live at once, and nothing survives [`PulseScheduler::teardown`].
//!
//! The host drives time with [`PulseScheduler::advance`]. The next pulse is
//! always armed through the timer queue, never by the scheduler calling itself.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::geometry::{Cell, GridSpec};
use super::session::{RippleEvent, RippleSession, RippleSource};
use super::timer::{TimerHandle, TimerKind, TimerQueue, TimerStats};
use super::timing::{CellTiming, cell_timing};
use crate::config::RippleConfig;
use crate::consts::{MAX_BUFFERED_EVENTS, STARTUP_DELAY_MS};
use crate::error::{RippleError, RippleResult};

/// Which timer, if any, the scheduler is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PulsePhase {
    /// No timers pending (auto pulse off, or torn down)
    Idle,
    /// Startup timer pending
    WaitingInitial,
    /// Recurring pulse timer pending
    WaitingRecurring,
}

/// Read model polled by the render surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RippleSnapshot {
    pub clicked_cell: Option<Cell>,
    pub generation: u64,
    pub center_cell: Cell,
    pub phase: PulsePhase,
}

/// Everything needed to animate one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellFrame {
    pub cell: Cell,
    pub delay_ms: f64,
    pub duration_ms: f64,
    /// A ripple has been triggered, so the cell plays its ripple animation
    pub rippling: bool,
    /// Pop offset, set only on the center cell
    pub pop_height_px: Option<f32>,
}

impl CellFrame {
    /// CSS custom properties for this cell. Timing is only present once a
    /// ripple has been triggered.
    pub fn style_properties(&self) -> Vec<(&'static str, String)> {
        let mut props = Vec::with_capacity(3);
        if self.rippling {
            props.push(("--delay", format!("{}ms", self.delay_ms)));
            props.push(("--duration", format!("{}ms", self.duration_ms)));
        }
        if let Some(pop) = self.pop_height_px {
            props.push(("--pop", format!("-{}px", pop)));
        }
        props
    }
}

/// Ripple controller for one mounted grid
#[derive(Debug)]
pub struct PulseScheduler {
    config: RippleConfig,
    grid: GridSpec,
    session: RippleSession,
    timers: TimerQueue,
    /// Startup timer slot
    initial: Option<TimerHandle>,
    /// Recurring pulse timer slot
    recurring: Option<TimerHandle>,
    torn_down: bool,
    /// Ripples emitted since the last drain, newest last
    events: VecDeque<RippleEvent>,
}

impl PulseScheduler {
    /// Build a scheduler, arming the startup timer when auto pulse is on
    pub fn new(config: RippleConfig) -> RippleResult<Self> {
        config.validate()?;

        let mut scheduler = Self {
            grid: config.grid(),
            config,
            session: RippleSession::new(),
            timers: TimerQueue::new(),
            initial: None,
            recurring: None,
            torn_down: false,
            events: VecDeque::new(),
        };

        if scheduler.config.auto_pulse {
            scheduler.schedule_initial();
        }

        log::info!(
            "Ripple grid {}x{} ready (auto pulse: {}, interval: {}ms)",
            scheduler.grid.rows,
            scheduler.grid.cols,
            scheduler.config.auto_pulse,
            scheduler.config.pulse_interval_ms
        );

        Ok(scheduler)
    }

    /// User activated a cell: ripple from it and restart the pulse countdown
    pub fn activate_cell(&mut self, cell: Cell) -> RippleResult<RippleEvent> {
        self.ensure_live()?;
        if !self.grid.contains(cell) {
            return Err(RippleError::CellOutOfBounds {
                cell,
                rows: self.grid.rows,
                cols: self.grid.cols,
            });
        }
        Ok(self.restart_from(cell, RippleSource::Manual))
    }

    /// The center cell's pop animation finished: ripple from the center again
    ///
    /// May arrive at any time relative to pending timers; it always replaces
    /// them rather than adding to them.
    pub fn notify_center_animation_complete(&mut self) -> RippleResult<RippleEvent> {
        self.ensure_live()?;
        let center = self.grid.center_cell();
        Ok(self.restart_from(center, RippleSource::CenterComplete))
    }

    /// Cancel every pending timer. Nothing fires afterward.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.cancel_all();
        self.torn_down = true;
        log::info!(
            "Ripple grid torn down at generation {}",
            self.session.generation()
        );
    }

    /// Tear down and rebuild with a new configuration
    pub fn reconfigure(&mut self, config: RippleConfig) -> RippleResult<()> {
        config.validate()?;
        self.teardown();
        *self = Self::new(config)?;
        Ok(())
    }

    /// Advance the virtual clock, firing due timers in order
    ///
    /// Non-finite or non-positive `elapsed_ms` is ignored.
    pub fn advance(&mut self, elapsed_ms: f64) {
        if self.torn_down || !elapsed_ms.is_finite() || elapsed_ms <= 0.0 {
            return;
        }
        let until = self.timers.now_ms() + elapsed_ms;
        while let Some((handle, kind)) = self.timers.pop_due(until) {
            self.on_timer_fired(handle, kind);
        }
        self.timers.advance_to(until);
    }

    /// Take the ripples emitted since the last call
    ///
    /// At most [`MAX_BUFFERED_EVENTS`] are kept; older ones are dropped.
    pub fn drain_events(&mut self) -> Vec<RippleEvent> {
        self.events.drain(..).collect()
    }

    pub fn phase(&self) -> PulsePhase {
        if self.initial.is_some() {
            PulsePhase::WaitingInitial
        } else if self.recurring.is_some() {
            PulsePhase::WaitingRecurring
        } else {
            PulsePhase::Idle
        }
    }

    pub fn snapshot(&self) -> RippleSnapshot {
        RippleSnapshot {
            clicked_cell: self.session.clicked_cell(),
            generation: self.session.generation(),
            center_cell: self.grid.center_cell(),
            phase: self.phase(),
        }
    }

    /// Timing for one cell relative to the latest ripple
    pub fn cell_timing(&self, cell: Cell) -> CellTiming {
        cell_timing(self.session.clicked_cell(), cell)
    }

    /// Per-cell animation parameters, row-major
    pub fn cell_frames(&self) -> Vec<CellFrame> {
        let center = self.grid.center_cell();
        let rippling = self.session.clicked_cell().is_some();
        self.grid
            .cells()
            .map(|cell| {
                let timing = self.cell_timing(cell);
                CellFrame {
                    cell,
                    delay_ms: timing.delay_ms,
                    duration_ms: timing.duration_ms,
                    rippling,
                    pop_height_px: (cell == center).then_some(self.config.pop_height_px),
                }
            })
            .collect()
    }

    pub fn config(&self) -> &RippleConfig {
        &self.config
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn session(&self) -> &RippleSession {
        &self.session
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Current virtual time
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    /// When the next automatic ripple is due, if one is armed
    pub fn next_pulse_at_ms(&self) -> Option<f64> {
        self.initial
            .or(self.recurring)
            .and_then(|handle| self.timers.deadline_ms(handle))
    }

    pub fn timer_stats(&self) -> TimerStats {
        self.timers.stats()
    }

    /// Pending timers of one kind, straight from the queue
    pub fn pending_timers(&self, kind: TimerKind) -> usize {
        self.timers.pending_count(kind)
    }

    fn ensure_live(&self) -> RippleResult<()> {
        if self.torn_down {
            Err(RippleError::TornDown)
        } else {
            Ok(())
        }
    }

    fn on_timer_fired(&mut self, handle: TimerHandle, kind: TimerKind) {
        let slot = match kind {
            TimerKind::Initial => &mut self.initial,
            TimerKind::Recurring => &mut self.recurring,
        };
        // Only the handle currently held in its slot may fire
        if *slot != Some(handle) {
            log::debug!("Ignoring stale {:?} timer {:?}", kind, handle);
            return;
        }
        *slot = None;

        let source = match kind {
            TimerKind::Initial => RippleSource::Startup,
            TimerKind::Recurring => RippleSource::Pulse,
        };
        let center = self.grid.center_cell();
        self.emit(center, source);
        self.schedule_recurring();
    }

    fn restart_from(&mut self, cell: Cell, source: RippleSource) -> RippleEvent {
        let event = self.emit(cell, source);
        if self.config.auto_pulse {
            self.schedule_recurring();
        }
        event
    }

    fn emit(&mut self, cell: Cell, source: RippleSource) -> RippleEvent {
        let event = self.session.trigger(cell, source);
        log::debug!(
            "Ripple #{} from ({}, {}) [{:?}] at {}ms",
            event.generation,
            cell.row,
            cell.col,
            source,
            self.timers.now_ms()
        );
        if self.events.len() >= MAX_BUFFERED_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
        event
    }

    fn schedule_initial(&mut self) {
        self.cancel_all();
        self.initial = Some(self.timers.schedule(TimerKind::Initial, STARTUP_DELAY_MS));
    }

    fn schedule_recurring(&mut self) {
        self.cancel_all();
        self.recurring = Some(
            self.timers
                .schedule(TimerKind::Recurring, self.config.pulse_interval_ms),
        );
    }

    /// Clear both slots before cancelling, so a cancelled handle is never honoured
    fn cancel_all(&mut self) {
        if let Some(handle) = self.initial.take() {
            self.timers.cancel(handle);
        }
        if let Some(handle) = self.recurring.take() {
            self.timers.cancel(handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn auto_config(pulse_interval_ms: f64) -> RippleConfig {
        RippleConfig {
            pulse_interval_ms,
            ..Default::default()
        }
    }

    fn manual_config() -> RippleConfig {
        RippleConfig {
            auto_pulse: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_startup_then_recurring() {
        let mut scheduler = PulseScheduler::new(auto_config(3600.0)).unwrap();
        let center = Cell::new(3, 13);
        assert_eq!(scheduler.phase(), PulsePhase::WaitingInitial);

        scheduler.advance(299.0);
        assert!(scheduler.drain_events().is_empty());

        scheduler.advance(1.0);
        let events = scheduler.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin, center);
        assert_eq!(events[0].generation, 1);
        assert_eq!(events[0].source, RippleSource::Startup);
        assert_eq!(scheduler.phase(), PulsePhase::WaitingRecurring);

        scheduler.advance(3600.0);
        let events = scheduler.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].origin, center);
        assert_eq!(events[0].generation, 2);
        assert_eq!(events[0].source, RippleSource::Pulse);
    }

    #[test]
    fn test_manual_activation_resets_cadence() {
        let mut scheduler = PulseScheduler::new(auto_config(3600.0)).unwrap();
        scheduler.advance(300.0);
        scheduler.advance(3600.0);
        assert_eq!(scheduler.snapshot().generation, 2);
        scheduler.drain_events();

        let event = scheduler.activate_cell(Cell::new(2, 2)).unwrap();
        assert_eq!(event.origin, Cell::new(2, 2));
        assert_eq!(event.generation, 3);
        assert_eq!(scheduler.snapshot().clicked_cell, Some(Cell::new(2, 2)));

        // Nothing before the full interval has elapsed again
        scheduler.advance(3599.0);
        assert_eq!(scheduler.drain_events(), vec![event]);

        scheduler.advance(1.0);
        let events = scheduler.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].generation, 4);
        assert_eq!(events[0].origin, Cell::new(3, 13));
        assert_eq!(scheduler.now_ms(), 300.0 + 3600.0 + 3600.0);
    }

    #[test]
    fn test_activation_during_startup_cancels_initial() {
        let mut scheduler = PulseScheduler::new(auto_config(1000.0)).unwrap();
        scheduler.advance(100.0);
        scheduler.activate_cell(Cell::new(0, 0)).unwrap();
        assert_eq!(scheduler.phase(), PulsePhase::WaitingRecurring);
        assert_eq!(scheduler.pending_timers(TimerKind::Initial), 0);

        // Startup deadline passes without a second ripple
        scheduler.advance(500.0);
        assert_eq!(scheduler.drain_events().len(), 1);
        assert_eq!(scheduler.next_pulse_at_ms(), Some(1100.0));
    }

    #[test]
    fn test_center_complete_replaces_pending_timer() {
        let mut scheduler = PulseScheduler::new(auto_config(3600.0)).unwrap();
        scheduler.advance(300.0);
        scheduler.advance(1000.0);

        let event = scheduler.notify_center_animation_complete().unwrap();
        assert_eq!(event.origin, Cell::new(3, 13));
        assert_eq!(event.source, RippleSource::CenterComplete);
        assert_eq!(scheduler.pending_timers(TimerKind::Recurring), 1);
        assert_eq!(scheduler.next_pulse_at_ms(), Some(1300.0 + 3600.0));

        // Repeated notices never stack timers
        scheduler.notify_center_animation_complete().unwrap();
        scheduler.notify_center_animation_complete().unwrap();
        assert_eq!(scheduler.pending_timers(TimerKind::Recurring), 1);
        assert_eq!(scheduler.timer_stats().outstanding(), 1);
    }

    #[test]
    fn test_auto_pulse_off_never_self_triggers() {
        let mut scheduler = PulseScheduler::new(manual_config()).unwrap();
        assert_eq!(scheduler.phase(), PulsePhase::Idle);
        scheduler.advance(1_000_000.0);
        assert!(scheduler.drain_events().is_empty());
        assert_eq!(scheduler.timer_stats().scheduled, 0);

        let event = scheduler.activate_cell(Cell::new(1, 1)).unwrap();
        assert_eq!(event.generation, 1);
        scheduler.notify_center_animation_complete().unwrap();
        assert_eq!(scheduler.phase(), PulsePhase::Idle);

        scheduler.advance(1_000_000.0);
        assert_eq!(scheduler.drain_events().len(), 2);
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut scheduler = PulseScheduler::new(auto_config(3600.0)).unwrap();
        scheduler.advance(300.0);
        scheduler.drain_events();

        scheduler.teardown();
        assert_eq!(scheduler.phase(), PulsePhase::Idle);
        assert_eq!(scheduler.timer_stats().outstanding(), 0);

        scheduler.advance(100_000.0);
        assert!(scheduler.drain_events().is_empty());
        assert_eq!(
            scheduler.activate_cell(Cell::new(0, 0)),
            Err(RippleError::TornDown)
        );
        assert_eq!(
            scheduler.notify_center_animation_complete(),
            Err(RippleError::TornDown)
        );
        assert_eq!(scheduler.snapshot().generation, 1);
    }

    #[test]
    fn test_out_of_bounds_activation_rejected() {
        let mut scheduler = PulseScheduler::new(manual_config()).unwrap();
        let err = scheduler.activate_cell(Cell::new(8, 0)).unwrap_err();
        assert!(matches!(err, RippleError::CellOutOfBounds { rows: 8, cols: 27, .. }));
        assert_eq!(scheduler.snapshot().generation, 0);
    }

    #[test]
    fn test_infinite_advance_is_ignored() {
        let mut scheduler = PulseScheduler::new(auto_config(3600.0)).unwrap();
        scheduler.advance(f64::INFINITY);
        scheduler.advance(f64::NAN);
        scheduler.advance(-5.0);
        assert_eq!(scheduler.now_ms(), 0.0);
        assert!(scheduler.drain_events().is_empty());
        assert_eq!(scheduler.phase(), PulsePhase::WaitingInitial);
    }

    #[test]
    fn test_long_advance_keeps_bounded_buffer() {
        let mut scheduler = PulseScheduler::new(auto_config(1.0)).unwrap();
        scheduler.advance(100_000.0);

        let events = scheduler.drain_events();
        assert_eq!(events.len(), MAX_BUFFERED_EVENTS);
        // Newest ripples are the ones kept
        assert_eq!(events.last().map(|e| e.generation), Some(scheduler.snapshot().generation));
        assert!(events.windows(2).all(|w| w[1].generation == w[0].generation + 1));
        assert_eq!(scheduler.timer_stats().outstanding(), 1);
    }

    #[test]
    fn test_tiny_interval_rejected() {
        assert!(matches!(
            PulseScheduler::new(auto_config(1e-300)),
            Err(RippleError::InvalidPulseInterval(_))
        ));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RippleConfig {
            cols: 0,
            ..Default::default()
        };
        assert!(PulseScheduler::new(config).is_err());
    }

    #[test]
    fn test_reconfigure_rebuilds() {
        let mut scheduler = PulseScheduler::new(auto_config(3600.0)).unwrap();
        scheduler.advance(300.0);
        scheduler
            .reconfigure(RippleConfig {
                rows: 3,
                cols: 3,
                auto_pulse: false,
                ..Default::default()
            })
            .unwrap();

        assert!(!scheduler.is_torn_down());
        assert_eq!(scheduler.phase(), PulsePhase::Idle);
        assert_eq!(scheduler.snapshot().generation, 0);
        assert_eq!(scheduler.snapshot().center_cell, Cell::new(1, 1));
        scheduler.advance(10_000.0);
        assert!(scheduler.drain_events().is_empty());
    }

    #[test]
    fn test_cell_frames() {
        let config = RippleConfig {
            rows: 3,
            cols: 3,
            auto_pulse: false,
            pop_height_px: 14.0,
            ..Default::default()
        };
        let mut scheduler = PulseScheduler::new(config).unwrap();

        let frames = scheduler.cell_frames();
        assert_eq!(frames.len(), 9);
        assert!(frames.iter().all(|f| f.delay_ms == 0.0));
        assert_eq!(frames[4].pop_height_px, Some(14.0));
        assert_eq!(frames.iter().filter(|f| f.pop_height_px.is_some()).count(), 1);

        assert!(frames.iter().all(|f| !f.rippling));

        scheduler.activate_cell(Cell::new(0, 0)).unwrap();
        let frames = scheduler.cell_frames();
        assert!(frames.iter().all(|f| f.rippling));
        assert_eq!(frames[0].delay_ms, 0.0);
        assert_eq!(frames[0].duration_ms, 200.0);
        assert_eq!(frames[2].delay_ms, 110.0);
        assert_eq!(frames[2].duration_ms, 360.0);
    }

    #[test]
    fn test_style_properties_before_and_after_trigger() {
        let config = RippleConfig {
            rows: 3,
            cols: 3,
            auto_pulse: false,
            pop_height_px: 28.0,
            ..Default::default()
        };
        let mut scheduler = PulseScheduler::new(config).unwrap();

        // Before any ripple only the center carries its pop offset
        let frames = scheduler.cell_frames();
        assert!(frames[0].style_properties().is_empty());
        assert_eq!(
            frames[4].style_properties(),
            vec![("--pop", "-28px".to_string())]
        );

        scheduler.activate_cell(Cell::new(0, 0)).unwrap();
        let frames = scheduler.cell_frames();
        assert_eq!(
            frames[2].style_properties(),
            vec![
                ("--delay", "110ms".to_string()),
                ("--duration", "360ms".to_string()),
            ]
        );
        assert_eq!(frames[4].style_properties().len(), 3);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Advance(f64),
        Activate(u32, u32),
        CenterComplete,
        Teardown,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0.0f64..8000.0).prop_map(Op::Advance),
            2 => (0u32..8, 0u32..27).prop_map(|(r, c)| Op::Activate(r, c)),
            2 => Just(Op::CenterComplete),
            1 => Just(Op::Teardown),
        ]
    }

    proptest! {
        #[test]
        fn prop_at_most_one_timer_per_kind(
            auto_pulse in any::<bool>(),
            ops in prop::collection::vec(op(), 0..64),
        ) {
            let mut scheduler = PulseScheduler::new(RippleConfig {
                auto_pulse,
                pulse_interval_ms: 1200.0,
                ..Default::default()
            }).unwrap();

            let mut last_generation = 0;
            for op in ops {
                let was_torn_down = scheduler.is_torn_down();
                let before = scheduler.snapshot().generation;
                match op {
                    Op::Advance(ms) => scheduler.advance(ms),
                    Op::Activate(row, col) => {
                        let result = scheduler.activate_cell(Cell::new(row, col));
                        if !was_torn_down {
                            prop_assert_eq!(result.unwrap().generation, before + 1);
                            prop_assert_eq!(scheduler.snapshot().clicked_cell, Some(Cell::new(row, col)));
                        }
                    }
                    Op::CenterComplete => {
                        let _ = scheduler.notify_center_animation_complete();
                    }
                    Op::Teardown => scheduler.teardown(),
                }

                prop_assert!(scheduler.pending_timers(TimerKind::Initial) <= 1);
                prop_assert!(scheduler.pending_timers(TimerKind::Recurring) <= 1);
                prop_assert!(scheduler.timer_stats().outstanding() <= 1);

                let generation = scheduler.snapshot().generation;
                prop_assert!(generation >= last_generation);
                last_generation = generation;

                if was_torn_down {
                    prop_assert_eq!(generation, before);
                    prop_assert_eq!(scheduler.timer_stats().outstanding(), 0);
                }
                if !auto_pulse {
                    prop_assert_eq!(scheduler.timer_stats().scheduled, 0);
                }
            }
        }
    }
}
