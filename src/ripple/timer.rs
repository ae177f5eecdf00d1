//! Virtual-clock timer queue
//!
//! Timers never run callbacks. The owner advances the clock and receives due
//! handles one at a time, in deadline order (ties in scheduling order), so
//! each firing is handled completely before the next is released.

use serde::{Deserialize, Serialize};

/// Opaque handle to a pending timer. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// Which scheduler slot a timer belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerKind {
    /// One-shot startup delay
    Initial,
    /// Auto-pulse interval
    Recurring,
}

#[derive(Debug, Clone)]
struct PendingTimer {
    handle: TimerHandle,
    kind: TimerKind,
    deadline_ms: f64,
}

/// Lifetime counters, for leak and double-fire checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerStats {
    pub scheduled: u64,
    pub canceled: u64,
    pub fired: u64,
}

impl TimerStats {
    /// Timers neither canceled nor fired
    pub fn outstanding(&self) -> u64 {
        self.scheduled - self.canceled - self.fired
    }
}

/// Deterministic timer queue driven by an external clock
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now_ms: f64,
    next_id: u64,
    pending: Vec<PendingTimer>,
    stats: TimerStats,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Arm a timer `delay_ms` from now
    pub fn schedule(&mut self, kind: TimerKind, delay_ms: f64) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let mut deadline_ms = self.now_ms + delay_ms.max(0.0);
        // A positive delay must land strictly after now, even when it rounds away
        if delay_ms > 0.0 && deadline_ms <= self.now_ms {
            deadline_ms = f64::from_bits(self.now_ms.to_bits() + 1);
        }
        self.pending.push(PendingTimer {
            handle,
            kind,
            deadline_ms,
        });
        self.stats.scheduled += 1;
        handle
    }

    /// Cancel a pending timer. Returns false if it already fired or was canceled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.pending.iter().position(|t| t.handle == handle) {
            Some(idx) => {
                self.pending.remove(idx);
                self.stats.canceled += 1;
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    /// Deadline of a pending timer
    pub fn deadline_ms(&self, handle: TimerHandle) -> Option<f64> {
        self.pending
            .iter()
            .find(|t| t.handle == handle)
            .map(|t| t.deadline_ms)
    }

    /// Number of pending timers of a kind
    pub fn pending_count(&self, kind: TimerKind) -> usize {
        self.pending.iter().filter(|t| t.kind == kind).count()
    }

    pub fn stats(&self) -> TimerStats {
        self.stats
    }

    /// Release the earliest timer due at or before `until_ms`, moving the
    /// clock to its deadline
    pub fn pop_due(&mut self, until_ms: f64) -> Option<(TimerHandle, TimerKind)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline_ms <= until_ms)
            .min_by(|(_, a), (_, b)| {
                a.deadline_ms
                    .total_cmp(&b.deadline_ms)
                    .then(a.handle.0.cmp(&b.handle.0))
            })
            .map(|(idx, _)| idx)?;

        let timer = self.pending.remove(idx);
        self.now_ms = self.now_ms.max(timer.deadline_ms);
        self.stats.fired += 1;
        Some((timer.handle, timer.kind))
    }

    /// Move the clock forward (never backward)
    pub fn advance_to(&mut self, now_ms: f64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
