//! Shared race state and its completion signal
//!
//! The only mutable state shared between the coordinator and its two workers
//! is four booleans. They live behind one mutex, and the condition variable
//! paired with that mutex is the only way anyone waits for them to change.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Identity of a worker within a race
///
/// `First` is the first-registered worker. It wins exact ties and its response
/// is the one returned when nobody succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerSlot {
    First,
    Second,
}

impl WorkerSlot {
    pub const BOTH: [WorkerSlot; 2] = [WorkerSlot::First, WorkerSlot::Second];

    /// The opposing worker
    pub fn other(self) -> WorkerSlot {
        match self {
            WorkerSlot::First => WorkerSlot::Second,
            WorkerSlot::Second => WorkerSlot::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            WorkerSlot::First => 0,
            WorkerSlot::Second => 1,
        }
    }
}

impl fmt::Display for WorkerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerSlot::First => write!(f, "first"),
            WorkerSlot::Second => write!(f, "second"),
        }
    }
}

/// Completion flags of both workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaceState {
    pub first_done: bool,
    pub first_ok: bool,
    pub second_done: bool,
    pub second_ok: bool,
}

impl RaceState {
    pub fn done(&self, slot: WorkerSlot) -> bool {
        match slot {
            WorkerSlot::First => self.first_done,
            WorkerSlot::Second => self.second_done,
        }
    }

    pub fn ok(&self, slot: WorkerSlot) -> bool {
        match slot {
            WorkerSlot::First => self.first_ok,
            WorkerSlot::Second => self.second_ok,
        }
    }

    pub fn both_done(&self) -> bool {
        self.first_done && self.second_done
    }

    /// Worker that finished successfully while its rival is still running
    pub fn early_winner(&self) -> Option<WorkerSlot> {
        WorkerSlot::BOTH
            .into_iter()
            .find(|&slot| self.done(slot) && self.ok(slot) && !self.done(slot.other()))
    }

    /// Record a worker's completion
    ///
    /// Only the worker owning `slot` calls this, at most once per race.
    fn record(&mut self, slot: WorkerSlot, ok: bool) {
        match slot {
            WorkerSlot::First => {
                self.first_done = true;
                self.first_ok = ok;
            }
            WorkerSlot::Second => {
                self.second_done = true;
                self.second_ok = ok;
            }
        }
    }
}

/// Mutex-guarded `RaceState` paired with its condition variable
#[derive(Debug, Default)]
pub struct RaceSignal {
    state: Mutex<RaceState>,
    changed: Condvar,
}

impl RaceSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the race state
    ///
    /// A worker that panicked while holding the lock can only have left plain
    /// booleans behind, so poisoning is ignored.
    pub fn lock(&self) -> MutexGuard<'_, RaceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset all flags for a new race
    pub fn reset(&self) {
        *self.lock() = RaceState::default();
    }

    /// Snapshot of the flags
    pub fn snapshot(&self) -> RaceState {
        *self.lock()
    }

    /// Publish a worker's completion and wake the coordinator
    pub fn complete(&self, slot: WorkerSlot, ok: bool) {
        let mut state = self.lock();
        state.record(slot, ok);
        self.changed.notify_all();
    }

    /// Wake the coordinator without changing any flag
    pub fn notify(&self) {
        // Taking the lock orders the wake after any in-progress evaluation
        let _state = self.lock();
        self.changed.notify_all();
    }

    /// Block until notified
    pub fn wait<'a>(&self, guard: MutexGuard<'a, RaceState>) -> MutexGuard<'a, RaceState> {
        self.changed
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until notified or `deadline` passes
    ///
    /// Returns the guard and whether the deadline has passed.
    pub fn wait_until<'a>(
        &self,
        guard: MutexGuard<'a, RaceState>,
        deadline: Instant,
    ) -> (MutexGuard<'a, RaceState>, bool) {
        let timeout = deadline.saturating_duration_since(Instant::now());
        if timeout == Duration::ZERO {
            return (guard, true);
        }
        let (guard, _) = self
            .changed
            .wait_timeout(guard, timeout)
            .unwrap_or_else(PoisonError::into_inner);
        (guard, Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_slot_other() {
        assert_eq!(WorkerSlot::First.other(), WorkerSlot::Second);
        assert_eq!(WorkerSlot::Second.other(), WorkerSlot::First);
        assert_eq!(WorkerSlot::First.to_string(), "first");
    }

    #[test]
    fn test_early_winner() {
        let mut state = RaceState::default();
        assert_eq!(state.early_winner(), None);

        state.record(WorkerSlot::Second, true);
        assert_eq!(state.early_winner(), Some(WorkerSlot::Second));

        // Once both are done there is no early winner; arbitration decides
        state.record(WorkerSlot::First, true);
        assert_eq!(state.early_winner(), None);
        assert!(state.both_done());
    }

    #[test]
    fn test_failed_worker_is_not_early_winner() {
        let mut state = RaceState::default();
        state.record(WorkerSlot::First, false);
        assert_eq!(state.early_winner(), None);
        assert!(state.done(WorkerSlot::First));
        assert!(!state.ok(WorkerSlot::First));
    }

    #[test]
    fn test_reset_clears_flags() {
        let signal = RaceSignal::new();
        signal.complete(WorkerSlot::First, true);
        signal.complete(WorkerSlot::Second, false);
        signal.reset();
        assert_eq!(signal.snapshot(), RaceState::default());
    }

    #[test]
    fn test_complete_wakes_waiter() {
        let signal = Arc::new(RaceSignal::new());
        let worker_signal = Arc::clone(&signal);

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            worker_signal.complete(WorkerSlot::Second, true);
        });

        let mut guard = signal.lock();
        while !guard.second_done {
            guard = signal.wait(guard);
        }
        assert!(guard.second_ok);
        drop(guard);
        handle.join().unwrap();
    }

    #[test]
    fn test_wait_until_past_deadline() {
        let signal = RaceSignal::new();
        let guard = signal.lock();
        let (_guard, expired) = signal.wait_until(guard, Instant::now());
        assert!(expired);
    }
}
