//! Mock solver for testing and simulation
//!
//! This module provides a `Solver` implementation that does no planning at all.
//! It sleeps for a configured time, polling its cancel token, then returns a
//! scripted outcome. Tests use it to stage races with known timing, and the
//! `metaplan` binary uses it to simulate races.
//!
//! # Features
//!
//! - Configurable delay with optional seeded jitter
//! - Scripted outcome: success, failure, planner fault, or panic
//! - Reported planning time independent of the real delay
//! - Optional release gate so tests can decide when a run may finish
//! - A shared `MockProbe` recording calls, cancellations and whether a run is
//!   still in flight
//!
//! # Example
//!
//! ```
//! use metaplan::solver::{CancelToken, PlannerParameters, Solver};
//! use metaplan::solver::mock::{MockBehavior, MockOutcome, MockSolver};
//! use std::time::Duration;
//!
//! let mut solver = MockSolver::new(
//!     "first",
//!     MockBehavior::new(MockOutcome::Success, Duration::from_millis(5)),
//! );
//! let probe = solver.probe();
//!
//! let outcome = solver
//!     .solve(&(), "goal", &PlannerParameters::bfs(), &CancelToken::new())
//!     .unwrap();
//!
//! assert!(outcome.success);
//! assert_eq!(outcome.response.planner, "first");
//! assert_eq!(probe.calls(), 1);
//! assert!(!probe.was_cancelled());
//! ```

use super::{CancelToken, PlannerParameters, SolveError, SolveOutcome, Solver};
use crate::stats::Statistics;
use crate::util::time::{duration_str, option_duration_str};
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// How often a sleeping mock checks its cancel token
const CHECKPOINT_INTERVAL: Duration = Duration::from_millis(1);

/// Scripted end of a mock run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockOutcome {
    /// Return `success = true`
    #[default]
    Success,
    /// Return `success = false`
    Failure,
    /// Return `Err(SolveError::Fault)`
    Fault,
    /// Panic inside `solve()`
    Panic,
}

/// Timing and outcome script for a mock run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockBehavior {
    /// Outcome returned once the delay has elapsed
    #[serde(default)]
    pub outcome: MockOutcome,
    /// Simulated work time
    #[serde(with = "duration_str")]
    pub delay: Duration,
    /// Standard deviation applied to `delay` on each run
    #[serde(default, with = "option_duration_str", skip_serializing_if = "Option::is_none")]
    pub jitter: Option<Duration>,
    /// Planning time to report instead of the measured time
    #[serde(default, with = "option_duration_str", skip_serializing_if = "Option::is_none")]
    pub reported_time: Option<Duration>,
}

impl MockBehavior {
    pub fn new(outcome: MockOutcome, delay: Duration) -> Self {
        Self {
            outcome,
            delay,
            jitter: None,
            reported_time: None,
        }
    }

    /// Report `time` as the planning time regardless of the real delay
    pub fn reporting(mut self, time: Duration) -> Self {
        self.reported_time = Some(time);
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = Some(jitter);
        self
    }
}

/// Plan returned by the mock solver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockPlan {
    /// Name of the mock solver that produced the plan
    pub planner: String,
    /// Strategy name from the parameters the run was given
    pub strategy: String,
    /// Request the plan answers
    pub request: String,
}

/// Observation handle shared between a mock solver and the test
///
/// Kept alive independently of the solver so it can be inspected while the
/// solver is borrowed by a coordinator.
#[derive(Debug, Default)]
pub struct MockProbe {
    calls: AtomicUsize,
    cancelled: AtomicBool,
    in_flight: AtomicBool,
    last_parameters: Mutex<Option<PlannerParameters>>,
}

impl MockProbe {
    /// Number of `solve()` calls started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether the most recent run stopped because of its cancel token
    pub fn was_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether a `solve()` call is currently executing
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Parameters passed to the most recent run
    pub fn last_parameters(&self) -> Option<PlannerParameters> {
        self.last_parameters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Sending half of a mock's release gate
///
/// A gated mock does not start its delay until `release()` is called (or the
/// gate is dropped).
#[derive(Debug, Clone)]
pub struct MockGate {
    tx: Sender<()>,
}

impl MockGate {
    /// Let one pending run proceed
    pub fn release(&self) {
        // Receiver gone means the solver was dropped; nothing to release
        let _ = self.tx.send(());
    }
}

/// Scripted `Solver` implementation
pub struct MockSolver {
    name: String,
    behavior: MockBehavior,
    rng: Xoshiro256PlusPlus,
    gate: Option<Receiver<()>>,
    probe: Arc<MockProbe>,
    last_statistics: Statistics,
}

impl MockSolver {
    pub fn new(name: impl Into<String>, behavior: MockBehavior) -> Self {
        Self {
            name: name.into(),
            behavior,
            rng: Xoshiro256PlusPlus::seed_from_u64(0),
            gate: None,
            probe: Arc::new(MockProbe::default()),
            last_statistics: Statistics::default(),
        }
    }

    /// Create a mock that waits for its gate before running
    pub fn gated(name: impl Into<String>, behavior: MockBehavior) -> (Self, MockGate) {
        let (tx, rx) = channel::unbounded();
        let mut solver = Self::new(name, behavior);
        solver.gate = Some(rx);
        (solver, MockGate { tx })
    }

    /// Seed the jitter generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn probe(&self) -> Arc<MockProbe> {
        Arc::clone(&self.probe)
    }

    pub fn behavior(&self) -> &MockBehavior {
        &self.behavior
    }

    /// Replace the script used by subsequent runs
    pub fn set_behavior(&mut self, behavior: MockBehavior) {
        self.behavior = behavior;
    }

    /// Delay for the next run, with jitter applied
    fn sample_delay(&mut self) -> Duration {
        let base = self.behavior.delay;
        let Some(jitter) = self.behavior.jitter else {
            return base;
        };
        match Normal::new(base.as_secs_f64(), jitter.as_secs_f64()) {
            Ok(normal) => Duration::from_secs_f64(normal.sample(&mut self.rng).max(0.0)),
            Err(_) => base,
        }
    }

    /// Block until the gate opens, checking for cancellation meanwhile
    fn wait_for_gate(&self, cancel: &CancelToken) -> Result<(), SolveError> {
        let Some(gate) = &self.gate else {
            return Ok(());
        };
        loop {
            if cancel.is_cancelled() {
                return Err(SolveError::Cancelled);
            }
            match gate.recv_timeout(CHECKPOINT_INTERVAL) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(()),
                Err(RecvTimeoutError::Timeout) => continue,
            }
        }
    }

    /// Sleep for `delay` in checkpoint-sized slices
    fn simulate_work(delay: Duration, cancel: &CancelToken) -> Result<(), SolveError> {
        let until = Instant::now() + delay;
        loop {
            if cancel.is_cancelled() {
                return Err(SolveError::Cancelled);
            }
            let now = Instant::now();
            if now >= until {
                return Ok(());
            }
            std::thread::sleep(CHECKPOINT_INTERVAL.min(until - now));
        }
    }

    fn run(
        &mut self,
        request: &str,
        params: &PlannerParameters,
        cancel: &CancelToken,
    ) -> Result<SolveOutcome<MockPlan>, SolveError> {
        let start = Instant::now();
        self.wait_for_gate(cancel)?;
        let delay = self.sample_delay();
        let worked = Self::simulate_work(delay, cancel);

        self.last_statistics = Statistics::new(
            self.behavior.reported_time.unwrap_or_else(|| start.elapsed()),
        );
        worked?;

        let plan = MockPlan {
            planner: self.name.clone(),
            strategy: params.name.clone(),
            request: request.to_string(),
        };
        match self.behavior.outcome {
            MockOutcome::Success => Ok(SolveOutcome::success(plan)),
            MockOutcome::Failure => Ok(SolveOutcome::failure(plan)),
            MockOutcome::Fault => Err(SolveError::Fault(anyhow::anyhow!(
                "injected fault in {}",
                self.name
            ))),
            MockOutcome::Panic => panic!("injected panic in {}", self.name),
        }
    }
}

/// Clears the in-flight marker on every exit path, unwinding included
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Solver for MockSolver {
    type Scene = ();
    type Request = str;
    type Response = MockPlan;

    fn solve(
        &mut self,
        _scene: &(),
        request: &str,
        params: &PlannerParameters,
        cancel: &CancelToken,
    ) -> Result<SolveOutcome<MockPlan>, SolveError> {
        let probe = Arc::clone(&self.probe);
        // In flight before counted, so a counted run that is not in flight has returned
        probe.in_flight.store(true, Ordering::SeqCst);
        probe.cancelled.store(false, Ordering::SeqCst);
        probe.calls.fetch_add(1, Ordering::SeqCst);
        *probe
            .last_parameters
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(params.clone());
        let _guard = InFlightGuard(&probe.in_flight);

        let result = self.run(request, params, cancel);
        if matches!(result, Err(SolveError::Cancelled)) {
            probe.cancelled.store(true, Ordering::SeqCst);
        }
        result
    }

    fn last_statistics(&self) -> Statistics {
        self.last_statistics
    }
}
