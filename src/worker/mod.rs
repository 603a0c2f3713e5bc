//! Worker execution wrapper
//!
//! A `Worker` runs one solver invocation on its own thread and reports back to
//! the coordinator exactly once.
//!
//! # Lifecycle
//!
//! 1. **Creation**: `Worker::new()` binds a slot, a solver, its parameters, a
//!    cancel token and the shared `RaceSignal`
//! 2. **Execution**: `spawn()` starts a scoped thread that calls `run()`
//! 3. **Completion**: `run()` publishes `{done, ok}` for its slot and notifies
//!    the coordinator, then returns a `WorkerReport` through the join handle
//!
//! # Failure handling
//!
//! Nothing escapes the solver call or its statistics read. Planner faults and
//! panics become a failed completion (`done = true, ok = false`) and are
//! logged. Cancellation is expected (the other worker won) and only logged at
//! debug level; a cancelled worker publishes no flags at all. If the worker
//! thread itself unwinds (a panicking logger, say), a drop guard still
//! publishes a failed completion before the thread dies.

use crate::coordinator::state::{RaceSignal, WorkerSlot};
use crate::error::RaceError;
use crate::logging::Logger;
use crate::solver::{CancelToken, PlannerParameters, SolveError, Solver};
use crate::stats::Statistics;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{Scope, ScopedJoinHandle};
use std::time::{Duration, Instant};

/// How a worker's run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerOutcome {
    /// Solver completed and found a plan
    Succeeded,
    /// Solver completed without a plan
    Failed,
    /// Solver returned a fault or panicked
    Faulted(String),
    /// Run was cancelled before it could report
    Cancelled,
}

impl WorkerOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerOutcome::Succeeded)
    }

    /// Whether the worker published completion flags
    pub fn is_done(&self) -> bool {
        !matches!(self, WorkerOutcome::Cancelled)
    }
}

/// Everything a worker hands back to the coordinator on join
#[derive(Debug)]
pub struct WorkerReport<R> {
    pub slot: WorkerSlot,
    /// Strategy name the worker ran with
    pub strategy: String,
    pub outcome: WorkerOutcome,
    /// Solver response, or `R::default()` if the solver produced none
    pub response: R,
    /// Solver statistics, present when the solver ran to completion
    pub statistics: Option<Statistics>,
    /// Wall time from worker start to report
    pub wall_time: Duration,
}

/// One racing solver invocation
pub struct Worker<'a, S: Solver> {
    slot: WorkerSlot,
    solver: &'a mut S,
    parameters: PlannerParameters,
    cancel: CancelToken,
    signal: &'a RaceSignal,
    logger: Arc<dyn Logger>,
}

impl<'a, S: Solver> Worker<'a, S> {
    pub fn new(
        slot: WorkerSlot,
        solver: &'a mut S,
        parameters: PlannerParameters,
        cancel: CancelToken,
        signal: &'a RaceSignal,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            slot,
            solver,
            parameters,
            cancel,
            signal,
            logger,
        }
    }

    /// Start `run()` on a named scoped thread
    ///
    /// # Errors
    ///
    /// Returns `RaceError::Spawn` if the OS cannot create the thread.
    pub fn spawn<'scope, 'env>(
        self,
        scope: &'scope Scope<'scope, 'env>,
        scene: &'scope S::Scene,
        request: &'scope S::Request,
    ) -> Result<ScopedJoinHandle<'scope, WorkerReport<S::Response>>, RaceError>
    where
        'a: 'scope,
        S: 'scope,
    {
        let slot = self.slot;
        std::thread::Builder::new()
            .name(format!("metaplan-{}", slot))
            .spawn_scoped(scope, move || self.run(scene, request))
            .map_err(|source| RaceError::Spawn { slot, source })
    }

    /// Run the solver on the current thread and publish the result
    pub fn run(self, scene: &S::Scene, request: &S::Request) -> WorkerReport<S::Response> {
        let start = Instant::now();
        let slot = self.slot;
        let mut publish = PublishGuard {
            slot,
            signal: self.signal,
            cancel: &self.cancel,
            published: false,
        };
        self.logger.debug(&format!(
            "Running {} planner (strategy {})",
            slot, self.parameters.name
        ));

        let solver = self.solver;
        let parameters = &self.parameters;
        let cancel = &self.cancel;
        let result = panic::catch_unwind(AssertUnwindSafe(|| -> Result<_, SolveError> {
            let solved = solver.solve(scene, request, parameters, cancel)?;
            Ok((solved, solver.last_statistics()))
        }));

        let (mut outcome, response, mut statistics) = match result {
            Ok(Ok((solved, stats))) if solved.success => {
                (WorkerOutcome::Succeeded, solved.response, Some(stats))
            }
            Ok(Ok((solved, stats))) => (WorkerOutcome::Failed, solved.response, Some(stats)),
            Ok(Err(SolveError::Cancelled)) => (WorkerOutcome::Cancelled, Default::default(), None),
            Ok(Err(SolveError::Fault(err))) => {
                self.logger.warn(&format!("{} planner fault: {:#}", slot, err));
                (WorkerOutcome::Faulted(format!("{:#}", err)), Default::default(), None)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                self.logger
                    .error(&format!("{} planner panicked: {}", slot, message));
                (WorkerOutcome::Faulted(message), Default::default(), None)
            }
        };

        // A run that returns after cancellation was requested records nothing
        if outcome != WorkerOutcome::Cancelled && cancel.is_cancelled() {
            self.logger.debug(&format!(
                "{} planner returned after cancellation, discarding result",
                slot
            ));
            outcome = WorkerOutcome::Cancelled;
            statistics = None;
        }

        if outcome == WorkerOutcome::Cancelled {
            self.logger.debug(&format!("{} planner cancelled", slot));
        }
        publish.publish(&outcome);

        WorkerReport {
            slot,
            strategy: self.parameters.name,
            outcome,
            response,
            statistics,
            wall_time: start.elapsed(),
        }
    }
}

/// Publishes a worker's completion exactly once
///
/// If the worker thread unwinds before publishing, the drop publishes a failed
/// completion (or a bare wake-up once cancelled) so the coordinator never waits
/// on a dead worker.
struct PublishGuard<'a> {
    slot: WorkerSlot,
    signal: &'a RaceSignal,
    cancel: &'a CancelToken,
    published: bool,
}

impl PublishGuard<'_> {
    fn publish(&mut self, outcome: &WorkerOutcome) {
        match outcome {
            WorkerOutcome::Succeeded => self.signal.complete(self.slot, true),
            WorkerOutcome::Failed | WorkerOutcome::Faulted(_) => self.signal.complete(self.slot, false),
            WorkerOutcome::Cancelled => self.signal.notify(),
        }
        self.published = true;
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        if self.cancel.is_cancelled() {
            self.signal.notify();
        } else {
            self.signal.complete(self.slot, false);
        }
    }
}

/// Best-effort text of a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
