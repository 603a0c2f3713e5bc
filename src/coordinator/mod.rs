//! Race coordinator
//!
//! The `Coordinator` races two solvers against one planning request and
//! returns a single answer.
//!
//! # Protocol
//!
//! 1. Reset the shared flags and start both workers on scoped threads
//! 2. Wait on the shared condition variable; re-evaluate on every wake:
//!    - one worker done and successful while the other still runs: that worker
//!      wins, the other is cancelled
//!    - one worker done and failed: keep waiting, the other is the only
//!      remaining chance
//!    - both done: arbitrate
//! 3. Join both workers, record the winner's statistics, return
//!
//! Arbitration when both finished: nobody succeeded means failure with the
//! first worker's response; one success wins outright; two successes go to the
//! strictly faster plan, ties to the first worker.
//!
//! # Example
//!
//! ```
//! use metaplan::config::RaceConfig;
//! use metaplan::coordinator::Coordinator;
//! use metaplan::logging::NullLogger;
//! use metaplan::solver::mock::{MockBehavior, MockOutcome, MockSolver};
//! use std::time::Duration;
//!
//! let fast = MockSolver::new("a", MockBehavior::new(MockOutcome::Success, Duration::from_millis(5)));
//! let slow = MockSolver::new("b", MockBehavior::new(MockOutcome::Success, Duration::from_secs(10)));
//!
//! let mut coordinator = Coordinator::new(fast, slow, RaceConfig::default(), NullLogger::shared())?;
//! let (success, plan) = coordinator.solve(&(), "goal")?;
//!
//! assert!(success);
//! assert_eq!(plan.planner, "a");
//! assert!(coordinator.last_planning_statistics().is_some());
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod state;

use crate::config::{validator, RaceConfig};
use crate::error::RaceError;
use crate::logging::Logger;
use crate::solver::{CancelToken, Solver};
use crate::stats::Statistics;
use crate::util::time::format_duration;
use crate::worker::{Worker, WorkerOutcome, WorkerReport};
use crate::Result;
use serde::{Deserialize, Serialize};
use state::{RaceSignal, RaceState, WorkerSlot};
use std::sync::Arc;
use std::thread::ScopedJoinHandle;
use std::time::{Duration, Instant};

/// How a race was decided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// A worker succeeded while its rival was still running
    FirstFinisher,
    /// Both finished, exactly one succeeded
    SoleSuccess,
    /// Both succeeded; the strictly faster plan (or the first worker on a tie) won
    FasterPlan,
    /// Both finished without a plan
    BothFailed,
    /// The race deadline passed before a decision
    TimedOut,
}

impl Resolution {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Resolution::FirstFinisher | Resolution::SoleSuccess | Resolution::FasterPlan
        )
    }
}

/// Per-worker part of a `RaceReport`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub slot: WorkerSlot,
    pub strategy: String,
    pub outcome: WorkerOutcome,
    pub statistics: Option<Statistics>,
    /// Worker wall time, start to report
    pub wall_time: Duration,
    /// Whether the coordinator asked this worker to stop
    pub cancel_requested: bool,
}

impl WorkerSummary {
    fn from_report<R>(report: &WorkerReport<R>, cancel_requested: bool) -> Self {
        Self {
            slot: report.slot,
            strategy: report.strategy.clone(),
            outcome: report.outcome.clone(),
            statistics: report.statistics,
            wall_time: report.wall_time,
            cancel_requested,
        }
    }
}

/// Diagnostic record of one completed race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceReport {
    pub resolution: Resolution,
    pub winner: Option<WorkerSlot>,
    /// First worker, then second worker
    pub workers: [WorkerSummary; 2],
    /// Time from `solve()` entry until both workers were joined
    pub wall_time: Duration,
}

impl RaceReport {
    pub fn success(&self) -> bool {
        self.resolution.is_success()
    }

    pub fn worker(&self, slot: WorkerSlot) -> &WorkerSummary {
        &self.workers[slot.index()]
    }

    /// Strategy name of the winner
    pub fn winning_strategy(&self) -> Option<&str> {
        self.winner.map(|slot| self.worker(slot).strategy.as_str())
    }
}

/// Outcome of the waiting phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    /// This worker succeeded while the other was still running
    EarlyWin(WorkerSlot),
    /// Both workers published completion
    BothDone(RaceState),
    /// Deadline passed first
    TimedOut,
}

/// Pick the winner once both workers are done
///
/// Only successful workers are eligible. Between two successes, the second
/// worker wins only with a strictly smaller planning time.
pub fn arbitrate(
    state: &RaceState,
    first: Option<&Statistics>,
    second: Option<&Statistics>,
) -> Option<WorkerSlot> {
    match (state.first_ok, state.second_ok) {
        (false, false) => None,
        (true, false) => Some(WorkerSlot::First),
        (false, true) => Some(WorkerSlot::Second),
        (true, true) => {
            let first = first.copied().unwrap_or_default();
            let second = second.copied().unwrap_or_default();
            if second.is_faster_than(&first) {
                Some(WorkerSlot::Second)
            } else {
                Some(WorkerSlot::First)
            }
        }
    }
}

/// Races two solvers and arbitrates their results
pub struct Coordinator<S: Solver> {
    first: S,
    second: S,
    config: RaceConfig,
    signal: RaceSignal,
    logger: Arc<dyn Logger>,
    last_planning_statistics: Option<Statistics>,
    last_race: Option<RaceReport>,
}

impl<S: Solver> Coordinator<S> {
    /// Create a coordinator over two independent solver instances
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid (for example, both workers would
    /// run with identical parameters).
    pub fn new(first: S, second: S, config: RaceConfig, logger: Arc<dyn Logger>) -> Result<Self> {
        validator::validate_race_config(&config)?;
        Ok(Self {
            first,
            second,
            config,
            signal: RaceSignal::new(),
            logger,
            last_planning_statistics: None,
            last_race: None,
        })
    }

    /// Build both solvers from one shared model
    pub fn from_model<M, F>(model: &M, build: F, config: RaceConfig, logger: Arc<dyn Logger>) -> Result<Self>
    where
        M: ?Sized,
        F: Fn(&M) -> Result<S>,
    {
        let first = build(model)?;
        let second = build(model)?;
        Self::new(first, second, config, logger)
    }

    pub fn config(&self) -> &RaceConfig {
        &self.config
    }

    /// Statistics of the last race's winner
    ///
    /// `None` before the first race and after any race nobody won.
    pub fn last_planning_statistics(&self) -> Option<&Statistics> {
        self.last_planning_statistics.as_ref()
    }

    /// Diagnostic report of the last completed race
    pub fn last_race(&self) -> Option<&RaceReport> {
        self.last_race.as_ref()
    }

    pub fn solvers(&self) -> (&S, &S) {
        (&self.first, &self.second)
    }

    /// Mutable access to the solvers between races
    pub fn solvers_mut(&mut self) -> (&mut S, &mut S) {
        (&mut self.first, &mut self.second)
    }

    /// Race both solvers on `request` and return `(success, response)`
    ///
    /// Blocks until a decision is made and both worker threads have stopped.
    /// On failure the response is the first worker's, for diagnostics only.
    ///
    /// # Errors
    ///
    /// Only infrastructure failures are errors: a worker thread that cannot be
    /// spawned, or one that died outside the guarded solver call.
    pub fn solve(
        &mut self,
        scene: &S::Scene,
        request: &S::Request,
    ) -> std::result::Result<(bool, S::Response), RaceError> {
        let start = Instant::now();
        self.signal.reset();
        self.last_planning_statistics = None;

        // A deadline past the end of representable time is no deadline
        let deadline = self.config.deadline.and_then(|d| start.checked_add(d));
        let first_cancel = CancelToken::with_deadline(deadline);
        let second_cancel = CancelToken::with_deadline(deadline);

        let first = Worker::new(
            WorkerSlot::First,
            &mut self.first,
            self.config.first.clone(),
            first_cancel.clone(),
            &self.signal,
            Arc::clone(&self.logger),
        );
        let second = Worker::new(
            WorkerSlot::Second,
            &mut self.second,
            self.config.second.clone(),
            second_cancel.clone(),
            &self.signal,
            Arc::clone(&self.logger),
        );
        let signal = &self.signal;
        let logger = &self.logger;

        logger.debug("Race started");
        let (decision, first_report, second_report) =
            std::thread::scope(|scope| -> std::result::Result<_, RaceError> {
                let first_handle = first.spawn(scope, scene, request)?;
                let second_handle = match second.spawn(scope, scene, request) {
                    Ok(handle) => handle,
                    Err(err) => {
                        logger.error(&format!("{}, stopping first worker", err));
                        first_cancel.cancel();
                        // Already failing; the spawn error is the one to report
                        let _ = first_handle.join();
                        return Err(err);
                    }
                };

                let decision = await_decision(signal, deadline);
                match decision {
                    Decision::EarlyWin(winner) => {
                        logger.info(&format!(
                            "{} planner succeeded first, interrupting {}",
                            winner,
                            winner.other()
                        ));
                        match winner.other() {
                            WorkerSlot::First => first_cancel.cancel(),
                            WorkerSlot::Second => second_cancel.cancel(),
                        }
                    }
                    Decision::TimedOut => {
                        logger.warn("Race deadline passed, interrupting both planners");
                        first_cancel.cancel();
                        second_cancel.cancel();
                    }
                    Decision::BothDone(_) => {}
                }

                let first_report = join_worker(WorkerSlot::First, first_handle, &first_cancel, logger.as_ref());
                let second_report = join_worker(WorkerSlot::Second, second_handle, &second_cancel, logger.as_ref());
                Ok((decision, first_report?, second_report?))
            })?;

        let (winner, resolution) = match decision {
            Decision::EarlyWin(winner) => (Some(winner), Resolution::FirstFinisher),
            Decision::TimedOut => (None, Resolution::TimedOut),
            Decision::BothDone(state) => {
                for report in [&first_report, &second_report] {
                    if let Some(stats) = report.statistics.filter(|_| report.outcome.is_success()) {
                        logger.info(&format!(
                            "{} planner ({}) reports time {}",
                            report.slot,
                            report.strategy,
                            format_duration(stats.total_planning_time)
                        ));
                    }
                }
                let winner = arbitrate(
                    &state,
                    first_report.statistics.as_ref(),
                    second_report.statistics.as_ref(),
                );
                let resolution = match (winner, state.first_ok && state.second_ok) {
                    (None, _) => Resolution::BothFailed,
                    (Some(_), true) => Resolution::FasterPlan,
                    (Some(_), false) => Resolution::SoleSuccess,
                };
                (winner, resolution)
            }
        };

        let report = RaceReport {
            resolution,
            winner,
            workers: [
                WorkerSummary::from_report(&first_report, first_cancel.is_cancel_requested()),
                WorkerSummary::from_report(&second_report, second_cancel.is_cancel_requested()),
            ],
            wall_time: start.elapsed(),
        };

        let (success, response) = match winner {
            Some(slot) => {
                let chosen = match slot {
                    WorkerSlot::First => first_report,
                    WorkerSlot::Second => second_report,
                };
                self.last_planning_statistics = chosen.statistics;
                logger.info(&format!(
                    "{} planner ({}) wins: {:?}",
                    slot, chosen.strategy, resolution
                ));
                (true, chosen.response)
            }
            None => {
                logger.warn(&format!("Both planners failed ({:?})", resolution));
                (false, first_report.response)
            }
        };

        self.last_race = Some(report);
        Ok((success, response))
    }
}

/// Block on the race signal until the race can be decided
fn await_decision(signal: &RaceSignal, deadline: Option<Instant>) -> Decision {
    let mut state = signal.lock();
    loop {
        if let Some(winner) = state.early_winner() {
            return Decision::EarlyWin(winner);
        }
        if state.both_done() {
            return Decision::BothDone(*state);
        }
        state = match deadline {
            None => signal.wait(state),
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Decision::TimedOut;
                }
                signal.wait_until(state, deadline).0
            }
        };
    }
}

/// Join a worker thread, logging how long a cancelled worker took to stop
fn join_worker<R>(
    slot: WorkerSlot,
    handle: ScopedJoinHandle<'_, WorkerReport<R>>,
    cancel: &CancelToken,
    logger: &dyn Logger,
) -> std::result::Result<WorkerReport<R>, RaceError> {
    let started = Instant::now();
    let report = handle
        .join()
        .map_err(|_| RaceError::WorkerPanicked { slot })?;
    if cancel.is_cancel_requested() {
        logger.debug(&format!(
            "{} planner stopped {} after cancellation",
            slot,
            format_duration(started.elapsed())
        ));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{CaptureLogger, NullLogger};
    use crate::solver::mock::{MockBehavior, MockOutcome, MockPlan, MockProbe, MockSolver};
    use crate::solver::{PlannerParameters, SolveError, SolveOutcome};
    use tracing::Level;

    fn behavior(outcome: MockOutcome, delay_ms: u64) -> MockBehavior {
        MockBehavior::new(outcome, Duration::from_millis(delay_ms))
    }

    fn coordinator(first: MockBehavior, second: MockBehavior) -> Coordinator<MockSolver> {
        Coordinator::new(
            MockSolver::new("a", first),
            MockSolver::new("b", second),
            RaceConfig::default(),
            NullLogger::shared(),
        )
        .unwrap()
    }

    fn stats(secs: f64) -> Statistics {
        Statistics::new(Duration::from_secs_f64(secs))
    }

    fn both_ok() -> RaceState {
        RaceState {
            first_done: true,
            first_ok: true,
            second_done: true,
            second_ok: true,
        }
    }

    #[test]
    fn test_arbitrate_prefers_faster_plan() {
        let winner = arbitrate(&both_ok(), Some(&stats(2.0)), Some(&stats(1.0)));
        assert_eq!(winner, Some(WorkerSlot::Second));

        let winner = arbitrate(&both_ok(), Some(&stats(1.0)), Some(&stats(2.0)));
        assert_eq!(winner, Some(WorkerSlot::First));
    }

    #[test]
    fn test_arbitrate_tie_goes_to_first() {
        let winner = arbitrate(&both_ok(), Some(&stats(1.5)), Some(&stats(1.5)));
        assert_eq!(winner, Some(WorkerSlot::First));
    }

    #[test]
    fn test_arbitrate_single_success_and_none() {
        let mut state = both_ok();
        state.first_ok = false;
        // Statistics do not matter when only one succeeded
        assert_eq!(
            arbitrate(&state, Some(&stats(0.1)), Some(&stats(9.0))),
            Some(WorkerSlot::Second)
        );

        state.second_ok = false;
        assert_eq!(arbitrate(&state, Some(&stats(0.1)), Some(&stats(9.0))), None);

        state.first_ok = true;
        assert_eq!(arbitrate(&state, None, None), Some(WorkerSlot::First));
    }

    #[test]
    fn test_await_decision_both_done() {
        let signal = RaceSignal::new();
        signal.complete(WorkerSlot::First, true);
        signal.complete(WorkerSlot::Second, true);
        assert_eq!(
            await_decision(&signal, None),
            Decision::BothDone(both_ok())
        );
    }

    #[test]
    fn test_await_decision_waits_after_failure() {
        let signal = Arc::new(RaceSignal::new());
        signal.complete(WorkerSlot::First, false);

        let worker_signal = Arc::clone(&signal);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            worker_signal.complete(WorkerSlot::Second, true);
        });

        let decision = await_decision(&signal, None);
        handle.join().unwrap();
        assert!(matches!(decision, Decision::BothDone(s) if s.second_ok && !s.first_ok));
    }

    #[test]
    fn test_await_decision_expired_deadline() {
        let signal = RaceSignal::new();
        assert_eq!(
            await_decision(&signal, Some(Instant::now())),
            Decision::TimedOut
        );
    }

    fn observers(coordinator: &Coordinator<MockSolver>) -> (Arc<MockProbe>, Arc<MockProbe>) {
        let (a, b) = coordinator.solvers();
        (a.probe(), b.probe())
    }

    /// Poll `condition` until it holds, failing after ten seconds
    fn wait_for(what: &str, condition: impl Fn() -> bool) {
        let give_up = Instant::now() + Duration::from_secs(10);
        while !condition() {
            assert!(Instant::now() < give_up, "timed out waiting for {}", what);
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    /// Race on a detached thread so a hung race fails instead of stalling
    fn solve_within<S>(
        mut coordinator: Coordinator<S>,
    ) -> (std::result::Result<bool, RaceError>, Option<Resolution>)
    where
        S: Solver<Scene = (), Request = str> + 'static,
    {
        let (tx, rx) = crossbeam::channel::bounded(1);
        std::thread::spawn(move || {
            let result = coordinator.solve(&(), "goal").map(|(success, _)| success);
            let _ = tx.send((result, coordinator.last_race().map(|r| r.resolution)));
        });
        rx.recv_timeout(Duration::from_secs(10))
            .expect("race did not finish")
    }

    /// Both workers held at their gates until only `release` is let through
    fn gated_early_win(release: WorkerSlot) -> (Coordinator<MockSolver>, (bool, MockPlan)) {
        let (first, gate_a) = MockSolver::gated("a", behavior(MockOutcome::Success, 0));
        let (second, gate_b) = MockSolver::gated("b", behavior(MockOutcome::Success, 0));
        let mut coordinator =
            Coordinator::new(first, second, RaceConfig::default(), NullLogger::shared()).unwrap();
        let (watch_a, watch_b) = observers(&coordinator);

        let result = std::thread::scope(|scope| {
            // Gates live in here so an unwinding test opens them
            let (gate_a, gate_b) = (gate_a, gate_b);
            let race = scope.spawn(|| coordinator.solve(&(), "goal"));

            wait_for("both workers to start", || {
                watch_a.is_in_flight() && watch_b.is_in_flight()
            });
            assert!(!race.is_finished());

            match release {
                WorkerSlot::First => gate_a.release(),
                WorkerSlot::Second => gate_b.release(),
            }
            let result = race.join().unwrap().unwrap();
            drop((gate_a, gate_b));
            result
        });
        (coordinator, result)
    }

    #[test]
    fn test_early_win_cancels_and_joins_loser() {
        let (coordinator, (success, plan)) = gated_early_win(WorkerSlot::First);
        let (watch_a, watch_b) = observers(&coordinator);

        assert!(success);
        assert_eq!(plan.planner, "a");
        // The loser's gate was never opened; only cancellation ended its run
        assert!(watch_b.was_cancelled());
        assert!(!watch_b.is_in_flight());
        assert!(!watch_a.was_cancelled());

        let report = coordinator.last_race().unwrap();
        assert_eq!(report.resolution, Resolution::FirstFinisher);
        assert_eq!(report.winner, Some(WorkerSlot::First));
        assert_eq!(report.worker(WorkerSlot::Second).outcome, WorkerOutcome::Cancelled);
        assert!(report.worker(WorkerSlot::Second).cancel_requested);
        assert!(!report.worker(WorkerSlot::First).cancel_requested);
    }

    #[test]
    fn test_second_worker_can_win_early() {
        let (coordinator, (success, plan)) = gated_early_win(WorkerSlot::Second);
        let (watch_a, watch_b) = observers(&coordinator);

        assert!(success);
        assert_eq!(plan.planner, "b");
        assert_eq!(plan.strategy, "no_bfs");
        assert!(watch_a.was_cancelled());
        assert!(!watch_a.is_in_flight());
        assert!(!watch_b.was_cancelled());

        let report = coordinator.last_race().unwrap();
        assert_eq!(report.resolution, Resolution::FirstFinisher);
        assert_eq!(report.winner, Some(WorkerSlot::Second));
        assert!(report.worker(WorkerSlot::First).cancel_requested);
    }

    #[test]
    fn test_failure_does_not_cancel_other_worker() {
        let (second, gate) = MockSolver::gated("b", behavior(MockOutcome::Success, 0));
        let mut coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Failure, 0)),
            second,
            RaceConfig::default(),
            NullLogger::shared(),
        )
        .unwrap();
        let (watch_a, watch_b) = observers(&coordinator);

        let (success, plan) = std::thread::scope(|scope| {
            let gate = gate;
            let race = scope.spawn(|| coordinator.solve(&(), "goal"));

            wait_for("first worker to fail", || {
                watch_a.calls() == 1 && !watch_a.is_in_flight()
            });
            wait_for("second worker to start", || watch_b.is_in_flight());
            // The race stays open on the second worker alone
            assert!(!race.is_finished());
            assert!(watch_b.is_in_flight());
            assert!(!watch_b.was_cancelled());

            gate.release();
            race.join().unwrap().unwrap()
        });

        assert!(success);
        assert_eq!(plan.planner, "b");
        assert!(!watch_b.was_cancelled());
        let report = coordinator.last_race().unwrap();
        assert_eq!(report.resolution, Resolution::SoleSuccess);
        assert_eq!(report.worker(WorkerSlot::First).outcome, WorkerOutcome::Failed);
        assert!(!report.worker(WorkerSlot::Second).cancel_requested);
    }

    /// Mock whose statistics accessor panics
    struct StatsPanics(MockSolver);

    impl Solver for StatsPanics {
        type Scene = ();
        type Request = str;
        type Response = MockPlan;

        fn solve(
            &mut self,
            scene: &(),
            request: &str,
            params: &PlannerParameters,
            cancel: &CancelToken,
        ) -> std::result::Result<SolveOutcome<MockPlan>, SolveError> {
            self.0.solve(scene, request, params, cancel)
        }

        fn last_statistics(&self) -> Statistics {
            panic!("statistics unavailable");
        }
    }

    #[test]
    fn test_statistics_panic_fails_worker_without_hanging() {
        let solver = |name: &str| StatsPanics(MockSolver::new(name, behavior(MockOutcome::Success, 0)));
        let coordinator =
            Coordinator::new(solver("a"), solver("b"), RaceConfig::default(), NullLogger::shared())
                .unwrap();

        let (result, resolution) = solve_within(coordinator);

        assert!(!result.unwrap());
        assert_eq!(resolution, Some(Resolution::BothFailed));
    }

    /// Logger that panics whenever the first worker's thread logs
    struct PanicsOnFirstWorker;

    impl Logger for PanicsOnFirstWorker {
        fn log(&self, _level: Level, message: &str) {
            if std::thread::current().name() == Some("metaplan-first") {
                panic!("logger failed on: {}", message);
            }
        }
    }

    #[test]
    fn test_dead_worker_thread_is_an_error() {
        let coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Success, 0)),
            MockSolver::new("b", behavior(MockOutcome::Success, 20)),
            RaceConfig::default(),
            Arc::new(PanicsOnFirstWorker),
        )
        .unwrap();

        let (result, resolution) = solve_within(coordinator);

        assert!(matches!(
            result,
            Err(RaceError::WorkerPanicked {
                slot: WorkerSlot::First
            })
        ));
        assert_eq!(resolution, None);
    }

    #[test]
    fn test_unrepresentable_deadline_is_no_deadline() {
        let config = RaceConfig {
            deadline: Some(Duration::MAX),
            ..RaceConfig::default()
        };
        let mut coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Success, 0)),
            MockSolver::new("b", behavior(MockOutcome::Success, 10_000)),
            config,
            NullLogger::shared(),
        )
        .unwrap();

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();

        assert!(success);
        assert_eq!(plan.planner, "a");
        assert_eq!(coordinator.last_race().unwrap().resolution, Resolution::FirstFinisher);
    }

    #[test]
    fn test_both_fail_returns_first_response() {
        let mut coordinator = coordinator(
            behavior(MockOutcome::Failure, 20),
            behavior(MockOutcome::Failure, 0),
        );

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();

        assert!(!success);
        assert_eq!(plan.planner, "a");
        assert!(coordinator.last_planning_statistics().is_none());
        assert_eq!(coordinator.last_race().unwrap().resolution, Resolution::BothFailed);
    }

    #[test]
    fn test_winner_statistics_are_retained() {
        let mut coordinator = coordinator(
            behavior(MockOutcome::Success, 10).reporting(Duration::from_secs(3)),
            behavior(MockOutcome::Failure, 0).reporting(Duration::from_secs(1)),
        );

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();

        assert!(success);
        assert_eq!(plan.planner, "a");
        assert_eq!(
            coordinator.last_planning_statistics(),
            Some(&Statistics::new(Duration::from_secs(3)))
        );
    }

    #[test]
    fn test_fault_and_panic_are_failures() {
        let logger = CaptureLogger::new();
        let mut coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Panic, 0)),
            MockSolver::new("b", behavior(MockOutcome::Fault, 20)),
            RaceConfig::default(),
            Arc::new(logger.clone()),
        )
        .unwrap();

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();

        assert!(!success);
        // Panicked worker produced no response; the slot default comes back
        assert_eq!(plan, Default::default());
        assert!(logger.contains("panicked"));
        assert!(logger.contains("planner fault"));
        let report = coordinator.last_race().unwrap();
        assert!(matches!(report.worker(WorkerSlot::First).outcome, WorkerOutcome::Faulted(_)));
        assert!(matches!(report.worker(WorkerSlot::Second).outcome, WorkerOutcome::Faulted(_)));
    }

    #[test]
    fn test_fault_leaves_other_worker_running() {
        let mut coordinator = coordinator(
            behavior(MockOutcome::Fault, 0),
            behavior(MockOutcome::Success, 50),
        );

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();

        assert!(success);
        assert_eq!(plan.planner, "b");
    }

    #[test]
    fn test_repeated_races_are_independent() {
        let mut coordinator = coordinator(
            behavior(MockOutcome::Success, 0).reporting(Duration::from_secs(2)),
            behavior(MockOutcome::Success, 10_000),
        );

        let (success, plan) = coordinator.solve(&(), "first goal").unwrap();
        assert!(success);
        assert_eq!(plan.planner, "a");
        assert_eq!(plan.request, "first goal");

        {
            let (a, b) = coordinator.solvers_mut();
            a.set_behavior(behavior(MockOutcome::Failure, 0));
            b.set_behavior(behavior(MockOutcome::Success, 20).reporting(Duration::from_secs(1)));
        }
        let (success, plan) = coordinator.solve(&(), "second goal").unwrap();

        assert!(success);
        assert_eq!(plan.planner, "b");
        assert_eq!(plan.request, "second goal");
        assert_eq!(
            coordinator.last_planning_statistics(),
            Some(&Statistics::new(Duration::from_secs(1)))
        );
        let (a, b) = coordinator.solvers();
        assert_eq!(a.probe().calls(), 2);
        assert_eq!(b.probe().calls(), 2);
    }

    #[test]
    fn test_failed_race_clears_previous_statistics() {
        let mut coordinator = coordinator(
            behavior(MockOutcome::Success, 0),
            behavior(MockOutcome::Failure, 0),
        );
        assert!(coordinator.solve(&(), "goal").unwrap().0);
        assert!(coordinator.last_planning_statistics().is_some());

        coordinator.solvers_mut().0.set_behavior(behavior(MockOutcome::Failure, 0));
        assert!(!coordinator.solve(&(), "goal").unwrap().0);
        assert!(coordinator.last_planning_statistics().is_none());
    }

    #[test]
    fn test_deadline_cancels_both_workers() {
        let config = RaceConfig {
            deadline: Some(Duration::from_millis(50)),
            ..RaceConfig::default()
        };
        let mut coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Success, 30_000)),
            MockSolver::new("b", behavior(MockOutcome::Success, 30_000)),
            config,
            NullLogger::shared(),
        )
        .unwrap();
        let (probe_a, probe_b) = {
            let (a, b) = coordinator.solvers();
            (a.probe(), b.probe())
        };

        let start = Instant::now();
        let (success, _) = coordinator.solve(&(), "goal").unwrap();

        assert!(!success);
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(probe_a.was_cancelled());
        assert!(probe_b.was_cancelled());
        assert_eq!(coordinator.last_race().unwrap().resolution, Resolution::TimedOut);
    }

    #[test]
    fn test_deadline_does_not_hide_early_win() {
        let config = RaceConfig {
            deadline: Some(Duration::from_secs(30)),
            ..RaceConfig::default()
        };
        let mut coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Success, 30_000)),
            MockSolver::new("b", behavior(MockOutcome::Success, 10)),
            config,
            NullLogger::shared(),
        )
        .unwrap();

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();
        assert!(success);
        assert_eq!(plan.planner, "b");
    }

    #[test]
    fn test_workers_receive_distinct_parameters() {
        let mut coordinator = coordinator(
            behavior(MockOutcome::Failure, 0),
            behavior(MockOutcome::Failure, 0),
        );
        coordinator.solve(&(), "goal").unwrap();

        let (a, b) = coordinator.solvers();
        assert_eq!(a.probe().last_parameters(), Some(PlannerParameters::bfs()));
        assert_eq!(b.probe().last_parameters(), Some(PlannerParameters::no_bfs()));
    }

    #[test]
    fn test_identical_parameters_rejected() {
        let config = RaceConfig {
            first: PlannerParameters::bfs(),
            second: PlannerParameters::bfs(),
            ..RaceConfig::default()
        };
        let result = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Success, 0)),
            MockSolver::new("b", behavior(MockOutcome::Success, 0)),
            config,
            NullLogger::shared(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_model_builds_two_solvers() {
        let model = behavior(MockOutcome::Success, 0);
        let mut coordinator = Coordinator::from_model(
            &model,
            |m: &MockBehavior| Ok(MockSolver::new("shared", m.clone())),
            RaceConfig::default(),
            NullLogger::shared(),
        )
        .unwrap();

        let (success, plan) = coordinator.solve(&(), "goal").unwrap();
        assert!(success);
        assert_eq!(plan.planner, "shared");
    }

    #[test]
    fn test_arbitration_trail_is_logged() {
        let logger = CaptureLogger::new();
        let mut coordinator = Coordinator::new(
            MockSolver::new("a", behavior(MockOutcome::Success, 0)),
            MockSolver::new("b", behavior(MockOutcome::Success, 10_000)),
            RaceConfig::default(),
            Arc::new(logger.clone()),
        )
        .unwrap();

        coordinator.solve(&(), "goal").unwrap();

        assert!(logger.contains("first planner succeeded first, interrupting second"));
        assert!(logger.contains("wins"));
    }
}
