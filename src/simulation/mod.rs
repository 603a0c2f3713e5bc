//! Simulated races
//!
//! Builds a coordinator over two `MockSolver`s from a `SimulationConfig`, runs
//! the configured number of races back to back, and collects a `RaceSummary`.
//! This is what the `metaplan` binary drives.

use crate::config::{MockPlannerConfig, SimulationConfig};
use crate::coordinator::{Coordinator, RaceReport};
use crate::logging::Logger;
use crate::solver::mock::{MockPlan, MockSolver};
use crate::stats::RaceSummary;
use crate::Result;
use anyhow::Context;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One race as seen by the simulator
#[derive(Debug, Clone, Serialize)]
pub struct RaceRecord {
    /// Zero-based race number
    pub index: usize,
    pub success: bool,
    /// Plan returned by the coordinator (the first planner's on failure)
    pub plan: MockPlan,
    pub report: RaceReport,
}

/// Result of a simulation run
#[derive(Debug)]
pub struct SimulationOutcome {
    pub summary: RaceSummary,
    /// Individual races, kept only when `output.per_race` is set
    pub races: Vec<RaceRecord>,
    /// Wall time for the whole run
    pub elapsed: Duration,
}

fn build_solver(planner: &MockPlannerConfig, seed: u64) -> MockSolver {
    MockSolver::new(planner.name.clone(), planner.behavior.clone()).with_seed(seed)
}

/// Run every race in `config` on a single coordinator
pub fn run_simulation(config: &SimulationConfig, logger: Arc<dyn Logger>) -> Result<SimulationOutcome> {
    let seed = config.runtime.seed;
    let first = build_solver(&config.first_planner, seed);
    let second = build_solver(&config.second_planner, seed.wrapping_add(1));

    let mut coordinator = Coordinator::new(first, second, config.race.clone(), Arc::clone(&logger))
        .context("Failed to create coordinator")?;
    logger.info(&format!(
        "Running {} races: {}",
        config.runtime.races,
        coordinator.config()
    ));

    let mut summary = RaceSummary::new()?;
    let mut races = Vec::new();
    let request = config.runtime.request.as_str();
    let start = Instant::now();

    for index in 0..config.runtime.races {
        let (success, plan) = coordinator
            .solve(&(), request)
            .with_context(|| format!("Race {} failed to run", index))?;

        let report = coordinator
            .last_race()
            .cloned()
            .context("Coordinator produced no race report")?;
        summary.record(&report);

        logger.debug(&format!(
            "Race {}: {:?}, winner {}",
            index,
            report.resolution,
            report.winning_strategy().unwrap_or("none")
        ));

        if config.output.per_race {
            races.push(RaceRecord {
                index,
                success,
                plan,
                report,
            });
        }
    }

    Ok(SimulationOutcome {
        summary,
        races,
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::state::WorkerSlot;
    use crate::coordinator::Resolution;
    use crate::logging::{CaptureLogger, NullLogger};
    use crate::solver::mock::{MockBehavior, MockOutcome};
    use crate::solver::PlannerParameters;

    fn config(first: MockBehavior, second: MockBehavior, races: usize) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.first_planner.behavior = first;
        config.second_planner.behavior = second;
        config.runtime.races = races;
        config.output.per_race = true;
        config
    }

    #[test]
    fn test_fast_planner_wins_every_race() {
        let config = config(
            MockBehavior::new(MockOutcome::Success, Duration::from_millis(5)),
            MockBehavior::new(MockOutcome::Success, Duration::from_secs(10)),
            3,
        );

        let outcome = run_simulation(&config, NullLogger::shared()).unwrap();

        assert_eq!(outcome.summary.races(), 3);
        assert_eq!(outcome.summary.wins(WorkerSlot::First), 3);
        assert_eq!(outcome.summary.cancellations(WorkerSlot::Second), 3);
        assert_eq!(outcome.races.len(), 3);
        for record in &outcome.races {
            assert!(record.success);
            assert_eq!(record.plan.planner, "fast");
            assert_eq!(record.plan.request, "goal");
            assert_eq!(record.report.resolution, Resolution::FirstFinisher);
        }
        assert!(outcome.elapsed < Duration::from_secs(10));
    }

    #[test]
    fn test_failure_waits_for_other_planner() {
        let config = config(
            MockBehavior::new(MockOutcome::Failure, Duration::from_millis(1)),
            MockBehavior::new(MockOutcome::Success, Duration::from_millis(20)),
            2,
        );

        let outcome = run_simulation(&config, NullLogger::shared()).unwrap();

        assert_eq!(outcome.summary.wins(WorkerSlot::Second), 2);
        assert_eq!(outcome.summary.resolutions().sole_success, 2);
        assert_eq!(outcome.races[0].plan.strategy, "no_bfs");
    }

    #[test]
    fn test_both_fail() {
        let config = config(
            MockBehavior::new(MockOutcome::Failure, Duration::from_millis(1)),
            MockBehavior::new(MockOutcome::Fault, Duration::from_millis(2)),
            1,
        );

        let outcome = run_simulation(&config, NullLogger::shared()).unwrap();

        assert_eq!(outcome.summary.failures(), 1);
        assert!(!outcome.races[0].success);
        // Failed runs still hand back the first planner's response
        assert_eq!(outcome.races[0].plan.planner, "fast");
    }

    #[test]
    fn test_deadline_times_out() {
        let mut config = config(
            MockBehavior::new(MockOutcome::Success, Duration::from_secs(10)),
            MockBehavior::new(MockOutcome::Success, Duration::from_secs(10)),
            1,
        );
        config.race.deadline = Some(Duration::from_millis(20));

        let outcome = run_simulation(&config, NullLogger::shared()).unwrap();

        assert_eq!(outcome.summary.resolutions().timed_out, 1);
        assert!(outcome.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_per_race_off_keeps_summary_only() {
        let mut config = config(
            MockBehavior::new(MockOutcome::Success, Duration::from_millis(1)),
            MockBehavior::new(MockOutcome::Success, Duration::from_secs(10)),
            2,
        );
        config.output.per_race = false;

        let outcome = run_simulation(&config, NullLogger::shared()).unwrap();
        assert!(outcome.races.is_empty());
        assert_eq!(outcome.summary.races(), 2);
    }

    #[test]
    fn test_identical_parameters_rejected() {
        let mut config = SimulationConfig::default();
        config.race.second = PlannerParameters::bfs();

        assert!(run_simulation(&config, NullLogger::shared()).is_err());
    }

    #[test]
    fn test_races_are_logged() {
        let logger = CaptureLogger::new();
        let config = config(
            MockBehavior::new(MockOutcome::Success, Duration::from_millis(1)),
            MockBehavior::new(MockOutcome::Success, Duration::from_secs(10)),
            1,
        );

        run_simulation(&config, Arc::new(logger.clone())).unwrap();
        assert!(logger.contains("Running 1 races: first=bfs (bfs=true), second=no_bfs (bfs=false)"));
        assert!(logger.contains("Race 0: FirstFinisher, winner bfs"));
    }
}
