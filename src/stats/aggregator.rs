//! Race statistics aggregation
//!
//! Folds a sequence of `RaceReport`s into totals: how often each worker won,
//! how races were decided, and wall-time distributions for whole races and for
//! winning plans.
//!
//! # Example
//!
//! ```
//! use metaplan::stats::RaceSummary;
//!
//! let summary = RaceSummary::new()?;
//! assert_eq!(summary.races(), 0);
//! assert_eq!(summary.success_rate(), 0.0);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::coordinator::state::WorkerSlot;
use crate::coordinator::{RaceReport, Resolution};
use crate::stats::histogram::RaceTimeHistogram;
use crate::Result;
use serde::{Deserialize, Serialize};

/// How many races ended with each resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionCounts {
    pub first_finisher: u64,
    pub sole_success: u64,
    pub faster_plan: u64,
    pub both_failed: u64,
    pub timed_out: u64,
}

impl ResolutionCounts {
    pub fn record(&mut self, resolution: Resolution) {
        *self.slot_mut(resolution) += 1;
    }

    fn slot_mut(&mut self, resolution: Resolution) -> &mut u64 {
        match resolution {
            Resolution::FirstFinisher => &mut self.first_finisher,
            Resolution::SoleSuccess => &mut self.sole_success,
            Resolution::FasterPlan => &mut self.faster_plan,
            Resolution::BothFailed => &mut self.both_failed,
            Resolution::TimedOut => &mut self.timed_out,
        }
    }
}

/// Totals over many races run on one coordinator
#[derive(Debug, Clone)]
pub struct RaceSummary {
    races: u64,
    wins: [u64; 2],
    cancellations: [u64; 2],
    resolutions: ResolutionCounts,
    race_times: RaceTimeHistogram,
    winning_plan_times: RaceTimeHistogram,
}

impl RaceSummary {
    pub fn new() -> Result<Self> {
        Ok(Self {
            races: 0,
            wins: [0; 2],
            cancellations: [0; 2],
            resolutions: ResolutionCounts::default(),
            race_times: RaceTimeHistogram::new()?,
            winning_plan_times: RaceTimeHistogram::new()?,
        })
    }

    /// Add one race
    pub fn record(&mut self, report: &RaceReport) {
        self.races += 1;
        self.resolutions.record(report.resolution);
        self.race_times.record(report.wall_time);

        if let Some(winner) = report.winner {
            self.wins[winner.index()] += 1;
            if let Some(stats) = report.worker(winner).statistics {
                self.winning_plan_times.record(stats.total_planning_time);
            }
        }

        for worker in &report.workers {
            if worker.cancel_requested {
                self.cancellations[worker.slot.index()] += 1;
            }
        }
    }

    pub fn races(&self) -> u64 {
        self.races
    }

    pub fn wins(&self, slot: WorkerSlot) -> u64 {
        self.wins[slot.index()]
    }

    /// Races in which the coordinator asked `slot` to stop
    pub fn cancellations(&self, slot: WorkerSlot) -> u64 {
        self.cancellations[slot.index()]
    }

    pub fn successes(&self) -> u64 {
        self.wins.iter().sum()
    }

    /// Races that ended without a plan, timeouts included
    pub fn failures(&self) -> u64 {
        self.races - self.successes()
    }

    pub fn success_rate(&self) -> f64 {
        if self.races == 0 {
            return 0.0;
        }
        self.successes() as f64 / self.races as f64
    }

    pub fn resolutions(&self) -> &ResolutionCounts {
        &self.resolutions
    }

    /// Whole-race wall times
    pub fn race_times(&self) -> &RaceTimeHistogram {
        &self.race_times
    }

    /// Planning times reported by winners
    pub fn winning_plan_times(&self) -> &RaceTimeHistogram {
        &self.winning_plan_times
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::WorkerSummary;
    use crate::stats::Statistics;
    use crate::worker::WorkerOutcome;
    use std::time::Duration;

    fn worker(slot: WorkerSlot, outcome: WorkerOutcome, millis: u64, cancelled: bool) -> WorkerSummary {
        WorkerSummary {
            slot,
            strategy: slot.to_string(),
            statistics: outcome
                .is_done()
                .then(|| Statistics::new(Duration::from_millis(millis))),
            outcome,
            wall_time: Duration::from_millis(millis),
            cancel_requested: cancelled,
        }
    }

    fn report(resolution: Resolution, winner: Option<WorkerSlot>, workers: [WorkerSummary; 2]) -> RaceReport {
        RaceReport {
            resolution,
            winner,
            workers,
            wall_time: Duration::from_millis(100),
        }
    }

    #[test]
    fn test_summary_empty() {
        let summary = RaceSummary::new().unwrap();
        assert_eq!(summary.races(), 0);
        assert_eq!(summary.failures(), 0);
        assert!(summary.race_times().is_empty());
    }

    #[test]
    fn test_record_early_win() {
        let mut summary = RaceSummary::new().unwrap();
        summary.record(&report(
            Resolution::FirstFinisher,
            Some(WorkerSlot::Second),
            [
                cancelled_worker(WorkerSlot::First),
                worker(WorkerSlot::Second, WorkerOutcome::Succeeded, 20, false),
            ],
        ));

        assert_eq!(summary.races(), 1);
        assert_eq!(summary.wins(WorkerSlot::Second), 1);
        assert_eq!(summary.wins(WorkerSlot::First), 0);
        assert_eq!(summary.cancellations(WorkerSlot::First), 1);
        assert_eq!(summary.resolutions().first_finisher, 1);
        assert_eq!(summary.winning_plan_times().len(), 1);
        assert_eq!(summary.success_rate(), 1.0);
    }

    fn cancelled_worker(slot: WorkerSlot) -> WorkerSummary {
        worker(slot, WorkerOutcome::Cancelled, 0, true)
    }

    #[test]
    fn test_record_mixed() {
        let mut summary = RaceSummary::new().unwrap();
        summary.record(&report(
            Resolution::FasterPlan,
            Some(WorkerSlot::First),
            [
                worker(WorkerSlot::First, WorkerOutcome::Succeeded, 10, false),
                worker(WorkerSlot::Second, WorkerOutcome::Succeeded, 10, false),
            ],
        ));
        summary.record(&report(
            Resolution::BothFailed,
            None,
            [
                worker(WorkerSlot::First, WorkerOutcome::Failed, 10, false),
                worker(WorkerSlot::Second, WorkerOutcome::Faulted("boom".into()), 10, false),
            ],
        ));

        assert_eq!(summary.races(), 2);
        assert_eq!(summary.successes(), 1);
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.success_rate(), 0.5);
        assert_eq!(summary.resolutions().faster_plan, 1);
        assert_eq!(summary.resolutions().both_failed, 1);
        assert_eq!(summary.race_times().len(), 2);
        assert_eq!(summary.winning_plan_times().len(), 1);
    }

    #[test]
    fn test_record_timeout() {
        let mut summary = RaceSummary::new().unwrap();
        summary.record(&report(
            Resolution::TimedOut,
            None,
            [
                cancelled_worker(WorkerSlot::First),
                cancelled_worker(WorkerSlot::Second),
            ],
        ));

        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.resolutions().timed_out, 1);
        assert_eq!(summary.cancellations(WorkerSlot::First), 1);
        assert_eq!(summary.cancellations(WorkerSlot::Second), 1);
    }
}
