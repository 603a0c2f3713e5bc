//! Human-readable text output

use crate::config::SimulationConfig;
use crate::coordinator::state::WorkerSlot;
use crate::coordinator::RaceReport;
use crate::simulation::{RaceRecord, SimulationOutcome};
use crate::stats::histogram::RaceTimeHistogram;
use crate::util::time::format_duration;
use crate::worker::WorkerOutcome;
use std::fmt::Write as _;

const RULE: &str = "═══════════════════════════════════════════════════════════";

fn banner(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out, "{:^59}", title);
    let _ = writeln!(out, "{}", RULE);
    let _ = writeln!(out);
}

/// Render the configuration block printed before racing
pub fn render_config(config: &SimulationConfig) -> String {
    let mut out = String::new();
    banner(&mut out, "RACE CONFIGURATION");
    let _ = writeln!(out, "Strategies: {}", config.race);
    let _ = writeln!(out, "First:      {}", config.first_planner);
    let _ = writeln!(out, "Second:     {}", config.second_planner);
    let _ = writeln!(out, "Races:      {}", config.runtime.races);
    let _ = writeln!(out, "Request:    {}", config.runtime.request);
    let _ = writeln!(out, "Seed:       {}", config.runtime.seed);
    out
}

fn describe_outcome(outcome: &WorkerOutcome) -> String {
    match outcome {
        WorkerOutcome::Succeeded => "succeeded".to_string(),
        WorkerOutcome::Failed => "failed".to_string(),
        WorkerOutcome::Faulted(reason) => format!("faulted ({})", reason),
        WorkerOutcome::Cancelled => "cancelled".to_string(),
    }
}

/// One line per race
pub fn render_race(record: &RaceRecord) -> String {
    let report: &RaceReport = &record.report;
    let mut line = format!(
        "#{:<5} {:<14} winner={:<8} {:>10}",
        record.index,
        format!("{:?}", report.resolution),
        report.winning_strategy().unwrap_or("-"),
        format_duration(report.wall_time),
    );
    for worker in &report.workers {
        let _ = write!(
            line,
            "  {}={}",
            worker.slot,
            describe_outcome(&worker.outcome)
        );
        if let Some(stats) = worker.statistics.filter(|_| worker.outcome.is_done()) {
            let _ = write!(line, " in {}", format_duration(stats.total_planning_time));
        }
    }
    line
}

fn render_times(out: &mut String, label: &str, hist: &RaceTimeHistogram) {
    let _ = writeln!(out, "{}:", label);
    if hist.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    let fmt = |d: Option<std::time::Duration>| d.map(format_duration).unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "  Min:  {}", fmt(hist.min()));
    let _ = writeln!(out, "  Mean: {}", fmt(hist.mean()));
    let _ = writeln!(out, "  p50:  {}", fmt(hist.percentile(50.0)));
    let _ = writeln!(out, "  p90:  {}", fmt(hist.percentile(90.0)));
    let _ = writeln!(out, "  p99:  {}", fmt(hist.percentile(99.0)));
    let _ = writeln!(out, "  Max:  {}", fmt(hist.max()));
}

/// Render the results block
pub fn render_results(config: &SimulationConfig, outcome: &SimulationOutcome) -> String {
    let summary = &outcome.summary;
    let mut out = String::new();
    banner(&mut out, "RACE RESULTS");

    let _ = writeln!(out, "Elapsed Time: {:.3}s", outcome.elapsed.as_secs_f64());
    let _ = writeln!(out);

    if !outcome.races.is_empty() {
        let _ = writeln!(out, "Races:");
        for record in &outcome.races {
            let _ = writeln!(out, "  {}", render_race(record));
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "Outcome: {} races, {} solved, {} failed ({:.1}% success)",
        summary.races(),
        summary.successes(),
        summary.failures(),
        summary.success_rate() * 100.0
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Wins:");
    for slot in WorkerSlot::BOTH {
        let (planner, params) = match slot {
            WorkerSlot::First => (&config.first_planner, &config.race.first),
            WorkerSlot::Second => (&config.second_planner, &config.race.second),
        };
        let _ = writeln!(
            out,
            "  {:<7} {:<12} ({:<8}) {} wins, {} interrupted",
            slot.to_string(),
            planner.name,
            params.name,
            summary.wins(slot),
            summary.cancellations(slot)
        );
    }
    let _ = writeln!(out);

    let counts = summary.resolutions();
    let _ = writeln!(out, "Resolutions:");
    let _ = writeln!(out, "  First finisher: {}", counts.first_finisher);
    let _ = writeln!(out, "  Sole success:   {}", counts.sole_success);
    let _ = writeln!(out, "  Faster plan:    {}", counts.faster_plan);
    let _ = writeln!(out, "  Both failed:    {}", counts.both_failed);
    let _ = writeln!(out, "  Timed out:      {}", counts.timed_out);
    let _ = writeln!(out);

    render_times(&mut out, "Race Time", summary.race_times());
    render_times(&mut out, "Winning Plan Time", summary.winning_plan_times());
    let _ = writeln!(out, "{}", RULE);
    out
}

/// Print the configuration block to stdout
pub fn print_config(config: &SimulationConfig) {
    print!("{}", render_config(config));
}

/// Print results to stdout
pub fn print_results(config: &SimulationConfig, outcome: &SimulationOutcome) {
    print!("{}", render_results(config, outcome));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NullLogger;
    use crate::simulation::run_simulation;
    use crate::solver::mock::{MockBehavior, MockOutcome};
    use std::time::Duration;

    fn run(first: MockOutcome, per_race: bool) -> (SimulationConfig, SimulationOutcome) {
        let mut config = SimulationConfig::default();
        config.first_planner.behavior = MockBehavior::new(first, Duration::from_millis(1));
        config.second_planner.behavior =
            MockBehavior::new(MockOutcome::Success, Duration::from_millis(5));
        config.output.per_race = per_race;
        let outcome = run_simulation(&config, NullLogger::shared()).unwrap();
        (config, outcome)
    }

    #[test]
    fn test_render_config() {
        let text = render_config(&SimulationConfig::default());
        assert!(text.contains("RACE CONFIGURATION"));
        assert!(text.contains("First:      fast: Success after 50.00ms"));
        assert!(text.contains("Races:      1"));
    }

    #[test]
    fn test_render_results() {
        let (config, outcome) = run(MockOutcome::Failure, false);
        let text = render_results(&config, &outcome);

        assert!(text.contains("1 races, 1 solved, 0 failed"));
        assert!(text.contains("Sole success:   1"));
        assert!(!text.contains("Races:\n"));
    }

    #[test]
    fn test_render_race_lines() {
        let (config, outcome) = run(MockOutcome::Fault, true);
        let text = render_results(&config, &outcome);

        assert!(text.contains("Races:"));
        let line = render_race(&outcome.races[0]);
        assert!(line.starts_with("#0"));
        assert!(line.contains("winner=no_bfs"));
        assert!(line.contains("first=faulted (injected fault in fast)"));
        assert!(line.contains("second=succeeded in"));
    }
}
