//! JSON output formatting
//!
//! Serializes a simulation run as one document:
//! - run information (timestamps, configuration)
//! - summary (win counts, resolution counts, wall-time percentiles)
//! - individual races (only when per-race output was requested)

use crate::config::SimulationConfig;
use crate::coordinator::state::WorkerSlot;
use crate::simulation::{RaceRecord, SimulationOutcome};
use crate::stats::aggregator::ResolutionCounts;
use crate::stats::histogram::RaceTimeHistogram;
use crate::util::time::format_duration;
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Duration with both microseconds and human-readable format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDuration {
    pub micros: u64,
    pub human: String,
}

impl JsonDuration {
    pub fn from_duration(d: Duration) -> Self {
        Self {
            micros: u64::try_from(d.as_micros()).unwrap_or(u64::MAX),
            human: format_duration(d),
        }
    }
}

/// Wall-time distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonTimes {
    pub count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p50: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p90: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p99: Option<JsonDuration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<JsonDuration>,
}

impl JsonTimes {
    fn from_histogram(hist: &RaceTimeHistogram) -> Self {
        Self {
            count: hist.len(),
            min: hist.min().map(JsonDuration::from_duration),
            mean: hist.mean().map(JsonDuration::from_duration),
            p50: hist.percentile(50.0).map(JsonDuration::from_duration),
            p90: hist.percentile(90.0).map(JsonDuration::from_duration),
            p99: hist.percentile(99.0).map(JsonDuration::from_duration),
            max: hist.max().map(JsonDuration::from_duration),
        }
    }
}

/// Per-worker totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWorkerTotals {
    pub slot: WorkerSlot,
    pub planner: String,
    pub strategy: String,
    pub wins: u64,
    pub cancellations: u64,
}

/// Totals over the whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    pub races: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
    pub workers: Vec<JsonWorkerTotals>,
    pub resolutions: ResolutionCounts,
    pub race_time: JsonTimes,
    pub winning_plan_time: JsonTimes,
}

/// Run information
#[derive(Debug, Clone, Serialize)]
pub struct JsonRunInfo {
    pub version: String,
    pub start_time: String,
    pub end_time: String,
    pub duration: JsonDuration,
    pub config: SimulationConfig,
}

/// Complete JSON report
#[derive(Debug, Clone, Serialize)]
pub struct JsonReport {
    pub run_info: JsonRunInfo,
    pub summary: JsonSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub races: Vec<RaceRecord>,
}

fn timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339()
}

/// Build the JSON report for a finished run
pub fn build_report(
    config: &SimulationConfig,
    outcome: &SimulationOutcome,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> JsonReport {
    let summary = &outcome.summary;
    let workers = WorkerSlot::BOTH
        .iter()
        .map(|&slot| {
            let (planner, params) = match slot {
                WorkerSlot::First => (&config.first_planner, &config.race.first),
                WorkerSlot::Second => (&config.second_planner, &config.race.second),
            };
            JsonWorkerTotals {
                slot,
                planner: planner.name.clone(),
                strategy: params.name.clone(),
                wins: summary.wins(slot),
                cancellations: summary.cancellations(slot),
            }
        })
        .collect();

    JsonReport {
        run_info: JsonRunInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: timestamp(start_time),
            end_time: timestamp(end_time),
            duration: JsonDuration::from_duration(outcome.elapsed),
            config: config.clone(),
        },
        summary: JsonSummary {
            races: summary.races(),
            successes: summary.successes(),
            failures: summary.failures(),
            success_rate: summary.success_rate(),
            workers,
            resolutions: *summary.resolutions(),
            race_time: JsonTimes::from_histogram(summary.race_times()),
            winning_plan_time: JsonTimes::from_histogram(summary.winning_plan_times()),
        },
        races: outcome.races.clone(),
    }
}

/// Write the report to `writer`
pub fn write_report<W: Write>(writer: W, report: &JsonReport, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(writer, report)?;
    } else {
        serde_json::to_writer(writer, report)?;
    }
    Ok(())
}

/// Write JSON output to file
pub fn write_json_output(output_path: &Path, report: &JsonReport, pretty: bool) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create JSON output: {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_report(&mut writer, report, pretty)?;
    writer.flush()?;
    Ok(())
}

/// Write JSON output to stdout
pub fn print_json(report: &JsonReport) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, report, true)?;
    writeln!(lock)?;
    Ok(())
}
