//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Scripted planner outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutcomeArg {
    /// Planner finds a plan
    Success,
    /// Planner completes without a plan
    Failure,
    /// Planner reports an internal error
    Fault,
    /// Planner panics
    Panic,
}

/// Report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Human-readable console output
    Text,
    /// JSON report
    Json,
}

/// metaplan - race two planning strategies and keep the better answer
///
/// Stages races between two simulated planners to exercise the arbitration
/// policy: first success wins, failures wait for the other planner, and when
/// both succeed the faster plan wins.
#[derive(Parser, Debug, Default)]
#[command(name = "metaplan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file (command-line flags override it)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Race Options ===
    /// Number of races to run
    #[arg(short = 'n', long)]
    pub races: Option<usize>,

    /// Give up on both planners after this long (e.g., 500ms, 2s)
    #[arg(long)]
    pub deadline: Option<String>,

    /// Request string handed to both planners
    #[arg(long)]
    pub request: Option<String>,

    /// Seed for planner jitter
    #[arg(long, env = "METAPLAN_SEED")]
    pub seed: Option<u64>,

    // === First Planner ===
    /// First planner outcome
    #[arg(long, value_enum)]
    pub first_outcome: Option<OutcomeArg>,

    /// First planner simulated work time (e.g., 50ms)
    #[arg(long)]
    pub first_delay: Option<String>,

    /// First planner delay jitter (standard deviation)
    #[arg(long)]
    pub first_jitter: Option<String>,

    /// Planning time the first planner reports instead of the measured time
    #[arg(long)]
    pub first_time: Option<String>,

    // === Second Planner ===
    /// Second planner outcome
    #[arg(long, value_enum)]
    pub second_outcome: Option<OutcomeArg>,

    /// Second planner simulated work time (e.g., 200ms)
    #[arg(long)]
    pub second_delay: Option<String>,

    /// Second planner delay jitter (standard deviation)
    #[arg(long)]
    pub second_jitter: Option<String>,

    /// Planning time the second planner reports instead of the measured time
    #[arg(long)]
    pub second_time: Option<String>,

    // === Output Options ===
    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Write the JSON report to this file
    #[arg(long)]
    pub json_output: Option<PathBuf>,

    /// Report every race, not just the summary
    #[arg(long)]
    pub per_race: bool,

    /// Validate and print the configuration without racing
    #[arg(long)]
    pub dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.races == Some(0) {
            anyhow::bail!("races must be at least 1");
        }

        if self.json_output.is_some() && self.format == Some(FormatArg::Text) {
            anyhow::bail!("--json-output cannot be combined with --format text");
        }

        Ok(())
    }

    /// Default log filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "metaplan=info",
            _ => "metaplan=debug",
        }
    }
}
