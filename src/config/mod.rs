//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//!
//! - **`RaceConfig`**: what the coordinator itself needs (the two parameter
//!   sets and an optional deadline)
//! - **`SimulationConfig`**: everything the `metaplan` binary needs to stage
//!   races between two mock planners

pub mod cli;
pub mod toml;
pub mod validator;

use crate::solver::mock::{MockBehavior, MockOutcome};
use crate::solver::PlannerParameters;
use crate::util::time::{format_duration, option_duration_str};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Parameters for the first-registered worker
    #[serde(default = "PlannerParameters::bfs")]
    pub first: PlannerParameters,
    /// Parameters for the second worker
    #[serde(default = "PlannerParameters::no_bfs")]
    pub second: PlannerParameters,
    /// Give up on both workers once this much time has passed
    #[serde(default, with = "option_duration_str", skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            first: PlannerParameters::bfs(),
            second: PlannerParameters::no_bfs(),
            deadline: None,
        }
    }
}

/// One simulated planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockPlannerConfig {
    /// Planner name shown in reports
    pub name: String,
    #[serde(flatten)]
    pub behavior: MockBehavior,
}

/// Complete simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub race: RaceConfig,
    pub first_planner: MockPlannerConfig,
    pub second_planner: MockPlannerConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            race: RaceConfig::default(),
            first_planner: MockPlannerConfig {
                name: "fast".to_string(),
                behavior: MockBehavior::new(MockOutcome::Success, Duration::from_millis(50)),
            },
            second_planner: MockPlannerConfig {
                name: "thorough".to_string(),
                behavior: MockBehavior::new(MockOutcome::Success, Duration::from_millis(200)),
            },
            runtime: RuntimeConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Number of races to run back to back on one coordinator
    #[serde(default = "default_races")]
    pub races: usize,
    /// Seed for planner jitter (second planner uses seed + 1)
    #[serde(default)]
    pub seed: u64,
    /// Request string handed to both planners
    #[serde(default = "default_request")]
    pub request: String,
}

fn default_races() -> usize {
    1
}

fn default_request() -> String {
    "goal".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            races: default_races(),
            seed: 0,
            request: default_request(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
    /// Write the JSON report here instead of stdout
    pub json_output: Option<PathBuf>,
    /// Include every race in the report, not just the summary
    #[serde(default)]
    pub per_race: bool,
}

/// Report format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for RaceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "first={} (bfs={}), second={} (bfs={})",
            self.first.name, self.first.use_bfs, self.second.name, self.second.use_bfs
        )?;
        if let Some(deadline) = self.deadline {
            write!(f, ", deadline={}", format_duration(deadline))?;
        }
        Ok(())
    }
}

impl fmt::Display for MockPlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} after {}",
            self.name,
            self.behavior.outcome,
            format_duration(self.behavior.delay)
        )?;
        if let Some(jitter) = self.behavior.jitter {
            write!(f, " ±{}", format_duration(jitter))?;
        }
        if let Some(reported) = self.behavior.reported_time {
            write!(f, ", reports {}", format_duration(reported))?;
        }
        Ok(())
    }
}
