//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, FormatArg, OutcomeArg};
use crate::util::time::parse_duration;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<SimulationConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<SimulationConfig> {
    let config: SimulationConfig =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Load the configuration named by `--config`, or the defaults, then apply CLI overrides
pub fn load_config(cli: &Cli) -> Result<SimulationConfig> {
    let config = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => SimulationConfig::default(),
    };
    merge_cli_with_config(cli, config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: SimulationConfig) -> Result<SimulationConfig> {
    // Race settings
    if let Some(races) = cli.races {
        config.runtime.races = races;
    }
    if let Some(seed) = cli.seed {
        config.runtime.seed = seed;
    }
    if let Some(request) = &cli.request {
        config.runtime.request = request.clone();
    }
    if let Some(deadline) = &cli.deadline {
        config.race.deadline = Some(parse_duration(deadline).context("Invalid --deadline")?);
    }

    // Planners
    merge_planner(
        &mut config.first_planner.behavior,
        PlannerOverrides {
            outcome: cli.first_outcome,
            delay: cli.first_delay.as_deref(),
            jitter: cli.first_jitter.as_deref(),
            time: cli.first_time.as_deref(),
        },
    )
    .context("Invalid first planner option")?;
    merge_planner(
        &mut config.second_planner.behavior,
        PlannerOverrides {
            outcome: cli.second_outcome,
            delay: cli.second_delay.as_deref(),
            jitter: cli.second_jitter.as_deref(),
            time: cli.second_time.as_deref(),
        },
    )
    .context("Invalid second planner option")?;

    // Output
    if let Some(format) = cli.format {
        config.output.format = match format {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        };
    }
    if let Some(path) = &cli.json_output {
        config.output.json_output = Some(path.clone());
        config.output.format = OutputFormat::Json;
    }
    if cli.per_race {
        config.output.per_race = true;
    }

    Ok(config)
}

struct PlannerOverrides<'a> {
    outcome: Option<OutcomeArg>,
    delay: Option<&'a str>,
    jitter: Option<&'a str>,
    time: Option<&'a str>,
}

fn merge_planner(behavior: &mut MockBehavior, overrides: PlannerOverrides<'_>) -> Result<()> {
    if let Some(outcome) = overrides.outcome {
        behavior.outcome = match outcome {
            OutcomeArg::Success => MockOutcome::Success,
            OutcomeArg::Failure => MockOutcome::Failure,
            OutcomeArg::Fault => MockOutcome::Fault,
            OutcomeArg::Panic => MockOutcome::Panic,
        };
    }
    if let Some(delay) = overrides.delay {
        behavior.delay = parse_duration(delay)?;
    }
    if let Some(jitter) = overrides.jitter {
        behavior.jitter = Some(parse_duration(jitter)?);
    }
    if let Some(time) = overrides.time {
        behavior.reported_time = Some(parse_duration(time)?);
    }
    Ok(())
}
