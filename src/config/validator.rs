//! Configuration validation

use super::*;
use anyhow::{Context, Result};

/// Upper bound on back-to-back simulated races
const MAX_RACES: usize = 1_000_000;

/// Validate complete simulation configuration
pub fn validate_config(config: &SimulationConfig) -> Result<()> {
    validate_race_config(&config.race)?;
    validate_planner(&config.first_planner).context("Invalid first_planner")?;
    validate_planner(&config.second_planner).context("Invalid second_planner")?;
    validate_runtime(&config.runtime)?;
    validate_output(&config.output)?;

    if config.first_planner.name == config.second_planner.name {
        anyhow::bail!(
            "first_planner and second_planner must have different names, both are '{}'",
            config.first_planner.name
        );
    }

    Ok(())
}

/// Validate coordinator configuration
///
/// The two workers must differ in their parameters; racing a strategy against
/// itself is always a configuration mistake.
pub fn validate_race_config(race: &RaceConfig) -> Result<()> {
    validate_parameters(&race.first).context("Invalid first parameters")?;
    validate_parameters(&race.second).context("Invalid second parameters")?;

    if race.first == race.second {
        anyhow::bail!(
            "first and second workers must use distinct parameters, both are '{}' (bfs={})",
            race.first.name,
            race.first.use_bfs
        );
    }

    if race.deadline == Some(Duration::ZERO) {
        anyhow::bail!("deadline must be greater than zero");
    }

    Ok(())
}

fn validate_parameters(params: &PlannerParameters) -> Result<()> {
    if params.name.trim().is_empty() {
        anyhow::bail!("strategy name must not be empty");
    }
    Ok(())
}

fn validate_planner(planner: &MockPlannerConfig) -> Result<()> {
    if planner.name.trim().is_empty() {
        anyhow::bail!("planner name must not be empty");
    }
    Ok(())
}

fn validate_runtime(runtime: &RuntimeConfig) -> Result<()> {
    if runtime.races == 0 || runtime.races > MAX_RACES {
        anyhow::bail!("races must be between 1 and {}, got {}", MAX_RACES, runtime.races);
    }
    Ok(())
}

fn validate_output(output: &OutputConfig) -> Result<()> {
    if output.json_output.is_some() && output.format != OutputFormat::Json {
        anyhow::bail!("json_output requires format = \"json\"");
    }
    Ok(())
}
