//! Report output
//!
//! - **text**: banner-style console report
//! - **json**: machine-readable report, to stdout or a file

pub mod json;
pub mod text;

use crate::config::{OutputFormat, SimulationConfig};
use crate::simulation::SimulationOutcome;
use crate::Result;
use chrono::{DateTime, Utc};

/// Emit the results of a run in the configured format
pub fn write_results(
    config: &SimulationConfig,
    outcome: &SimulationOutcome,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<()> {
    match config.output.format {
        OutputFormat::Text => {
            text::print_results(config, outcome);
            Ok(())
        }
        OutputFormat::Json => {
            let report = json::build_report(config, outcome, start_time, end_time);
            match &config.output.json_output {
                Some(path) => {
                    json::write_json_output(path, &report, true)?;
                    println!("JSON report written to {}", path.display());
                    Ok(())
                }
                None => json::print_json(&report),
            }
        }
    }
}
