//! metaplan CLI entry point

use anyhow::{Context, Result};
use chrono::Utc;
use metaplan::config::cli::Cli;
use metaplan::config::{toml, validator, OutputFormat};
use metaplan::logging::TracingLogger;
use metaplan::output::{self, text};
use metaplan::simulation::run_simulation;
use tracing_subscriber::EnvFilter;

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.validate()?;
    init_tracing(&cli);

    let config = toml::load_config(&cli)?;
    validator::validate_config(&config).context("Configuration validation failed")?;

    // JSON on stdout must stay parseable
    let banner = config.output.format == OutputFormat::Text || config.output.json_output.is_some();
    if banner {
        println!("metaplan v{}", env!("CARGO_PKG_VERSION"));
        println!();
        text::print_config(&config);
    }

    if cli.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    if banner {
        println!();
    }

    let start_time = Utc::now();
    let outcome = run_simulation(&config, TracingLogger::shared("coordinator"))?;
    let end_time = Utc::now();

    output::write_results(&config, &outcome, start_time, end_time)
}
