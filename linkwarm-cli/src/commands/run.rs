//! Run command - replay a scenario script and print the report.

use std::path::{Path, PathBuf};

use linkwarm::prefetch::{default_config_path, PrefetchConfig, RootMargin};

use super::load_scenario;
use crate::error::CliError;
use crate::replay::{replay, Report};

/// Arguments for the run command.
pub struct RunArgs {
    pub scenario: PathBuf,
    pub config: Option<PathBuf>,
    pub disable: bool,
    pub root_margin: Option<String>,
    pub json: bool,
}

/// Run the run command.
pub fn run(args: RunArgs) -> Result<(), CliError> {
    let report = execute(&args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }
    Ok(())
}

/// Load everything and replay, without printing.
pub(crate) fn execute(args: &RunArgs) -> Result<Report, CliError> {
    let config = resolve_config(args)?;
    let scenario = load_scenario(&args.scenario)?;

    tracing::info!(
        scenario = %args.scenario.display(),
        steps = scenario.len(),
        enabled = config.enabled,
        root_margin = %config.root_margin,
        "Replaying scenario"
    );

    Ok(replay(&scenario, &config))
}

/// Configuration precedence: flags > explicit file > default file > defaults.
fn resolve_config(args: &RunArgs) -> Result<PrefetchConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => PrefetchConfig::load(path)?,
        None => load_default_file()?,
    };

    if args.disable {
        config = config.with_enabled(false);
    }

    if let Some(margin) = &args.root_margin {
        let root_margin: RootMargin = margin
            .parse()
            .map_err(|e| CliError::Config(format!("--root-margin: {}", e)))?;
        config = config.with_root_margin(root_margin);
    }

    Ok(config)
}

fn load_default_file() -> Result<PrefetchConfig, CliError> {
    match default_config_path() {
        Some(path) if path.exists() => load_from(&path),
        _ => Ok(PrefetchConfig::default()),
    }
}

fn load_from(path: &Path) -> Result<PrefetchConfig, CliError> {
    tracing::debug!(path = %path.display(), "Loading configuration");
    Ok(PrefetchConfig::load(path)?)
}
