//! CLI command implementations.

pub mod check;
pub mod run;

use std::path::Path;

use crate::error::CliError;
use crate::scenario::Scenario;

/// Read and parse a scenario script.
pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        CliError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    Ok(text.parse()?)
}
