//! CLI error types.

use std::fmt;

use linkwarm::prefetch::ConfigError;

use crate::scenario::ScenarioError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration could not be loaded or a flag was invalid.
    Config(String),

    /// The scenario script is malformed.
    Scenario(ScenarioError),

    /// Reading input or writing output failed.
    Io(std::io::Error),

    /// The report could not be serialized.
    Serialize(serde_json::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Scenario(e) => write!(f, "Scenario error: {}", e),
            CliError::Io(e) => write!(f, "I/O error: {}", e),
            CliError::Serialize(e) => write!(f, "Failed to serialize report: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::Scenario(e) => Some(e),
            CliError::Io(e) => Some(e),
            CliError::Serialize(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ScenarioError> for CliError {
    fn from(e: ScenarioError) -> Self {
        CliError::Scenario(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialize(e)
    }
}
