//! Check command - parse a scenario script without replaying it.

use std::path::Path;

use super::load_scenario;
use crate::error::CliError;

/// Run the check command.
pub fn run(path: &Path) -> Result<(), CliError> {
    let scenario = load_scenario(path)?;

    if scenario.is_empty() {
        println!(
            "{}: no steps (link starts at {})",
            path.display(),
            scenario.initial_href
        );
    } else {
        println!(
            "{}: {} steps OK (link starts at {})",
            path.display(),
            scenario.len(),
            scenario.initial_href
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_check_valid_and_invalid() {
        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "# warm on hover\nmount\nhover").unwrap();
        assert!(run(good.path()).is_ok());

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "mount extra").unwrap();
        assert!(matches!(run(bad.path()), Err(CliError::Scenario(_))));
    }
}
