//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod replay;
pub(crate) mod resume;

mod output;

use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use gaia_engine::EngineOptions;

/// Output format for `replay` and `resume`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<gaia_engine::MoveError> for CliError {
    fn from(e: gaia_engine::MoveError) -> Self {
        Self::new(e.to_string())
    }
}

/// Moves in a move file: one per line, blank lines and `#` comments skipped.
pub(crate) fn parse_move_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Read a move file.
pub(crate) fn read_moves(path: &Path) -> Result<Vec<String>, CliError> {
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    Ok(parse_move_lines(&text).into_iter().map(str::to_string).collect())
}

/// Engine options from an optional JSON file.
pub(crate) fn read_options(path: Option<&Path>) -> Result<EngineOptions, CliError> {
    let Some(path) = path else {
        return Ok(EngineOptions::default());
    };
    let text = fs::read_to_string(path)
        .map_err(|e| CliError::new(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| CliError::new(format!("Invalid options in {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_lines_skips_comments() {
        let text = "# setup\ninit 2 s1\n\n  p1 faction terrans  # first pick\n#p2 faction xenos\n";
        assert_eq!(parse_move_lines(text), vec!["init 2 s1", "p1 faction terrans"]);
    }

    #[test]
    fn test_read_options_default() {
        assert_eq!(read_options(None).unwrap(), EngineOptions::default());
    }
}
