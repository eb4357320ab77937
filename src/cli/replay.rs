//! Replay command implementation.

use std::path::Path;

use gaia_engine::Engine;
use tracing::info;

use super::output::{JsonSummary, format_text};
use super::{CliError, OutputFormat, read_moves, read_options};

/// Print the final state of a game.
pub(super) fn print_engine(engine: &Engine, format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => print!("{}", format_text(engine)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonSummary::from_engine(engine))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}

/// Write a snapshot if asked to.
pub(super) fn save_snapshot(engine: &Engine, save: Option<&Path>) -> Result<(), CliError> {
    if let Some(path) = save {
        engine
            .save(path)
            .map_err(|e| CliError::new(format!("Failed to save {}: {e}", path.display())))?;
        info!(path = %path.display(), "snapshot saved");
    }
    Ok(())
}

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if a file cannot be read or a move is rejected.
pub(crate) fn execute(
    moves: &Path,
    options: Option<&Path>,
    format: OutputFormat,
    save: Option<&Path>,
) -> Result<(), CliError> {
    let options = read_options(options)?;
    let lines = read_moves(moves)?;

    let engine = Engine::replay(options, &lines).map_err(|(i, e)| {
        CliError::new(format!(
            "{}: move {} `{}` rejected: {e}",
            moves.display(),
            i + 1,
            lines.get(i).map_or("", String::as_str)
        ))
    })?;

    save_snapshot(&engine, save)?;
    print_engine(&engine, format)
}
