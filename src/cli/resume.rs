//! Resume command implementation.

use std::path::Path;

use gaia_engine::Engine;

use super::replay::{print_engine, save_snapshot};
use super::{CliError, OutputFormat};

/// Execute the resume command.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be loaded or a move is rejected.
pub(crate) fn execute(
    snapshot: &Path,
    moves: &[String],
    format: OutputFormat,
    save: Option<&Path>,
) -> Result<(), CliError> {
    let mut engine = Engine::load(snapshot)
        .map_err(|e| CliError::new(format!("Failed to load {}: {e}", snapshot.display())))?;

    for mv in moves {
        engine
            .apply(mv)
            .map_err(|e| CliError::new(format!("move `{mv}` rejected: {e}")))?;
    }

    save_snapshot(&engine, save)?;
    print_engine(&engine, format)
}
