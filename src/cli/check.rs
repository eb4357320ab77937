//! Check command implementation.

use std::path::{Path, PathBuf};
use std::time::Instant;

use gaia_engine::invariants::check_invariants;
use gaia_engine::{Engine, EngineOptions};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::debug;

use super::output::{CheckStats, format_check};
use super::{CliError, read_moves, read_options};

/// Replay one file, checking invariants after every move.
fn check_file(path: &Path, options: &EngineOptions) -> CheckStats {
    let mut stats = CheckStats {
        files: 1,
        ..CheckStats::default()
    };
    let moves = match read_moves(path) {
        Ok(moves) => moves,
        Err(e) => {
            stats.failures.push(e.to_string());
            return stats;
        }
    };

    let mut engine = Engine::new(options.clone());
    for (i, mv) in moves.iter().enumerate() {
        if let Err(e) = engine.apply(mv) {
            stats
                .failures
                .push(format!("{}: move {} `{mv}` rejected: {e}", path.display(), i + 1));
            return stats;
        }
        stats.moves += 1;
        if let Some(violation) = check_invariants(&engine).first() {
            stats
                .failures
                .push(format!("{}: after move {} `{mv}`: {violation}", path.display(), i + 1));
            return stats;
        }
    }
    debug!(path = %path.display(), moves = stats.moves, "file ok");
    stats.passed = 1;
    stats
}

/// Execute the check command.
///
/// # Errors
///
/// Returns an error if the options cannot be read or any file fails.
pub(crate) fn execute(
    files: &[PathBuf],
    options: Option<&Path>,
    threads: Option<usize>,
    progress: bool,
) -> Result<(), CliError> {
    let options = read_options(options)?;

    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let pb = progress.then(|| {
        let pb = ProgressBar::new(u64::try_from(files.len()).unwrap_or(u64::MAX));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    });

    let start = Instant::now();
    let stats = files
        .par_iter()
        .fold(CheckStats::default, |mut local, path| {
            local.merge(check_file(path, &options));
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            local
        })
        .reduce(CheckStats::default, |mut a, b| {
            a.merge(b);
            a
        });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    print!("{}", format_check(&stats));
    println!("Duration: {:.2}s", start.elapsed().as_secs_f64());

    if stats.failures.is_empty() {
        Ok(())
    } else {
        Err(CliError::new(format!("{} of {} files failed", stats.failures.len(), stats.files)))
    }
}
