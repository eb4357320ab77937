//! Gaia CLI - replay, resume and check games from move logs.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// Gaia - a deterministic board game rules engine
#[derive(Parser, Debug)]
#[command(name = "gaia-engine")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log engine decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a move log from the start and report the final state
    Replay {
        /// Move file, one move per line (`#` starts a comment)
        #[arg(required = true)]
        moves: PathBuf,

        /// Engine options as JSON
        #[arg(long)]
        options: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save a snapshot of the final state
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Load a snapshot and apply further moves
    Resume {
        /// Snapshot file written by `replay --save` or `resume --save`
        #[arg(required = true)]
        snapshot: PathBuf,

        /// Moves to apply, each quoted
        moves: Vec<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save a snapshot of the resulting state
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Replay many move logs in parallel, checking invariants after each move
    Check {
        /// Move files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Engine options as JSON
        #[arg(long)]
        options: Option<PathBuf>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    let result = match args.command {
        Commands::Replay {
            moves,
            options,
            format,
            save,
        } => cli::replay::execute(&moves, options.as_deref(), format, save.as_deref()),

        Commands::Resume {
            snapshot,
            moves,
            format,
            save,
        } => cli::resume::execute(&snapshot, &moves, format, save.as_deref()),

        Commands::Check {
            files,
            options,
            threads,
            progress,
        } => cli::check::execute(&files, options.as_deref(), threads, progress),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
