//! # k303 CLI entry point
//!
//! Parses command-line arguments, installs logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use k303_cli::checks::{run_checks, ChecksArgs};
use k303_cli::logging;
use k303_cli::validate::{run_validate, ValidateArgs};

/// Exit code for operational failures (unreadable input, bad configuration).
const EXIT_FATAL: u8 = 2;

/// K.303 disclosure report validator.
///
/// Validates a trustee's monthly K.303 fund disclosure report against the
/// exchange fund registry and the disclosure rule set.
#[derive(Parser, Debug)]
#[command(name = "k303", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the YAML configuration file.
    #[arg(long, global = true, default_value = "config/k303.yaml")]
    config: PathBuf,

    /// Base directory for per-run logs and report copies.
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a monthly K.303 report.
    Validate(ValidateArgs),

    /// List every registered check.
    Checks(ChecksArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let run_log = match logging::init(cli.verbose, cli.log_dir.as_deref()) {
        Ok(run_log) => run_log,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    tracing::debug!(run_id = %run_log.run_id, "k303 CLI starting");

    let result = match cli.command {
        Commands::Validate(args) => run_validate(&args, &cli.config, &run_log),
        Commands::Checks(args) => run_checks(&args, &cli.config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}
