//! # Validate Subcommand
//!
//! Reads the current report, the optional previous report and the fund
//! registry, runs every registered check, and publishes the run report.
//!
//! Returns exit code: 0 when every check passed or is not implemented,
//! 1 when any check has exceptions or failed to run. Operational errors
//! propagate to `main`, which exits with 2.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use k303_core::ReportMonth;
use k303_engine::{run_validation, RunReport, ValidationInput};

use crate::config::{load_config, Overrides};
use crate::logging::RunLog;
use crate::report::{render_summary, write_json, REPORT_FILE};
use crate::source::{read_disclosure, read_registry};

/// Arguments for the `k303 validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Current-month K.303 disclosure report (CSV or XLSX).
    #[arg(long, value_name = "FILE")]
    pub current: PathBuf,

    /// Previous-month report (CSV or XLSX). Without it, check 2א fails to run.
    #[arg(long, value_name = "FILE")]
    pub previous: Option<PathBuf>,

    /// Exchange fund registry (CSV or XLSX).
    #[arg(long, value_name = "FILE")]
    pub registry: PathBuf,

    /// Report month as YYYY-MM. Inferred from the report dates when omitted.
    #[arg(long, value_name = "YYYY-MM")]
    pub report_month: Option<ReportMonth>,

    /// Trustee whose funds are validated; overrides the configuration.
    #[arg(long)]
    pub trustee: Option<String>,

    /// Fund manager named in the run summary; overrides the configuration.
    #[arg(long)]
    pub manager: Option<String>,

    /// Write the JSON report here instead of stdout.
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print only the JSON report, without the console summary.
    #[arg(long)]
    pub quiet: bool,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config_path: &Path, run_log: &RunLog) -> Result<u8> {
    let overrides = Overrides {
        trustee_name: args.trustee.clone(),
        manager_name: args.manager.clone(),
    };
    let config = load_config(config_path, &overrides)?;

    let input = ValidationInput {
        current: read_disclosure(&args.current).context("failed to read current report")?,
        previous: args
            .previous
            .as_deref()
            .map(read_disclosure)
            .transpose()
            .context("failed to read previous report")?,
        registry: read_registry(&args.registry).context("failed to read fund registry")?,
        report_month: args.report_month,
    };

    let report = run_validation(input, &config).context("validation run aborted")?;
    publish(&report, args, run_log)?;

    Ok(exit_code(&report))
}

fn publish(report: &RunReport, args: &ValidateArgs, run_log: &RunLog) -> Result<()> {
    write_json(report, args.output.as_deref())?;
    if let Some(dir) = &run_log.dir {
        write_json(report, Some(&dir.join(REPORT_FILE)))?;
    }
    if !args.quiet {
        eprint!("{}", render_summary(report));
    }
    Ok(())
}

/// 1 when the report needs attention, else 0.
pub fn exit_code(report: &RunReport) -> u8 {
    if report.needs_attention() {
        1
    } else {
        0
    }
}
