//! # Report Output
//!
//! The JSON run report is the machine-readable artifact; the console
//! summary is for the operator.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use k303_core::CheckOutcome;
use k303_engine::RunReport;

/// File name of the report copy kept in the run directory.
pub const REPORT_FILE: &str = "report.json";

/// Write the report as pretty JSON to `path`, or to stdout when `None`.
pub fn write_json(report: &RunReport, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create report file {}", path.display()))?;
            let mut out = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut out, report).context("failed to serialize report")?;
            out.write_all(b"\n")?;
            out.flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "report written");
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            serde_json::to_writer_pretty(&mut out, report).context("failed to serialize report")?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}

/// Render the operator summary.
pub fn render_summary(report: &RunReport) -> String {
    let s = &report.summary;
    let mut out = String::new();

    let month = if s.report_month_inferred {
        format!("{} (inferred)", s.report_month_label)
    } else {
        s.report_month_label.clone()
    };
    let _ = writeln!(out, "K.303 validation: {month}");
    let _ = writeln!(out, "Trustee: {}", s.trustee_name);
    if let Some(manager) = &s.manager_name {
        let _ = writeln!(out, "Manager: {manager}");
    }
    let _ = writeln!(
        out,
        "Rows: {} read, {} rejected, {} in scope, {} out of scope",
        s.total_raw_rows, s.rejected_rows, s.in_scope_rows, s.out_of_scope_rows
    );
    let _ = writeln!(
        out,
        "Funds: {} in report, {} in scope, {} out of scope, {} registered to trustee",
        s.funds_in_report, s.in_scope_funds, s.out_of_scope_funds, s.registry_funds
    );
    if let (Some(raw), Some(rejected)) = (s.previous_raw_rows, s.previous_rejected_rows) {
        let _ = writeln!(out, "Previous report: {raw} rows read, {rejected} rejected");
    }
    out.push('\n');

    for check in &report.checks {
        let status = match &check.status.outcome {
            CheckOutcome::Passed => "PASS".to_string(),
            CheckOutcome::Failed => format!("FAIL ({})", check.status.exception_count),
            CheckOutcome::NotImplemented => "N/A".to_string(),
            CheckOutcome::FailedToRun { error } => format!("ERROR: {error}"),
        };
        let _ = writeln!(out, "  {:<40} {status}", check.display_name);
    }

    let _ = writeln!(
        out,
        "\nChecks: {} passed, {} failed, {} failed to run, {} not implemented; {} exceptions",
        s.checks_passed,
        s.checks_failed,
        s.checks_failed_to_run,
        s.checks_not_implemented,
        s.total_exceptions
    );
    out
}
