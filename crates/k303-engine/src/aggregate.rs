//! # Exception Aggregator
//!
//! Turns per-check evaluation results into the published [`RunReport`]: one
//! [`CheckReport`] per registered check in [`CheckId::all`] order, the run
//! summary counts, and the rejection ledger. This report is the only
//! artifact the engine hands to its callers.

use serde::Serialize;

use k303_core::{CheckId, CheckOutcome, CheckStatus, ExceptionRecord, ReportMonth, RowRejection};

use crate::error::EvaluationError;
use crate::evaluator::Evaluation;

/// One check's published result.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub check_id: CheckId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub status: CheckStatus,
    /// Discovery order.
    pub exceptions: Vec<ExceptionRecord>,
}

impl CheckReport {
    /// Build the report for one check from its evaluation result.
    pub fn from_result(check_id: CheckId, result: Result<Evaluation, EvaluationError>) -> Self {
        let (status, exceptions) = match result {
            Ok(Evaluation::Completed(exceptions)) => {
                (CheckStatus::completed(check_id, exceptions.len()), exceptions)
            }
            Ok(Evaluation::NotImplemented) => (CheckStatus::not_implemented(check_id), Vec::new()),
            Err(err) => (CheckStatus::failed_to_run(check_id, err.to_string()), Vec::new()),
        };
        Self {
            check_id,
            display_name: check_id.display_name(),
            description: check_id.description(),
            status,
            exceptions,
        }
    }
}

/// Which input file a rejected row came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Current,
    Previous,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Previous => "previous",
        }
    }
}

/// A rejection-ledger entry.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedRow {
    pub period: Period,
    #[serde(flatten)]
    pub rejection: RowRejection,
}

/// Run-level counts and identification.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub trustee_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    pub report_month: Option<ReportMonth>,
    /// Hebrew month label, e.g. `נובמבר 2025`.
    pub report_month_label: String,
    pub report_month_inferred: bool,
    /// Current-period lines read, rejected rows included.
    pub total_raw_rows: usize,
    pub rejected_rows: usize,
    pub in_scope_rows: usize,
    pub out_of_scope_rows: usize,
    pub funds_in_report: usize,
    pub in_scope_funds: usize,
    pub out_of_scope_funds: usize,
    /// Trustee funds in the registry.
    pub registry_funds: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_raw_rows: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_rejected_rows: Option<usize>,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub checks_not_implemented: usize,
    pub checks_failed_to_run: usize,
    pub total_exceptions: usize,
}

impl RunSummary {
    /// Fill the check tallies from the published check reports.
    pub fn tally(&mut self, checks: &[CheckReport]) {
        self.checks_passed = 0;
        self.checks_failed = 0;
        self.checks_not_implemented = 0;
        self.checks_failed_to_run = 0;
        self.total_exceptions = 0;
        for check in checks {
            match check.status.outcome {
                CheckOutcome::Passed => self.checks_passed += 1,
                CheckOutcome::Failed => self.checks_failed += 1,
                CheckOutcome::NotImplemented => self.checks_not_implemented += 1,
                CheckOutcome::FailedToRun { .. } => self.checks_failed_to_run += 1,
            }
            self.total_exceptions += check.exceptions.len();
        }
    }
}

/// The published result of one validation run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub checks: Vec<CheckReport>,
    /// Every rejected row of both periods, current first.
    pub rejections: Vec<RejectedRow>,
}

impl RunReport {
    /// Assemble the report. Check results must already be in
    /// [`CheckId::all`] order.
    pub fn assemble(
        mut summary: RunSummary,
        results: Vec<(CheckId, Result<Evaluation, EvaluationError>)>,
        rejections: Vec<RejectedRow>,
    ) -> Self {
        let checks: Vec<CheckReport> = results
            .into_iter()
            .map(|(id, result)| CheckReport::from_result(id, result))
            .collect();
        summary.tally(&checks);
        Self {
            summary,
            checks,
            rejections,
        }
    }

    /// The report for one check.
    pub fn check(&self, id: CheckId) -> Option<&CheckReport> {
        self.checks.iter().find(|c| c.check_id == id)
    }

    /// True when any check has exceptions or failed to run.
    pub fn needs_attention(&self) -> bool {
        self.checks.iter().any(|c| c.status.needs_attention())
    }
}
