//! # Run Orchestration
//!
//! ```text
//! raw rows ─► normalize ─► scope ─► ┌ evaluator ┐
//!                                   │ evaluator │ (rayon, isolated) ─► aggregate
//!                                   └ evaluator ┘
//! ```
//!
//! Fatal problems (invalid configuration, ambiguous registry, no report
//! month) abort before any check runs. After that, every check is isolated:
//! an evaluator error or panic becomes a `failed_to_run` status for that
//! check alone.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use k303_core::{
    normalize_report, CheckId, FundRegistry, FundRegistryEntry, RawDisclosureRow, ReportMonth,
};

use crate::aggregate::{Period, RejectedRow, RunReport, RunSummary};
use crate::config::EngineConfig;
use crate::context::{infer_report_month, EvaluationContext};
use crate::error::{EngineError, EvaluationError};
use crate::evaluator::{default_evaluators, CheckEvaluator, Evaluation};
use crate::scope::resolve_scope;

/// Everything a run consumes.
#[derive(Debug, Clone, Default)]
pub struct ValidationInput {
    /// Current-period report lines.
    pub current: Vec<RawDisclosureRow>,
    /// Previous-period report lines, when available.
    pub previous: Option<Vec<RawDisclosureRow>>,
    /// Registry entries in source order.
    pub registry: Vec<FundRegistryEntry>,
    /// Explicit report month; inferred from the current rows when `None`.
    pub report_month: Option<ReportMonth>,
}

/// Validate one report with the default evaluator set.
pub fn run_validation(
    input: ValidationInput,
    config: &EngineConfig,
) -> Result<RunReport, EngineError> {
    let evaluators = default_evaluators(config);
    run_validation_with(input, config, &evaluators)
}

/// Validate one report with a caller-supplied evaluator set.
pub fn run_validation_with(
    input: ValidationInput,
    config: &EngineConfig,
    evaluators: &[Box<dyn CheckEvaluator>],
) -> Result<RunReport, EngineError> {
    config.validate()?;
    let registry = FundRegistry::new(input.registry)?;

    let current = normalize_report(Period::Current.as_str(), &input.current);
    let previous = input
        .previous
        .as_deref()
        .map(|rows| normalize_report(Period::Previous.as_str(), rows));

    let (report_month, inferred) = match input.report_month {
        Some(month) => (month, false),
        None => (
            infer_report_month(&current.rows).ok_or(EngineError::NoReportMonth)?,
            true,
        ),
    };
    tracing::info!(%report_month, inferred, "report month resolved");

    let ctx = EvaluationContext {
        config,
        registry: &registry,
        current: resolve_scope(&current.rows, &registry, &config.trustee_name),
        previous: previous
            .as_ref()
            .map(|p| resolve_scope(&p.rows, &registry, &config.trustee_name)),
        report_month,
    };

    let summary = RunSummary {
        trustee_name: config.trustee_name.clone(),
        manager_name: config.manager_name.clone(),
        report_month: Some(report_month),
        report_month_label: report_month.hebrew_label(),
        report_month_inferred: inferred,
        total_raw_rows: current.raw_row_count(),
        rejected_rows: current.rejections.len(),
        in_scope_rows: ctx.current.in_scope_row_count(),
        out_of_scope_rows: ctx.current.out_of_scope_row_count(),
        funds_in_report: ctx.current.funds_in_report().len(),
        in_scope_funds: ctx.current.in_scope_fund_count(),
        out_of_scope_funds: ctx.current.out_of_scope_fund_count(),
        registry_funds: ctx.current.funds_in_registry().len(),
        previous_raw_rows: previous.as_ref().map(|p| p.raw_row_count()),
        previous_rejected_rows: previous.as_ref().map(|p| p.rejections.len()),
        ..RunSummary::default()
    };

    let results = evaluate_all(&ctx, evaluators);

    let mut rejections: Vec<RejectedRow> = current
        .rejections
        .iter()
        .cloned()
        .map(|rejection| RejectedRow {
            period: Period::Current,
            rejection,
        })
        .collect();
    if let Some(prev) = &previous {
        rejections.extend(prev.rejections.iter().cloned().map(|rejection| RejectedRow {
            period: Period::Previous,
            rejection,
        }));
    }

    let report = RunReport::assemble(summary, results, rejections);
    tracing::info!(
        passed = report.summary.checks_passed,
        failed = report.summary.checks_failed,
        failed_to_run = report.summary.checks_failed_to_run,
        exceptions = report.summary.total_exceptions,
        "validation run complete"
    );
    Ok(report)
}

/// Run every evaluator in parallel. Results keep the order of `evaluators`.
pub fn evaluate_all(
    ctx: &EvaluationContext<'_>,
    evaluators: &[Box<dyn CheckEvaluator>],
) -> Vec<(CheckId, Result<Evaluation, EvaluationError>)> {
    evaluators
        .par_iter()
        .map(|evaluator| {
            let check_id = evaluator.check_id();
            (check_id, evaluate_isolated(evaluator.as_ref(), ctx))
        })
        .collect()
}

/// Run one evaluator, converting a panic into [`EvaluationError::Panicked`].
pub fn evaluate_isolated(
    evaluator: &dyn CheckEvaluator,
    ctx: &EvaluationContext<'_>,
) -> Result<Evaluation, EvaluationError> {
    let check_id = evaluator.check_id();
    let span = tracing::info_span!("check", check = %check_id);
    let _guard = span.enter();

    let result = panic::catch_unwind(AssertUnwindSafe(|| evaluator.evaluate(ctx)))
        .unwrap_or_else(|payload| {
            Err(EvaluationError::Panicked {
                check_id,
                message: panic_message(&*payload),
            })
        });

    match &result {
        Ok(Evaluation::Completed(found)) => {
            tracing::info!(exceptions = found.len(), "check completed")
        }
        Ok(Evaluation::NotImplemented) => tracing::info!("check not implemented"),
        Err(err) => tracing::error!("check failed to run: {err}"),
    }
    result
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
