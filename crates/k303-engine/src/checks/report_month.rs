//! Check 1ב: every in-scope row is dated in the report month.

use k303_core::{CheckId, ExceptionDetail, ExceptionRecord, ReportMonth};

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::evaluator::{CheckEvaluator, Evaluation};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportMonthEvaluator;

impl CheckEvaluator for ReportMonthEvaluator {
    fn check_id(&self) -> CheckId {
        CheckId::ReportDate
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError> {
        let expected = ctx.report_month;
        let exceptions = ctx
            .current
            .in_scope_rows()
            .filter(|scoped| !expected.contains(scoped.row.report_date()))
            .map(|scoped| {
                let row = scoped.row;
                let actual = ReportMonth::of(row.report_date());
                tracing::debug!(
                    fund_id = %row.fund_id(),
                    row = row.source_row(),
                    %actual,
                    "row dated outside report month"
                );
                ExceptionRecord::new(
                    CheckId::ReportDate,
                    row.fund_id(),
                    row.fund_name(),
                    format!("תאריך לא תואם (צפוי: {})", expected.hebrew_label()),
                    ExceptionDetail::ReportMonth { expected, actual },
                )
                .with_code(row.effective_code().clone())
                .with_percent(row.percent_of_fund())
                .with_report_date(row.report_date())
                .with_source_row(row.source_row())
            })
            .collect();
        Ok(Evaluation::Completed(exceptions))
    }
}
