//! Check 2א: month-over-month reasonableness.
//!
//! Both periods are reduced to `(fund_id, effective_code) → percent` over
//! in-scope rows, summing duplicate keys. A key in both periods is flagged
//! when the absolute change exceeds the configured threshold; a key in one
//! period only is `added` or `removed`.
//!
//! Output order: current keys in first-appearance order, then removed keys
//! in previous-period first-appearance order. Because values are summed
//! exactly and keys are compared as sets, reordering rows within a period
//! changes neither membership nor values of the flags.

use std::collections::HashMap;

use rust_decimal::Decimal;

use k303_core::{
    CheckId, DisclosureCode, ExceptionDetail, ExceptionRecord, FundId, ReasonablenessFlag,
};

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::evaluator::{CheckEvaluator, Evaluation};
use crate::scope::FundScope;

type Key = (FundId, DisclosureCode);

#[derive(Debug, Clone)]
struct Holding {
    percent: Decimal,
    fund_name: String,
    source_row: usize,
}

/// Summed holdings of one period, keys in first-appearance order.
#[derive(Debug, Default)]
struct PeriodHoldings {
    order: Vec<Key>,
    values: HashMap<Key, Holding>,
}

fn overflow(fund_id: FundId) -> EvaluationError {
    EvaluationError::Overflow {
        check_id: CheckId::PriorMonthReasonableness,
        fund_id,
    }
}

impl PeriodHoldings {
    fn from_scope(scope: &FundScope<'_>) -> Result<Self, EvaluationError> {
        let mut holdings = Self::default();
        for scoped in scope.in_scope_rows() {
            let row = scoped.row;
            let key = (row.fund_id(), row.effective_code().clone());
            match holdings.values.get_mut(&key) {
                Some(h) => {
                    h.percent = h
                        .percent
                        .checked_add(row.percent_of_fund())
                        .ok_or_else(|| overflow(row.fund_id()))?;
                }
                None => {
                    holdings.order.push(key.clone());
                    holdings.values.insert(
                        key,
                        Holding {
                            percent: row.percent_of_fund(),
                            fund_name: row.fund_name().to_string(),
                            source_row: row.source_row(),
                        },
                    );
                }
            }
        }
        Ok(holdings)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReasonablenessEvaluator;

impl CheckEvaluator for ReasonablenessEvaluator {
    fn check_id(&self) -> CheckId {
        CheckId::PriorMonthReasonableness
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError> {
        let previous_scope = ctx
            .previous
            .as_ref()
            .ok_or_else(|| EvaluationError::MissingInput {
                check_id: self.check_id(),
                reason: "no previous-period report supplied".into(),
            })?;
        let threshold = ctx.config.reasonableness_threshold;
        let current = PeriodHoldings::from_scope(&ctx.current)?;
        let previous = PeriodHoldings::from_scope(previous_scope)?;

        let mut exceptions = Vec::new();

        for key in &current.order {
            let Some(cur) = current.values.get(key) else {
                continue;
            };
            let (fund_id, code) = key;
            let record = match previous.values.get(key) {
                Some(prev) => {
                    let delta = cur
                        .percent
                        .checked_sub(prev.percent)
                        .ok_or_else(|| overflow(*fund_id))?;
                    if delta.abs() <= threshold {
                        continue;
                    }
                    ExceptionRecord::new(
                        CheckId::PriorMonthReasonableness,
                        *fund_id,
                        cur.fund_name.clone(),
                        format!("סטייה > {threshold}% (שינוי: {:.2}%)", delta),
                        ExceptionDetail::Reasonableness {
                            flag_kind: ReasonablenessFlag::Changed,
                            previous_percent: Some(prev.percent),
                            current_percent: Some(cur.percent),
                            delta: Some(delta),
                        },
                    )
                }
                None => ExceptionRecord::new(
                    CheckId::PriorMonthReasonableness,
                    *fund_id,
                    cur.fund_name.clone(),
                    format!("קוד חדש (כעת: {:.2}%)", cur.percent),
                    ExceptionDetail::Reasonableness {
                        flag_kind: ReasonablenessFlag::Added,
                        previous_percent: None,
                        current_percent: Some(cur.percent),
                        delta: None,
                    },
                ),
            };
            exceptions.push(
                record
                    .with_code(code.clone())
                    .with_percent(cur.percent)
                    .with_source_row(cur.source_row),
            );
        }

        for key in &previous.order {
            if current.values.contains_key(key) {
                continue;
            }
            let Some(prev) = previous.values.get(key) else {
                continue;
            };
            let (fund_id, code) = key;
            exceptions.push(
                ExceptionRecord::new(
                    CheckId::PriorMonthReasonableness,
                    *fund_id,
                    prev.fund_name.clone(),
                    format!("קוד נעלם (היה: {:.2}%)", prev.percent),
                    ExceptionDetail::Reasonableness {
                        flag_kind: ReasonablenessFlag::Removed,
                        previous_percent: Some(prev.percent),
                        current_percent: None,
                        delta: None,
                    },
                )
                .with_code(code.clone()),
            );
        }

        tracing::debug!(
            current_keys = current.order.len(),
            previous_keys = previous.order.len(),
            flagged = exceptions.len(),
            "compared holdings month over month"
        );
        Ok(Evaluation::Completed(exceptions))
    }
}
