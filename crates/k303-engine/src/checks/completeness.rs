//! Check 1א: fund completeness.
//!
//! `registry − report` funds are missing from the report; `report − registry`
//! funds are extra. Missing funds come out in registry order, extra funds in
//! order of first appearance in the report.

use std::collections::{HashMap, HashSet};

use k303_core::{
    CheckId, CompletenessCategory, ExceptionDetail, ExceptionRecord, FundId,
};

use crate::config::ExtraFundPolicy;
use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::evaluator::{CheckEvaluator, Evaluation};
use crate::scope::ScopedRow;

const MISSING_REASON: &str = "קרן חסרה בדוח";
const UNREGISTERED_REASON: &str = "קרן לא קיימת ברשימת קרנות";
const OTHER_TRUSTEE_REASON: &str = "קרן אינה רשומה לנאמן";

#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessEvaluator;

impl CheckEvaluator for CompletenessEvaluator {
    fn check_id(&self) -> CheckId {
        CheckId::FundCompleteness
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError> {
        let scope = &ctx.current;
        let report: HashSet<FundId> = scope.funds_in_report().iter().copied().collect();
        let registered: HashSet<FundId> = scope
            .funds_in_registry()
            .iter()
            .map(|e| e.exchange_id)
            .collect();

        let mut exceptions = Vec::new();

        for entry in scope.funds_in_registry() {
            if !report.contains(&entry.exchange_id) {
                tracing::warn!(fund_id = %entry.exchange_id, "fund missing from report");
                exceptions.push(ExceptionRecord::new(
                    CheckId::FundCompleteness,
                    entry.exchange_id,
                    entry.fund_name.clone(),
                    MISSING_REASON,
                    ExceptionDetail::Completeness {
                        category: CompletenessCategory::MissingFromReport,
                    },
                ));
            }
        }

        let mut first_rows: HashMap<FundId, &ScopedRow<'_>> = HashMap::new();
        for scoped in scope.rows() {
            first_rows.entry(scoped.row.fund_id()).or_insert(scoped);
        }

        for fund_id in scope.funds_in_report() {
            if registered.contains(fund_id) {
                continue;
            }
            let in_registry = ctx.registry.contains(*fund_id);
            let reason = match (ctx.config.extra_fund_policy, in_registry) {
                (ExtraFundPolicy::UnregisteredOnly, true) => continue,
                (_, false) => UNREGISTERED_REASON,
                (ExtraFundPolicy::Strict, true) => OTHER_TRUSTEE_REASON,
            };
            tracing::warn!(fund_id = %fund_id, registered = in_registry, "extra fund in report");
            let mut record = ExceptionRecord::new(
                CheckId::FundCompleteness,
                *fund_id,
                first_rows
                    .get(fund_id)
                    .map(|r| r.row.fund_name().to_string())
                    .unwrap_or_default(),
                reason,
                ExceptionDetail::Completeness {
                    category: CompletenessCategory::ExtraInReport,
                },
            );
            if let Some(first) = first_rows.get(fund_id) {
                record = record.with_source_row(first.row.source_row());
            }
            exceptions.push(record);
        }

        Ok(Evaluation::Completed(exceptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fixtures::*;
    use k303_core::FundRegistry;

    fn categories(eval: Evaluation) -> Vec<(u64, CompletenessCategory)> {
        let Evaluation::Completed(found) = eval else {
            panic!("expected completed evaluation");
        };
        found
            .iter()
            .map(|e| match e.detail() {
                ExceptionDetail::Completeness { category } => (e.fund_id().get(), *category),
                other => panic!("unexpected detail {other:?}"),
            })
            .collect()
    }

    #[test]
    fn missing_fund_is_one_exception() {
        let cfg = config();
        let reg = FundRegistry::new(vec![trustee_entry(1, None), trustee_entry(2, None)]).unwrap();
        let rows = vec![row(1, "01", "5", "30112025")];
        let ctx = context(&cfg, &reg, &rows, None);
        let found = categories(CompletenessEvaluator.evaluate(&ctx).unwrap());
        assert_eq!(found, vec![(2, CompletenessCategory::MissingFromReport)]);
    }

    #[test]
    fn missing_in_registry_order_extra_in_report_order() {
        let cfg = config();
        let reg = FundRegistry::new(vec![
            trustee_entry(5, None),
            trustee_entry(3, None),
            trustee_entry(1, None),
        ])
        .unwrap();
        let rows = vec![
            row(9, "01", "5", "30112025"),
            row(1, "01", "5", "30112025"),
            row(7, "01", "5", "30112025"),
        ];
        let ctx = context(&cfg, &reg, &rows, None);
        let found = categories(CompletenessEvaluator.evaluate(&ctx).unwrap());
        assert_eq!(
            found,
            vec![
                (5, CompletenessCategory::MissingFromReport),
                (3, CompletenessCategory::MissingFromReport),
                (9, CompletenessCategory::ExtraInReport),
                (7, CompletenessCategory::ExtraInReport),
            ]
        );
    }

    #[test]
    fn other_trustee_fund_depends_on_policy() {
        let reg = FundRegistry::new(vec![
            trustee_entry(1, None),
            entry(2, "נאמן אחר", None),
        ])
        .unwrap();
        let rows = vec![row(1, "01", "5", "30112025"), row(2, "01", "5", "30112025")];

        let strict = config();
        let ctx = context(&strict, &reg, &rows, None);
        assert_eq!(
            categories(CompletenessEvaluator.evaluate(&ctx).unwrap()),
            vec![(2, CompletenessCategory::ExtraInReport)]
        );

        let mut lenient = config();
        lenient.extra_fund_policy = ExtraFundPolicy::UnregisteredOnly;
        let ctx = context(&lenient, &reg, &rows, None);
        assert!(categories(CompletenessEvaluator.evaluate(&ctx).unwrap()).is_empty());
    }

    #[test]
    fn complete_report_passes() {
        let cfg = config();
        let reg = FundRegistry::new(vec![trustee_entry(1, None)]).unwrap();
        let rows = vec![row(1, "01", "5", "30112025"), row(1, "06", "5", "30112025")];
        let ctx = context(&cfg, &reg, &rows, None);
        assert!(categories(CompletenessEvaluator.evaluate(&ctx).unwrap()).is_empty());
    }
}
