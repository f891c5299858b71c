//! Order and symmetry properties of whole validation runs.

use std::collections::BTreeSet;

use proptest::prelude::*;

use k303_core::{
    CheckId, CompletenessCategory, DisclosureCode, ExceptionDetail, FundId, RawDisclosureRow,
};
use k303_engine::RunReport;
use k303_integration_tests::*;

/// Funds per completeness category, as sets.
fn completeness_sets(report: &RunReport) -> (BTreeSet<FundId>, BTreeSet<FundId>) {
    let mut missing = BTreeSet::new();
    let mut extra = BTreeSet::new();
    for e in exceptions(report, CheckId::FundCompleteness) {
        match e.detail() {
            ExceptionDetail::Completeness {
                category: CompletenessCategory::MissingFromReport,
            } => {
                missing.insert(e.fund_id());
            }
            ExceptionDetail::Completeness {
                category: CompletenessCategory::ExtraInReport,
            } => {
                extra.insert(e.fund_id());
            }
            other => panic!("unexpected detail {other:?}"),
        }
    }
    (missing, extra)
}

/// Run with registry funds `registered` and one report line per `reported` fund.
fn completeness_run(registered: &BTreeSet<u64>, reported: &BTreeSet<u64>) -> RunReport {
    let registry = registered.iter().map(|&id| entry(id)).collect();
    let current = reported
        .iter()
        .map(|&id| raw(id, "05", "100", NOV))
        .collect();
    run(registry, current, None)
}

fn ids(set: &BTreeSet<u64>) -> BTreeSet<FundId> {
    set.iter().map(|&id| FundId::new(id)).collect()
}

/// Reasonableness findings stripped of row positions, sorted.
fn reasonableness_findings(report: &RunReport) -> Vec<String> {
    let mut found: Vec<String> = exceptions(report, CheckId::PriorMonthReasonableness)
        .iter()
        .map(|e| {
            format!(
                "{}|{}|{}",
                e.fund_id(),
                e.effective_code().map(DisclosureCode::as_str).unwrap_or(""),
                serde_json::to_string(e.detail()).unwrap()
            )
        })
        .collect();
    found.sort();
    found
}

/// Report lines over a few funds and codes, percents with two decimals.
fn period_rows(date: &'static str) -> impl Strategy<Value = Vec<RawDisclosureRow>> {
    prop::collection::vec(
        (
            1u64..=4,
            prop::sample::select(vec!["01", "0102", "03", "06", "0801"]),
            0u32..5000,
        ),
        0..24,
    )
    .prop_map(move |lines| {
        lines
            .into_iter()
            .map(|(id, code, cents)| {
                let pct = format!("{}.{:02}", cents / 100, cents % 100);
                raw(id, code, &pct, date)
            })
            .collect()
    })
}

proptest! {
    /// Swapping the registry and report fund sets swaps missing and extra.
    #[test]
    fn completeness_is_symmetric(
        a in prop::collection::btree_set(1u64..40, 1..12),
        b in prop::collection::btree_set(1u64..40, 1..12),
    ) {
        let (missing_ab, extra_ab) = completeness_sets(&completeness_run(&a, &b));
        let (missing_ba, extra_ba) = completeness_sets(&completeness_run(&b, &a));

        prop_assert_eq!(&missing_ab, &extra_ba);
        prop_assert_eq!(&extra_ab, &missing_ba);
        prop_assert_eq!(missing_ab, ids(&a.difference(&b).copied().collect()));
        prop_assert_eq!(extra_ab, ids(&b.difference(&a).copied().collect()));
    }

    /// Reordering the lines of either period does not change 2א findings.
    #[test]
    fn reasonableness_is_stable_under_reordering(
        (current, shuffled_current) in period_rows(NOV)
            .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle())),
        (previous, shuffled_previous) in period_rows(OCT)
            .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle())),
    ) {
        let registry: Vec<_> = (1..=4).map(entry).collect();
        // Keep the current report non-empty so every run has rows to scope.
        let mut current = current;
        let mut shuffled_current = shuffled_current;
        current.push(raw(1, "05", "1", NOV));
        shuffled_current.insert(0, raw(1, "05", "1", NOV));

        let ordered = run(registry.clone(), current, Some(previous));
        let reordered = run(registry, shuffled_current, Some(shuffled_previous));

        prop_assert_eq!(
            reasonableness_findings(&ordered),
            reasonableness_findings(&reordered)
        );
    }

    /// A fund holding only codes outside every rule triggers no combination check.
    #[test]
    fn unrelated_codes_never_trigger_combination_rules(
        codes in prop::collection::btree_set(
            prop::sample::select(vec!["02", "04", "05", "0401", "0501", "09"]),
            1..5,
        )
    ) {
        let current = codes.iter().map(|c| raw(7, c, "10", NOV)).collect();
        let report = run(vec![entry(7)], current, None);
        prop_assert_eq!(report.summary.rejected_rows, 0);
        for &id in CheckId::combination_checks() {
            prop_assert!(exceptions(&report, id).is_empty(), "check {} fired", id);
        }
    }
}
