//! End-to-end runs over small hand-built reports.

use k303_core::{
    CheckId, CheckOutcome, CompletenessCategory, Decimal, DisclosureCode, ExceptionDetail,
    ExposureFlag, FundId, ImplicationDirection, ReasonablenessFlag,
};
use k303_engine::ExtraFundPolicy;
use k303_integration_tests::*;

fn code(s: &str) -> DisclosureCode {
    DisclosureCode::new(s).unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// =========================================================================
// 1א completeness
// =========================================================================

#[test]
fn trustee_fund_absent_from_report_is_one_missing_exception() {
    let report = run(
        vec![entry(100), entry(200)],
        vec![raw(100, "05", "100", NOV)],
        Some(vec![raw(100, "05", "100", OCT)]),
    );
    let found = exceptions(&report, CheckId::FundCompleteness);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fund_id(), FundId::new(200));
    assert_eq!(found[0].fund_name(), "קרן 200");
    assert_eq!(
        found[0].detail(),
        &ExceptionDetail::Completeness {
            category: CompletenessCategory::MissingFromReport
        }
    );
}

#[test]
fn other_trustee_fund_is_extra_only_under_strict_policy() {
    let registry = vec![entry(100), entry_for(300, "נאמן אחר בע\"מ", Some("6F"))];
    let current = vec![raw(100, "05", "100", NOV), raw(300, "05", "100", NOV)];

    let strict = run(registry.clone(), current.clone(), None);
    let found = exceptions(&strict, CheckId::FundCompleteness);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].fund_id(), FundId::new(300));
    assert_eq!(strict.summary.out_of_scope_funds, 1);

    let mut config = config();
    config.extra_fund_policy = ExtraFundPolicy::UnregisteredOnly;
    let lenient = run_with(&config, registry, current, None);
    assert!(exceptions(&lenient, CheckId::FundCompleteness).is_empty());
}

#[test]
fn unregistered_fund_rows_are_out_of_scope_everywhere_else() {
    let report = run(
        vec![entry_for(100, TRUSTEE, Some("00"))],
        vec![raw(100, "05", "100", NOV), raw(999, "01", "90", "01012020")],
        None,
    );
    assert_eq!(report.summary.in_scope_rows, 1);
    assert_eq!(report.summary.out_of_scope_rows, 1);
    assert!(exceptions(&report, CheckId::ReportDate).is_empty());
    assert!(exceptions(&report, CheckId::ExposureProfile).is_empty());
    assert_eq!(exceptions(&report, CheckId::FundCompleteness).len(), 1);
}

// =========================================================================
// 1ב report month
// =========================================================================

#[test]
fn row_dated_outside_report_month_is_flagged() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "05", "60", NOV), raw(100, "06", "40", OCT)],
        None,
    );
    let found = exceptions(&report, CheckId::ReportDate);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].source_row_index(), Some(3));
    assert!(found[0].reason_text().contains("נובמבר 2025"));
}

#[test]
fn row_without_date_is_rejected_not_flagged() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "05", "60", NOV), raw(100, "06", "40", "")],
        None,
    );
    assert!(exceptions(&report, CheckId::ReportDate).is_empty());
    assert_eq!(report.summary.rejected_rows, 1);
    assert_eq!(report.rejections[0].rejection.source_row, 3);
}

// =========================================================================
// 2א reasonableness
// =========================================================================

#[test]
fn fifteen_point_drop_is_changed_with_negative_delta() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "01", "5.0", NOV)],
        Some(vec![raw(100, "01", "20.0", OCT)]),
    );
    let found = exceptions(&report, CheckId::PriorMonthReasonableness);
    assert_eq!(found.len(), 1);
    match found[0].detail() {
        ExceptionDetail::Reasonableness {
            flag_kind, delta, ..
        } => {
            assert_eq!(*flag_kind, ReasonablenessFlag::Changed);
            assert_eq!(*delta, Some(dec("-15.0")));
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn change_at_threshold_is_not_flagged() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "01", "30", NOV)],
        Some(vec![raw(100, "01", "20", OCT)]),
    );
    assert!(exceptions(&report, CheckId::PriorMonthReasonableness).is_empty());
}

#[test]
fn added_and_removed_codes_are_flagged() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "01", "50", NOV), raw(100, "06", "50", NOV)],
        Some(vec![raw(100, "01", "50", OCT), raw(100, "05", "50", OCT)]),
    );
    let flags: Vec<ReasonablenessFlag> = exceptions(&report, CheckId::PriorMonthReasonableness)
        .iter()
        .map(|e| match e.detail() {
            ExceptionDetail::Reasonableness { flag_kind, .. } => *flag_kind,
            other => panic!("unexpected detail {other:?}"),
        })
        .collect();
    assert_eq!(
        flags,
        vec![ReasonablenessFlag::Added, ReasonablenessFlag::Removed]
    );
}

#[test]
fn no_previous_report_fails_only_reasonableness() {
    let report = run(vec![entry(100)], vec![raw(100, "05", "100", NOV)], None);
    let check = report.check(CheckId::PriorMonthReasonableness).unwrap();
    assert!(matches!(
        check.status.outcome,
        CheckOutcome::FailedToRun { .. }
    ));
    assert_eq!(report.summary.checks_failed_to_run, 1);
    assert_eq!(report.summary.checks_failed, 0);
}

#[test]
fn percent_overflow_fails_sums_cleanly_and_leaves_other_checks() {
    let max = Decimal::MAX.to_string();
    let report = run(
        vec![entry(100)],
        vec![raw(100, "01", &max, NOV), raw(100, "01", &max, NOV)],
        Some(vec![raw(100, "01", "1", OCT)]),
    );
    for id in [CheckId::PriorMonthReasonableness, CheckId::ExposureProfile] {
        match &report.check(id).unwrap().status.outcome {
            CheckOutcome::FailedToRun { error } => {
                assert!(error.contains("overflowed"), "{error}");
                assert!(!error.contains("panicked"), "{error}");
            }
            other => panic!("check {id}: unexpected outcome {other:?}"),
        }
    }
    assert_eq!(report.summary.checks_failed_to_run, 2);
    assert_eq!(
        report.check(CheckId::FundCompleteness).unwrap().status.outcome,
        CheckOutcome::Passed
    );
}

// =========================================================================
// 2ב exposure
// =========================================================================

fn exposure_kinds(report: &k303_engine::RunReport) -> Vec<ExposureFlag> {
    exceptions(report, CheckId::ExposureProfile)
        .iter()
        .map(|e| match e.detail() {
            ExceptionDetail::Exposure { kind, .. } => *kind,
            other => panic!("unexpected detail {other:?}"),
        })
        .collect()
}

#[test]
fn zero_equity_profile_tolerates_zero_percent_line() {
    let report = run(
        vec![entry_for(100, TRUSTEE, Some("0A"))],
        vec![raw(100, "01", "0.0", NOV), raw(100, "05", "100", NOV)],
        None,
    );
    assert!(exposure_kinds(&report).is_empty());
}

#[test]
fn zero_equity_profile_flags_small_holding_once() {
    let report = run(
        vec![entry_for(100, TRUSTEE, Some("0A"))],
        vec![raw(100, "01", "0.3", NOV), raw(100, "05", "99.7", NOV)],
        None,
    );
    assert_eq!(exposure_kinds(&report), vec![ExposureFlag::ZeroEquity]);
}

#[test]
fn unknown_profile_token_is_reported_per_fund() {
    let report = run(
        vec![entry_for(100, TRUSTEE, Some("Q9"))],
        vec![raw(100, "01", "10", NOV), raw(100, "06", "10", NOV)],
        None,
    );
    assert_eq!(exposure_kinds(&report), vec![ExposureFlag::UnknownProfile]);
}

// =========================================================================
// 3-series combination rules
// =========================================================================

#[test]
fn government_shekel_bond_without_duration_names_missing_code() {
    let report = run(
        vec![entry(100)],
        vec![
            raw(100, "03010101", "60", NOV),
            raw(100, "07", "60", NOV),
            raw(100, "08", "60", NOV),
        ],
        None,
    );
    let found = exceptions(&report, CheckId::GovernmentShekelBonds);
    assert_eq!(found.len(), 1);
    match found[0].detail() {
        ExceptionDetail::Combination {
            direction,
            missing_codes,
            ..
        } => {
            assert_eq!(*direction, ImplicationDirection::LeftToRight);
            assert_eq!(missing_codes, &vec![code("080201")]);
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn broad_parent_code_does_not_satisfy_specific_rule() {
    let report = run(
        vec![entry(100)],
        vec![
            raw(100, "03", "60", NOV),
            raw(100, "07", "60", NOV),
            raw(100, "08", "60", NOV),
        ],
        None,
    );
    assert!(exceptions(&report, CheckId::GovernmentShekelBonds).is_empty());
    assert!(exceptions(&report, CheckId::BondExposure).is_empty());
}

#[test]
fn duration_without_bond_is_right_to_left_exception() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "03", "60", NOV), raw(100, "080201", "60", NOV)],
        None,
    );
    let found = exceptions(&report, CheckId::GovernmentShekelBonds);
    assert_eq!(found.len(), 1);
    assert!(matches!(
        found[0].detail(),
        ExceptionDetail::Combination {
            direction: ImplicationDirection::RightToLeft,
            ..
        }
    ));
}

#[test]
fn bonds_require_both_ratings_and_duration() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "03", "60", NOV), raw(100, "08", "60", NOV)],
        None,
    );
    let found = exceptions(&report, CheckId::BondExposure);
    assert_eq!(found.len(), 1);
    match found[0].detail() {
        ExceptionDetail::Combination { missing_codes, .. } => {
            assert_eq!(missing_codes, &vec![code("07")])
        }
        other => panic!("unexpected detail {other:?}"),
    }
}

#[test]
fn combination_rules_are_vacuous_when_neither_side_present() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "05", "100", NOV)],
        Some(vec![raw(100, "05", "100", OCT)]),
    );
    for &id in CheckId::combination_checks() {
        let check = report.check(id).unwrap();
        assert_eq!(check.status.outcome, CheckOutcome::Passed, "check {id}");
    }
    assert!(!report.needs_attention());
}

#[test]
fn deferred_checks_report_not_implemented() {
    let report = run(vec![entry(100)], vec![raw(100, "05", "100", NOV)], None);
    for id in [CheckId::NonInvestmentGradeBonds, CheckId::FundNameMapping] {
        let check = report.check(id).unwrap();
        assert_eq!(check.status.outcome, CheckOutcome::NotImplemented);
        assert!(!check.status.passed);
    }
    assert_eq!(report.summary.checks_not_implemented, 2);
}

#[test]
fn report_serializes_decimals_as_strings() {
    let report = run(
        vec![entry(100)],
        vec![raw(100, "01", "5.0", NOV)],
        Some(vec![raw(100, "01", "20.0", OCT)]),
    );
    let json = serde_json::to_value(&report).unwrap();
    let check = &json["checks"][2];
    assert_eq!(check["check_id"], "2א");
    assert_eq!(check["exceptions"][0]["detail"]["delta"], "-15.0");
    assert_eq!(check["exceptions"][0]["detail"]["flag_kind"], "changed");
    assert_eq!(json["summary"]["report_month"], "2025-11");
}
