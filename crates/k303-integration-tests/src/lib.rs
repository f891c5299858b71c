//! Fixture builders shared by the cross-crate tests.

use k303_core::{
    CheckId, ExceptionRecord, FundId, FundRegistryEntry, RawDisclosureRow, ReportMonth,
};
use k303_engine::{run_validation, EngineConfig, ProfileLegend, RunReport, ValidationInput};

pub use k303_engine::DEFAULT_TRUSTEE as TRUSTEE;

/// Last day of November 2025, as written in report files.
pub const NOV: &str = "30112025";
/// Last day of October 2025.
pub const OCT: &str = "31102025";

pub fn november() -> ReportMonth {
    ReportMonth::new(2025, 11).expect("valid month")
}

/// Registry entry for `trustee` with the standard naming.
pub fn entry_for(id: u64, trustee: &str, token: Option<&str>) -> FundRegistryEntry {
    FundRegistryEntry {
        exchange_id: FundId::new(id),
        fund_name: format!("קרן {id}"),
        trustee_name: trustee.into(),
        manager_name: "מנהל קרנות".into(),
        exposure_profile_token: token.map(String::from),
        source_row: 2,
    }
}

/// Registry entry for the default trustee with a permissive profile.
pub fn entry(id: u64) -> FundRegistryEntry {
    entry_for(id, TRUSTEE, Some("6F"))
}

/// One raw report line with the code in the level-1 column.
pub fn raw(id: u64, code: &str, pct: &str, date: &str) -> RawDisclosureRow {
    RawDisclosureRow {
        source_row: 0,
        fund_id: id.to_string(),
        fund_name: format!("קרן {id}"),
        levels: [code.into(), String::new(), String::new(), String::new()],
        percent_of_fund: pct.into(),
        report_date: date.into(),
        ..Default::default()
    }
}

/// Number raw lines as a file would: header on line 1, data from line 2.
pub fn numbered(mut rows: Vec<RawDisclosureRow>) -> Vec<RawDisclosureRow> {
    for (idx, row) in rows.iter_mut().enumerate() {
        row.source_row = idx + 2;
    }
    rows
}

pub fn config() -> EngineConfig {
    EngineConfig::new(ProfileLegend::standard())
}

/// Run with the default configuration and an explicit November report month.
pub fn run(
    registry: Vec<FundRegistryEntry>,
    current: Vec<RawDisclosureRow>,
    previous: Option<Vec<RawDisclosureRow>>,
) -> RunReport {
    run_with(&config(), registry, current, previous)
}

pub fn run_with(
    config: &EngineConfig,
    registry: Vec<FundRegistryEntry>,
    current: Vec<RawDisclosureRow>,
    previous: Option<Vec<RawDisclosureRow>>,
) -> RunReport {
    let input = ValidationInput {
        current: numbered(current),
        previous: previous.map(numbered),
        registry,
        report_month: Some(november()),
    };
    run_validation(input, config).expect("validation run")
}

/// Exceptions of one check.
pub fn exceptions(report: &RunReport, id: CheckId) -> &[ExceptionRecord] {
    report
        .check(id)
        .map(|c| c.exceptions.as_slice())
        .unwrap_or_default()
}
