//! # Disclosure Rows: Row Normalizer
//!
//! Turns one raw report line ([`RawDisclosureRow`], cell text keyed by the
//! twelve K.303 columns) into a typed [`DisclosureRow`] with its effective
//! code derived.
//!
//! Normalization is a pure function of one row. Failures are returned as
//! [`RowError`]; [`normalize_report`] collects them into a rejection ledger so
//! a malformed row is excluded from every check but still counted.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::code::{normalize_level_code, DisclosureCode, LevelCodes, LEVEL_COUNT};
use crate::error::RowError;
use crate::fund::FundId;
use crate::period::parse_report_date;
use crate::text::{clean_field, integral_digits};

/// Column headers of a K.303 disclosure report, in file order.
pub mod columns {
    /// Fund exchange number.
    pub const FUND_ID: &str = "מספר קרן";
    /// Fund name.
    pub const FUND_NAME: &str = "שם קרן";
    /// Hierarchy level 1 .. 4.
    pub const LEVELS: [&str; super::LEVEL_COUNT] = ["רמה 1", "רמה 2", "רמה 3", "רמה 4"];
    /// Percent of fund assets.
    pub const PERCENT: &str = "%מקרן";
    /// Free-text additional data.
    pub const EXTRA_DATA: &str = "נתונים נוספים";
    /// DDMMYYYY report date.
    pub const REPORT_DATE: &str = "תאריך דוח";
    /// Index of this record within the fund's submission.
    pub const RECORD_INDEX: &str = "מס.רשומה";
    /// Total records in the fund's submission.
    pub const TOTAL_RECORDS: &str = "סהכ רשומות";
    /// Manager number at the registrar.
    pub const MANAGER_NO: &str = "מס.מנהל ברשם";

    /// All twelve expected columns.
    pub const EXPECTED: [&str; 12] = [
        FUND_ID,
        FUND_NAME,
        LEVELS[0],
        LEVELS[1],
        LEVELS[2],
        LEVELS[3],
        PERCENT,
        EXTRA_DATA,
        REPORT_DATE,
        RECORD_INDEX,
        TOTAL_RECORDS,
        MANAGER_NO,
    ];

    /// Columns without which no row can be normalized.
    pub const REQUIRED: [&str; 8] = [
        FUND_ID,
        FUND_NAME,
        LEVELS[0],
        LEVELS[1],
        LEVELS[2],
        LEVELS[3],
        PERCENT,
        REPORT_DATE,
    ];
}

/// One report line as read from the source file, before any parsing.
///
/// Cells are kept verbatim; missing optional columns are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDisclosureRow {
    /// 1-based line in the source file, header included.
    pub source_row: usize,
    pub fund_id: String,
    pub fund_name: String,
    pub levels: [String; LEVEL_COUNT],
    pub percent_of_fund: String,
    pub extra_data: String,
    pub report_date: String,
    pub record_index: String,
    pub total_records: String,
    pub manager_registry_no: String,
}

/// A validated disclosure line.
///
/// The effective code is derived once during normalization and exposed
/// read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclosureRow {
    source_row: usize,
    fund_id: FundId,
    fund_name: String,
    levels: LevelCodes,
    effective_code: DisclosureCode,
    percent_of_fund: Decimal,
    report_date: NaiveDate,
    record_index: Option<u32>,
    total_records: Option<u32>,
    extra_data: Option<String>,
    manager_registry_no: Option<String>,
}

impl DisclosureRow {
    /// 1-based line in the source file.
    pub fn source_row(&self) -> usize {
        self.source_row
    }

    pub fn fund_id(&self) -> FundId {
        self.fund_id
    }

    pub fn fund_name(&self) -> &str {
        &self.fund_name
    }

    /// The four hierarchy codes as reported (width-normalized).
    pub fn levels(&self) -> &LevelCodes {
        &self.levels
    }

    /// Deepest non-empty hierarchy code.
    pub fn effective_code(&self) -> &DisclosureCode {
        &self.effective_code
    }

    pub fn percent_of_fund(&self) -> Decimal {
        self.percent_of_fund
    }

    pub fn report_date(&self) -> NaiveDate {
        self.report_date
    }

    pub fn record_index(&self) -> Option<u32> {
        self.record_index
    }

    pub fn total_records(&self) -> Option<u32> {
        self.total_records
    }

    pub fn extra_data(&self) -> Option<&str> {
        self.extra_data.as_deref()
    }

    pub fn manager_registry_no(&self) -> Option<&str> {
        self.manager_registry_no.as_deref()
    }
}

/// Normalize one raw report line.
///
/// Validation order: fund id, hierarchy levels, effective code, percent,
/// report date, record counters. The first failure is returned.
pub fn normalize_row(raw: &RawDisclosureRow) -> Result<DisclosureRow, RowError> {
    let fund_id_text = clean_field(&raw.fund_id);
    let fund_id = fund_id_text.parse::<FundId>().map_err(|e| RowError::Parse {
        column: columns::FUND_ID.into(),
        value: fund_id_text.to_string(),
        reason: e.to_string(),
    })?;

    let mut levels: [Option<DisclosureCode>; LEVEL_COUNT] = Default::default();
    for (idx, cell) in raw.levels.iter().enumerate() {
        levels[idx] = normalize_level_code(idx + 1, columns::LEVELS[idx], cell)?;
    }
    let levels = LevelCodes::new(levels);
    let effective_code = levels.effective()?;

    let percent_of_fund = parse_percent(&raw.percent_of_fund)?;
    let report_date = parse_report_date(&raw.report_date)?;
    let record_index = parse_counter(columns::RECORD_INDEX, &raw.record_index)?;
    let total_records = parse_counter(columns::TOTAL_RECORDS, &raw.total_records)?;

    Ok(DisclosureRow {
        source_row: raw.source_row,
        fund_id,
        fund_name: clean_field(&raw.fund_name).to_string(),
        levels,
        effective_code,
        percent_of_fund,
        report_date,
        record_index,
        total_records,
        extra_data: non_empty(&raw.extra_data),
        manager_registry_no: non_empty(&raw.manager_registry_no),
    })
}

fn parse_percent(raw: &str) -> Result<Decimal, RowError> {
    let cleaned = clean_field(raw);
    let fail = || RowError::NumericFormat {
        column: columns::PERCENT.into(),
        value: cleaned.to_string(),
    };
    if cleaned.is_empty() {
        return Err(fail());
    }
    cleaned
        .parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(cleaned))
        .map_err(|_| fail())
}

fn parse_counter(column: &str, raw: &str) -> Result<Option<u32>, RowError> {
    let cleaned = clean_field(raw);
    if cleaned.is_empty() {
        return Ok(None);
    }
    integral_digits(cleaned)
        .and_then(|d| d.parse::<u32>().ok())
        .map(Some)
        .ok_or_else(|| RowError::Parse {
            column: column.to_string(),
            value: cleaned.to_string(),
            reason: "expected a non-negative integer".into(),
        })
}

fn non_empty(raw: &str) -> Option<String> {
    let cleaned = clean_field(raw);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

// ---------------------------------------------------------------------------
// Whole-report normalization
// ---------------------------------------------------------------------------

/// A row excluded from evaluation, kept for the rejection ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 1-based line in the source file.
    pub source_row: usize,
    /// Fund id cell as written, for locating the row by eye.
    pub raw_fund_id: String,
    /// Human-readable reason.
    pub reason: String,
    /// Structured error.
    pub error: RowError,
}

/// Outcome of normalizing every line of one report.
#[derive(Debug, Clone, Default)]
pub struct NormalizedReport {
    /// Rows that normalized cleanly, in file order.
    pub rows: Vec<DisclosureRow>,
    /// Rows that failed, in file order.
    pub rejections: Vec<RowRejection>,
}

impl NormalizedReport {
    /// Raw line count: admitted plus rejected.
    pub fn raw_row_count(&self) -> usize {
        self.rows.len() + self.rejections.len()
    }
}

/// Normalize every line of a report. Never fails as a whole: each bad row is
/// logged at `warn` and recorded as a [`RowRejection`].
pub fn normalize_report(period: &str, raws: &[RawDisclosureRow]) -> NormalizedReport {
    let mut report = NormalizedReport::default();
    for raw in raws {
        match normalize_row(raw) {
            Ok(row) => report.rows.push(row),
            Err(error) => {
                tracing::warn!(
                    period,
                    row = raw.source_row,
                    fund_id = clean_field(&raw.fund_id),
                    kind = error.kind(),
                    "excluding disclosure row: {error}"
                );
                report.rejections.push(RowRejection {
                    source_row: raw.source_row,
                    raw_fund_id: clean_field(&raw.fund_id).to_string(),
                    reason: error.to_string(),
                    error,
                });
            }
        }
    }
    tracing::info!(
        period,
        admitted = report.rows.len(),
        rejected = report.rejections.len(),
        "normalized disclosure report"
    );
    report
}
