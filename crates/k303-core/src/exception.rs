//! # Exception Records
//!
//! An [`ExceptionRecord`] is one finding produced by a rule evaluator. The
//! common fields locate the finding (fund, code, row); the typed
//! [`ExceptionDetail`] carries what each check family knows about it.
//!
//! Records are built once by an evaluator and never modified afterwards:
//! fields are private and the `with_*` builders consume `self`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::check::CheckId;
use crate::code::DisclosureCode;
use crate::fund::FundId;
use crate::period::ReportMonth;

/// Completeness category for check 1א.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletenessCategory {
    /// Registered to the trustee but absent from the report.
    MissingFromReport,
    /// Present in the report but not registered to the trustee.
    ExtraInReport,
}

/// Month-over-month flag for check 2א.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonablenessFlag {
    /// Present in both periods; the change exceeds the threshold.
    Changed,
    /// Present only in the current period.
    Added,
    /// Present only in the previous period.
    Removed,
}

/// Exposure finding for check 2ב.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureFlag {
    /// Equity (01) disclosed by a zero-equity fund.
    ZeroEquity,
    /// FX (06) disclosed by a zero-FX fund.
    ZeroFx,
    /// Total equity exposure above the profile limit.
    EquityLimit,
    /// Total FX exposure above the profile limit.
    FxLimit,
    /// The fund's profile token is not in the legend.
    UnknownProfile,
}

/// Which side of a combination rule triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImplicationDirection {
    /// Left-side code present, right side incomplete.
    LeftToRight,
    /// Right-side code present, no left-side code.
    RightToLeft,
}

/// Check-family specific data attached to an exception.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExceptionDetail {
    Completeness {
        category: CompletenessCategory,
    },
    ReportMonth {
        expected: ReportMonth,
        actual: ReportMonth,
    },
    Reasonableness {
        flag_kind: ReasonablenessFlag,
        previous_percent: Option<Decimal>,
        current_percent: Option<Decimal>,
        /// `current − previous`; set only for [`ReasonablenessFlag::Changed`].
        delta: Option<Decimal>,
    },
    Exposure {
        kind: ExposureFlag,
        token: String,
        /// Profile limit, for the limit flags.
        limit: Option<Decimal>,
    },
    Combination {
        direction: ImplicationDirection,
        missing_codes: Vec<DisclosureCode>,
        present_codes: Vec<DisclosureCode>,
    },
}

/// One finding of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionRecord {
    check_id: CheckId,
    reason_text: String,
    fund_id: FundId,
    fund_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    effective_code: Option<DisclosureCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_of_fund: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_row_index: Option<usize>,
    detail: ExceptionDetail,
}

impl ExceptionRecord {
    pub fn new(
        check_id: CheckId,
        fund_id: FundId,
        fund_name: impl Into<String>,
        reason_text: impl Into<String>,
        detail: ExceptionDetail,
    ) -> Self {
        Self {
            check_id,
            reason_text: reason_text.into(),
            fund_id,
            fund_name: fund_name.into(),
            effective_code: None,
            percent_of_fund: None,
            report_date: None,
            source_row_index: None,
            detail,
        }
    }

    pub fn with_code(mut self, code: DisclosureCode) -> Self {
        self.effective_code = Some(code);
        self
    }

    pub fn with_percent(mut self, percent: Decimal) -> Self {
        self.percent_of_fund = Some(percent);
        self
    }

    pub fn with_report_date(mut self, date: NaiveDate) -> Self {
        self.report_date = Some(date);
        self
    }

    /// Attach the 1-based source file row.
    pub fn with_source_row(mut self, row: usize) -> Self {
        self.source_row_index = Some(row);
        self
    }

    pub fn check_id(&self) -> CheckId {
        self.check_id
    }

    pub fn reason_text(&self) -> &str {
        &self.reason_text
    }

    pub fn fund_id(&self) -> FundId {
        self.fund_id
    }

    pub fn fund_name(&self) -> &str {
        &self.fund_name
    }

    pub fn effective_code(&self) -> Option<&DisclosureCode> {
        self.effective_code.as_ref()
    }

    pub fn percent_of_fund(&self) -> Option<Decimal> {
        self.percent_of_fund
    }

    pub fn report_date(&self) -> Option<NaiveDate> {
        self.report_date
    }

    pub fn source_row_index(&self) -> Option<usize> {
        self.source_row_index
    }

    pub fn detail(&self) -> &ExceptionDetail {
        &self.detail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_optional_fields() {
        let rec = ExceptionRecord::new(
            CheckId::ReportDate,
            FundId::new(5113022),
            "קרן",
            "תאריך לא תואם",
            ExceptionDetail::ReportMonth {
                expected: ReportMonth::new(2025, 11).unwrap(),
                actual: ReportMonth::new(2025, 10).unwrap(),
            },
        )
        .with_code("01".parse().unwrap())
        .with_report_date(NaiveDate::from_ymd_opt(2025, 10, 31).unwrap())
        .with_source_row(7);

        assert_eq!(rec.check_id(), CheckId::ReportDate);
        assert_eq!(rec.effective_code().unwrap().as_str(), "01");
        assert_eq!(rec.source_row_index(), Some(7));
        assert_eq!(rec.percent_of_fund(), None);
    }

    #[test]
    fn serializes_detail_with_type_tag() {
        let rec = ExceptionRecord::new(
            CheckId::PriorMonthReasonableness,
            FundId::new(100),
            "קרן",
            "סטייה",
            ExceptionDetail::Reasonableness {
                flag_kind: ReasonablenessFlag::Changed,
                previous_percent: Some(Decimal::new(200, 1)),
                current_percent: Some(Decimal::new(50, 1)),
                delta: Some(Decimal::new(-150, 1)),
            },
        )
        .with_percent(Decimal::new(50, 1));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["check_id"], "2א");
        assert_eq!(json["fund_id"], 100);
        assert_eq!(json["percent_of_fund"], "5.0");
        assert_eq!(json["detail"]["type"], "reasonableness");
        assert_eq!(json["detail"]["flag_kind"], "changed");
        assert_eq!(json["detail"]["delta"], "-15.0");
        assert!(json.get("report_date").is_none());
    }

    #[test]
    fn combination_detail_lists_codes() {
        let detail = ExceptionDetail::Combination {
            direction: ImplicationDirection::LeftToRight,
            missing_codes: vec!["080201".parse().unwrap()],
            present_codes: vec!["03010101".parse().unwrap()],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["direction"], "left_to_right");
        assert_eq!(json["missing_codes"][0], "080201");
    }
}
