//! # Check Registry: Single Source of Truth
//!
//! Defines [`CheckId`], the closed set of checks a K.303 validation run
//! evaluates, and [`CheckStatus`], the per-check verdict.
//!
//! ## Design
//!
//! Every check the run publishes is a variant here, including the two
//! deferred rules (non-investment-grade bond flag, fund-name mapping). The
//! deferred rules are never omitted from output: they report
//! [`CheckOutcome::NotImplemented`]. Exhaustive `match` on [`CheckId`] forces
//! every consumer to handle a newly added check.
//!
//! Check ids serialize as their regulatory code (`1א`, `3ג`, ...).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Every check in a K.303 validation run, in publication order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CheckId {
    /// 1א: registry funds vs. report funds.
    FundCompleteness,
    /// 1ב: every row dated in the report month.
    ReportDate,
    /// 2א: month-over-month change per fund and code.
    PriorMonthReasonableness,
    /// 2ב: equity / FX exposure vs. the fund's exposure profile.
    ExposureProfile,
    /// 2ב: non-investment-grade bond flag (070201). Deferred.
    NonInvestmentGradeBonds,
    /// 2ב: fund name vs. disclosure code mapping. Deferred.
    FundNameMapping,
    /// 3א: FX-linked assets ↔ FX exposure (06).
    FxExposure,
    /// 3ב: bonds (03) ↔ ratings (07) and duration (08).
    BondExposure,
    /// 3ג: shekel government bonds ↔ their duration code.
    GovernmentShekelBonds,
    /// 3ד: CPI-linked government bonds ↔ their duration code.
    GovernmentLinkedBonds,
    /// 3ה: FX-linked government bonds ↔ their duration code.
    GovernmentFxLinkedBonds,
    /// 3ו: shekel corporate bonds ↔ their duration code.
    CorporateShekelBonds,
    /// 3ז: CPI-linked corporate bonds ↔ their duration code.
    CorporateLinkedBonds,
    /// 3ח: FX-linked corporate bonds ↔ their duration code.
    CorporateFxLinkedBonds,
}

/// Number of registered checks.
pub const CHECK_COUNT: usize = 14;

impl CheckId {
    /// All checks in publication order.
    pub fn all() -> &'static [CheckId] {
        &[
            Self::FundCompleteness,
            Self::ReportDate,
            Self::PriorMonthReasonableness,
            Self::ExposureProfile,
            Self::NonInvestmentGradeBonds,
            Self::FundNameMapping,
            Self::FxExposure,
            Self::BondExposure,
            Self::GovernmentShekelBonds,
            Self::GovernmentLinkedBonds,
            Self::GovernmentFxLinkedBonds,
            Self::CorporateShekelBonds,
            Self::CorporateLinkedBonds,
            Self::CorporateFxLinkedBonds,
        ]
    }

    /// The combination checks (3א–3ח), evaluated from the rule table.
    pub fn combination_checks() -> &'static [CheckId] {
        &Self::all()[6..]
    }

    /// Regulatory check code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::FundCompleteness => "1א",
            Self::ReportDate => "1ב",
            Self::PriorMonthReasonableness => "2א",
            Self::ExposureProfile => "2ב",
            Self::NonInvestmentGradeBonds => "2ב-070201",
            Self::FundNameMapping => "2ב-שם",
            Self::FxExposure => "3א",
            Self::BondExposure => "3ב",
            Self::GovernmentShekelBonds => "3ג",
            Self::GovernmentLinkedBonds => "3ד",
            Self::GovernmentFxLinkedBonds => "3ה",
            Self::CorporateShekelBonds => "3ו",
            Self::CorporateLinkedBonds => "3ז",
            Self::CorporateFxLinkedBonds => "3ח",
        }
    }

    /// Display name as it appears in the published report.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::FundCompleteness => "בדיקה #1א - שלמות קרנות",
            Self::ReportDate => "בדיקה #1ב - תקינות תאריכים",
            Self::PriorMonthReasonableness => "בדיקה #2א - סבירות מול דוח קודם",
            Self::ExposureProfile => "בדיקה #2ב - סבירות מול מאפייני הקרן",
            Self::NonInvestmentGradeBonds => "בדיקה #2ב - אג\"ח בדירוג נמוך (070201)",
            Self::FundNameMapping => "בדיקה #2ב - התאמת שם קרן לקודים",
            Self::FxExposure => "בדיקה #3א - חשיפה למט\"ח",
            Self::BondExposure => "בדיקה #3ב - חשיפה לאג\"ח",
            Self::GovernmentShekelBonds => "בדיקה #3ג - אג\"ח ממשלתי שקלי",
            Self::GovernmentLinkedBonds => "בדיקה #3ד - אג\"ח ממשלתי צמוד",
            Self::GovernmentFxLinkedBonds => "בדיקה #3ה - אג\"ח ממשלתי צמוד מט\"ח",
            Self::CorporateShekelBonds => "בדיקה #3ו - אג\"ח קונצרני שקלי",
            Self::CorporateLinkedBonds => "בדיקה #3ז - אג\"ח קונצרני צמוד",
            Self::CorporateFxLinkedBonds => "בדיקה #3ח - אג\"ח קונצרני צמוד מט\"ח",
        }
    }

    /// One-line description of what the check compares.
    pub fn description(&self) -> &'static str {
        match self {
            Self::FundCompleteness => "הצלבה בין רשימת קרנות לדוח",
            Self::ReportDate => "התאמת תאריך לחודש הדיווח",
            Self::PriorMonthReasonableness => "השוואה לחודש קודם",
            Self::ExposureProfile => "הצלבה מול פרופיל חשיפה",
            Self::NonInvestmentGradeBonds => "סימון אג\"ח שאינו בדירוג השקעה (070201)",
            Self::FundNameMapping => "הצלבת שם הקרן מול קודי החשיפה",
            Self::FxExposure => "הצלבת קודי חשיפה למט\"ח",
            Self::BondExposure => "הצלבת קודי אג\"ח/דירוגים/מח\"מ",
            Self::GovernmentShekelBonds => "הצלבת 03010101 מול 080201",
            Self::GovernmentLinkedBonds => "הצלבת 03010102 מול 080202",
            Self::GovernmentFxLinkedBonds => "הצלבת 03010103 מול 080203",
            Self::CorporateShekelBonds => "הצלבת 03010202/03010203 מול 080204",
            Self::CorporateLinkedBonds => "הצלבת 03010201 מול 080205",
            Self::CorporateFxLinkedBonds => "הצלבת 03010204 מול 080206",
        }
    }

    /// True for the registered-but-unimplemented rules.
    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::NonInvestmentGradeBonds | Self::FundNameMapping)
    }

    /// True for the rule-table checks 3א–3ח.
    pub fn is_combination(&self) -> bool {
        Self::combination_checks().contains(self)
    }
}

impl fmt::Display for CheckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CheckId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .iter()
            .copied()
            .find(|id| id.code() == wanted)
            .ok_or_else(|| ValidationError::UnknownCheckId(s.to_string()))
    }
}

impl TryFrom<String> for CheckId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CheckId> for String {
    fn from(id: CheckId) -> Self {
        id.code().to_string()
    }
}

// ---------------------------------------------------------------------------
// Check status
// ---------------------------------------------------------------------------

/// How a check's evaluation ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// Ran and produced no exceptions.
    Passed,
    /// Ran and produced at least one exception.
    Failed,
    /// Registered but not yet implemented.
    NotImplemented,
    /// The evaluator returned an error or panicked.
    FailedToRun {
        /// Error text captured from the evaluator.
        error: String,
    },
}

impl CheckOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::NotImplemented => "not_implemented",
            Self::FailedToRun { .. } => "failed_to_run",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for one check.
///
/// `passed` is true iff the check ran and produced zero exceptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckStatus {
    pub check_id: CheckId,
    #[serde(flatten)]
    pub outcome: CheckOutcome,
    /// True only for [`CheckOutcome::Passed`]. Deferred and failed-to-run
    /// checks carry zero exceptions but are never `passed`; exit codes read
    /// `outcome`, not this flag.
    pub passed: bool,
    pub exception_count: usize,
}

impl CheckStatus {
    /// Status of a check that ran to completion.
    pub fn completed(check_id: CheckId, exception_count: usize) -> Self {
        let outcome = if exception_count == 0 {
            CheckOutcome::Passed
        } else {
            CheckOutcome::Failed
        };
        Self {
            check_id,
            passed: exception_count == 0,
            outcome,
            exception_count,
        }
    }

    /// Status of a deferred check.
    pub fn not_implemented(check_id: CheckId) -> Self {
        Self {
            check_id,
            outcome: CheckOutcome::NotImplemented,
            passed: false,
            exception_count: 0,
        }
    }

    /// Status of a check whose evaluator failed.
    pub fn failed_to_run(check_id: CheckId, error: impl Into<String>) -> Self {
        Self {
            check_id,
            outcome: CheckOutcome::FailedToRun {
                error: error.into(),
            },
            passed: false,
            exception_count: 0,
        }
    }

    /// True when this status should make the run exit non-zero.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self.outcome,
            CheckOutcome::Failed | CheckOutcome::FailedToRun { .. }
        )
    }
}
