//! # Report Periods
//!
//! K.303 reports carry their date as an 8-digit DDMMYYYY number, written
//! without a leading zero for days 1–9 (`1122025` is 1 December 2025).
//! Checks compare rows at month granularity through [`ReportMonth`].

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{RowError, ValidationError};
use crate::text::{clean_field, integral_digits};

const HEBREW_MONTHS: [&str; 12] = [
    "ינואר",
    "פברואר",
    "מרץ",
    "אפריל",
    "מאי",
    "יוני",
    "יולי",
    "אוגוסט",
    "ספטמבר",
    "אוקטובר",
    "נובמבר",
    "דצמבר",
];

/// A calendar month (`YYYY-MM`) that a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReportMonth {
    year: i32,
    month: u32,
}

impl ReportMonth {
    /// Construct from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidReportMonth(format!(
                "{year:04}-{month:02}"
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// 1-based month number.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// True when `date` falls in this month.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Label used in report headers, e.g. `נובמבר 2025`.
    pub fn hebrew_label(&self) -> String {
        // month is validated to 1..=12 at construction.
        let name = HEBREW_MONTHS[(self.month - 1) as usize];
        format!("{name} {}", self.year)
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportMonth {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidReportMonth(s.to_string());
        let (year, month) = clean_field(s).split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.is_empty() || month.len() > 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for ReportMonth {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReportMonth> for String {
    fn from(month: ReportMonth) -> Self {
        month.to_string()
    }
}

/// Parse a DDMMYYYY report date.
///
/// Accepts 7- or 8-digit integral values (a spreadsheet `.0` suffix is
/// tolerated). Impossible dates such as day 32 or 29 February in a common
/// year are rejected.
pub fn parse_report_date(raw: &str) -> Result<NaiveDate, RowError> {
    let cleaned = clean_field(raw);
    let fail = |reason: &str| RowError::DateFormat {
        value: cleaned.to_string(),
        reason: reason.to_string(),
    };
    if cleaned.is_empty() {
        return Err(fail("report date is missing"));
    }
    let digits = integral_digits(cleaned).ok_or_else(|| fail("expected a DDMMYYYY number"))?;
    if !(7..=8).contains(&digits.len()) {
        return Err(fail("expected 7 or 8 digits"));
    }
    let padded = format!("{digits:0>8}");
    let day: u32 = padded[0..2].parse().map_err(|_| fail("bad day"))?;
    let month: u32 = padded[2..4].parse().map_err(|_| fail("bad month"))?;
    let year: i32 = padded[4..8].parse().map_err(|_| fail("bad year"))?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| fail("not a calendar date"))
}
