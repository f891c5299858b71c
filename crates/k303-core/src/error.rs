//! # Error Types: Structured Error Hierarchy
//!
//! Defines the error types shared by every crate in the validator. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Row-level errors ([`RowError`]) are recoverable: the offending row is
//!   excluded from evaluation, logged, and counted in the rejection ledger.
//!   One malformed row never aborts a run.
//! - Registry-level errors ([`RegistryError`]) are fatal: join correctness is
//!   foundational, so a duplicate exchange id aborts the run before any check
//!   executes.
//! - Every variant carries the raw value and the column or row it came from.

use serde::Serialize;
use thiserror::Error;

/// A failure to derive a [`DisclosureRow`](crate::DisclosureRow) from one raw
/// report line.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    /// A field is present but malformed (non-numeric fund id, non-digit level
    /// code, malformed record counter).
    #[error("malformed value {value:?} in column {column}: {reason}")]
    Parse {
        /// Column header the value was read from.
        column: String,
        /// The raw cell text, after trimming.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// All four hierarchy levels are empty.
    #[error("row has no disclosure code at any of the four hierarchy levels")]
    MissingEffectiveCode,

    /// The report date is missing, not a DDMMYYYY number, or not a real
    /// calendar date.
    #[error("invalid report date {value:?}: {reason}")]
    DateFormat {
        /// The raw cell text.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The percent-of-fund value is missing or not a decimal number.
    #[error("invalid numeric value {value:?} in column {column}")]
    NumericFormat {
        /// Column header the value was read from.
        column: String,
        /// The raw cell text.
        value: String,
    },
}

impl RowError {
    /// Short machine-readable kind, used in logs and the rejection ledger.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "parse",
            Self::MissingEffectiveCode => "missing_effective_code",
            Self::DateFormat { .. } => "date_format",
            Self::NumericFormat { .. } => "numeric_format",
        }
    }
}

/// Integrity failures in the reference fund registry. Always fatal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two registry entries share the same exchange id, so the join from
    /// disclosure rows would be ambiguous.
    #[error("join ambiguity: exchange id {exchange_id} appears in registry rows {first_row} and {second_row}")]
    JoinAmbiguity {
        /// The duplicated exchange id.
        exchange_id: u64,
        /// Source row of the first occurrence.
        first_row: usize,
        /// Source row of the duplicate.
        second_row: usize,
    },
}

/// Error constructing a validated domain primitive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Fund identifier is empty or not an integer.
    #[error("invalid fund id {0:?}: expected an integer exchange number")]
    InvalidFundId(String),

    /// Disclosure code contains non-digit characters or is empty.
    #[error("invalid disclosure code {0:?}: expected a non-empty digit string")]
    InvalidCode(String),

    /// Report month is not a `YYYY-MM` string or names a month outside 1..=12.
    #[error("invalid report month {0:?}: expected YYYY-MM")]
    InvalidReportMonth(String),

    /// Check identifier is not one of the registered checks.
    #[error("unknown check id {0:?}")]
    UnknownCheckId(String),
}
