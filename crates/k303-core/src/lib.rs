//! # k303-core: Foundational Types for the K.303 Validator
//!
//! Defines the data model every other crate in the workspace builds on:
//! fund identifiers, the four-level disclosure code hierarchy, report
//! periods, row normalization, the check registry and exception records.
//! It depends on no other `k303-*` crate.
//!
//! ## Key Design Principles
//!
//! 1. **Newtypes for domain primitives.** [`FundId`], [`DisclosureCode`] and
//!    [`ReportMonth`] validate at construction. No bare strings for codes.
//!
//! 2. **Effective code derived once.** [`normalize_row`] resolves the
//!    deepest non-empty level into an immutable field of [`DisclosureRow`].
//!
//! 3. **Single [`CheckId`] enum.** Every published check, deferred ones
//!    included, is a variant; exhaustive `match` everywhere.
//!
//! 4. **Row errors are values.** A malformed row yields a [`RowError`] that
//!    the caller records in the rejection ledger; it never aborts a run.
//!
//! ## Crate Policy
//!
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Decimals are `rust_decimal::Decimal` and serialize as strings.

pub mod check;
pub mod code;
pub mod disclosure;
pub mod error;
pub mod exception;
pub mod fund;
pub mod period;
pub mod text;

// Re-export primary types for ergonomic imports.
pub use check::{CheckId, CheckOutcome, CheckStatus, CHECK_COUNT};
pub use code::{level_width, normalize_level_code, DisclosureCode, LevelCodes, LEVEL_COUNT};
pub use disclosure::{
    columns, normalize_report, normalize_row, DisclosureRow, NormalizedReport,
    RawDisclosureRow, RowRejection,
};
pub use error::{RegistryError, RowError, ValidationError};
pub use exception::{
    CompletenessCategory, ExceptionDetail, ExceptionRecord, ExposureFlag, ImplicationDirection,
    ReasonablenessFlag,
};
pub use fund::{FundId, FundRegistry, FundRegistryEntry};
pub use period::{parse_report_date, ReportMonth};
pub use rust_decimal::Decimal;
