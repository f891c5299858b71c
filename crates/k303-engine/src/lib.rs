//! # k303-engine: K.303 Compliance Engine
//!
//! Evaluates a normalized K.303 disclosure report against the fund registry
//! and the regulatory rule set, producing a [`RunReport`].
//!
//! ## Pipeline
//!
//! 1. **Normalize** raw lines into [`DisclosureRow`](k303_core::DisclosureRow)s
//!    (bad rows go to the rejection ledger).
//! 2. **Scope** rows against the registry for the configured trustee
//!    ([`scope`]).
//! 3. **Evaluate** every registered check in parallel ([`runner`]), each
//!    behind the [`CheckEvaluator`] trait:
//!    - 1א completeness, 1ב report month ([`checks`]),
//!    - 2א month-over-month reasonableness, 2ב exposure profile,
//!    - 3א–3ח combination rules from a data table ([`combination`]),
//!    - deferred rules reporting `not_implemented`.
//! 4. **Aggregate** statuses, exceptions and summary counts ([`aggregate`]).
//!
//! ## Crate Policy
//!
//! - Evaluators are pure functions of the [`EvaluationContext`].
//! - No `.unwrap()` outside tests; evaluator failures are values.

pub mod aggregate;
pub mod checks;
pub mod combination;
pub mod config;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod profile;
pub mod runner;
pub mod scope;

pub use aggregate::{CheckReport, Period, RejectedRow, RunReport, RunSummary};
pub use combination::{default_rules, CombinationEvaluator, CombinationRule, RightMode};
pub use config::{EngineConfig, ExtraFundPolicy, DEFAULT_REASONABLENESS_THRESHOLD, DEFAULT_TRUSTEE};
pub use context::{infer_report_month, EvaluationContext};
pub use error::{ConfigError, DecodeError, EngineError, EvaluationError};
pub use evaluator::{default_evaluators, CheckEvaluator, Evaluation};
pub use profile::{ExposureProfile, ProfileLegend};
pub use runner::{evaluate_all, evaluate_isolated, run_validation, run_validation_with, ValidationInput};
pub use scope::{resolve_scope, FundCodes, FundScope, ScopedRow};
