//! # Engine Errors
//!
//! - [`ConfigError`] is fatal and raised before any check runs.
//! - [`DecodeError`] is recovered per fund: the exposure check reports it as
//!   a data-quality exception and skips that fund.
//! - [`EvaluationError`] fails one check only; the runner records it as a
//!   `failed_to_run` status and the other checks proceed.

use thiserror::Error;

use k303_core::{CheckId, FundId, RegistryError};

/// Invalid engine configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The YAML document could not be deserialized, including rule codes
    /// that are not digit strings.
    #[error("malformed configuration: {0}")]
    Malformed(String),

    /// The exposure profile legend has no entries.
    #[error("exposure profile legend is empty")]
    EmptyProfileLegend,

    /// A legend token is blank.
    #[error("exposure profile legend contains a blank token")]
    BlankProfileToken,

    /// The combination rule table has no rules.
    #[error("combination rule table is empty")]
    EmptyRuleTable,

    /// A rule has no codes on one side.
    #[error("combination rule {check_id} has no {side} codes")]
    EmptyRuleSide {
        check_id: CheckId,
        side: &'static str,
    },

    /// A rule names a check id outside the combination series.
    #[error("check {check_id} is not a combination check")]
    NotACombinationCheck { check_id: CheckId },

    /// Two rules share a check id.
    #[error("duplicate combination rule for check {check_id}")]
    DuplicateRule { check_id: CheckId },

    /// Threshold below zero.
    #[error("reasonableness threshold must be non-negative, got {0}")]
    NegativeThreshold(String),

    /// Trustee name is blank.
    #[error("trustee name is empty")]
    EmptyTrustee,
}

/// A fund's exposure profile token is not in the legend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown exposure profile token {token:?}")]
pub struct DecodeError {
    /// The token as it appears in the registry.
    pub token: String,
}

/// A check evaluator could not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    /// Required input for the check is absent.
    #[error("check {check_id} is missing input: {reason}")]
    MissingInput { check_id: CheckId, reason: String },

    /// Summing or differencing a fund's percents left the decimal range.
    #[error("check {check_id}: percent arithmetic overflowed for fund {fund_id}")]
    Overflow { check_id: CheckId, fund_id: FundId },

    /// The evaluator panicked; the payload message is captured.
    #[error("check {check_id} panicked: {message}")]
    Panicked { check_id: CheckId, message: String },
}

/// Fatal errors that abort a run before any check executes.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// No report month was supplied and none can be inferred.
    #[error("report month cannot be inferred: the current report has no valid rows")]
    NoReportMonth,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_rule() {
        let err = ConfigError::EmptyRuleSide {
            check_id: CheckId::GovernmentShekelBonds,
            side: "right",
        };
        let msg = err.to_string();
        assert!(msg.contains("3ג"));
        assert!(msg.contains("right"));
    }

    #[test]
    fn decode_error_names_token() {
        assert!(DecodeError { token: "9Z".into() }.to_string().contains("9Z"));
    }

    #[test]
    fn engine_error_wraps_registry_error() {
        let err: EngineError = RegistryError::JoinAmbiguity {
            exchange_id: 5,
            first_row: 2,
            second_row: 3,
        }
        .into();
        assert!(err.to_string().contains("join ambiguity"));
    }
}
