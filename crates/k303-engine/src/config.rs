//! # Engine Configuration
//!
//! [`EngineConfig`] is deserialized from YAML and validated before any check
//! runs. Every field except the profile legend has a default; the legend is
//! mandatory because exposure decoding has no sensible fallback.
//!
//! ```yaml
//! trustee_name: מזרחי טפחות חברה לנאמנות בע"מ
//! reasonableness_threshold: 10
//! extra_fund_policy: strict
//! profile_legend:
//!   "3B": { max_equity_percent: 50, max_fx_percent: 30 }
//! ```

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use k303_core::text::clean_field;

use crate::combination::{default_rules, CombinationRule};
use crate::error::ConfigError;
use crate::profile::ProfileLegend;

/// Trustee whose funds are validated unless configured otherwise.
pub const DEFAULT_TRUSTEE: &str = "מזרחי טפחות חברה לנאמנות בע\"מ";

/// Default month-over-month threshold, in percentage points.
pub const DEFAULT_REASONABLENESS_THRESHOLD: i64 = 10;

/// Which report funds check 1א flags as extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraFundPolicy {
    /// Every report fund not registered to the trustee.
    #[default]
    Strict,
    /// Only report funds absent from the whole registry; funds registered
    /// to another trustee are ignored.
    UnregisteredOnly,
}

fn default_trustee() -> String {
    DEFAULT_TRUSTEE.to_string()
}

fn default_threshold() -> Decimal {
    Decimal::from(DEFAULT_REASONABLENESS_THRESHOLD)
}

/// Validated engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default = "default_trustee")]
    pub trustee_name: String,
    /// Fund manager named in the run summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager_name: Option<String>,
    /// Absolute change, in percentage points, above which 2א flags a code.
    #[serde(default = "default_threshold")]
    pub reasonableness_threshold: Decimal,
    #[serde(default)]
    pub extra_fund_policy: ExtraFundPolicy,
    pub profile_legend: ProfileLegend,
    /// Replaces the built-in combination table when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combination_rules: Option<Vec<CombinationRule>>,
}

impl EngineConfig {
    /// Defaults for everything except the legend.
    pub fn new(profile_legend: ProfileLegend) -> Self {
        Self {
            trustee_name: default_trustee(),
            manager_name: None,
            reasonableness_threshold: default_threshold(),
            extra_fund_policy: ExtraFundPolicy::default(),
            profile_legend,
            combination_rules: None,
        }
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants that the type system does not carry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if clean_field(&self.trustee_name).is_empty() {
            return Err(ConfigError::EmptyTrustee);
        }
        if self.reasonableness_threshold.is_sign_negative()
            && !self.reasonableness_threshold.is_zero()
        {
            return Err(ConfigError::NegativeThreshold(
                self.reasonableness_threshold.to_string(),
            ));
        }
        if self.profile_legend.is_empty() {
            return Err(ConfigError::EmptyProfileLegend);
        }
        if self.profile_legend.tokens().any(str::is_empty) {
            return Err(ConfigError::BlankProfileToken);
        }
        if let Some(rules) = &self.combination_rules {
            validate_rules(rules)?;
        }
        Ok(())
    }

    /// The combination table in force: configured rules or the built-in table.
    pub fn rules(&self) -> Vec<CombinationRule> {
        self.combination_rules.clone().unwrap_or_else(default_rules)
    }
}

fn validate_rules(rules: &[CombinationRule]) -> Result<(), ConfigError> {
    if rules.is_empty() {
        return Err(ConfigError::EmptyRuleTable);
    }
    let mut seen = HashSet::new();
    for rule in rules {
        let check_id = rule.check_id;
        if !check_id.is_combination() {
            return Err(ConfigError::NotACombinationCheck { check_id });
        }
        if !seen.insert(check_id) {
            return Err(ConfigError::DuplicateRule { check_id });
        }
        if rule.left.is_empty() {
            return Err(ConfigError::EmptyRuleSide {
                check_id,
                side: "left",
            });
        }
        if rule.right.is_empty() {
            return Err(ConfigError::EmptyRuleSide {
                check_id,
                side: "right",
            });
        }
    }
    Ok(())
}
