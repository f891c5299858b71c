//! # Exposure Profile Decoder
//!
//! Registry entries carry a two-character exposure profile token: an equity
//! grade digit followed by an FX grade letter (`3B` is up to 50% equity and
//! up to 30% FX; `0` in either position means no exposure at all). The
//! mapping from token to [`ExposureProfile`] is injected data, never
//! hard-coded in the evaluator.
//!
//! Unknown tokens fail with [`DecodeError`]; the exposure check turns that
//! into a per-fund data-quality exception.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use k303_core::text::clean_field;

use crate::error::DecodeError;

/// Decoded view of a profile token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExposureProfile {
    /// The fund may not hold equity (code `01`).
    #[serde(default)]
    pub zero_equity_exposure: bool,
    /// The fund may not hold FX exposure (code `06`).
    #[serde(default)]
    pub zero_fx_exposure: bool,
    /// Upper bound on total `01*` exposure, in percent of fund.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_equity_percent: Option<Decimal>,
    /// Upper bound on total `06*` exposure, in percent of fund.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fx_percent: Option<Decimal>,
}

/// Token → profile table.
///
/// Tokens are matched after trimming and ASCII upper-casing, so `3b` and
/// ` 3B ` both resolve to the `3B` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, ExposureProfile>", into = "BTreeMap<String, ExposureProfile>")]
pub struct ProfileLegend {
    entries: BTreeMap<String, ExposureProfile>,
}

fn normalize_token(token: &str) -> String {
    clean_field(token).to_ascii_uppercase()
}

#[cfg(any(test, feature = "test-support"))]
const EQUITY_GRADES: [(char, Option<i64>); 7] = [
    ('0', Some(0)),
    ('1', Some(10)),
    ('2', Some(30)),
    ('3', Some(50)),
    ('4', Some(120)),
    ('5', Some(200)),
    ('6', None),
];

#[cfg(any(test, feature = "test-support"))]
const FX_GRADES: [(char, Option<i64>); 7] = [
    ('0', Some(0)),
    ('A', Some(10)),
    ('B', Some(30)),
    ('C', Some(50)),
    ('D', Some(120)),
    ('E', Some(200)),
    ('F', None),
];

impl ProfileLegend {
    /// The exchange's standard 7 × 7 grade scale.
    ///
    /// Grade `0` sets the zero-exposure flag; grades 1–5 / A–E set an upper
    /// limit; grade 6 / F is unlimited. Fixture data: runs always take the
    /// legend from configuration.
    #[cfg(any(test, feature = "test-support"))]
    pub fn standard() -> Self {
        let mut entries = BTreeMap::new();
        for (eq_grade, eq_limit) in EQUITY_GRADES {
            for (fx_grade, fx_limit) in FX_GRADES {
                let profile = ExposureProfile {
                    zero_equity_exposure: eq_grade == '0',
                    zero_fx_exposure: fx_grade == '0',
                    max_equity_percent: eq_limit.filter(|l| *l > 0).map(Decimal::from),
                    max_fx_percent: fx_limit.filter(|l| *l > 0).map(Decimal::from),
                };
                entries.insert(format!("{eq_grade}{fx_grade}"), profile);
            }
        }
        Self { entries }
    }

    /// Decode a registry token.
    pub fn decode(&self, token: &str) -> Result<&ExposureProfile, DecodeError> {
        self.entries
            .get(&normalize_token(token))
            .ok_or_else(|| DecodeError {
                token: token.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens in sorted order.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl From<BTreeMap<String, ExposureProfile>> for ProfileLegend {
    fn from(raw: BTreeMap<String, ExposureProfile>) -> Self {
        let entries = raw
            .into_iter()
            .map(|(token, profile)| (normalize_token(&token), profile))
            .collect();
        Self { entries }
    }
}

impl From<ProfileLegend> for BTreeMap<String, ExposureProfile> {
    fn from(legend: ProfileLegend) -> Self {
        legend.entries
    }
}

impl FromIterator<(String, ExposureProfile)> for ProfileLegend {
    fn from_iter<I: IntoIterator<Item = (String, ExposureProfile)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<BTreeMap<_, _>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_scale_has_49_tokens() {
        let legend = ProfileLegend::standard();
        assert_eq!(legend.len(), 49);
        assert!(legend.tokens().all(|t| t.len() == 2));
    }

    #[test]
    fn zero_grades_set_flags_without_limits() {
        let legend = ProfileLegend::standard();
        let p = legend.decode("0B").unwrap();
        assert!(p.zero_equity_exposure);
        assert!(!p.zero_fx_exposure);
        assert_eq!(p.max_equity_percent, None);
        assert_eq!(p.max_fx_percent, Some(Decimal::from(30)));

        let p = legend.decode("60").unwrap();
        assert!(!p.zero_equity_exposure);
        assert!(p.zero_fx_exposure);
        assert_eq!(p.max_equity_percent, None);
    }

    #[test]
    fn decode_normalizes_case_and_whitespace() {
        let legend = ProfileLegend::standard();
        assert_eq!(legend.decode(" 3b ").unwrap(), legend.decode("3B").unwrap());
        assert_eq!(
            legend.decode("3B").unwrap().max_equity_percent,
            Some(Decimal::from(50))
        );
    }

    #[test]
    fn unknown_token_is_decode_error() {
        let legend = ProfileLegend::standard();
        let err = legend.decode("9Z").unwrap_err();
        assert_eq!(err.token, "9Z");
        assert!(legend.decode("").is_err());
    }

    #[test]
    fn deserializes_from_yaml_mapping() {
        let legend: ProfileLegend = serde_yaml::from_str(
            "0a:\n  zero_equity_exposure: true\n3B:\n  max_equity_percent: 50\n  max_fx_percent: 30.5\n",
        )
        .unwrap();
        assert_eq!(legend.len(), 2);
        assert!(legend.decode("0A").unwrap().zero_equity_exposure);
        assert_eq!(
            legend.decode("3B").unwrap().max_fx_percent,
            Some("30.5".parse().unwrap())
        );
    }

    #[test]
    fn rejects_unknown_profile_fields() {
        let res: Result<ProfileLegend, _> = serde_yaml::from_str("3B:\n  max_bond: 4\n");
        assert!(res.is_err());
    }
}
