//! # Hierarchical Disclosure Codes
//!
//! K.303 classifies every disclosure line with up to four nested codes. A
//! level-N code is `2 × N` digits wide and extends its parent code, so
//! `03` (bonds) → `0301` → `030101` → `03010101` (shekel government bonds).
//!
//! The *effective code* of a row is its deepest non-empty level. Because
//! codes nest by string prefix, rule evaluation can ask "does this fund hold
//! anything under `03`?" with a plain prefix test.
//!
//! ## Width normalization
//!
//! Spreadsheet round-trips drop leading zeros (`03` becomes `3`,
//! `03010101` becomes `3010101`). [`normalize_level_code`] left-pads each
//! level back to its canonical width so the prefix relationship survives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RowError, ValidationError};
use crate::text::{clean_field, integral_digits};

/// Number of levels in the disclosure hierarchy.
pub const LEVEL_COUNT: usize = 4;

/// Canonical digit width of a code at the given 1-based level.
pub const fn level_width(level: usize) -> usize {
    level * 2
}

/// A disclosure code: a non-empty string of ASCII digits.
///
/// Leading zeros are significant. Ordering is lexicographic, which keeps a
/// parent code immediately before its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisclosureCode(String);

impl DisclosureCode {
    /// Validate and wrap a code. The value must be a non-empty digit string.
    pub fn new(code: impl Into<String>) -> Result<Self, ValidationError> {
        let code = code.into();
        if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ValidationError::InvalidCode(code));
        }
        Ok(Self(code))
    }

    /// The digit string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when `prefix` is a string prefix of this code (or equal to it).
    pub fn has_prefix(&self, prefix: &DisclosureCode) -> bool {
        self.0.starts_with(prefix.as_str())
    }

    /// The hierarchy level implied by the code width, if the width is a
    /// canonical one.
    pub fn implied_level(&self) -> Option<usize> {
        (1..=LEVEL_COUNT).find(|&level| level_width(level) == self.0.len())
    }
}

impl fmt::Display for DisclosureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DisclosureCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DisclosureCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DisclosureCode> for String {
    fn from(code: DisclosureCode) -> Self {
        code.0
    }
}

/// Normalize one hierarchy cell.
///
/// Returns `Ok(None)` for an empty cell. Non-empty cells must be integral
/// digit strings (a trailing `.0` is tolerated); shorter values are
/// left-padded with zeros to the level's canonical width. Codes longer than
/// the canonical width are kept verbatim.
pub fn normalize_level_code(
    level: usize,
    column: &str,
    raw: &str,
) -> Result<Option<DisclosureCode>, RowError> {
    let cleaned = clean_field(raw);
    if cleaned.is_empty() {
        return Ok(None);
    }
    let digits = integral_digits(cleaned).ok_or_else(|| RowError::Parse {
        column: column.to_string(),
        value: cleaned.to_string(),
        reason: "level code must contain digits only".into(),
    })?;
    let width = level_width(level);
    let padded = if digits.len() < width {
        format!("{digits:0>width$}")
    } else {
        digits.to_string()
    };
    // Padded digit strings are non-empty by construction.
    DisclosureCode::new(padded)
        .map(Some)
        .map_err(|e| RowError::Parse {
            column: column.to_string(),
            value: cleaned.to_string(),
            reason: e.to_string(),
        })
}

/// The four ordered hierarchy codes of one disclosure line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCodes([Option<DisclosureCode>; LEVEL_COUNT]);

impl LevelCodes {
    /// Wrap four ordered levels, level 1 first.
    pub fn new(levels: [Option<DisclosureCode>; LEVEL_COUNT]) -> Self {
        Self(levels)
    }

    /// Code at a 1-based level, if present.
    pub fn get(&self, level: usize) -> Option<&DisclosureCode> {
        level
            .checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .and_then(Option::as_ref)
    }

    /// Resolve the effective code: scan level 4 down to level 1, first
    /// non-empty level wins.
    pub fn effective(&self) -> Result<DisclosureCode, RowError> {
        self.0
            .iter()
            .rev()
            .flatten()
            .next()
            .cloned()
            .ok_or(RowError::MissingEffectiveCode)
    }

    /// True when every level is empty.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> DisclosureCode {
        DisclosureCode::new(s).unwrap()
    }

    #[test]
    fn code_rejects_non_digits_and_empty() {
        assert!(DisclosureCode::new("").is_err());
        assert!(DisclosureCode::new("03a1").is_err());
        assert!(DisclosureCode::new(" 03").is_err());
        assert!(DisclosureCode::new("0301").is_ok());
    }

    #[test]
    fn prefix_follows_hierarchy() {
        let leaf = code("03010101");
        assert!(leaf.has_prefix(&code("03")));
        assert!(leaf.has_prefix(&code("0301")));
        assert!(leaf.has_prefix(&code("03010101")));
        assert!(!leaf.has_prefix(&code("0302")));
        assert!(!code("03").has_prefix(&code("03010101")));
    }

    #[test]
    fn implied_level_from_width() {
        assert_eq!(code("06").implied_level(), Some(1));
        assert_eq!(code("080201").implied_level(), Some(3));
        assert_eq!(code("03010101").implied_level(), Some(4));
        assert_eq!(code("031").implied_level(), None);
    }

    #[test]
    fn normalize_pads_dropped_leading_zeros() {
        assert_eq!(
            normalize_level_code(1, "רמה 1", "3").unwrap(),
            Some(code("03"))
        );
        assert_eq!(
            normalize_level_code(4, "רמה 4", "3010101").unwrap(),
            Some(code("03010101"))
        );
        assert_eq!(
            normalize_level_code(2, "רמה 2", "102.0").unwrap(),
            Some(code("0102"))
        );
    }

    #[test]
    fn normalize_keeps_canonical_and_wide_codes() {
        assert_eq!(
            normalize_level_code(3, "רמה 3", "080201").unwrap(),
            Some(code("080201"))
        );
        assert_eq!(
            normalize_level_code(1, "רמה 1", "0801").unwrap(),
            Some(code("0801"))
        );
    }

    #[test]
    fn normalize_empty_cell_is_none() {
        assert_eq!(normalize_level_code(2, "רמה 2", "  \r").unwrap(), None);
    }

    #[test]
    fn normalize_rejects_text() {
        let err = normalize_level_code(2, "רמה 2", "מניות").unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[test]
    fn effective_code_is_deepest_non_empty_level() {
        let levels = LevelCodes::new([Some(code("03")), Some(code("0301")), None, None]);
        assert_eq!(levels.effective().unwrap(), code("0301"));

        let full = LevelCodes::new([
            Some(code("03")),
            Some(code("0301")),
            Some(code("030101")),
            Some(code("03010101")),
        ]);
        assert_eq!(full.effective().unwrap(), code("03010101"));
    }

    #[test]
    fn effective_code_skips_gaps() {
        // A deeper level wins even when an intermediate level is blank.
        let levels = LevelCodes::new([Some(code("08")), None, Some(code("080201")), None]);
        assert_eq!(levels.effective().unwrap(), code("080201"));
    }

    #[test]
    fn all_empty_levels_fail() {
        let levels = LevelCodes::default();
        assert!(levels.is_empty());
        assert_eq!(levels.effective(), Err(RowError::MissingEffectiveCode));
    }

    #[test]
    fn level_accessor_is_one_based() {
        let levels = LevelCodes::new([Some(code("06")), None, None, None]);
        assert_eq!(levels.get(1), Some(&code("06")));
        assert_eq!(levels.get(0), None);
        assert_eq!(levels.get(2), None);
        assert_eq!(levels.get(5), None);
    }

    #[test]
    fn serde_uses_plain_string() {
        let json = serde_json::to_string(&code("0102")).unwrap();
        assert_eq!(json, "\"0102\"");
        let back: DisclosureCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code("0102"));
        assert!(serde_json::from_str::<DisclosureCode>("\"01x\"").is_err());
    }
}
