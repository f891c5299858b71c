//! # Combination Implication Engine (3א–3ח)
//!
//! Each rule links a set of left-side codes to a set of right-side codes,
//! in both directions:
//!
//! ```text
//! left → right:  any left code present  ⇒  right side satisfied
//! right → left:  any right code present ⇒  some left code present
//! ```
//!
//! A rule code `C` is *present* for a fund when any of the fund's distinct
//! current-period effective codes starts with `C`. Presence is tested against
//! effective codes only, so a fund disclosing `03` does not hold `03010101`.
//!
//! ## Design
//!
//! The rule table is data ([`CombinationRule`]); [`default_rules`] is the
//! built-in table and configuration may replace it. One
//! [`CombinationEvaluator`] runs per rule.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use k303_core::{
    CheckId, DisclosureCode, ExceptionDetail, ExceptionRecord, FundId, ImplicationDirection,
};

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::evaluator::{CheckEvaluator, Evaluation};

/// How the right side of a rule is satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightMode {
    /// At least one right code must be present.
    #[default]
    AnyOf,
    /// Every right code must be present; each missing one is its own
    /// exception.
    AllOf,
}

/// One bidirectional code-presence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CombinationRule {
    pub check_id: CheckId,
    /// Left-side codes; presence of any one triggers left → right.
    pub left: Vec<DisclosureCode>,
    pub right: Vec<DisclosureCode>,
    #[serde(default)]
    pub right_mode: RightMode,
    /// Hebrew label for the left side, used in reason texts.
    pub left_label: String,
    /// Hebrew label for the right side, used in reason texts.
    pub right_label: String,
}

fn codes(list: &[&str]) -> Vec<DisclosureCode> {
    list.iter()
        .filter_map(|c| DisclosureCode::new(*c).ok())
        .collect()
}

fn rule(
    check_id: CheckId,
    left: &[&str],
    right: &[&str],
    right_mode: RightMode,
    left_label: &str,
    right_label: &str,
) -> CombinationRule {
    CombinationRule {
        check_id,
        left: codes(left),
        right: codes(right),
        right_mode,
        left_label: left_label.into(),
        right_label: right_label.into(),
    }
}

/// The built-in K.303 rule table.
pub fn default_rules() -> Vec<CombinationRule> {
    use RightMode::{AllOf, AnyOf};
    vec![
        rule(
            CheckId::FxExposure,
            &["0102", "0302", "0502"],
            &["06"],
            AnyOf,
            "חשיפה למט\"ח",
            "קוד חשיפה למט\"ח",
        ),
        rule(
            CheckId::BondExposure,
            &["03"],
            &["07", "08"],
            AllOf,
            "אג\"ח",
            "דירוגים/מח\"מ",
        ),
        rule(
            CheckId::GovernmentShekelBonds,
            &["03010101"],
            &["080201"],
            AnyOf,
            "אג\"ח ממשלתי שקלי",
            "מח\"מ ממשלתי שקלי",
        ),
        rule(
            CheckId::GovernmentLinkedBonds,
            &["03010102"],
            &["080202"],
            AnyOf,
            "אג\"ח ממשלתי צמוד",
            "מח\"מ ממשלתי צמוד",
        ),
        rule(
            CheckId::GovernmentFxLinkedBonds,
            &["03010103"],
            &["080203"],
            AnyOf,
            "אג\"ח ממשלתי צמוד מט\"ח",
            "מח\"מ ממשלתי צמוד מט\"ח",
        ),
        rule(
            CheckId::CorporateShekelBonds,
            &["03010202", "03010203"],
            &["080204"],
            AnyOf,
            "אג\"ח קונצרני שקלי",
            "מח\"מ קונצרני שקלי",
        ),
        rule(
            CheckId::CorporateLinkedBonds,
            &["03010201"],
            &["080205"],
            AnyOf,
            "אג\"ח קונצרני צמוד",
            "מח\"מ קונצרני צמוד",
        ),
        rule(
            CheckId::CorporateFxLinkedBonds,
            &["03010204"],
            &["080206"],
            AnyOf,
            "אג\"ח קונצרני צמוד מט\"ח",
            "מח\"מ קונצרני צמוד מט\"ח",
        ),
    ]
}

fn join_codes(codes: &[DisclosureCode]) -> String {
    codes
        .iter()
        .map(DisclosureCode::as_str)
        .collect::<Vec<_>>()
        .join("/")
}

/// True when any fund code starts with `rule_code`.
pub fn is_present(fund_codes: &BTreeSet<DisclosureCode>, rule_code: &DisclosureCode) -> bool {
    fund_codes.iter().any(|c| c.has_prefix(rule_code))
}

impl CombinationRule {
    /// Evaluate this rule for one fund's distinct effective codes.
    ///
    /// Returns exceptions in a fixed order: left → right findings first (in
    /// right-code order for all-of rules), then the right → left finding.
    pub fn evaluate_fund(
        &self,
        fund_id: FundId,
        fund_name: &str,
        fund_codes: &BTreeSet<DisclosureCode>,
    ) -> Vec<ExceptionRecord> {
        let present_left: Vec<DisclosureCode> = self
            .left
            .iter()
            .filter(|c| is_present(fund_codes, c))
            .cloned()
            .collect();
        let present_right: Vec<DisclosureCode> = self
            .right
            .iter()
            .filter(|c| is_present(fund_codes, c))
            .cloned()
            .collect();

        let mut out = Vec::new();

        if !present_left.is_empty() {
            match self.right_mode {
                RightMode::AllOf => {
                    for missing in self.right.iter().filter(|c| !present_right.contains(c)) {
                        let reason = format!(
                            "יש {} ({}) אך חסר קוד {}",
                            self.left_label,
                            join_codes(&present_left),
                            missing
                        );
                        out.push(self.exception(
                            fund_id,
                            fund_name,
                            reason,
                            ImplicationDirection::LeftToRight,
                            vec![missing.clone()],
                            present_left.clone(),
                        ));
                    }
                }
                RightMode::AnyOf => {
                    if present_right.is_empty() {
                        let reason = format!(
                            "יש {} ({}) אך חסר {} ({})",
                            self.left_label,
                            join_codes(&present_left),
                            self.right_label,
                            join_codes(&self.right)
                        );
                        out.push(self.exception(
                            fund_id,
                            fund_name,
                            reason,
                            ImplicationDirection::LeftToRight,
                            self.right.clone(),
                            present_left.clone(),
                        ));
                    }
                }
            }
        }

        if !present_right.is_empty() && present_left.is_empty() {
            let reason = format!(
                "יש {} ({}) אך חסר {} ({})",
                self.right_label,
                join_codes(&present_right),
                self.left_label,
                join_codes(&self.left)
            );
            out.push(self.exception(
                fund_id,
                fund_name,
                reason,
                ImplicationDirection::RightToLeft,
                self.left.clone(),
                present_right,
            ));
        }

        out
    }

    fn exception(
        &self,
        fund_id: FundId,
        fund_name: &str,
        reason: String,
        direction: ImplicationDirection,
        missing_codes: Vec<DisclosureCode>,
        present_codes: Vec<DisclosureCode>,
    ) -> ExceptionRecord {
        ExceptionRecord::new(
            self.check_id,
            fund_id,
            fund_name,
            reason,
            ExceptionDetail::Combination {
                direction,
                missing_codes,
                present_codes,
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// Runs one [`CombinationRule`] across every in-scope fund.
#[derive(Debug, Clone)]
pub struct CombinationEvaluator {
    rule: CombinationRule,
}

impl CombinationEvaluator {
    pub fn new(rule: CombinationRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> &CombinationRule {
        &self.rule
    }
}

impl CheckEvaluator for CombinationEvaluator {
    fn check_id(&self) -> CheckId {
        self.rule.check_id
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError> {
        let mut exceptions = Vec::new();
        for fund in ctx.current.in_scope_funds() {
            let found = self
                .rule
                .evaluate_fund(fund.fund_id, &fund.fund_name, &fund.codes);
            if !found.is_empty() {
                tracing::debug!(
                    fund_id = %fund.fund_id,
                    count = found.len(),
                    "combination rule violated"
                );
            }
            exceptions.extend(found);
        }
        Ok(Evaluation::Completed(exceptions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fund(codes: &[&str]) -> BTreeSet<DisclosureCode> {
        codes.iter().map(|c| c.parse().unwrap()).collect()
    }

    fn rule_for(id: CheckId) -> CombinationRule {
        default_rules()
            .into_iter()
            .find(|r| r.check_id == id)
            .unwrap()
    }

    fn eval(id: CheckId, codes: &[&str]) -> Vec<ExceptionRecord> {
        rule_for(id).evaluate_fund(FundId::new(100), "קרן", &fund(codes))
    }

    #[test]
    fn default_table_covers_every_combination_check() {
        let ids: Vec<CheckId> = default_rules().iter().map(|r| r.check_id).collect();
        assert_eq!(ids, CheckId::combination_checks());
        for r in default_rules() {
            assert!(!r.left.is_empty() && !r.right.is_empty());
        }
    }

    #[test]
    fn vacuous_when_both_sides_absent() {
        for id in CheckId::combination_checks() {
            assert!(eval(*id, &["0101", "0401"]).is_empty());
        }
    }

    #[test]
    fn shekel_gov_bond_without_duration() {
        let found = eval(CheckId::GovernmentShekelBonds, &["03010101"]);
        assert_eq!(found.len(), 1);
        match found[0].detail() {
            ExceptionDetail::Combination {
                direction,
                missing_codes,
                ..
            } => {
                assert_eq!(*direction, ImplicationDirection::LeftToRight);
                assert_eq!(missing_codes[0].as_str(), "080201");
            }
            other => panic!("unexpected detail {other:?}"),
        }
        assert!(found[0].reason_text().contains("080201"));
    }

    #[test]
    fn broad_bond_code_is_not_a_specific_bond() {
        // 03 alone does not make 03010101 present; the duration code then
        // stands without its bond.
        let found = eval(CheckId::GovernmentShekelBonds, &["03", "080201"]);
        assert_eq!(found.len(), 1);
        assert!(matches!(
            found[0].detail(),
            ExceptionDetail::Combination {
                direction: ImplicationDirection::RightToLeft,
                ..
            }
        ));
        assert!(eval(CheckId::GovernmentShekelBonds, &["03"]).is_empty());
    }

    #[test]
    fn satisfied_pair_is_clean() {
        assert!(eval(CheckId::GovernmentShekelBonds, &["03010101", "080201"]).is_empty());
        assert!(eval(CheckId::CorporateShekelBonds, &["03010203", "080204"]).is_empty());
    }

    #[test]
    fn all_of_reports_each_missing_code() {
        let found = eval(CheckId::BondExposure, &["03010101"]);
        assert_eq!(found.len(), 2);
        let missing: Vec<&str> = found
            .iter()
            .map(|e| match e.detail() {
                ExceptionDetail::Combination { missing_codes, .. } => missing_codes[0].as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(missing, vec!["07", "08"]);

        assert_eq!(eval(CheckId::BondExposure, &["03", "0701"]).len(), 1);
        assert!(eval(CheckId::BondExposure, &["03", "0701", "080201"]).is_empty());
    }

    #[test]
    fn right_without_left_is_one_exception() {
        let found = eval(CheckId::BondExposure, &["0701", "0801"]);
        assert_eq!(found.len(), 1);
        let found = eval(CheckId::FxExposure, &["0601"]);
        assert_eq!(found.len(), 1);
        assert!(found[0].reason_text().contains("0102/0302/0502"));
    }

    #[test]
    fn fx_any_of_left() {
        assert!(eval(CheckId::FxExposure, &["050201", "06"]).is_empty());
        let found = eval(CheckId::FxExposure, &["01020101"]);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn rule_deserializes_from_yaml() {
        let r: CombinationRule = serde_yaml::from_str(
            "check_id: 3ג\nleft: ['03010101']\nright: ['080201']\nleft_label: a\nright_label: b\n",
        )
        .unwrap();
        assert_eq!(r.check_id, CheckId::GovernmentShekelBonds);
        assert_eq!(r.right_mode, RightMode::AnyOf);
    }
}
