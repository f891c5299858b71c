//! # Check Evaluator Trait
//!
//! Every check is a [`CheckEvaluator`]: a pure function of the
//! [`EvaluationContext`] returning its exceptions in discovery order. The
//! runner owns isolation (error and panic capture) and parallelism, so
//! evaluators stay plain sequential code.

use std::fmt;

use k303_core::{CheckId, ExceptionRecord};

use crate::checks::{
    CompletenessEvaluator, DeferredEvaluator, ExposureEvaluator, ReasonablenessEvaluator,
    ReportMonthEvaluator,
};
use crate::combination::CombinationEvaluator;
use crate::config::EngineConfig;
use crate::context::EvaluationContext;
use crate::error::EvaluationError;

/// Result of a check that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The check ran; exceptions in discovery order.
    Completed(Vec<ExceptionRecord>),
    /// The check is registered but has no implementation.
    NotImplemented,
}

/// A single check.
///
/// Implementations must be `Send + Sync` because the runner evaluates all
/// checks in parallel over a shared context.
pub trait CheckEvaluator: Send + Sync + fmt::Debug {
    /// The check this evaluator produces results for.
    fn check_id(&self) -> CheckId;

    /// Evaluate the check.
    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError>;
}

/// One evaluator per registered check, in [`CheckId::all`] order.
///
/// Combination checks take their rule from `config.rules()`; a combination
/// check with no configured rule is reported as not implemented.
pub fn default_evaluators(config: &EngineConfig) -> Vec<Box<dyn CheckEvaluator>> {
    let mut rules = config.rules();
    CheckId::all()
        .iter()
        .map(|&id| -> Box<dyn CheckEvaluator> {
            match id {
                CheckId::FundCompleteness => Box::new(CompletenessEvaluator),
                CheckId::ReportDate => Box::new(ReportMonthEvaluator),
                CheckId::PriorMonthReasonableness => Box::new(ReasonablenessEvaluator),
                CheckId::ExposureProfile => Box::new(ExposureEvaluator),
                CheckId::NonInvestmentGradeBonds | CheckId::FundNameMapping => {
                    Box::new(DeferredEvaluator::new(id))
                }
                CheckId::FxExposure
                | CheckId::BondExposure
                | CheckId::GovernmentShekelBonds
                | CheckId::GovernmentLinkedBonds
                | CheckId::GovernmentFxLinkedBonds
                | CheckId::CorporateShekelBonds
                | CheckId::CorporateLinkedBonds
                | CheckId::CorporateFxLinkedBonds => {
                    match rules.iter().position(|r| r.check_id == id) {
                        Some(pos) => Box::new(CombinationEvaluator::new(rules.swap_remove(pos))),
                        None => {
                            tracing::warn!(check = %id, "no combination rule configured");
                            Box::new(DeferredEvaluator::new(id))
                        }
                    }
                }
            }
        })
        .collect()
}
