//! Registered checks without an implementation: the non-investment-grade
//! bond flag (070201) and the fund-name ↔ code mapping. They always report
//! `not_implemented` and never produce exceptions.

use k303_core::CheckId;

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::evaluator::{CheckEvaluator, Evaluation};

#[derive(Debug, Clone, Copy)]
pub struct DeferredEvaluator {
    check_id: CheckId,
}

impl DeferredEvaluator {
    pub fn new(check_id: CheckId) -> Self {
        Self { check_id }
    }
}

impl CheckEvaluator for DeferredEvaluator {
    fn check_id(&self) -> CheckId {
        self.check_id
    }

    fn evaluate(&self, _ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError> {
        tracing::debug!(check = %self.check_id, "check not implemented");
        Ok(Evaluation::NotImplemented)
    }
}
