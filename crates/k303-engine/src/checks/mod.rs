//! Rule evaluators for the 1- and 2-series checks. The 3-series lives in
//! [`crate::combination`].

pub mod completeness;
pub mod deferred;
pub mod exposure;
pub mod reasonableness;
pub mod report_month;

pub use completeness::CompletenessEvaluator;
pub use deferred::DeferredEvaluator;
pub use exposure::ExposureEvaluator;
pub use reasonableness::ReasonablenessEvaluator;
pub use report_month::ReportMonthEvaluator;
