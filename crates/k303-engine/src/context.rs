//! # Evaluation Context
//!
//! Everything a check evaluator may read. Built once per run by the runner
//! and shared immutably across the evaluator pool.

use std::collections::HashMap;

use k303_core::{DisclosureRow, FundRegistry, ReportMonth};

use crate::config::EngineConfig;
use crate::scope::FundScope;

/// Read-only inputs shared by every evaluator.
#[derive(Debug, Clone)]
pub struct EvaluationContext<'a> {
    pub config: &'a EngineConfig,
    pub registry: &'a FundRegistry,
    /// Current-period rows, scoped.
    pub current: FundScope<'a>,
    /// Previous-period rows, scoped. `None` when no previous report was
    /// supplied.
    pub previous: Option<FundScope<'a>>,
    pub report_month: ReportMonth,
}

/// Modal report month across `rows`; ties go to the month encountered first.
pub fn infer_report_month(rows: &[DisclosureRow]) -> Option<ReportMonth> {
    let mut counts: HashMap<ReportMonth, usize> = HashMap::new();
    let mut order: Vec<ReportMonth> = Vec::new();
    for row in rows {
        let month = ReportMonth::of(row.report_date());
        let count = counts.entry(month).or_insert(0);
        if *count == 0 {
            order.push(month);
        }
        *count += 1;
    }
    let mut best: Option<(ReportMonth, usize)> = None;
    for month in order {
        let count = counts.get(&month).copied().unwrap_or(0);
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((month, count));
        }
    }
    best.map(|(month, _)| month)
}
