//! # Fund Scope Resolver
//!
//! Joins disclosure rows to the registry on `fund_id ↔ exchange_id` and marks
//! each row in scope iff its matched fund is held by the target trustee.
//!
//! Out-of-scope rows (unregistered funds, other trustees) stay in the
//! [`FundScope`] for counting but are never evaluated. Completeness (1א)
//! works from the two fund lists rather than the flags.

use std::collections::{BTreeSet, HashMap, HashSet};

use k303_core::{DisclosureCode, DisclosureRow, FundId, FundRegistry, FundRegistryEntry};

/// A disclosure row annotated with its registry match.
#[derive(Debug, Clone, Copy)]
pub struct ScopedRow<'a> {
    pub row: &'a DisclosureRow,
    pub entry: Option<&'a FundRegistryEntry>,
    pub in_scope: bool,
}

/// One in-scope fund and its distinct effective codes for the period.
#[derive(Debug, Clone)]
pub struct FundCodes<'a> {
    pub fund_id: FundId,
    pub fund_name: String,
    pub entry: Option<&'a FundRegistryEntry>,
    pub codes: BTreeSet<DisclosureCode>,
}

/// Scope resolution output for one period.
#[derive(Debug, Clone, Default)]
pub struct FundScope<'a> {
    rows: Vec<ScopedRow<'a>>,
    funds_in_registry: Vec<&'a FundRegistryEntry>,
    funds_in_report: Vec<FundId>,
}

/// Resolve scope for one period's rows.
pub fn resolve_scope<'a>(
    rows: &'a [DisclosureRow],
    registry: &'a FundRegistry,
    trustee: &str,
) -> FundScope<'a> {
    let funds_in_registry: Vec<&FundRegistryEntry> = registry.trustee_funds(trustee).collect();

    let mut seen = HashSet::new();
    let mut funds_in_report = Vec::new();
    let scoped: Vec<ScopedRow<'a>> = rows
        .iter()
        .map(|row| {
            if seen.insert(row.fund_id()) {
                funds_in_report.push(row.fund_id());
            }
            let entry = registry.get(row.fund_id());
            let in_scope = entry.is_some_and(|e| e.has_trustee(trustee));
            ScopedRow {
                row,
                entry,
                in_scope,
            }
        })
        .collect();

    let scope = FundScope {
        rows: scoped,
        funds_in_registry,
        funds_in_report,
    };
    tracing::debug!(
        rows = scope.rows.len(),
        in_scope_rows = scope.in_scope_row_count(),
        registry_funds = scope.funds_in_registry.len(),
        report_funds = scope.funds_in_report.len(),
        "resolved fund scope"
    );
    scope
}

impl<'a> FundScope<'a> {
    /// All rows, in report order.
    pub fn rows(&self) -> &[ScopedRow<'a>] {
        &self.rows
    }

    /// In-scope rows, in report order.
    pub fn in_scope_rows(&self) -> impl Iterator<Item = &ScopedRow<'a>> {
        self.rows.iter().filter(|r| r.in_scope)
    }

    /// Registry funds held by the trustee, in registry order.
    pub fn funds_in_registry(&self) -> &[&'a FundRegistryEntry] {
        &self.funds_in_registry
    }

    /// Distinct report funds, in order of first appearance.
    pub fn funds_in_report(&self) -> &[FundId] {
        &self.funds_in_report
    }

    pub fn in_scope_row_count(&self) -> usize {
        self.in_scope_rows().count()
    }

    pub fn out_of_scope_row_count(&self) -> usize {
        self.rows.len() - self.in_scope_row_count()
    }

    /// Distinct report funds with at least one in-scope row.
    pub fn in_scope_fund_count(&self) -> usize {
        self.in_scope_rows()
            .map(|r| r.row.fund_id())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn out_of_scope_fund_count(&self) -> usize {
        self.funds_in_report.len() - self.in_scope_fund_count()
    }

    /// In-scope funds with their distinct effective codes, in order of first
    /// appearance. The fund name is the first non-empty report name, falling
    /// back to the registry name.
    pub fn in_scope_funds(&self) -> Vec<FundCodes<'a>> {
        let mut position: HashMap<FundId, usize> = HashMap::new();
        let mut funds: Vec<FundCodes<'a>> = Vec::new();
        for scoped in self.in_scope_rows() {
            let row = scoped.row;
            let idx = *position.entry(row.fund_id()).or_insert_with(|| {
                funds.push(FundCodes {
                    fund_id: row.fund_id(),
                    fund_name: String::new(),
                    entry: scoped.entry,
                    codes: BTreeSet::new(),
                });
                funds.len() - 1
            });
            let fund = &mut funds[idx];
            if fund.fund_name.is_empty() {
                fund.fund_name = row.fund_name().to_string();
            }
            fund.codes.insert(row.effective_code().clone());
        }
        for fund in &mut funds {
            if fund.fund_name.is_empty() {
                if let Some(entry) = fund.entry {
                    fund.fund_name = entry.fund_name.clone();
                }
            }
        }
        funds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k303_core::{normalize_row, RawDisclosureRow};

    const TRUSTEE: &str = "מזרחי טפחות חברה לנאמנות בע\"מ";

    fn entry(id: u64, trustee: &str) -> FundRegistryEntry {
        FundRegistryEntry {
            exchange_id: FundId::new(id),
            fund_name: format!("קרן רשומה {id}"),
            trustee_name: trustee.into(),
            manager_name: "מנהל".into(),
            exposure_profile_token: None,
            source_row: 2,
        }
    }

    fn row(id: u64, name: &str, code: &str) -> DisclosureRow {
        normalize_row(&RawDisclosureRow {
            source_row: 2,
            fund_id: id.to_string(),
            fund_name: name.into(),
            levels: [code.into(), String::new(), String::new(), String::new()],
            percent_of_fund: "1".into(),
            report_date: "30112025".into(),
            ..Default::default()
        })
        .unwrap()
    }

    fn registry() -> FundRegistry {
        FundRegistry::new(vec![entry(1, TRUSTEE), entry(2, "אחר"), entry(3, TRUSTEE)]).unwrap()
    }

    #[test]
    fn in_scope_iff_trustee_matches() {
        let reg = registry();
        let rows = vec![row(1, "א", "01"), row(2, "ב", "01"), row(9, "ט", "01")];
        let scope = resolve_scope(&rows, &reg, TRUSTEE);
        let flags: Vec<bool> = scope.rows().iter().map(|r| r.in_scope).collect();
        assert_eq!(flags, vec![true, false, false]);
        assert!(scope.rows()[1].entry.is_some());
        assert!(scope.rows()[2].entry.is_none());
        assert_eq!(scope.in_scope_row_count(), 1);
        assert_eq!(scope.out_of_scope_row_count(), 2);
        assert_eq!(scope.in_scope_fund_count(), 1);
        assert_eq!(scope.out_of_scope_fund_count(), 2);
    }

    #[test]
    fn fund_lists_keep_their_orders() {
        let reg = registry();
        let rows = vec![row(9, "ט", "01"), row(1, "א", "01"), row(9, "ט", "06")];
        let scope = resolve_scope(&rows, &reg, TRUSTEE);
        let registry_ids: Vec<u64> = scope
            .funds_in_registry()
            .iter()
            .map(|e| e.exchange_id.get())
            .collect();
        assert_eq!(registry_ids, vec![1, 3]);
        assert_eq!(scope.funds_in_report(), &[FundId::new(9), FundId::new(1)]);
    }

    #[test]
    fn in_scope_funds_collect_distinct_codes() {
        let reg = registry();
        let rows = vec![
            row(3, "", "03"),
            row(1, "א", "01"),
            row(3, "ג", "03"),
            row(3, "ג", "06"),
        ];
        let scope = resolve_scope(&rows, &reg, TRUSTEE);
        let funds = scope.in_scope_funds();
        assert_eq!(funds.len(), 2);
        assert_eq!(funds[0].fund_id, FundId::new(3));
        assert_eq!(funds[0].fund_name, "ג");
        assert_eq!(funds[0].codes.len(), 2);
        assert_eq!(funds[1].fund_id, FundId::new(1));
    }

    #[test]
    fn fund_name_falls_back_to_registry() {
        let reg = registry();
        let rows = vec![row(1, "", "01")];
        let scope = resolve_scope(&rows, &reg, TRUSTEE);
        assert_eq!(scope.in_scope_funds()[0].fund_name, "קרן רשומה 1");
    }
}
