//! Check 2ב: disclosed exposure vs. the fund's exposure profile.
//!
//! For each in-scope fund with a decodable profile token:
//!
//! - a zero-equity fund may not disclose a non-zero `01*` line;
//! - a zero-FX fund may not disclose a non-zero `06*` line;
//! - when the profile carries a limit, total `01*` / `06*` exposure above it
//!   is one exception per fund and limit.
//!
//! A fund without a token is skipped with a warning. An unknown token is one
//! data-quality exception for the fund, which is then skipped.

use std::collections::HashMap;

use rust_decimal::Decimal;

use k303_core::{
    CheckId, DisclosureCode, ExceptionDetail, ExceptionRecord, ExposureFlag, FundId,
};

use crate::context::EvaluationContext;
use crate::error::EvaluationError;
use crate::evaluator::{CheckEvaluator, Evaluation};
use crate::profile::ExposureProfile;
use crate::scope::ScopedRow;

/// Equity code family.
pub const EQUITY_CODE: &str = "01";
/// FX exposure code family.
pub const FX_CODE: &str = "06";

#[derive(Debug, Clone, Copy, Default)]
pub struct ExposureEvaluator;

impl CheckEvaluator for ExposureEvaluator {
    fn check_id(&self) -> CheckId {
        CheckId::ExposureProfile
    }

    fn evaluate(&self, ctx: &EvaluationContext<'_>) -> Result<Evaluation, EvaluationError> {
        let equity = family_code(EQUITY_CODE)?;
        let fx = family_code(FX_CODE)?;

        let mut order: Vec<FundId> = Vec::new();
        let mut by_fund: HashMap<FundId, Vec<&ScopedRow<'_>>> = HashMap::new();
        for scoped in ctx.current.in_scope_rows() {
            let rows = by_fund.entry(scoped.row.fund_id()).or_default();
            if rows.is_empty() {
                order.push(scoped.row.fund_id());
            }
            rows.push(scoped);
        }

        let mut exceptions = Vec::new();
        for fund_id in order {
            let Some(rows) = by_fund.get(&fund_id) else {
                continue;
            };
            let Some(first) = rows.first() else {
                continue;
            };
            let fund_name = first.row.fund_name();
            let token = first
                .entry
                .and_then(|e| e.exposure_profile_token.as_deref())
                .map(str::trim)
                .filter(|t| !t.is_empty());
            let Some(token) = token else {
                tracing::warn!(fund_id = %fund_id, "fund has no exposure profile; skipping");
                continue;
            };
            let profile = match ctx.config.profile_legend.decode(token) {
                Ok(profile) => profile,
                Err(err) => {
                    tracing::warn!(fund_id = %fund_id, token, "{err}");
                    exceptions.push(ExceptionRecord::new(
                        CheckId::ExposureProfile,
                        fund_id,
                        fund_name,
                        format!("פרופיל חשיפה לא מוכר: {token}"),
                        ExceptionDetail::Exposure {
                            kind: ExposureFlag::UnknownProfile,
                            token: token.to_string(),
                            limit: None,
                        },
                    ));
                    continue;
                }
            };
            check_fund(
                fund_id, fund_name, token, profile, rows, &equity, &fx, &mut exceptions,
            )?;
        }
        Ok(Evaluation::Completed(exceptions))
    }
}

fn family_code(code: &str) -> Result<DisclosureCode, EvaluationError> {
    DisclosureCode::new(code).map_err(|e| EvaluationError::MissingInput {
        check_id: CheckId::ExposureProfile,
        reason: e.to_string(),
    })
}

#[allow(clippy::too_many_arguments)]
fn check_fund(
    fund_id: FundId,
    fund_name: &str,
    token: &str,
    profile: &ExposureProfile,
    rows: &[&ScopedRow<'_>],
    equity: &DisclosureCode,
    fx: &DisclosureCode,
    out: &mut Vec<ExceptionRecord>,
) -> Result<(), EvaluationError> {
    let overflow = || EvaluationError::Overflow {
        check_id: CheckId::ExposureProfile,
        fund_id,
    };
    let mut equity_total = Decimal::ZERO;
    let mut fx_total = Decimal::ZERO;

    for scoped in rows {
        let row = scoped.row;
        let code = row.effective_code();
        let pct = row.percent_of_fund();
        let (is_equity, is_fx) = (code.has_prefix(equity), code.has_prefix(fx));
        if is_equity {
            equity_total = equity_total.checked_add(pct).ok_or_else(overflow)?;
        } else if is_fx {
            fx_total = fx_total.checked_add(pct).ok_or_else(overflow)?;
        }

        let flagged = if is_equity && profile.zero_equity_exposure && !pct.is_zero() {
            Some((
                ExposureFlag::ZeroEquity,
                format!("פרופיל {token} אינו מתיר חשיפה למניות אך דווח קוד {code} ({pct}%)"),
            ))
        } else if is_fx && profile.zero_fx_exposure && !pct.is_zero() {
            Some((
                ExposureFlag::ZeroFx,
                format!("פרופיל {token} אינו מתיר חשיפה למט\"ח אך דווח קוד {code} ({pct}%)"),
            ))
        } else {
            None
        };
        if let Some((kind, reason)) = flagged {
            tracing::debug!(fund_id = %fund_id, row = row.source_row(), ?kind, "exposure violation");
            out.push(
                ExceptionRecord::new(
                    CheckId::ExposureProfile,
                    fund_id,
                    fund_name,
                    reason,
                    ExceptionDetail::Exposure {
                        kind,
                        token: token.to_string(),
                        limit: None,
                    },
                )
                .with_code(code.clone())
                .with_percent(pct)
                .with_report_date(row.report_date())
                .with_source_row(row.source_row()),
            );
        }
    }

    if let Some(max) = profile.max_equity_percent {
        if equity_total > max {
            out.push(limit_exception(
                fund_id,
                fund_name,
                token,
                ExposureFlag::EquityLimit,
                format!("פרופיל {token} מתיר עד {max}% מניות אך סה\"כ חשיפה = {equity_total:.2}%"),
                equity,
                equity_total,
                max,
            ));
        }
    }
    if let Some(max) = profile.max_fx_percent {
        if fx_total > max {
            out.push(limit_exception(
                fund_id,
                fund_name,
                token,
                ExposureFlag::FxLimit,
                format!("פרופיל {token} מתיר עד {max}% מט\"ח אך סה\"כ חשיפה = {fx_total:.2}%"),
                fx,
                fx_total,
                max,
            ));
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn limit_exception(
    fund_id: FundId,
    fund_name: &str,
    token: &str,
    kind: ExposureFlag,
    reason: String,
    family: &DisclosureCode,
    total: Decimal,
    max: Decimal,
) -> ExceptionRecord {
    tracing::debug!(fund_id = %fund_id, %total, %max, ?kind, "exposure above profile limit");
    ExceptionRecord::new(
        CheckId::ExposureProfile,
        fund_id,
        fund_name,
        reason,
        ExceptionDetail::Exposure {
            kind,
            token: token.to_string(),
            limit: Some(max),
        },
    )
    .with_code(family.clone())
    .with_percent(total)
}
