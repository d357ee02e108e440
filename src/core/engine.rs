use tracing::debug;

use super::error::EngineResult;
use super::growth::compute_future_value;
use super::range::resolve_range;
use super::rates::resolve_annual_rate;
use super::types::{
    ContributionPlan, ContributionRange, DynamicRangeConfig, InvestmentMode, ProjectionResult,
    RateTable, SchedulePoint,
};

#[derive(Debug, Clone, Copy)]
struct ResolvedContribution {
    amount: f64,
    range: Option<ContributionRange>,
    flexibility_percent: Option<f64>,
}

/// Projects a plan to maturity.
///
/// A band only applies to systematic plans; the band midpoint is then the
/// monthly contribution projected. Lumpsum plans ignore `range_config`.
pub fn project(
    plan: &ContributionPlan,
    rate_table: &RateTable,
    range_config: Option<&DynamicRangeConfig>,
) -> EngineResult<ProjectionResult> {
    let annual_rate = resolve_annual_rate(plan.horizon_months, rate_table)?;
    let contribution = resolve_contribution(plan, range_config)?;
    let value = compute_future_value(
        contribution.amount,
        annual_rate,
        plan.horizon_months,
        plan.mode,
    )?;

    debug!(
        mode = ?plan.mode,
        horizon_months = plan.horizon_months,
        annual_rate,
        contribution = contribution.amount,
        maturity_value = value.maturity_value,
        "projection complete"
    );

    Ok(ProjectionResult {
        invested: value.invested,
        gains: value.gains,
        maturity_value: value.maturity_value,
        is_dynamic: contribution.range.is_some(),
        range_used: contribution.range,
        annual_rate,
        projected_contribution: contribution.amount,
        flexibility_percent: contribution.flexibility_percent,
    })
}

/// Growth checkpoints at every completed year, plus the final month when
/// the horizon is not a whole number of years.
///
/// Every point uses the rate resolved for the full horizon, so the last
/// point always agrees with [`project`]. The result holds one point per
/// year of horizon; callers taking horizons from untrusted input bound it
/// first.
pub fn project_schedule(
    plan: &ContributionPlan,
    rate_table: &RateTable,
    range_config: Option<&DynamicRangeConfig>,
) -> EngineResult<Vec<SchedulePoint>> {
    let annual_rate = resolve_annual_rate(plan.horizon_months, rate_table)?;
    let contribution = resolve_contribution(plan, range_config)?;

    let mut checkpoints: Vec<u32> = (12..=plan.horizon_months).step_by(12).collect();
    if plan.horizon_months % 12 != 0 {
        checkpoints.push(plan.horizon_months);
    }

    checkpoints
        .into_iter()
        .map(|month| {
            compute_future_value(contribution.amount, annual_rate, month, plan.mode).map(|value| {
                SchedulePoint {
                    month,
                    invested: value.invested,
                    gains: value.gains,
                    maturity_value: value.maturity_value,
                }
            })
        })
        .collect()
}

fn resolve_contribution(
    plan: &ContributionPlan,
    range_config: Option<&DynamicRangeConfig>,
) -> EngineResult<ResolvedContribution> {
    match (plan.mode, range_config) {
        (InvestmentMode::Systematic, Some(config)) => {
            let (range, flexibility) = resolve_range(plan.base_amount, config)?;
            Ok(ResolvedContribution {
                amount: range.midpoint(),
                range: Some(range),
                flexibility_percent: Some(flexibility),
            })
        }
        _ => Ok(ResolvedContribution {
            amount: plan.base_amount,
            range: None,
            flexibility_percent: None,
        }),
    }
}
