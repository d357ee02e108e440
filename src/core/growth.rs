use super::error::{EngineResult, ProjectionError};
use super::types::{FutureValue, InvestmentMode};

/// Compounded value of a contribution stream or a single deposit.
///
/// Lumpsum grows annually as `amount * (1 + rate)^(months / 12)`.
/// Systematic contributions are an annuity due compounded monthly at
/// `rate / 12`, with a zero rate collapsing to `amount * months`.
pub fn compute_future_value(
    amount: f64,
    annual_rate: f64,
    horizon_months: u32,
    mode: InvestmentMode,
) -> EngineResult<FutureValue> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ProjectionError::InvalidAmount { amount });
    }
    if horizon_months == 0 {
        return Err(ProjectionError::InvalidHorizon { months: 0 });
    }

    let (invested, maturity_value) = match mode {
        InvestmentMode::Lumpsum => (
            amount,
            lumpsum_maturity(amount, annual_rate, horizon_months),
        ),
        InvestmentMode::Systematic => (
            amount * horizon_months as f64,
            annuity_due_maturity(amount, annual_rate, horizon_months),
        ),
    };

    Ok(FutureValue {
        invested,
        gains: maturity_value - invested,
        maturity_value,
    })
}

fn lumpsum_maturity(amount: f64, annual_rate: f64, months: u32) -> f64 {
    amount * (1.0 + annual_rate).powf(months as f64 / 12.0)
}

fn annuity_due_maturity(amount: f64, annual_rate: f64, months: u32) -> f64 {
    let n = months as f64;
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return amount * n;
    }
    let growth = (1.0 + r).powf(n);
    amount * ((growth - 1.0) / r) * (1.0 + r)
}
