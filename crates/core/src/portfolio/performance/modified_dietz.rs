use chrono::NaiveDate;
use log::warn;
use rust_decimal::prelude::*;

use super::performance_model::{CashFlow, MetricResult};
use crate::constants::DAYS_PER_YEAR;
use crate::settings::EngineSettings;
use crate::utils::decimal_utils::{clamp, safe_div};

/// Modified Dietz return over `total_days` days starting at `period_start`, as
/// a decimal fraction.
///
/// `cash_flows` are external flows seen from the portfolio: a contribution is
/// positive, a withdrawal negative. Each flow is weighted by the share of the
/// period it was invested, clamped to [0, 1].
pub fn compute_twr(
    start_value: Decimal,
    end_value: Decimal,
    cash_flows: &[CashFlow],
    period_start: NaiveDate,
    total_days: i64,
) -> Option<Decimal> {
    if total_days <= 0 {
        return None;
    }
    let period = Decimal::from(total_days);

    let mut total_flow = Decimal::ZERO;
    let mut weighted_flow = Decimal::ZERO;
    for cf in cash_flows {
        let elapsed = Decimal::from((cf.date - period_start).num_days());
        let weight = clamp((period - elapsed) / period, Decimal::ZERO, Decimal::ONE);
        total_flow = total_flow.checked_add(cf.amount)?;
        weighted_flow = weighted_flow.checked_add(cf.amount.checked_mul(weight)?)?;
    }

    let denominator = start_value.checked_add(weighted_flow)?;
    if denominator <= Decimal::ZERO {
        return None;
    }
    let gain = end_value
        .checked_sub(start_value)?
        .checked_sub(total_flow)?;
    let period_return = gain.checked_div(denominator);
    if period_return.is_none() {
        warn!(
            "Modified Dietz return overflowed: gain {} over denominator {}",
            gain, denominator
        );
    }
    period_return
}

/// Scales a period return to a yearly one (decimal fraction in, decimal
/// fraction out).
///
/// Periods shorter than the linear threshold are scaled linearly to avoid
/// absurd compounding; longer ones compound. A loss of 100% or more stays -1.
pub fn annualize(total_return: Decimal, days: i64, settings: &EngineSettings) -> Decimal {
    if days <= 0 {
        return Decimal::ZERO;
    }
    if total_return <= Decimal::NEGATIVE_ONE {
        return Decimal::NEGATIVE_ONE;
    }

    let days_dec = Decimal::from(days);
    let year = Decimal::from(DAYS_PER_YEAR);
    let linear = total_return.saturating_mul(year) / days_dec;
    if days < settings.annualization.linear_threshold_days {
        return linear;
    }

    let exponent = year / days_dec;
    match Decimal::ONE
        .checked_add(total_return)
        .and_then(|base| base.checked_powd(exponent))
    {
        Some(growth) => growth - Decimal::ONE,
        None => {
            warn!(
                "Compounding {} over {} days overflowed, using linear scaling",
                total_return, days
            );
            linear
        }
    }
}

/// Links sub-period returns: Π(1 + rᵢ) − 1. `None` for no periods or when the
/// product does not fit.
pub fn chain_returns(returns: &[Decimal]) -> Option<Decimal> {
    if returns.is_empty() {
        return None;
    }
    let growth = returns.iter().try_fold(Decimal::ONE, |acc, r| {
        acc.checked_mul(Decimal::ONE.checked_add(*r)?)
    })?;
    Some(growth - Decimal::ONE)
}

/// Simple return of one sub-period; zero when there is no starting value.
pub fn period_return(start_value: Decimal, end_value: Decimal) -> Decimal {
    if start_value <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    safe_div(end_value.saturating_sub(start_value), start_value)
}

/// Year-to-date return in percent: (end − start − net flows) / start.
///
/// `net_flows` counts purchases as positive. A portfolio opened this year has
/// no start value; its return is measured on the capital put in this year.
pub fn compute_ytd(
    start_value: Decimal,
    end_value: Decimal,
    net_flows: Decimal,
    first_year_portfolio: bool,
) -> MetricResult {
    if start_value <= Decimal::ZERO {
        if first_year_portfolio && net_flows > Decimal::ZERO {
            return match end_value
                .checked_sub(net_flows)
                .and_then(|gain| as_percent(gain, net_flows))
            {
                Some(ytd) => MetricResult::of(ytd)
                    .with_warning("Computed from the first contribution of the year"),
                None => MetricResult::warning(YTD_OUT_OF_RANGE),
            };
        }
        return MetricResult::warning("No starting value to compute YTD");
    }

    match end_value
        .checked_sub(start_value)
        .and_then(|v| v.checked_sub(net_flows))
        .and_then(|gain| as_percent(gain, start_value))
    {
        Some(ytd) => MetricResult::of(ytd),
        None => MetricResult::warning(YTD_OUT_OF_RANGE),
    }
}

const YTD_OUT_OF_RANGE: &str = "YTD return is out of range, verify the data";

/// `part / base × 100`, `None` when it does not fit in a Decimal.
fn as_percent(part: Decimal, base: Decimal) -> Option<Decimal> {
    part.checked_div(base)?.checked_mul(Decimal::ONE_HUNDRED)
}
