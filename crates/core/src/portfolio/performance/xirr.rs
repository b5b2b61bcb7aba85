use log::{debug, warn};
use rust_decimal::prelude::*;

use super::performance_model::{CashFlow, MetricResult};
use super::root_finding::{FallbackSolver, RateObjective, RootSearchOutcome};
use crate::settings::EngineSettings;

/// Net present value of a cash-flow series as a function of the annual rate.
///
/// Flow times are measured in years from the earliest flow.
#[derive(Debug, Clone)]
pub struct NpvObjective {
    /// (years since first flow, amount)
    terms: Vec<(Decimal, Decimal)>,
}

impl NpvObjective {
    pub fn new(cash_flows: &[CashFlow], days_per_year: Decimal) -> Self {
        let first = cash_flows.iter().map(|cf| cf.date).min();
        let terms = cash_flows
            .iter()
            .map(|cf| {
                let days = first.map(|f| (cf.date - f).num_days()).unwrap_or(0);
                let years = Decimal::from(days)
                    .checked_div(days_per_year)
                    .unwrap_or(Decimal::ZERO);
                (years, cf.amount)
            })
            .collect();
        NpvObjective { terms }
    }
}

impl RateObjective for NpvObjective {
    fn value(&self, rate: Decimal) -> Decimal {
        let factor = discount_factor(rate);
        saturating_total(self.terms.iter().map(|(years, amount)| {
            (*years, *amount, compounded(*amount, factor, *years))
        }))
    }

    fn derivative(&self, rate: Decimal) -> Decimal {
        let factor = discount_factor(rate);
        saturating_total(
            self.terms
                .iter()
                .filter(|(years, _)| !years.is_zero())
                .map(|(years, amount)| {
                    let exponent = *years + Decimal::ONE;
                    let term = years
                        .checked_mul(*amount)
                        .and_then(|weighted| compounded(weighted, factor, exponent))
                        .map(|term| -term);
                    (exponent, -*amount, term)
                }),
        )
    }
}

/// 1 / (1 + rate). `None` when the rate leaves no positive base.
fn discount_factor(rate: Decimal) -> Option<Decimal> {
    let base = Decimal::ONE.checked_add(rate)?;
    if base <= Decimal::ZERO {
        return None;
    }
    Decimal::ONE.checked_div(base)
}

/// `amount × factor^exponent`, or `None` when the magnitude does not fit.
fn compounded(amount: Decimal, factor: Option<Decimal>, exponent: Decimal) -> Option<Decimal> {
    if amount.is_zero() || exponent.is_zero() {
        return Some(amount);
    }
    let factor = factor?;
    match factor.checked_powd(exponent) {
        Some(growth) => amount.checked_mul(growth),
        // A factor at or below one can only underflow.
        None if factor <= Decimal::ONE => Some(Decimal::ZERO),
        None => None,
    }
}

/// Sums `(exponent, sign source, term)` triples. Terms too large to represent
/// dominate every finite one, so when any exist the result saturates towards
/// the sign of those with the largest exponent.
fn saturating_total(terms: impl Iterator<Item = (Decimal, Decimal, Option<Decimal>)>) -> Decimal {
    let mut finite = Decimal::ZERO;
    let mut unbounded: Option<(Decimal, Decimal)> = None;
    for (exponent, sign_source, term) in terms {
        match term {
            Some(term) => finite = finite.saturating_add(term),
            None => {
                unbounded = match unbounded {
                    Some((largest, sign)) if largest > exponent => Some((largest, sign)),
                    Some((largest, sign)) if largest == exponent => {
                        Some((largest, sign.saturating_add(sign_source)))
                    }
                    _ => Some((exponent, sign_source)),
                };
            }
        }
    }

    match unbounded {
        Some((_, sign)) if sign > Decimal::ZERO => Decimal::MAX,
        Some((_, sign)) if sign < Decimal::ZERO => Decimal::MIN,
        _ => finite,
    }
}

/// Annualized money-weighted return of `cash_flows`, in percent.
///
/// `None` when there are fewer than two flows, when all flows share a sign or
/// when neither root finder converges.
pub fn compute_xirr(cash_flows: &[CashFlow], settings: &EngineSettings) -> Option<Decimal> {
    if cash_flows.len() < 2 {
        return None;
    }
    let has_negative = cash_flows.iter().any(|cf| cf.amount < Decimal::ZERO);
    let has_positive = cash_flows.iter().any(|cf| cf.amount > Decimal::ZERO);
    if !has_negative || !has_positive {
        return None;
    }

    let mut sorted = cash_flows.to_vec();
    sorted.sort_by_key(|cf| cf.date);
    let objective = NpvObjective::new(&sorted, settings.xirr.days_per_year);

    match FallbackSolver::from_settings(&settings.xirr).solve(&objective) {
        RootSearchOutcome::Converged { rate, iterations } => {
            debug!("XIRR converged to {} after {} iterations", rate, iterations);
            Some(rate * Decimal::ONE_HUNDRED)
        }
        outcome => {
            warn!(
                "XIRR did not converge for {} cash flows: {:?}",
                sorted.len(),
                outcome
            );
            None
        }
    }
}

/// [`compute_xirr`] with an explanation for missing or suspicious values.
pub fn compute_xirr_with_diagnostics(
    cash_flows: &[CashFlow],
    settings: &EngineSettings,
) -> MetricResult {
    if cash_flows.len() < 2 {
        return MetricResult::warning("At least 2 cash flows are required");
    }
    if !cash_flows.iter().any(|cf| cf.amount < Decimal::ZERO) {
        return MetricResult::warning("No purchases recorded");
    }
    if !cash_flows.iter().any(|cf| cf.amount > Decimal::ZERO) {
        return MetricResult::warning("No positive current value");
    }

    let Some(xirr) = compute_xirr(cash_flows, settings) else {
        return MetricResult::failed("XIRR calculation did not converge");
    };

    if xirr < settings.xirr.low_warning_pct {
        MetricResult::of(xirr).with_warning("Very negative return, verify the data")
    } else if xirr > settings.xirr.high_warning_pct {
        MetricResult::of(xirr).with_warning("Very high return, possibly due to a short holding period")
    } else {
        MetricResult::of(xirr)
    }
}
