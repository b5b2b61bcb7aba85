use log::debug;
use rust_decimal::Decimal;

use super::cash_flows::{
    fund_cash_flows, net_invested, to_portfolio_perspective, trades_to_cash_flows,
    with_terminal_value,
};
use super::modified_dietz::{annualize, compute_twr, compute_ytd};
use super::performance_model::{
    CashFlow, DiagnosticMetric, MetricResult, PerformanceInput, PerformanceReport,
};
use super::xirr::compute_xirr_with_diagnostics;
use crate::constants::{DAYS_PER_YEAR, DECIMAL_PRECISION};
use crate::portfolio::lots::LotBook;
use crate::settings::EngineSettings;
use crate::utils::time_utils::{days_between, year_start};

const INSUFFICIENT_DATA: &str = "Insufficient data";
const TWR_OUT_OF_RANGE: &str = "Time-weighted return is out of range, verify the data";

/// Computes MWR, TWR and YTD for one portfolio.
///
/// Never fails: a metric that cannot be computed is `None` and the reason is
/// recorded in the report's diagnostics.
pub fn build_performance_report(
    input: &PerformanceInput,
    settings: &EngineSettings,
) -> PerformanceReport {
    let mut report = PerformanceReport::default();

    let mut ledger = trades_to_cash_flows(&input.trades);
    let replay = LotBook::replay(&input.fund_events, settings);
    let (fund_flows, ledger_diagnostics) = fund_cash_flows(&replay);
    ledger.extend(fund_flows);
    ledger.sort_by_key(|cf| cf.date);
    report.diagnostics.extend(ledger_diagnostics);

    if ledger.is_empty() || input.current_valuation <= Decimal::ZERO {
        for metric in [DiagnosticMetric::Mwr, DiagnosticMetric::Twr, DiagnosticMetric::Ytd] {
            report.absorb(metric, MetricResult::warning(INSUFFICIENT_DATA));
        }
        return report;
    }

    let mwr_flows = with_terminal_value(ledger.clone(), input.current_valuation, input.as_of);
    let mwr = compute_xirr_with_diagnostics(&mwr_flows, settings);
    report.money_weighted_return_pct = report.absorb(DiagnosticMetric::Mwr, mwr).map(rounded);

    let twr = time_weighted(&ledger, input, settings, &mut report);
    report.time_weighted_return_pct = report.absorb(DiagnosticMetric::Twr, twr).map(rounded);

    let ytd = year_to_date(&ledger, input);
    report.ytd_return_pct = report.absorb(DiagnosticMetric::Ytd, ytd).map(rounded);

    debug!(
        "Performance over {} days: mwr={:?} twr={:?} ytd={:?}",
        report.period_days,
        report.money_weighted_return_pct,
        report.time_weighted_return_pct,
        report.ytd_return_pct
    );
    report
}

/// Modified Dietz from the first ledger flow to the as-of date, starting from
/// an empty portfolio.
fn time_weighted(
    ledger: &[CashFlow],
    input: &PerformanceInput,
    settings: &EngineSettings,
    report: &mut PerformanceReport,
) -> MetricResult {
    let Some(first) = ledger.first() else {
        return MetricResult::warning(INSUFFICIENT_DATA);
    };
    let days = days_between(first.date, input.as_of);
    report.period_days = days;
    if days < 1 {
        return MetricResult::warning("Period too short to compute TWR");
    }

    let external = to_portfolio_perspective(ledger);
    let Some(period_return) = compute_twr(
        Decimal::ZERO,
        input.current_valuation,
        &external,
        first.date,
        days,
    ) else {
        return MetricResult::warning("Modified Dietz return could not be computed");
    };

    if days < DAYS_PER_YEAR && !settings.annualization.annualize_short_periods {
        return match period_return.checked_mul(Decimal::ONE_HUNDRED) {
            Some(pct) => MetricResult::of(pct)
                .with_warning(format!("Return over {} days (not annualized)", days)),
            None => MetricResult::warning(TWR_OUT_OF_RANGE),
        };
    }

    match annualize(period_return, days, settings).checked_mul(Decimal::ONE_HUNDRED) {
        Some(pct) => {
            report.twr_annualized = true;
            MetricResult::of(pct)
        }
        None => MetricResult::warning(TWR_OUT_OF_RANGE),
    }
}

/// Return since January 1st of the as-of year.
fn year_to_date(ledger: &[CashFlow], input: &PerformanceInput) -> MetricResult {
    let start = year_start(input.as_of);
    let (before, this_year): (Vec<CashFlow>, Vec<CashFlow>) =
        ledger.iter().partition(|cf| cf.date < start);
    let net_flows = net_invested(&this_year);

    if before.is_empty() {
        if net_flows <= Decimal::ZERO {
            return MetricResult::warning("No investment this year");
        }
        return compute_ytd(Decimal::ZERO, input.current_valuation, net_flows, true);
    }

    let estimated_start = input
        .current_invested
        .checked_sub(net_flows)
        .unwrap_or(Decimal::ZERO);
    if estimated_start <= Decimal::ZERO {
        return MetricResult::warning("Cannot estimate the value at the start of the year");
    }
    compute_ytd(estimated_start, input.current_valuation, net_flows, false)
}

fn rounded(value: Decimal) -> Decimal {
    value.round_dp(DECIMAL_PRECISION)
}
