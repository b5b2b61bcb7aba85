use rust_decimal::Decimal;

use super::fifo_engine::LotBook;
use super::lots_model::{FundSummary, FundTotals, Lot, LotValuation};
use crate::fx::RateLookup;
use crate::portfolio::positions::MonetaryValue;
use crate::quotes::{FundUnitValue, MarketSnapshot};
use crate::utils::decimal_utils::{pct_of, safe_div};

/// Values one lot at the fund's current unit value.
///
/// Daily P&L is `units × (current − previous)` and is only computed when both
/// unit values are known and positive.
pub fn value_lot(
    lot: &Lot,
    unit_value: Option<&FundUnitValue>,
    rates: &dyn RateLookup,
    current_rate: Option<Decimal>,
) -> LotValuation {
    let current = unit_value
        .and_then(|u| u.current)
        .filter(|v| *v > Decimal::ZERO);
    let previous = unit_value
        .and_then(|u| u.previous)
        .filter(|v| *v > Decimal::ZERO);

    let valuation_primary = lot.units * current.unwrap_or(Decimal::ZERO);
    let daily_pnl = match (current, previous) {
        (Some(current), Some(previous)) => lot.units * (current - previous),
        _ => Decimal::ZERO,
    };

    let cost = MonetaryValue::new(
        lot.cost_basis,
        safe_div(lot.cost_basis, rates.rate_on(lot.subscription_date)),
    );
    let valuation = MonetaryValue::new(
        valuation_primary,
        to_secondary(valuation_primary, current_rate),
    );

    LotValuation {
        lot_id: lot.id.clone(),
        fund_id: lot.fund_id.clone(),
        subscription_date: lot.subscription_date,
        units: lot.units,
        entry_unit_value: lot.entry_unit_value,
        cost,
        valuation,
        unrealized_pnl: valuation - cost,
        daily_pnl,
    }
}

/// Aggregates the given lots of one fund.
pub fn summarize_fund(
    fund_id: &str,
    lots: &[&Lot],
    market: &MarketSnapshot,
    rates: &dyn RateLookup,
) -> FundSummary {
    let unit_value = market.unit_value(fund_id);
    let current_rate = market.usable_rate();
    let valued: Vec<LotValuation> = lots
        .iter()
        .filter(|lot| lot.active)
        .map(|lot| value_lot(lot, unit_value, rates, current_rate))
        .collect();

    let units: Decimal = valued.iter().map(|l| l.units).sum();
    let weighted_entry: Decimal = valued.iter().map(|l| l.units * l.entry_unit_value).sum();
    let cost: MonetaryValue = valued.iter().map(|l| l.cost).sum();
    let valuation: MonetaryValue = valued.iter().map(|l| l.valuation).sum();
    let daily_primary: Decimal = valued.iter().map(|l| l.daily_pnl).sum();
    let unrealized_pnl = valuation - cost;

    FundSummary {
        fund_id: fund_id.to_string(),
        units,
        average_entry_unit_value: safe_div(weighted_entry, units),
        current_unit_value: unit_value.and_then(|u| u.current),
        price_date: unit_value.and_then(|u| u.price_date),
        cost,
        valuation,
        unrealized_pnl,
        unrealized_pnl_pct: pct_of(unrealized_pnl.primary, cost.primary),
        unrealized_pnl_pct_secondary: pct_of(unrealized_pnl.secondary, cost.secondary),
        daily_pnl: MonetaryValue::new(daily_primary, to_secondary(daily_primary, current_rate)),
        lots: valued,
    }
}

/// One summary per fund that still has active lots, ordered by fund id.
pub fn summarize_funds(
    book: &LotBook,
    market: &MarketSnapshot,
    rates: &dyn RateLookup,
) -> Vec<FundSummary> {
    book.fund_ids()
        .into_iter()
        .filter_map(|fund_id| {
            let active = book.active_lots(fund_id);
            if active.is_empty() {
                return None;
            }
            Some(summarize_fund(fund_id, &active, market, rates))
        })
        .collect()
}

pub fn calculate_fund_totals(funds: &[FundSummary]) -> FundTotals {
    let invested: MonetaryValue = funds.iter().map(|f| f.cost).sum();
    let valuation: MonetaryValue = funds.iter().map(|f| f.valuation).sum();
    let result = valuation - invested;

    FundTotals {
        invested,
        valuation,
        result,
        result_pct: pct_of(result.primary, invested.primary),
        result_pct_secondary: pct_of(result.secondary, invested.secondary),
        daily_result: funds.iter().map(|f| f.daily_pnl).sum(),
    }
}

fn to_secondary(amount: Decimal, rate: Option<Decimal>) -> Decimal {
    rate.map(|rate| safe_div(amount, rate))
        .unwrap_or(Decimal::ZERO)
}
