use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::positions_model::{MonetaryValue, PortfolioTotals, Position, PositionValuation};
use crate::quotes::MarketSnapshot;
use crate::utils::decimal_utils::{pct_of, safe_div};

/// Values a position at the snapshot's price and conversion rate.
///
/// Missing prices value the position at zero; a missing percent change gives a
/// zero daily P&L; a missing rate zeroes the secondary-currency valuation.
pub fn value_position(position: &Position, market: &MarketSnapshot) -> PositionValuation {
    let quote = market.quote(&position.instrument_id);
    let current_price = quote
        .and_then(|q| q.price)
        .filter(|price| !price.is_sign_negative());
    let pct_change = quote.and_then(|q| q.pct_change).unwrap_or(Decimal::ZERO);
    let is_stale = quote.map(|q| q.is_stale).unwrap_or(false);

    let current_rate = market.usable_rate();
    let to_secondary = |amount: Decimal| {
        current_rate
            .map(|rate| safe_div(amount, rate))
            .unwrap_or(Decimal::ZERO)
    };

    let valuation_primary = position.quantity * current_price.unwrap_or(Decimal::ZERO);
    let valuation = MonetaryValue::new(valuation_primary, to_secondary(valuation_primary));
    let cost = MonetaryValue::new(position.total_cost, position.total_cost_secondary);
    let unrealized_pnl = valuation - cost;

    let daily_primary = pct_change / dec!(100) * valuation_primary;
    let daily_pnl = MonetaryValue::new(daily_primary, to_secondary(daily_primary));

    // fx_result: what the original secondary-currency cost gained from the rate moving;
    // price_result: the rest of the base-currency result.
    let average_conversion_rate = position.average_conversion_rate();
    let effective_rate = current_rate.unwrap_or(average_conversion_rate);
    let fx_result = position.total_cost_secondary * (effective_rate - average_conversion_rate);
    let price_result = unrealized_pnl.primary - fx_result;

    PositionValuation {
        instrument_id: position.instrument_id.clone(),
        quantity: position.quantity,
        average_price: position.average_cost(),
        current_price,
        is_stale,
        cost,
        valuation,
        unrealized_pnl,
        unrealized_pnl_pct: pct_of(unrealized_pnl.primary, cost.primary),
        unrealized_pnl_pct_secondary: pct_of(unrealized_pnl.secondary, cost.secondary),
        realized_pnl: position.realized_pnl,
        daily_pnl,
        daily_pnl_pct: pct_change,
        average_conversion_rate,
        fx_result,
        price_result,
    }
}

/// Values every position, largest valuation first.
pub fn value_positions(positions: &[Position], market: &MarketSnapshot) -> Vec<PositionValuation> {
    let mut valued: Vec<PositionValuation> = positions
        .iter()
        .map(|position| value_position(position, market))
        .collect();
    valued.sort_by(|a, b| b.valuation.primary.cmp(&a.valuation.primary));
    valued
}

pub fn calculate_totals(valuations: &[PositionValuation]) -> PortfolioTotals {
    let invested: MonetaryValue = valuations.iter().map(|v| v.cost).sum();
    let valuation: MonetaryValue = valuations.iter().map(|v| v.valuation).sum();
    let daily_result: MonetaryValue = valuations.iter().map(|v| v.daily_pnl).sum();
    let result = valuation - invested;

    PortfolioTotals {
        invested,
        valuation,
        result,
        result_pct: pct_of(result.primary, invested.primary),
        result_pct_secondary: pct_of(result.secondary, invested.secondary),
        daily_result,
        daily_result_pct: pct_of(daily_result.primary, invested.primary),
        daily_result_pct_secondary: pct_of(daily_result.secondary, invested.secondary),
    }
}
