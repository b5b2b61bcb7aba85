use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::performance_model::{CashFlow, Diagnostic, DiagnosticMetric};
use crate::portfolio::lots::LotReplay;
use crate::portfolio::positions::{Trade, TradeSide};

/// Buy → −amount, sell → +amount (investor's point of view).
pub fn trade_cash_flow(trade: &Trade) -> CashFlow {
    let amount = trade.cash_amount();
    let signed = match trade.side {
        TradeSide::Buy => -amount,
        TradeSide::Sell => amount,
    };
    CashFlow::new(trade.trade_date(), signed)
}

pub fn trades_to_cash_flows(trades: &[Trade]) -> Vec<CashFlow> {
    trades.iter().map(trade_cash_flow).collect()
}

/// Cash flows of a replayed fund ledger.
///
/// A subscription pays in its amount. A redemption returns the units actually
/// redeemed at its settlement unit value; without one, the released cost basis
/// stands in and a warning is emitted. Skipped funds produce no flows, only a
/// diagnostic.
pub fn fund_cash_flows(replay: &LotReplay) -> (Vec<CashFlow>, Vec<Diagnostic>) {
    let mut flows = Vec::new();
    let mut diagnostics = Vec::new();

    for skipped in &replay.skipped {
        diagnostics.push(Diagnostic::warning(
            DiagnosticMetric::Ledger,
            format!(
                "Fund {} excluded: {}",
                skipped.entity_id, skipped.reason
            ),
        ));
    }

    for subscription in &replay.subscriptions {
        flows.push(CashFlow::new(subscription.date, -subscription.amount));
    }

    for replayed in &replay.redemptions {
        let redemption = &replayed.redemption;
        let fill = &replayed.fill;
        if fill.unconsumed_remainder > Decimal::ZERO {
            diagnostics.push(Diagnostic::warning(
                DiagnosticMetric::Ledger,
                format!(
                    "Redemption {} exceeds the units held in {} by {}",
                    redemption.id, redemption.fund_id, fill.unconsumed_remainder
                ),
            ));
        }
        if fill.units_redeemed.is_zero() {
            continue;
        }

        let proceeds = match redemption.unit_value.filter(|v| *v > Decimal::ZERO) {
            Some(unit_value) => fill.units_redeemed * unit_value,
            None => {
                diagnostics.push(Diagnostic::warning(
                    DiagnosticMetric::Ledger,
                    format!(
                        "Redemption {} has no unit value, valued at released cost",
                        redemption.id
                    ),
                ));
                fill.cost_basis_released
            }
        };
        flows.push(CashFlow::new(redemption.date, proceeds));
    }

    flows.sort_by_key(|cf| cf.date);
    (flows, diagnostics)
}

/// Appends the current valuation as a final inflow when it is positive.
pub fn with_terminal_value(
    mut flows: Vec<CashFlow>,
    valuation: Decimal,
    as_of: NaiveDate,
) -> Vec<CashFlow> {
    if valuation > Decimal::ZERO {
        flows.push(CashFlow::new(as_of, valuation));
    }
    flows
}

/// Capital put in minus capital taken out; positive means net investment.
pub fn net_invested(flows: &[CashFlow]) -> Decimal {
    flows
        .iter()
        .fold(Decimal::ZERO, |acc, cf| acc.saturating_sub(cf.amount))
}

/// The same flows seen from the portfolio: a purchase becomes a contribution.
pub fn to_portfolio_perspective(flows: &[CashFlow]) -> Vec<CashFlow> {
    flows
        .iter()
        .map(|cf| CashFlow::new(cf.date, -cf.amount))
        .collect()
}
