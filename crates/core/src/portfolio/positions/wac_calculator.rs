use log::debug;
use std::collections::BTreeMap;

use super::positions_model::{Position, Trade, TradeSide};
use crate::fx::RateLookup;
use crate::settings::EngineSettings;

/// Folds a trade list into one weighted-average-cost position per instrument.
///
/// Trades are re-sorted by timestamp (stable, so same-instant trades keep
/// their input order). Closed positions are dropped; the result is ordered by
/// instrument id.
pub fn compute_positions(
    trades: &[Trade],
    rates: &dyn RateLookup,
    settings: &EngineSettings,
) -> Vec<Position> {
    let mut positions: BTreeMap<&str, Position> = BTreeMap::new();

    for trade in chronological(trades.iter()) {
        let position = positions
            .entry(trade.instrument_id.as_str())
            .or_insert_with(|| Position::new(trade.instrument_id.clone()));
        apply_trade(position, trade, rates, settings);
    }

    let open: Vec<Position> = positions
        .into_values()
        .filter(|position| position.is_open())
        .collect();
    debug!(
        "Computed {} open positions from {} trades",
        open.len(),
        trades.len()
    );
    open
}

/// Folds the trades of a single instrument. Unlike [`compute_positions`] the
/// result is returned even when the position has been closed.
pub fn compute_position(
    instrument_id: &str,
    trades: &[Trade],
    rates: &dyn RateLookup,
    settings: &EngineSettings,
) -> Position {
    let mut position = Position::new(instrument_id.to_string());
    let own = trades.iter().filter(|t| t.instrument_id == instrument_id);
    for trade in chronological(own) {
        apply_trade(&mut position, trade, rates, settings);
    }
    position
}

fn chronological<'a>(trades: impl Iterator<Item = &'a Trade>) -> Vec<&'a Trade> {
    let mut ordered: Vec<&Trade> = trades.collect();
    ordered.sort_by_key(|trade| trade.timestamp);
    ordered
}

fn apply_trade(
    position: &mut Position,
    trade: &Trade,
    rates: &dyn RateLookup,
    settings: &EngineSettings,
) {
    let quantity = trade.qty();
    if quantity.is_zero() {
        debug!("Skipping trade {} with zero quantity", trade.id);
        return;
    }

    match trade.side {
        TradeSide::Buy => {
            let rate = rates.rate_on(trade.trade_date());
            position.apply_buy(quantity, trade.price(), rate);
        }
        TradeSide::Sell => {
            position.apply_sell(quantity, trade.price());
        }
    }
    position.sweep_dust(settings.dust_threshold);
    position.touch(trade.trade_date());
}
