use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::positions_model::Position;
use super::positions_valuation::{calculate_totals, value_position, value_positions};
use crate::quotes::{InstrumentQuote, MarketSnapshot};

fn position(instrument: &str, quantity: Decimal, cost: Decimal, cost_secondary: Decimal) -> Position {
    let mut p = Position::new(instrument.to_string());
    p.quantity = quantity;
    p.total_cost = cost;
    p.total_cost_secondary = cost_secondary;
    p
}

fn quote(instrument: &str, price: Option<Decimal>, pct_change: Option<Decimal>) -> InstrumentQuote {
    InstrumentQuote {
        instrument_id: instrument.to_string(),
        price,
        pct_change,
        is_stale: false,
    }
}

#[test]
fn test_valuation_and_unrealized_result() {
    let market = MarketSnapshot::new(
        vec![quote("AL30", Some(dec!(120)), Some(dec!(2.5)))],
        vec![],
        Some(dec!(1200)),
    );
    let valued = value_position(&position("AL30", dec!(10), dec!(1000), dec!(1)), &market);

    assert_eq!(valued.current_price, Some(dec!(120)));
    assert_eq!(valued.average_price, dec!(100));
    assert_eq!(valued.valuation.primary, dec!(1200));
    assert_eq!(valued.valuation.secondary, dec!(1));
    assert_eq!(valued.unrealized_pnl.primary, dec!(200));
    assert_eq!(valued.unrealized_pnl.secondary, Decimal::ZERO);
    assert_eq!(valued.unrealized_pnl_pct, dec!(20));
    assert_eq!(valued.daily_pnl.primary, dec!(30));
    assert_eq!(valued.daily_pnl.secondary, dec!(0.025));
    assert_eq!(valued.daily_pnl_pct, dec!(2.5));
}

#[test]
fn test_result_split_between_rate_and_price() {
    // Bought at an average rate of 1000; the rate moved to 1200 and the price rose 10%.
    let market = MarketSnapshot::new(
        vec![quote("GD30", Some(dec!(110)), None)],
        vec![],
        Some(dec!(1200)),
    );
    let valued = value_position(&position("GD30", dec!(10), dec!(1000), dec!(1)), &market);

    assert_eq!(valued.average_conversion_rate, dec!(1000));
    assert_eq!(valued.unrealized_pnl.primary, dec!(100));
    assert_eq!(valued.fx_result, dec!(200));
    assert_eq!(valued.price_result, dec!(-100));
    assert_eq!(valued.fx_result + valued.price_result, valued.unrealized_pnl.primary);
}

#[test]
fn test_missing_price_values_at_zero() {
    let market = MarketSnapshot::new(vec![], vec![], Some(dec!(1000)));
    let valued = value_position(&position("TX26", dec!(5), dec!(500), dec!(0.5)), &market);

    assert_eq!(valued.current_price, None);
    assert_eq!(valued.valuation.primary, Decimal::ZERO);
    assert_eq!(valued.unrealized_pnl.primary, dec!(-500));
    assert_eq!(valued.daily_pnl.primary, Decimal::ZERO);
}

#[test]
fn test_missing_rate_zeroes_secondary_and_fx_split() {
    let market = MarketSnapshot::new(vec![quote("AL30", Some(dec!(120)), None)], vec![], None);
    let valued = value_position(&position("AL30", dec!(10), dec!(1000), dec!(1)), &market);

    assert_eq!(valued.valuation.secondary, Decimal::ZERO);
    assert_eq!(valued.fx_result, Decimal::ZERO);
    assert_eq!(valued.price_result, dec!(200));
}

#[test]
fn test_stale_flag_is_carried() {
    let mut q = quote("AL30", Some(dec!(1)), None);
    q.is_stale = true;
    let market = MarketSnapshot::new(vec![q], vec![], None);
    assert!(value_position(&position("AL30", dec!(1), dec!(1), dec!(0)), &market).is_stale);
}

#[test]
fn test_positions_sorted_by_valuation_descending() {
    let market = MarketSnapshot::new(
        vec![
            quote("AL30", Some(dec!(10)), None),
            quote("GD30", Some(dec!(50)), None),
        ],
        vec![],
        Some(dec!(1000)),
    );
    let positions = vec![
        position("AL30", dec!(10), dec!(90), dec!(0.09)),
        position("GD30", dec!(10), dec!(400), dec!(0.4)),
        position("TX26", dec!(10), dec!(10), dec!(0.01)),
    ];
    let valued = value_positions(&positions, &market);
    let ids: Vec<&str> = valued.iter().map(|v| v.instrument_id.as_str()).collect();
    assert_eq!(ids, vec!["GD30", "AL30", "TX26"]);
}

#[test]
fn test_totals_aggregate_every_position() {
    let market = MarketSnapshot::new(
        vec![
            quote("AL30", Some(dec!(12)), Some(dec!(1))),
            quote("GD30", Some(dec!(45)), Some(dec!(-2))),
        ],
        vec![],
        Some(dec!(1000)),
    );
    let positions = vec![
        position("AL30", dec!(100), dec!(1000), dec!(1)),
        position("GD30", dec!(20), dec!(1000), dec!(1)),
    ];
    let totals = calculate_totals(&value_positions(&positions, &market));

    assert_eq!(totals.invested.primary, dec!(2000));
    assert_eq!(totals.valuation.primary, dec!(2100));
    assert_eq!(totals.result.primary, dec!(100));
    assert_eq!(totals.result_pct, dec!(5));
    assert_eq!(totals.invested.secondary, dec!(2));
    assert_eq!(totals.valuation.secondary, dec!(2.1));
    assert_eq!(totals.result_pct_secondary, dec!(5));
    // 1% of 1200 minus 2% of 900
    assert_eq!(totals.daily_result.primary, dec!(-6));
    assert_eq!(totals.daily_result_pct, dec!(-0.3));
}

#[test]
fn test_totals_of_nothing_are_zero() {
    let totals = calculate_totals(&[]);
    assert_eq!(totals.invested.primary, Decimal::ZERO);
    assert_eq!(totals.result_pct, Decimal::ZERO);
}
