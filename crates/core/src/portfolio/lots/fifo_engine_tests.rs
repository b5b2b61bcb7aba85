use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::fifo_engine::{apply_redemption, new_lot_from_subscription, LotBook};
use super::lots_model::{FundEvent, Lot, Redemption, Subscription};
use crate::errors::{CalculatorError, Error};
use crate::settings::EngineSettings;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn subscription(id: &str, fund: &str, on: NaiveDate, unit_value: Decimal, amount: Decimal) -> Subscription {
    Subscription {
        id: id.to_string(),
        fund_id: fund.to_string(),
        date: on,
        entry_unit_value: unit_value,
        amount,
    }
}

fn redemption(id: &str, fund: &str, on: NaiveDate, units: Decimal) -> Redemption {
    Redemption {
        id: id.to_string(),
        fund_id: fund.to_string(),
        date: on,
        units,
        unit_value: None,
    }
}

fn lot(id: &str, fund: &str, on: NaiveDate, units: Decimal) -> Lot {
    new_lot_from_subscription(&subscription(id, fund, on, dec!(1), units)).unwrap()
}

#[test]
fn test_subscription_opens_lot_at_entry_value() {
    let lot = new_lot_from_subscription(&subscription(
        "s1",
        "FIMA",
        date(2024, 1, 1),
        dec!(1000),
        dec!(100000),
    ))
    .unwrap();
    assert_eq!(lot.units, dec!(100));
    assert_eq!(lot.cost_basis, dec!(100000));
    assert_eq!(lot.id, "s1");
    assert!(lot.active);
}

#[test]
fn test_invalid_subscriptions_are_rejected() {
    for (unit_value, amount) in [
        (Decimal::ZERO, dec!(100)),
        (dec!(-1), dec!(100)),
        (dec!(10), Decimal::ZERO),
        (dec!(10), dec!(-5)),
    ] {
        let result =
            new_lot_from_subscription(&subscription("s1", "FIMA", date(2024, 1, 1), unit_value, amount));
        assert!(matches!(
            result,
            Err(Error::Calculation(CalculatorError::InvalidSubscription { .. }))
        ));
    }
}

#[test]
fn test_redemption_consumes_oldest_lot_first() {
    let lots = vec![
        lot("a", "FIMA", date(2024, 1, 1), dec!(100)),
        lot("b", "FIMA", date(2024, 2, 1), dec!(50)),
    ];
    let outcome = apply_redemption(&lots, "FIMA", dec!(120), &EngineSettings::default());

    assert_eq!(outcome.units_redeemed, dec!(120));
    assert_eq!(outcome.unconsumed_remainder, Decimal::ZERO);
    assert_eq!(outcome.cost_basis_released, dec!(120));
    assert!(!outcome.lots[0].active);
    assert_eq!(outcome.lots[0].units, Decimal::ZERO);
    assert!(outcome.lots[1].active);
    assert_eq!(outcome.lots[1].units, dec!(30));
    assert_eq!(outcome.lots[1].cost_basis, dec!(30));

    assert_eq!(outcome.consumed.len(), 2);
    assert_eq!(outcome.consumed[0].lot_id, "a");
    assert!(outcome.consumed[0].deactivated);
    assert_eq!(outcome.consumed[1].units_consumed, dec!(20));
    assert!(!outcome.consumed[1].deactivated);
}

#[test]
fn test_order_follows_date_not_slice_position() {
    let lots = vec![
        lot("late", "FIMA", date(2024, 3, 1), dec!(10)),
        lot("early", "FIMA", date(2024, 1, 1), dec!(10)),
    ];
    let outcome = apply_redemption(&lots, "FIMA", dec!(5), &EngineSettings::default());
    assert_eq!(outcome.consumed[0].lot_id, "early");
    assert_eq!(outcome.lots[0].units, dec!(10));
    assert_eq!(outcome.lots[1].units, dec!(5));
}

#[test]
fn test_same_day_lots_keep_insertion_order() {
    let lots = vec![
        lot("first", "FIMA", date(2024, 1, 1), dec!(10)),
        lot("second", "FIMA", date(2024, 1, 1), dec!(10)),
    ];
    let outcome = apply_redemption(&lots, "FIMA", dec!(12), &EngineSettings::default());
    assert_eq!(outcome.lots[0].units, Decimal::ZERO);
    assert_eq!(outcome.lots[1].units, dec!(8));
}

#[test]
fn test_input_lots_are_not_modified() {
    let lots = vec![lot("a", "FIMA", date(2024, 1, 1), dec!(10))];
    let before = lots.clone();
    let _ = apply_redemption(&lots, "FIMA", dec!(4), &EngineSettings::default());
    assert_eq!(lots, before);
}

#[test]
fn test_other_funds_are_untouched() {
    let lots = vec![
        lot("a", "FIMA", date(2024, 1, 1), dec!(10)),
        lot("b", "BALANZ", date(2023, 1, 1), dec!(10)),
    ];
    let outcome = apply_redemption(&lots, "FIMA", dec!(4), &EngineSettings::default());
    assert_eq!(outcome.lots[1], lots[1]);
    assert_eq!(outcome.lots[0].units, dec!(6));
}

#[test]
fn test_over_redemption_reports_remainder() {
    let lots = vec![lot("a", "FIMA", date(2024, 1, 1), dec!(10))];
    let outcome = apply_redemption(&lots, "FIMA", dec!(15), &EngineSettings::default());
    assert_eq!(outcome.units_redeemed, dec!(10));
    assert_eq!(outcome.unconsumed_remainder, dec!(5));
    assert!(!outcome.lots[0].active);
}

#[test]
fn test_redeeming_unknown_fund_leaves_everything_unconsumed() {
    let lots = vec![lot("a", "FIMA", date(2024, 1, 1), dec!(10))];
    let outcome = apply_redemption(&lots, "OTHER", dec!(3), &EngineSettings::default());
    assert!(outcome.consumed.is_empty());
    assert_eq!(outcome.unconsumed_remainder, dec!(3));
}

#[test]
fn test_non_positive_request_is_a_no_op() {
    let lots = vec![lot("a", "FIMA", date(2024, 1, 1), dec!(10))];
    for units in [Decimal::ZERO, dec!(-2)] {
        let outcome = apply_redemption(&lots, "FIMA", units, &EngineSettings::default());
        assert_eq!(outcome.lots, lots);
        assert_eq!(outcome.units_redeemed, Decimal::ZERO);
        assert_eq!(outcome.unconsumed_remainder, Decimal::ZERO);
    }
}

#[test]
fn test_dust_remainder_deactivates_lot() {
    let lots = vec![lot("a", "FIMA", date(2024, 1, 1), dec!(1))];
    let outcome = apply_redemption(&lots, "FIMA", dec!(0.99995), &EngineSettings::default());

    assert_eq!(outcome.units_redeemed, dec!(0.99995));
    assert_eq!(outcome.dust_swept, dec!(0.00005));
    assert_eq!(outcome.lots[0].units, Decimal::ZERO);
    assert_eq!(outcome.lots[0].cost_basis, Decimal::ZERO);
    assert!(!outcome.lots[0].active);
}

#[test]
fn test_inactive_lots_are_skipped() {
    let mut spent = lot("a", "FIMA", date(2024, 1, 1), dec!(10));
    spent.active = false;
    let lots = vec![spent, lot("b", "FIMA", date(2024, 2, 1), dec!(10))];
    let outcome = apply_redemption(&lots, "FIMA", dec!(4), &EngineSettings::default());
    assert_eq!(outcome.consumed.len(), 1);
    assert_eq!(outcome.consumed[0].lot_id, "b");
}

#[test]
fn test_book_orders_late_inserted_older_lot_first() {
    let mut book = LotBook::new(&EngineSettings::default());
    book.subscribe(&subscription("feb", "FIMA", date(2024, 2, 1), dec!(1), dec!(50)))
        .unwrap();
    book.subscribe(&subscription("jan", "FIMA", date(2024, 1, 1), dec!(1), dec!(100)))
        .unwrap();

    let ids: Vec<&str> = book.active_lots("FIMA").iter().map(|l| l.id.as_str()).collect();
    assert_eq!(ids, vec!["jan", "feb"]);

    let fill = book.redeem("FIMA", dec!(120));
    assert_eq!(fill.units_redeemed, dec!(120));
    assert_eq!(book.fund_quantity("FIMA"), dec!(30));
    let remaining: Vec<&str> = book.active_lots("FIMA").iter().map(|l| l.id.as_str()).collect();
    assert_eq!(remaining, vec!["feb"]);
    // The arena keeps insertion order, spent lots included.
    assert_eq!(book.lots()[1].id, "jan");
    assert!(!book.lots()[1].active);
}

#[test]
fn test_book_rejects_invalid_subscription_without_side_effects() {
    let mut book = LotBook::new(&EngineSettings::default());
    let result = book.subscribe(&subscription("s1", "FIMA", date(2024, 1, 1), Decimal::ZERO, dec!(10)));
    assert!(result.is_err());
    assert!(book.lots().is_empty());
    assert!(book.fund_ids().is_empty());
}

#[test]
fn test_replay_skips_only_the_failing_fund() {
    let events = vec![
        FundEvent::Subscription(subscription("s1", "FIMA", date(2024, 1, 1), dec!(10), dec!(1000))),
        FundEvent::Subscription(subscription("s2", "BROKEN", date(2024, 1, 2), dec!(10), dec!(1000))),
        FundEvent::Subscription(subscription("s3", "BROKEN", date(2024, 1, 3), Decimal::ZERO, dec!(1000))),
        FundEvent::Redemption(redemption("r1", "FIMA", date(2024, 2, 1), dec!(40))),
    ];
    let replay = LotBook::replay(&events, &EngineSettings::default());

    assert_eq!(replay.skipped.len(), 1);
    assert_eq!(replay.skipped[0].entity_id, "BROKEN");
    assert_eq!(replay.skipped[0].event_id, "s3");
    assert!(replay.book.active_lots("BROKEN").is_empty());
    assert_eq!(replay.book.fund_ids(), vec!["FIMA"]);
    assert_eq!(replay.book.fund_quantity("FIMA"), dec!(60));
    assert_eq!(replay.subscriptions.len(), 1);
    assert_eq!(replay.redemptions.len(), 1);
    assert_eq!(replay.redemptions[0].fill.units_redeemed, dec!(40));
}

#[test]
fn test_replay_sorts_by_date_and_keeps_same_day_order() {
    let events = vec![
        FundEvent::Redemption(redemption("r2", "FIMA", date(2024, 3, 1), dec!(5))),
        FundEvent::Subscription(subscription("s1", "FIMA", date(2024, 1, 1), dec!(1), dec!(10))),
        FundEvent::Redemption(redemption("r1", "FIMA", date(2024, 1, 1), dec!(10))),
        FundEvent::Subscription(subscription("s2", "FIMA", date(2024, 2, 1), dec!(1), dec!(20))),
    ];
    let replay = LotBook::replay(&events, &EngineSettings::default());

    // s1 then r1 on the same day empties the first lot; r2 then takes from s2.
    assert_eq!(replay.redemptions[0].redemption.id, "r1");
    assert_eq!(replay.redemptions[0].fill.units_redeemed, dec!(10));
    assert_eq!(replay.redemptions[1].fill.consumed[0].lot_id, "s2");
    assert_eq!(replay.book.fund_quantity("FIMA"), dec!(15));
}

#[test]
fn test_fund_event_json_is_tagged() {
    let json = r#"{"kind":"redemption","id":"r1","fundId":"FIMA","date":"2024-02-01","units":40}"#;
    let event: FundEvent = serde_json::from_str(json).unwrap();
    assert_eq!(event.id(), "r1");
    assert_eq!(event.fund_id(), "FIMA");
    assert_eq!(event.date(), date(2024, 2, 1));
    assert!(matches!(event, FundEvent::Redemption(Redemption { unit_value: None, .. })));
}
