use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::decimal_utils::{is_dust, safe_div};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// A recorded buy or sell of an exchange-traded instrument. Immutable.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub instrument_id: String,
    pub timestamp: DateTime<Utc>,
    pub side: TradeSide,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Settled amount including fees, when the broker reports one.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
}

impl Trade {
    /// Quantity as a magnitude; the side carries the direction.
    pub fn qty(&self) -> Decimal {
        self.quantity.abs()
    }

    /// Unit price, negative prices treated as zero.
    pub fn price(&self) -> Decimal {
        self.unit_price.max(Decimal::ZERO)
    }

    pub fn gross_amount(&self) -> Decimal {
        self.qty() * self.price()
    }

    /// Cash that changed hands: the settled amount when known, otherwise
    /// quantity times price.
    pub fn cash_amount(&self) -> Decimal {
        match self.total_amount {
            Some(amount) if !amount.is_zero() => amount.abs(),
            _ => self.gross_amount(),
        }
    }

    pub fn trade_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Weighted-average-cost position of one instrument.
///
/// Cost is tracked twice: in the base currency and, independently, in the
/// secondary currency converted at each buy's trade-date rate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub instrument_id: String,
    pub quantity: Decimal,
    pub total_cost: Decimal,
    pub total_cost_secondary: Decimal,
    /// Proceeds minus average cost of every unit sold so far.
    pub realized_pnl: Decimal,
    pub first_trade_date: Option<NaiveDate>,
    pub last_trade_date: Option<NaiveDate>,
    pub trade_count: usize,
}

impl Position {
    pub fn new(instrument_id: String) -> Self {
        Position {
            instrument_id,
            quantity: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            total_cost_secondary: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            first_trade_date: None,
            last_trade_date: None,
            trade_count: 0,
        }
    }

    /// Average cost per unit in the base currency, zero for an empty position.
    pub fn average_cost(&self) -> Decimal {
        safe_div(self.total_cost, self.quantity)
    }

    /// Average cost per unit in the secondary currency.
    pub fn average_cost_secondary(&self) -> Decimal {
        safe_div(self.total_cost_secondary, self.quantity)
    }

    /// Implied conversion rate paid on average (base cost / secondary cost).
    pub fn average_conversion_rate(&self) -> Decimal {
        safe_div(self.total_cost, self.total_cost_secondary)
    }

    pub fn is_open(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    /// Adds `quantity` units bought at `unit_price`; `rate` converts the
    /// gross cost into the secondary currency.
    pub fn apply_buy(&mut self, quantity: Decimal, unit_price: Decimal, rate: Decimal) {
        let gross = quantity * unit_price;
        self.quantity += quantity;
        self.total_cost += gross;
        self.total_cost_secondary += safe_div(gross, rate);
    }

    /// Removes up to `quantity` units at the current average cost and books the
    /// realized result against `unit_price`. Returns the units actually sold.
    pub fn apply_sell(&mut self, quantity: Decimal, unit_price: Decimal) -> Decimal {
        let sold = quantity.min(self.quantity.max(Decimal::ZERO));
        if sold < quantity {
            warn!(
                "Sell of {} {} exceeds held quantity {}. Clamping to held quantity.",
                quantity, self.instrument_id, self.quantity
            );
        }
        if sold.is_zero() {
            return Decimal::ZERO;
        }

        let average_cost = self.average_cost();
        let average_cost_secondary = self.average_cost_secondary();

        self.realized_pnl += sold * (unit_price - average_cost);
        self.total_cost -= sold * average_cost;
        self.total_cost_secondary -= sold * average_cost_secondary;
        self.quantity -= sold;
        sold
    }

    /// Forces a near-empty position to exactly zero so proportional
    /// subtraction residue does not accumulate.
    pub fn sweep_dust(&mut self, threshold: Decimal) {
        if is_dust(self.quantity, threshold) {
            if !self.quantity.is_zero() {
                debug!(
                    "Position {} quantity {} below dust threshold {}. Zeroing.",
                    self.instrument_id, self.quantity, threshold
                );
            }
            self.quantity = Decimal::ZERO;
            self.total_cost = Decimal::ZERO;
            self.total_cost_secondary = Decimal::ZERO;
        }
    }

    pub(crate) fn touch(&mut self, date: NaiveDate) {
        if self.first_trade_date.is_none() {
            self.first_trade_date = Some(date);
        }
        self.last_trade_date = Some(date);
        self.trade_count += 1;
    }
}

/// A pair of amounts expressed in the base and the secondary currency.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryValue {
    pub primary: Decimal,
    pub secondary: Decimal,
}

impl MonetaryValue {
    pub fn new(primary: Decimal, secondary: Decimal) -> Self {
        MonetaryValue { primary, secondary }
    }

    pub fn zero() -> Self {
        MonetaryValue::default()
    }
}

impl std::ops::Add for MonetaryValue {
    type Output = MonetaryValue;

    fn add(self, other: MonetaryValue) -> MonetaryValue {
        MonetaryValue {
            primary: self.primary + other.primary,
            secondary: self.secondary + other.secondary,
        }
    }
}

impl std::ops::Sub for MonetaryValue {
    type Output = MonetaryValue;

    fn sub(self, other: MonetaryValue) -> MonetaryValue {
        MonetaryValue {
            primary: self.primary - other.primary,
            secondary: self.secondary - other.secondary,
        }
    }
}

impl std::iter::Sum for MonetaryValue {
    fn sum<I: Iterator<Item = MonetaryValue>>(iter: I) -> MonetaryValue {
        iter.fold(MonetaryValue::zero(), |acc, v| acc + v)
    }
}

/// Position view with live valuation and P&L attribution.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionValuation {
    pub instrument_id: String,
    pub quantity: Decimal,
    pub average_price: Decimal,
    pub current_price: Option<Decimal>,
    pub is_stale: bool,

    pub cost: MonetaryValue,
    pub valuation: MonetaryValue,
    pub unrealized_pnl: MonetaryValue,
    pub unrealized_pnl_pct: Decimal,
    pub unrealized_pnl_pct_secondary: Decimal,
    pub realized_pnl: Decimal,

    pub daily_pnl: MonetaryValue,
    pub daily_pnl_pct: Decimal,

    // Split of the base-currency result into currency and price effects
    pub average_conversion_rate: Decimal,
    pub fx_result: Decimal,
    pub price_result: Decimal,
}

/// Aggregates over all valued positions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioTotals {
    pub invested: MonetaryValue,
    pub valuation: MonetaryValue,
    pub result: MonetaryValue,
    pub result_pct: Decimal,
    pub result_pct_secondary: Decimal,
    pub daily_result: MonetaryValue,
    pub daily_result_pct: Decimal,
    pub daily_result_pct_secondary: Decimal,
}
