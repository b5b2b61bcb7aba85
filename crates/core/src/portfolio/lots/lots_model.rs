use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::positions::MonetaryValue;

/// Fund shares bought by a single subscription.
///
/// Lots belong to exactly one fund and are never re-ordered; redemptions only
/// shrink them. A lot whose units fall below the dust threshold is zeroed and
/// marked inactive.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: String,
    pub fund_id: String,
    pub subscription_date: NaiveDate,
    /// Unit value ("VCP") paid at subscription.
    pub entry_unit_value: Decimal,
    pub units: Decimal,
    /// Capital still invested through this lot.
    pub cost_basis: Decimal,
    pub active: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub fund_id: String,
    pub date: NaiveDate,
    pub entry_unit_value: Decimal,
    pub amount: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub id: String,
    pub fund_id: String,
    pub date: NaiveDate,
    pub units: Decimal,
    /// Unit value the redemption was settled at. Prices the proceeds.
    #[serde(default)]
    pub unit_value: Option<Decimal>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FundEvent {
    Subscription(Subscription),
    Redemption(Redemption),
}

impl FundEvent {
    pub fn id(&self) -> &str {
        match self {
            FundEvent::Subscription(s) => &s.id,
            FundEvent::Redemption(r) => &r.id,
        }
    }

    pub fn fund_id(&self) -> &str {
        match self {
            FundEvent::Subscription(s) => &s.fund_id,
            FundEvent::Redemption(r) => &r.fund_id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            FundEvent::Subscription(s) => s.date,
            FundEvent::Redemption(r) => r.date,
        }
    }
}

/// What a redemption did to one lot.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotConsumption {
    pub lot_id: String,
    pub units_before: Decimal,
    pub units_after: Decimal,
    pub units_consumed: Decimal,
    pub cost_basis_before: Decimal,
    pub cost_basis_after: Decimal,
    pub deactivated: bool,
}

/// Result of walking a fund's lots for one redemption.
///
/// `units_redeemed` is the sum of `units_consumed`; residue zeroed by the dust
/// sweep is reported separately in `dust_swept`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionFill {
    pub consumed: Vec<LotConsumption>,
    pub units_redeemed: Decimal,
    pub cost_basis_released: Decimal,
    /// Requested units no lot could cover (over-redemption).
    pub unconsumed_remainder: Decimal,
    pub dust_swept: Decimal,
}

/// Outcome of [`apply_redemption`](super::apply_redemption): the updated lot
/// list plus the consumption plan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionOutcome {
    pub lots: Vec<Lot>,
    pub consumed: Vec<LotConsumption>,
    pub units_redeemed: Decimal,
    pub cost_basis_released: Decimal,
    pub unconsumed_remainder: Decimal,
    pub dust_swept: Decimal,
}

impl RedemptionOutcome {
    pub(crate) fn new(lots: Vec<Lot>, fill: RedemptionFill) -> Self {
        RedemptionOutcome {
            lots,
            consumed: fill.consumed,
            units_redeemed: fill.units_redeemed,
            cost_basis_released: fill.cost_basis_released,
            unconsumed_remainder: fill.unconsumed_remainder,
            dust_swept: fill.dust_swept,
        }
    }
}

/// A redemption as replayed against the lot book.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReplayedRedemption {
    pub redemption: Redemption,
    pub fill: RedemptionFill,
}

/// An entity left out of a batch fold because one of its events was invalid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SkippedEntity {
    pub entity_id: String,
    pub event_id: String,
    pub reason: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LotValuation {
    pub lot_id: String,
    pub fund_id: String,
    pub subscription_date: NaiveDate,
    pub units: Decimal,
    pub entry_unit_value: Decimal,
    /// Cost basis; the secondary amount uses the rate of the subscription date.
    pub cost: MonetaryValue,
    pub valuation: MonetaryValue,
    pub unrealized_pnl: MonetaryValue,
    pub daily_pnl: Decimal,
}

/// Aggregate of the active lots of one fund.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundSummary {
    pub fund_id: String,
    pub units: Decimal,
    /// Volume-weighted entry unit value. Informational only; results come from the lots.
    pub average_entry_unit_value: Decimal,
    pub current_unit_value: Option<Decimal>,
    pub price_date: Option<NaiveDate>,
    pub cost: MonetaryValue,
    pub valuation: MonetaryValue,
    pub unrealized_pnl: MonetaryValue,
    pub unrealized_pnl_pct: Decimal,
    pub unrealized_pnl_pct_secondary: Decimal,
    pub daily_pnl: MonetaryValue,
    pub lots: Vec<LotValuation>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct FundTotals {
    pub invested: MonetaryValue,
    pub valuation: MonetaryValue,
    pub result: MonetaryValue,
    pub result_pct: Decimal,
    pub result_pct_secondary: Decimal,
    pub daily_result: MonetaryValue,
}
