use log::{debug, error, warn};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use super::lots_model::{
    FundEvent, Lot, LotConsumption, RedemptionFill, RedemptionOutcome, ReplayedRedemption,
    SkippedEntity, Subscription,
};
use crate::errors::{CalculatorError, Result};
use crate::settings::EngineSettings;
use crate::utils::decimal_utils::is_dust;

/// Opens a lot for a subscription.
///
/// Both the entry unit value and the amount must be positive; anything else is
/// a caller bug and is rejected rather than producing infinite or negative units.
pub fn new_lot_from_subscription(subscription: &Subscription) -> Result<Lot> {
    if subscription.entry_unit_value <= Decimal::ZERO || subscription.amount <= Decimal::ZERO {
        return Err(CalculatorError::InvalidSubscription {
            subscription_id: subscription.id.clone(),
            fund_id: subscription.fund_id.clone(),
            entry_unit_value: subscription.entry_unit_value,
            amount: subscription.amount,
        }
        .into());
    }

    let units = subscription
        .amount
        .checked_div(subscription.entry_unit_value)
        .ok_or_else(|| {
            CalculatorError::Calculation(format!(
                "Units for subscription {} overflow ({} / {})",
                subscription.id, subscription.amount, subscription.entry_unit_value
            ))
        })?;

    Ok(Lot {
        id: subscription.id.clone(),
        fund_id: subscription.fund_id.clone(),
        subscription_date: subscription.date,
        entry_unit_value: subscription.entry_unit_value,
        units,
        cost_basis: subscription.amount,
        active: true,
    })
}

/// Redeems `units_to_redeem` units of `fund_id` against `lots` in FIFO order
/// (subscription date, then position in `lots`).
///
/// The input is not modified; the returned outcome carries the updated lots.
/// Redeeming more than the fund holds is not an error: the uncovered part is
/// reported as `unconsumed_remainder`.
pub fn apply_redemption(
    lots: &[Lot],
    fund_id: &str,
    units_to_redeem: Decimal,
    settings: &EngineSettings,
) -> RedemptionOutcome {
    let mut updated = lots.to_vec();
    let mut order: Vec<usize> = updated
        .iter()
        .enumerate()
        .filter(|(_, lot)| lot.active && lot.fund_id == fund_id)
        .map(|(index, _)| index)
        .collect();
    order.sort_by_key(|&index| (updated[index].subscription_date, index));

    let fill = consume_fifo(
        &mut updated,
        &order,
        fund_id,
        units_to_redeem,
        settings.lot_dust_threshold,
    );
    RedemptionOutcome::new(updated, fill)
}

fn consume_fifo(
    lots: &mut [Lot],
    order: &[usize],
    fund_id: &str,
    units_to_redeem: Decimal,
    dust_threshold: Decimal,
) -> RedemptionFill {
    let mut fill = RedemptionFill::default();
    if units_to_redeem <= Decimal::ZERO {
        debug!(
            "Ignoring non-positive redemption of {} units for fund {}",
            units_to_redeem, fund_id
        );
        return fill;
    }

    let mut remaining = units_to_redeem;
    for &index in order {
        if remaining <= Decimal::ZERO {
            break;
        }
        let Some(lot) = lots.get_mut(index) else {
            error!("Lot index {} out of range for fund {}", index, fund_id);
            continue;
        };
        if !lot.active || lot.units <= Decimal::ZERO {
            continue;
        }

        let units_before = lot.units;
        let cost_basis_before = lot.cost_basis;
        let taken = units_before.min(remaining);
        let left = units_before - taken;

        let deactivated = is_dust(left, dust_threshold);
        if deactivated {
            fill.dust_swept += left;
            lot.units = Decimal::ZERO;
            lot.cost_basis = Decimal::ZERO;
            lot.active = false;
        } else {
            lot.units = left;
            lot.cost_basis = left * lot.entry_unit_value;
        }

        remaining -= taken;
        fill.units_redeemed += taken;
        fill.cost_basis_released += cost_basis_before - lot.cost_basis;
        fill.consumed.push(LotConsumption {
            lot_id: lot.id.clone(),
            units_before,
            units_after: lot.units,
            units_consumed: taken,
            cost_basis_before,
            cost_basis_after: lot.cost_basis,
            deactivated,
        });
    }

    if remaining > Decimal::ZERO {
        warn!(
            "Redemption of {} units for fund {} exceeds active lots by {}",
            units_to_redeem, fund_id, remaining
        );
    }
    fill.unconsumed_remainder = remaining.max(Decimal::ZERO);
    fill
}

/// All lots of a portfolio: an insertion-ordered arena plus, per fund, the
/// arena indices sorted by (subscription date, arena index).
#[derive(Debug, Clone)]
pub struct LotBook {
    lots: Vec<Lot>,
    fifo_index: HashMap<String, Vec<usize>>,
    lot_dust_threshold: Decimal,
}

/// Lot book rebuilt from a fund event ledger.
#[derive(Debug, Clone)]
pub struct LotReplay {
    pub book: LotBook,
    /// Subscriptions that opened a lot, in replay order.
    pub subscriptions: Vec<Subscription>,
    pub redemptions: Vec<ReplayedRedemption>,
    pub skipped: Vec<SkippedEntity>,
}

impl LotBook {
    pub fn new(settings: &EngineSettings) -> Self {
        LotBook {
            lots: Vec::new(),
            fifo_index: HashMap::new(),
            lot_dust_threshold: settings.lot_dust_threshold,
        }
    }

    /// Opens a lot and files it in its fund's FIFO order.
    pub fn subscribe(&mut self, subscription: &Subscription) -> Result<&Lot> {
        let lot = new_lot_from_subscription(subscription)?;
        let index = self.lots.len();
        let date = lot.subscription_date;
        self.lots.push(lot);

        let lots = &self.lots;
        let order = self
            .fifo_index
            .entry(subscription.fund_id.clone())
            .or_default();
        let at = order.partition_point(|&i| lots[i].subscription_date <= date);
        order.insert(at, index);

        Ok(&self.lots[index])
    }

    pub fn redeem(&mut self, fund_id: &str, units: Decimal) -> RedemptionFill {
        let order = self
            .fifo_index
            .get(fund_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        consume_fifo(&mut self.lots, order, fund_id, units, self.lot_dust_threshold)
    }

    /// Active lots of `fund_id` in FIFO order.
    pub fn active_lots(&self, fund_id: &str) -> Vec<&Lot> {
        self.fifo_index
            .get(fund_id)
            .map(|order| {
                order
                    .iter()
                    .filter_map(|&i| self.lots.get(i))
                    .filter(|lot| lot.active)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Units held in `fund_id`, the sum over its active lots.
    pub fn fund_quantity(&self, fund_id: &str) -> Decimal {
        self.active_lots(fund_id).iter().map(|lot| lot.units).sum()
    }

    /// Every fund that ever had a lot, sorted.
    pub fn fund_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.fifo_index.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Every lot in insertion order, inactive ones included.
    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    /// Rebuilds a book from fund events.
    ///
    /// Events are ordered by date (stable, so same-day events keep their input
    /// order). A fund with an invalid subscription is left out entirely and
    /// reported in `skipped`; the other funds are unaffected.
    pub fn replay(events: &[FundEvent], settings: &EngineSettings) -> LotReplay {
        let mut ordered: Vec<&FundEvent> = events.iter().collect();
        ordered.sort_by_key(|event| event.date());

        let mut rejected: HashSet<String> = HashSet::new();
        let mut skipped = Vec::new();
        for event in &ordered {
            let FundEvent::Subscription(subscription) = event else {
                continue;
            };
            if rejected.contains(&subscription.fund_id) {
                continue;
            }
            if let Err(e) = new_lot_from_subscription(subscription) {
                warn!("Skipping fund {}: {}", subscription.fund_id, e);
                rejected.insert(subscription.fund_id.clone());
                skipped.push(SkippedEntity {
                    entity_id: subscription.fund_id.clone(),
                    event_id: subscription.id.clone(),
                    reason: e.to_string(),
                });
            }
        }

        let mut book = LotBook::new(settings);
        let mut subscriptions = Vec::new();
        let mut redemptions = Vec::new();
        for event in ordered {
            if rejected.contains(event.fund_id()) {
                continue;
            }
            match event {
                FundEvent::Subscription(subscription) => match book.subscribe(subscription) {
                    Ok(_) => subscriptions.push(subscription.clone()),
                    Err(e) => error!("Subscription {} failed on replay: {}", subscription.id, e),
                },
                FundEvent::Redemption(redemption) => {
                    let fill = book.redeem(&redemption.fund_id, redemption.units);
                    redemptions.push(ReplayedRedemption {
                        redemption: redemption.clone(),
                        fill,
                    });
                }
            }
        }

        debug!(
            "Replayed {} fund events into {} lots ({} funds skipped)",
            events.len(),
            book.lots.len(),
            skipped.len()
        );
        LotReplay {
            book,
            subscriptions,
            redemptions,
            skipped,
        }
    }
}
