use chrono::{NaiveDate, TimeDelta};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::fx_errors::FxError;
use super::fx_model::RateSample;
use crate::constants::MAX_RATE_LOOKBACK_DAYS;
use crate::settings::EngineSettings;

/// Date-indexed conversion rate source consumed by the position engines.
///
/// Implementations must always return a strictly positive rate so that
/// callers can divide by it.
pub trait RateLookup: Send + Sync {
    fn rate_on(&self, date: NaiveDate) -> Decimal;
}

/// Immutable table of historical conversion rates.
///
/// Lookup policy:
/// 1. exact date match;
/// 2. nearest prior date within `lookback_days`;
/// 3. the caller-supplied default rate.
///
/// Unlike a nearest-neighbour converter, a later sample is never used for an
/// earlier date: a cost basis can only be converted at a rate known on the
/// trade date.
#[derive(Debug, Clone)]
pub struct HistoricalRateTable {
    rates: BTreeMap<NaiveDate, Decimal>,
    lookback_days: i64,
    default_rate: Decimal,
}

impl HistoricalRateTable {
    /// Builds the table. Non-positive samples are dropped; when two samples
    /// share a date the later one in `samples` wins.
    pub fn new(
        samples: Vec<RateSample>,
        lookback_days: i64,
        default_rate: Decimal,
    ) -> Result<Self, FxError> {
        if default_rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "default rate must be positive, got {}",
                default_rate
            )));
        }
        if !(0..=MAX_RATE_LOOKBACK_DAYS).contains(&lookback_days) {
            return Err(FxError::InvalidRate(format!(
                "lookback window must be between 0 and {} days, got {}",
                MAX_RATE_LOOKBACK_DAYS, lookback_days
            )));
        }

        let mut rates = BTreeMap::new();
        for sample in samples {
            if sample.rate <= Decimal::ZERO {
                warn!(
                    "Ignoring non-positive conversion rate {} on {}",
                    sample.rate, sample.date
                );
                continue;
            }
            rates.insert(sample.date, sample.rate);
        }
        debug!(
            "Built rate table with {} samples (lookback {} days, default {})",
            rates.len(),
            lookback_days,
            default_rate
        );

        Ok(HistoricalRateTable {
            rates,
            lookback_days,
            default_rate,
        })
    }

    /// Same as [`HistoricalRateTable::new`] with the lookback window taken from settings.
    pub fn with_settings(
        samples: Vec<RateSample>,
        settings: &EngineSettings,
        default_rate: Decimal,
    ) -> Result<Self, FxError> {
        Self::new(samples, settings.rate_lookback_days, default_rate)
    }

    /// Exact or nearest-prior rate within the lookback window, without the default.
    /// `None` as well when the window reaches past the calendar's lower bound.
    pub fn find_rate(&self, date: NaiveDate) -> Option<Decimal> {
        let earliest = TimeDelta::try_days(self.lookback_days)
            .and_then(|window| date.checked_sub_signed(window))?;
        self.rates
            .range(earliest..=date)
            .next_back()
            .map(|(_, rate)| *rate)
    }

    /// Most recent sample in the table.
    pub fn latest_rate(&self) -> Option<Decimal> {
        self.rates.values().next_back().copied()
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl RateLookup for HistoricalRateTable {
    fn rate_on(&self, date: NaiveDate) -> Decimal {
        match self.find_rate(date) {
            Some(rate) => rate,
            None => {
                debug!(
                    "No conversion rate on or up to {} days before {}; using default {}",
                    self.lookback_days, date, self.default_rate
                );
                self.default_rate
            }
        }
    }
}
