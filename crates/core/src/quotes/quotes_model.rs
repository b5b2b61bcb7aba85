use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Latest market price of an exchange-traded instrument.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentQuote {
    pub instrument_id: String,
    pub price: Option<Decimal>,
    /// Day-over-day change in percent (e.g. 1.5 for +1.5%).
    pub pct_change: Option<Decimal>,
    #[serde(default)]
    pub is_stale: bool,
}

/// Unit value ("VCP") of a fund on the latest and the previous pricing day.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FundUnitValue {
    pub fund_id: String,
    pub current: Option<Decimal>,
    pub previous: Option<Decimal>,
    pub price_date: Option<NaiveDate>,
}

/// Immutable view of the price oracle for one recomputation.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub quotes: HashMap<String, InstrumentQuote>,
    pub unit_values: HashMap<String, FundUnitValue>,
    /// Current secondary-currency conversion rate (e.g. today's MEP).
    pub current_rate: Option<Decimal>,
}

impl MarketSnapshot {
    pub fn new(
        quotes: Vec<InstrumentQuote>,
        unit_values: Vec<FundUnitValue>,
        current_rate: Option<Decimal>,
    ) -> Self {
        MarketSnapshot {
            quotes: quotes
                .into_iter()
                .map(|q| (q.instrument_id.clone(), q))
                .collect(),
            unit_values: unit_values
                .into_iter()
                .map(|v| (v.fund_id.clone(), v))
                .collect(),
            current_rate,
        }
    }

    pub fn quote(&self, instrument_id: &str) -> Option<&InstrumentQuote> {
        self.quotes.get(instrument_id)
    }

    pub fn unit_value(&self, fund_id: &str) -> Option<&FundUnitValue> {
        self.unit_values.get(fund_id)
    }

    /// Current rate when present and positive.
    pub fn usable_rate(&self) -> Option<Decimal> {
        self.current_rate.filter(|rate| *rate > Decimal::ZERO)
    }
}
