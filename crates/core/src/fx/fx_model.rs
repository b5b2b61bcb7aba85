use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observation of the secondary-currency conversion rate
/// (units of base currency per unit of secondary currency, e.g. ARS per USD).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RateSample {
    pub date: NaiveDate,
    pub rate: Decimal,
}

impl RateSample {
    pub fn new(date: NaiveDate, rate: Decimal) -> Self {
        RateSample { date, rate }
    }
}
