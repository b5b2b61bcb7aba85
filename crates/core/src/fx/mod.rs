//! FX (conversion rate) module - rate samples and the date-based lookup the
//! engines use to carry a secondary-currency cost basis.

mod fx_errors;
mod fx_model;
pub mod rate_table;

pub use fx_errors::FxError;
pub use fx_model::RateSample;
pub use rate_table::{HistoricalRateTable, RateLookup};
