//! Price and unit-value snapshots handed in by the external price oracle.
//!
//! Any value may be missing (holidays, stale feeds). Consumers degrade to a
//! zero valuation or zero daily P&L instead of failing.

mod quotes_model;

pub use quotes_model::{FundUnitValue, InstrumentQuote, MarketSnapshot};
