//! Collaborators the portfolio service reads from.

use rust_decimal::Decimal;

use crate::errors::Result;
use crate::fx::RateSample;
use crate::portfolio::lots::FundEvent;
use crate::portfolio::positions::Trade;
use crate::quotes::{FundUnitValue, InstrumentQuote};

/// Read access to the append-only event ledger.
pub trait LedgerRepositoryTrait: Send + Sync {
    fn get_trades(&self, portfolio_id: &str) -> Result<Vec<Trade>>;

    fn get_fund_events(&self, portfolio_id: &str) -> Result<Vec<FundEvent>>;
}

/// Read access to the price oracle.
pub trait MarketDataTrait: Send + Sync {
    /// Latest quotes for the given instruments. Unknown ids are simply absent.
    fn get_quotes(&self, instrument_ids: &[String]) -> Result<Vec<InstrumentQuote>>;

    /// Latest and previous unit values for the given funds.
    fn get_unit_values(&self, fund_ids: &[String]) -> Result<Vec<FundUnitValue>>;

    /// Historical conversion-rate samples.
    fn get_rate_table(&self) -> Result<Vec<RateSample>>;

    fn get_current_rate(&self) -> Result<Option<Decimal>>;
}
