//! Core error types for the accounting engine.
//!
//! Degenerate inputs (too few cash flows, zero denominators, over-redemption)
//! are not errors: the engines return `None` or a remainder instead. Only
//! caller-contract violations and bad configuration surface here.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::fx::FxError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the engine and the service layer around it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Market data unavailable: {0}")]
    MarketData(String),

    #[error("Position calculation failed: {0}")]
    Calculation(#[from] CalculatorError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),
}

/// Errors raised by the position and lot engines.
#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error(
        "Invalid subscription {subscription_id} for fund {fund_id}: entry unit value {entry_unit_value} and amount {amount} must both be positive"
    )]
    InvalidSubscription {
        subscription_id: String,
        fund_id: String,
        entry_unit_value: Decimal,
        amount: Decimal,
    },

    #[error("Calculation failed: {0}")]
    Calculation(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfigValue(err.to_string())
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}
