//! Cartera Core - position and performance accounting.
//!
//! Turns a ledger of trades and fund subscriptions/redemptions into
//! weighted-average-cost positions, FIFO fund lots and return metrics
//! (XIRR, Modified Dietz). The engines are pure functions of their inputs;
//! [`portfolio::PortfolioService`] wires them to a ledger and a price oracle.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod portfolio;
pub mod quotes;
pub mod settings;
pub mod utils;

// Re-export the engine entry points
pub use portfolio::lots::{apply_redemption, LotBook};
pub use portfolio::performance::{
    annualize, build_performance_report, chain_returns, compute_twr, compute_xirr,
    compute_xirr_with_diagnostics,
};
pub use portfolio::positions::compute_positions;
pub use portfolio::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
