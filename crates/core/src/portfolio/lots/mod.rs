//! FIFO lot accounting for fund shares.
//!
//! Every subscription opens its own lot at its entry unit value; redemptions
//! consume the oldest lots first. Fund level figures are aggregates of the
//! active lots and never feed back into them.

mod fifo_engine;
mod lots_model;
mod lots_valuation;

pub use fifo_engine::{apply_redemption, new_lot_from_subscription, LotBook, LotReplay};
pub use lots_model::*;
pub use lots_valuation::{calculate_fund_totals, summarize_fund, summarize_funds, value_lot};

#[cfg(test)]
mod fifo_engine_tests;
