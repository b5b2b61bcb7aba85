//! Weighted-average-cost positions for exchange-traded instruments.

mod positions_model;
pub mod positions_valuation;
pub mod wac_calculator;

pub use positions_model::*;
pub use positions_valuation::{calculate_totals, value_position, value_positions};
pub use wac_calculator::{compute_position, compute_positions};


#[cfg(test)]
mod positions_valuation_tests;
