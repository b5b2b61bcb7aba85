//! Return metrics: money-weighted (XIRR) and time-weighted (Modified Dietz),
//! plus the façade that derives both from a portfolio ledger.

mod cash_flows;
mod modified_dietz;
mod performance_model;
mod performance_service;
pub mod root_finding;
mod xirr;

pub use cash_flows::{
    fund_cash_flows, net_invested, to_portfolio_perspective, trade_cash_flow,
    trades_to_cash_flows, with_terminal_value,
};
pub use modified_dietz::{annualize, chain_returns, compute_twr, compute_ytd, period_return};
pub use performance_model::*;
pub use performance_service::build_performance_report;
pub use root_finding::{
    Bisection, FallbackSolver, NewtonRaphson, RateObjective, RootFinder, RootSearchOutcome,
};
pub use xirr::{compute_xirr, compute_xirr_with_diagnostics, NpvObjective};
