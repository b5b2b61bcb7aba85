pub mod lots;
pub mod performance;
mod portfolio_model;
mod portfolio_service;
mod portfolio_traits;
pub mod positions;

pub use portfolio_model::*;
pub use portfolio_service::{PortfolioService, PortfolioServiceTrait};
pub use portfolio_traits::{LedgerRepositoryTrait, MarketDataTrait};
