use chrono::NaiveDate;
use log::{debug, error};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::sync::Arc;

use super::lots::{calculate_fund_totals, summarize_funds, FundSummary, LotBook};
use super::performance::{build_performance_report, PerformanceInput};
use super::portfolio_model::{PortfolioFailure, PortfolioSnapshot, SnapshotBatch};
use super::portfolio_traits::{LedgerRepositoryTrait, MarketDataTrait};
use super::positions::{
    calculate_totals, compute_positions, value_positions, Position, PositionValuation,
};
use crate::errors::Result;
use crate::fx::HistoricalRateTable;
use crate::quotes::MarketSnapshot;
use crate::settings::EngineSettings;

pub trait PortfolioServiceTrait: Send + Sync {
    /// Open WAC positions valued at the latest quotes.
    fn get_positions(&self, portfolio_id: &str) -> Result<Vec<PositionValuation>>;

    /// Fund holdings aggregated from their active lots.
    fn get_fund_summaries(&self, portfolio_id: &str) -> Result<Vec<FundSummary>>;

    fn calculate_snapshot(&self, portfolio_id: &str, as_of: NaiveDate) -> Result<PortfolioSnapshot>;

    /// Recomputes several portfolios in parallel. Failures are collected, not propagated.
    fn calculate_snapshots(&self, portfolio_ids: &[String], as_of: NaiveDate) -> SnapshotBatch;
}

/// Runs the accounting engines over data pulled from the ledger and the price oracle.
pub struct PortfolioService {
    ledger: Arc<dyn LedgerRepositoryTrait>,
    market_data: Arc<dyn MarketDataTrait>,
    settings: EngineSettings,
}

impl PortfolioService {
    pub fn new(
        ledger: Arc<dyn LedgerRepositoryTrait>,
        market_data: Arc<dyn MarketDataTrait>,
        settings: EngineSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            ledger,
            market_data,
            settings,
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Rate table whose fallback is today's rate, or 1 when there is none.
    fn rate_table(&self, current_rate: Option<Decimal>) -> Result<HistoricalRateTable> {
        let samples = self.market_data.get_rate_table()?;
        let default_rate = current_rate
            .filter(|rate| *rate > Decimal::ZERO)
            .unwrap_or(Decimal::ONE);
        Ok(HistoricalRateTable::with_settings(
            samples,
            &self.settings,
            default_rate,
        )?)
    }

    fn market_snapshot(
        &self,
        positions: &[Position],
        fund_ids: Vec<String>,
        current_rate: Option<Decimal>,
    ) -> Result<MarketSnapshot> {
        let instrument_ids: Vec<String> = positions
            .iter()
            .map(|p| p.instrument_id.clone())
            .collect();
        let quotes = if instrument_ids.is_empty() {
            Vec::new()
        } else {
            self.market_data.get_quotes(&instrument_ids)?
        };
        let unit_values = if fund_ids.is_empty() {
            Vec::new()
        } else {
            self.market_data.get_unit_values(&fund_ids)?
        };
        Ok(MarketSnapshot::new(quotes, unit_values, current_rate))
    }
}

impl PortfolioServiceTrait for PortfolioService {
    fn get_positions(&self, portfolio_id: &str) -> Result<Vec<PositionValuation>> {
        let trades = self.ledger.get_trades(portfolio_id)?;
        let current_rate = self.market_data.get_current_rate()?;
        let rates = self.rate_table(current_rate)?;

        let positions = compute_positions(&trades, &rates, &self.settings);
        let market = self.market_snapshot(&positions, Vec::new(), current_rate)?;
        Ok(value_positions(&positions, &market))
    }

    fn get_fund_summaries(&self, portfolio_id: &str) -> Result<Vec<FundSummary>> {
        let events = self.ledger.get_fund_events(portfolio_id)?;
        let current_rate = self.market_data.get_current_rate()?;
        let rates = self.rate_table(current_rate)?;

        let replay = LotBook::replay(&events, &self.settings);
        let fund_ids = replay.book.fund_ids().into_iter().map(String::from).collect();
        let market = self.market_snapshot(&[], fund_ids, current_rate)?;
        Ok(summarize_funds(&replay.book, &market, &rates))
    }

    fn calculate_snapshot(&self, portfolio_id: &str, as_of: NaiveDate) -> Result<PortfolioSnapshot> {
        let trades = self.ledger.get_trades(portfolio_id)?;
        let fund_events = self.ledger.get_fund_events(portfolio_id)?;
        let current_rate = self.market_data.get_current_rate()?;
        let rates = self.rate_table(current_rate)?;

        let positions = compute_positions(&trades, &rates, &self.settings);
        let replay = LotBook::replay(&fund_events, &self.settings);
        let fund_ids = replay.book.fund_ids().into_iter().map(String::from).collect();
        let market = self.market_snapshot(&positions, fund_ids, current_rate)?;

        let valued_positions = value_positions(&positions, &market);
        let position_totals = calculate_totals(&valued_positions);
        let funds = summarize_funds(&replay.book, &market, &rates);
        let fund_totals = calculate_fund_totals(&funds);

        let invested = position_totals.invested + fund_totals.invested;
        let valuation = position_totals.valuation + fund_totals.valuation;

        let performance = build_performance_report(
            &PerformanceInput {
                trades,
                fund_events,
                current_valuation: valuation.primary,
                current_invested: invested.primary,
                as_of,
            },
            &self.settings,
        );

        debug!(
            "Snapshot {} at {}: {} positions, {} funds, valuation {}",
            portfolio_id,
            as_of,
            valued_positions.len(),
            funds.len(),
            valuation.primary
        );

        Ok(PortfolioSnapshot {
            portfolio_id: portfolio_id.to_string(),
            as_of,
            positions: valued_positions,
            position_totals,
            funds,
            fund_totals,
            invested,
            valuation,
            performance,
            skipped: replay.skipped,
        })
    }

    fn calculate_snapshots(&self, portfolio_ids: &[String], as_of: NaiveDate) -> SnapshotBatch {
        let results: Vec<(String, Result<PortfolioSnapshot>)> = portfolio_ids
            .par_iter()
            .map(|id| (id.clone(), self.calculate_snapshot(id, as_of)))
            .collect();

        let mut batch = SnapshotBatch::default();
        for (portfolio_id, result) in results {
            match result {
                Ok(snapshot) => batch.snapshots.push(snapshot),
                Err(e) => {
                    error!("Failed to recompute portfolio {}: {}", portfolio_id, e);
                    batch.failures.push(PortfolioFailure {
                        portfolio_id,
                        error: e.to_string(),
                    });
                }
            }
        }
        batch
    }
}
