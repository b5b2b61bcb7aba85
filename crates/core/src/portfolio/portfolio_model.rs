use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::portfolio::lots::{FundSummary, FundTotals, SkippedEntity};
use crate::portfolio::performance::PerformanceReport;
use crate::portfolio::positions::{MonetaryValue, PortfolioTotals, PositionValuation};

/// Full recomputation of one portfolio at a date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub portfolio_id: String,
    pub as_of: NaiveDate,
    pub positions: Vec<PositionValuation>,
    pub position_totals: PortfolioTotals,
    pub funds: Vec<FundSummary>,
    pub fund_totals: FundTotals,
    /// Positions and funds together.
    pub invested: MonetaryValue,
    pub valuation: MonetaryValue,
    pub performance: PerformanceReport,
    /// Funds left out because of invalid events.
    pub skipped: Vec<SkippedEntity>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioFailure {
    pub portfolio_id: String,
    pub error: String,
}

/// Result of recomputing several portfolios; one failure never hides the others.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotBatch {
    pub snapshots: Vec<PortfolioSnapshot>,
    pub failures: Vec<PortfolioFailure>,
}
