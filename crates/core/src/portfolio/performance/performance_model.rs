use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::portfolio::lots::FundEvent;
use crate::portfolio::positions::Trade;

/// A dated, signed amount from the investor's point of view: negative is
/// capital paid in, positive is capital returned or current value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl CashFlow {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        CashFlow { date, amount }
    }
}

/// A metric value with an optional explanation.
///
/// A `warning` means the value is missing or should be read with care; an
/// `error` means the calculation itself failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MetricResult {
    pub value: Option<Decimal>,
    pub warning: Option<String>,
    pub error: Option<String>,
}

impl MetricResult {
    pub fn of(value: Decimal) -> Self {
        MetricResult {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        MetricResult {
            warning: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        MetricResult {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warning = Some(message.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticMetric {
    Mwr,
    Twr,
    Ytd,
    /// Problems found while turning the ledger into cash flows.
    Ledger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub metric: DiagnosticMetric,
    pub severity: Severity,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(metric: DiagnosticMetric, message: impl Into<String>) -> Self {
        Diagnostic {
            metric,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(metric: DiagnosticMetric, message: impl Into<String>) -> Self {
        Diagnostic {
            metric,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Everything the metrics façade needs for one portfolio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceInput {
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub fund_events: Vec<FundEvent>,
    pub current_valuation: Decimal,
    /// Capital currently invested, used to estimate the start-of-year value.
    pub current_invested: Decimal,
    pub as_of: NaiveDate,
}

/// Return metrics in percent. Missing values are explained in `diagnostics`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub money_weighted_return_pct: Option<Decimal>,
    pub time_weighted_return_pct: Option<Decimal>,
    pub ytd_return_pct: Option<Decimal>,
    /// Days from the first ledger flow to the as-of date.
    pub period_days: i64,
    pub twr_annualized: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl PerformanceReport {
    /// Records a metric's explanation and returns its value.
    pub(crate) fn absorb(&mut self, metric: DiagnosticMetric, result: MetricResult) -> Option<Decimal> {
        if let Some(message) = result.warning {
            self.diagnostics.push(Diagnostic::warning(metric, message));
        }
        if let Some(message) = result.error {
            self.diagnostics.push(Diagnostic::error(metric, message));
        }
        result.value
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}
