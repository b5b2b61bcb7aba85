use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    BISECTION_MAX_ITERATIONS, BISECTION_SCAN_STEP, BISECTION_TOLERANCE, DUST_THRESHOLD,
    LINEAR_ANNUALIZATION_DAYS, LOT_DUST_THRESHOLD, MAX_RATE_LOOKBACK_DAYS, RATE_LOOKBACK_DAYS,
    XIRR_DAYS_PER_YEAR, XIRR_DERIVATIVE_FLOOR, XIRR_HIGH_WARNING_PCT, XIRR_INITIAL_GUESS,
    XIRR_LOW_WARNING_PCT, XIRR_MAX_ITERATIONS, XIRR_RATE_CEILING, XIRR_RATE_FLOOR,
    XIRR_TOLERANCE,
};
use crate::errors::{Error, Result};

/// Tunable parameters of the accounting engine.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a valid
/// configuration. The dust thresholds and XIRR warning band are empirical
/// values and are expected to be tuned per deployment.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineSettings {
    /// WAC positions whose quantity falls below this are zeroed.
    pub dust_threshold: Decimal,
    /// Fund lots whose remaining units fall below this are deactivated.
    pub lot_dust_threshold: Decimal,
    /// How many days back a missing conversion rate is searched for.
    pub rate_lookback_days: i64,
    pub xirr: XirrSettings,
    pub annualization: AnnualizationSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct XirrSettings {
    pub initial_guess: Decimal,
    pub tolerance: Decimal,
    pub max_iterations: u32,
    pub derivative_floor: Decimal,
    pub rate_floor: Decimal,
    pub rate_ceiling: Decimal,
    pub bisection_tolerance: Decimal,
    pub bisection_max_iterations: u32,
    pub bisection_scan_step: Decimal,
    pub days_per_year: Decimal,
    /// Results below this percentage are flagged for data verification.
    pub low_warning_pct: Decimal,
    /// Results above this percentage are flagged as a likely short holding period.
    pub high_warning_pct: Decimal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnualizationSettings {
    pub linear_threshold_days: i64,
    /// Extrapolate periods shorter than a year instead of reporting them as-is.
    pub annualize_short_periods: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            dust_threshold: DUST_THRESHOLD,
            lot_dust_threshold: LOT_DUST_THRESHOLD,
            rate_lookback_days: RATE_LOOKBACK_DAYS,
            xirr: XirrSettings::default(),
            annualization: AnnualizationSettings::default(),
        }
    }
}

impl Default for XirrSettings {
    fn default() -> Self {
        XirrSettings {
            initial_guess: XIRR_INITIAL_GUESS,
            tolerance: XIRR_TOLERANCE,
            max_iterations: XIRR_MAX_ITERATIONS,
            derivative_floor: XIRR_DERIVATIVE_FLOOR,
            rate_floor: XIRR_RATE_FLOOR,
            rate_ceiling: XIRR_RATE_CEILING,
            bisection_tolerance: BISECTION_TOLERANCE,
            bisection_max_iterations: BISECTION_MAX_ITERATIONS,
            bisection_scan_step: BISECTION_SCAN_STEP,
            days_per_year: XIRR_DAYS_PER_YEAR,
            low_warning_pct: XIRR_LOW_WARNING_PCT,
            high_warning_pct: XIRR_HIGH_WARNING_PCT,
        }
    }
}

impl Default for AnnualizationSettings {
    fn default() -> Self {
        AnnualizationSettings {
            linear_threshold_days: LINEAR_ANNUALIZATION_DAYS,
            annualize_short_periods: false,
        }
    }
}

impl EngineSettings {
    /// Parses settings from JSON and validates them.
    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: EngineSettings = serde_json::from_str(raw)?;
        settings.validate()?;
        debug!("Loaded engine settings: {:?}", settings);
        Ok(settings)
    }

    /// Rejects combinations the engines cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.dust_threshold.is_sign_positive() || self.dust_threshold.is_zero() {
            return Err(invalid("dustThreshold", self.dust_threshold));
        }
        if !self.lot_dust_threshold.is_sign_positive() || self.lot_dust_threshold.is_zero() {
            return Err(invalid("lotDustThreshold", self.lot_dust_threshold));
        }
        if !(0..=MAX_RATE_LOOKBACK_DAYS).contains(&self.rate_lookback_days) {
            return Err(invalid("rateLookbackDays", self.rate_lookback_days));
        }
        self.xirr.validate()?;
        if self.annualization.linear_threshold_days < 0 {
            return Err(invalid(
                "annualization.linearThresholdDays",
                self.annualization.linear_threshold_days,
            ));
        }
        Ok(())
    }
}

impl XirrSettings {
    fn validate(&self) -> Result<()> {
        if self.rate_floor <= Decimal::NEGATIVE_ONE {
            return Err(invalid("xirr.rateFloor", self.rate_floor));
        }
        if self.rate_ceiling <= self.rate_floor {
            return Err(invalid("xirr.rateCeiling", self.rate_ceiling));
        }
        if self.initial_guess < self.rate_floor || self.initial_guess > self.rate_ceiling {
            return Err(invalid("xirr.initialGuess", self.initial_guess));
        }
        if self.tolerance <= Decimal::ZERO {
            return Err(invalid("xirr.tolerance", self.tolerance));
        }
        if self.bisection_tolerance <= Decimal::ZERO {
            return Err(invalid("xirr.bisectionTolerance", self.bisection_tolerance));
        }
        if self.bisection_scan_step <= Decimal::ZERO {
            return Err(invalid("xirr.bisectionScanStep", self.bisection_scan_step));
        }
        if self.days_per_year <= Decimal::ZERO {
            return Err(invalid("xirr.daysPerYear", self.days_per_year));
        }
        if self.low_warning_pct >= self.high_warning_pct {
            return Err(invalid("xirr.lowWarningPct", self.low_warning_pct));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: impl std::fmt::Display) -> Error {
    Error::InvalidConfigValue(format!("{} = {}", key, value))
}
