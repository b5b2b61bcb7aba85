use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal places kept in reported return percentages
pub const DECIMAL_PRECISION: u32 = 6;

/// Quantity below which a WAC position is treated as empty
pub const DUST_THRESHOLD: Decimal = dec!(0.0001);

/// Units below which a fund lot is treated as fully consumed
pub const LOT_DUST_THRESHOLD: Decimal = dec!(0.0001);

/// Days searched backwards for a conversion rate before using the default rate
pub const RATE_LOOKBACK_DAYS: i64 = 10;

/// Longest accepted lookback window
pub const MAX_RATE_LOOKBACK_DAYS: i64 = 3650;

/// Year length used to turn day offsets into XIRR exponents
pub const XIRR_DAYS_PER_YEAR: Decimal = dec!(365.25);

/// Calendar year length used for annualization
pub const DAYS_PER_YEAR: i64 = 365;

/// Periods shorter than this are annualized linearly instead of compounded
pub const LINEAR_ANNUALIZATION_DAYS: i64 = 30;

// Newton-Raphson
pub const XIRR_INITIAL_GUESS: Decimal = dec!(0.10);
pub const XIRR_TOLERANCE: Decimal = dec!(0.0000001);
pub const XIRR_MAX_ITERATIONS: u32 = 100;
pub const XIRR_DERIVATIVE_FLOOR: Decimal = dec!(0.0000000001);

// Search domain shared by both root finders
pub const XIRR_RATE_FLOOR: Decimal = dec!(-0.99);
pub const XIRR_RATE_CEILING: Decimal = dec!(10);

// Bisection fallback
pub const BISECTION_TOLERANCE: Decimal = dec!(0.000001);
pub const BISECTION_MAX_ITERATIONS: u32 = 200;
pub const BISECTION_SCAN_STEP: Decimal = dec!(0.1);

/// XIRR results outside this band (in percent) carry a warning
pub const XIRR_LOW_WARNING_PCT: Decimal = dec!(-95);
pub const XIRR_HIGH_WARNING_PCT: Decimal = dec!(500);
