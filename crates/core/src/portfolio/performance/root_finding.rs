//! Root finders for rate equations such as NPV(r) = 0.
//!
//! Newton-Raphson is fast but stalls on flat objectives; bisection is slow but
//! only needs a sign change. [`FallbackSolver`] runs the first and hands over
//! to the second when it gives up.

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::settings::XirrSettings;
use crate::utils::decimal_utils::clamp;

/// A function of a rate together with its first derivative.
pub trait RateObjective {
    fn value(&self, rate: Decimal) -> Decimal;
    fn derivative(&self, rate: Decimal) -> Decimal;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootSearchOutcome {
    Converged { rate: Decimal, iterations: u32 },
    /// The derivative vanished before convergence.
    Stalled { last_rate: Decimal, iterations: u32 },
    /// The iteration cap was reached.
    Exhausted { last_rate: Decimal, iterations: u32 },
    /// No sign change was found in the search domain.
    NoBracket,
}

impl RootSearchOutcome {
    pub fn rate(&self) -> Option<Decimal> {
        match self {
            RootSearchOutcome::Converged { rate, .. } => Some(*rate),
            _ => None,
        }
    }
}

pub trait RootFinder: Send + Sync {
    fn name(&self) -> &'static str;
    fn find_root(&self, objective: &dyn RateObjective) -> RootSearchOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewtonRaphson {
    pub initial_guess: Decimal,
    pub tolerance: Decimal,
    pub max_iterations: u32,
    pub derivative_floor: Decimal,
    pub rate_floor: Decimal,
    pub rate_ceiling: Decimal,
}

impl NewtonRaphson {
    pub fn from_settings(settings: &XirrSettings) -> Self {
        NewtonRaphson {
            initial_guess: settings.initial_guess,
            tolerance: settings.tolerance,
            max_iterations: settings.max_iterations,
            derivative_floor: settings.derivative_floor,
            rate_floor: settings.rate_floor,
            rate_ceiling: settings.rate_ceiling,
        }
    }
}

impl RootFinder for NewtonRaphson {
    fn name(&self) -> &'static str {
        "newton-raphson"
    }

    fn find_root(&self, objective: &dyn RateObjective) -> RootSearchOutcome {
        let mut guess = self.initial_guess;
        for iteration in 1..=self.max_iterations {
            let value = objective.value(guess);
            if value.abs() < self.tolerance {
                return RootSearchOutcome::Converged {
                    rate: guess,
                    iterations: iteration,
                };
            }

            let derivative = objective.derivative(guess);
            if derivative.abs() < self.derivative_floor {
                return RootSearchOutcome::Stalled {
                    last_rate: guess,
                    iterations: iteration,
                };
            }

            let Some(next) = value
                .checked_div(derivative)
                .and_then(|step| guess.checked_sub(step))
            else {
                return RootSearchOutcome::Stalled {
                    last_rate: guess,
                    iterations: iteration,
                };
            };
            let next = clamp(next, self.rate_floor, self.rate_ceiling);

            if (next - guess).abs() < self.tolerance {
                return RootSearchOutcome::Converged {
                    rate: next,
                    iterations: iteration,
                };
            }
            guess = next;
        }

        RootSearchOutcome::Exhausted {
            last_rate: guess,
            iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bisection {
    pub rate_floor: Decimal,
    pub rate_ceiling: Decimal,
    pub scan_step: Decimal,
    /// Applied both to |f(mid)| and to the bracket half-width.
    pub tolerance: Decimal,
    pub max_iterations: u32,
}

impl Bisection {
    pub fn from_settings(settings: &XirrSettings) -> Self {
        Bisection {
            rate_floor: settings.rate_floor,
            rate_ceiling: settings.rate_ceiling,
            scan_step: settings.bisection_scan_step,
            tolerance: settings.bisection_tolerance,
            max_iterations: settings.bisection_max_iterations,
        }
    }

    /// Finds an interval whose endpoints have opposite signs: the whole domain
    /// if it qualifies, else the first `scan_step` wide slice that does.
    fn bracket(&self, objective: &dyn RateObjective) -> Option<(Decimal, Decimal, Decimal)> {
        let low_value = objective.value(self.rate_floor);
        let high_value = objective.value(self.rate_ceiling);
        if opposite_signs(low_value, high_value) {
            return Some((self.rate_floor, self.rate_ceiling, low_value));
        }
        if self.scan_step <= Decimal::ZERO {
            return None;
        }

        let mut low = self.rate_floor;
        let mut low_value = low_value;
        while low < self.rate_ceiling {
            let high = (low + self.scan_step).min(self.rate_ceiling);
            let high_value = objective.value(high);
            if opposite_signs(low_value, high_value) {
                return Some((low, high, low_value));
            }
            low = high;
            low_value = high_value;
        }
        None
    }
}

impl RootFinder for Bisection {
    fn name(&self) -> &'static str {
        "bisection"
    }

    fn find_root(&self, objective: &dyn RateObjective) -> RootSearchOutcome {
        for endpoint in [self.rate_floor, self.rate_ceiling] {
            if objective.value(endpoint).abs() < self.tolerance {
                return RootSearchOutcome::Converged {
                    rate: endpoint,
                    iterations: 0,
                };
            }
        }

        let Some((mut low, mut high, mut low_value)) = self.bracket(objective) else {
            return RootSearchOutcome::NoBracket;
        };

        let mut mid = (low + high) / dec!(2);
        for iteration in 1..=self.max_iterations {
            mid = (low + high) / dec!(2);
            let value = objective.value(mid);
            let half_width = (high - low) / dec!(2);
            if value.abs() < self.tolerance || half_width < self.tolerance {
                return RootSearchOutcome::Converged {
                    rate: mid,
                    iterations: iteration,
                };
            }

            if opposite_signs(low_value, value) {
                high = mid;
            } else {
                low = mid;
                low_value = value;
            }
        }

        RootSearchOutcome::Exhausted {
            last_rate: mid,
            iterations: self.max_iterations,
        }
    }
}

/// Runs `primary` and, unless it converges, `fallback`.
pub struct FallbackSolver {
    primary: Box<dyn RootFinder>,
    fallback: Box<dyn RootFinder>,
}

impl FallbackSolver {
    pub fn new(primary: Box<dyn RootFinder>, fallback: Box<dyn RootFinder>) -> Self {
        FallbackSolver { primary, fallback }
    }

    /// Newton-Raphson backed by bisection.
    pub fn from_settings(settings: &XirrSettings) -> Self {
        FallbackSolver::new(
            Box::new(NewtonRaphson::from_settings(settings)),
            Box::new(Bisection::from_settings(settings)),
        )
    }

    pub fn solve(&self, objective: &dyn RateObjective) -> RootSearchOutcome {
        let outcome = self.primary.find_root(objective);
        if let RootSearchOutcome::Converged { .. } = outcome {
            return outcome;
        }

        debug!(
            "{} did not converge ({:?}), falling back to {}",
            self.primary.name(),
            outcome,
            self.fallback.name()
        );
        self.fallback.find_root(objective)
    }
}

fn opposite_signs(a: Decimal, b: Decimal) -> bool {
    (a < Decimal::ZERO && b > Decimal::ZERO) || (a > Decimal::ZERO && b < Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// f(r) = r - target
    struct Linear {
        target: Decimal,
    }

    impl RateObjective for Linear {
        fn value(&self, rate: Decimal) -> Decimal {
            rate - self.target
        }
        fn derivative(&self, _rate: Decimal) -> Decimal {
            Decimal::ONE
        }
    }

    /// Constant, never crosses zero.
    struct Flat;

    impl RateObjective for Flat {
        fn value(&self, _rate: Decimal) -> Decimal {
            dec!(500)
        }
        fn derivative(&self, _rate: Decimal) -> Decimal {
            Decimal::ZERO
        }
    }

    /// f(r) = r^3 - 0.125 with the derivative reported as zero, so only
    /// bisection can find the root at 0.5.
    struct Cubic;

    impl RateObjective for Cubic {
        fn value(&self, rate: Decimal) -> Decimal {
            rate * rate * rate - dec!(0.125)
        }
        fn derivative(&self, _rate: Decimal) -> Decimal {
            Decimal::ZERO
        }
    }

    fn settings() -> XirrSettings {
        XirrSettings::default()
    }

    #[test]
    fn test_newton_converges_on_linear() {
        let outcome = NewtonRaphson::from_settings(&settings()).find_root(&Linear { target: dec!(0.35) });
        let rate = outcome.rate().unwrap();
        assert!((rate - dec!(0.35)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_newton_stalls_on_zero_derivative() {
        let outcome = NewtonRaphson::from_settings(&settings()).find_root(&Flat);
        assert_eq!(
            outcome,
            RootSearchOutcome::Stalled {
                last_rate: dec!(0.10),
                iterations: 1
            }
        );
    }

    #[test]
    fn test_newton_clamps_to_domain() {
        // Root outside the domain: the candidate is pinned at the ceiling.
        let outcome = NewtonRaphson::from_settings(&settings()).find_root(&Linear { target: dec!(50) });
        assert_eq!(outcome.rate(), Some(dec!(10)));
    }

    #[test]
    fn test_bisection_solves_independently() {
        let outcome = Bisection::from_settings(&settings()).find_root(&Cubic);
        let rate = outcome.rate().unwrap();
        assert!((rate - dec!(0.5)).abs() < dec!(0.00001), "rate = {}", rate);
    }

    #[test]
    fn test_bisection_scans_when_domain_does_not_bracket() {
        // Positive at both ends, negative only on (0.30, 0.40).
        struct Dip;
        impl RateObjective for Dip {
            fn value(&self, rate: Decimal) -> Decimal {
                let centre = rate - dec!(0.35);
                centre * centre - dec!(0.0025)
            }
            fn derivative(&self, _rate: Decimal) -> Decimal {
                Decimal::ZERO
            }
        }
        let rate = Bisection::from_settings(&settings())
            .find_root(&Dip)
            .rate()
            .unwrap();
        assert!((rate - dec!(0.30)).abs() < dec!(0.0001), "rate = {}", rate);
    }

    #[test]
    fn test_bisection_without_bracket_gives_up() {
        assert_eq!(
            Bisection::from_settings(&settings()).find_root(&Flat),
            RootSearchOutcome::NoBracket
        );
    }

    #[test]
    fn test_bisection_respects_iteration_cap() {
        let mut finder = Bisection::from_settings(&settings());
        finder.max_iterations = 3;
        finder.tolerance = dec!(0.0000000001);
        let outcome = finder.find_root(&Linear { target: dec!(0.123456789) });
        assert!(matches!(
            outcome,
            RootSearchOutcome::Exhausted { iterations: 3, .. }
        ));
    }

    #[test]
    fn test_fallback_takes_over_after_stall() {
        let solver = FallbackSolver::from_settings(&settings());
        let rate = solver.solve(&Cubic).rate().unwrap();
        assert!((rate - dec!(0.5)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_fallback_not_used_when_primary_converges() {
        let solver = FallbackSolver::new(
            Box::new(NewtonRaphson::from_settings(&settings())),
            Box::new(Bisection {
                max_iterations: 0,
                ..Bisection::from_settings(&settings())
            }),
        );
        assert!(solver.solve(&Linear { target: dec!(0.2) }).rate().is_some());
    }
}
