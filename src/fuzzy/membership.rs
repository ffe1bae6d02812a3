//! Fuzzy truth values and piecewise-linear membership functions

use serde::{Deserialize, Serialize};

use crate::error::{AnemiaError, AnemiaResult};

/// A fuzzy truth value in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FuzzyValue(f64);

impl FuzzyValue {
    pub const ZERO: FuzzyValue = FuzzyValue(0.0);
    pub const ONE: FuzzyValue = FuzzyValue(1.0);

    /// Clamps into [0, 1]; NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            Self(0.0)
        } else {
            Self(value.clamp(0.0, 1.0))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Fuzzy NOT (complement)
    pub fn not(&self) -> Self {
        Self::new(1.0 - self.0)
    }

    /// Fuzzy AND (t-norm) - minimum
    pub fn and(&self, other: &Self) -> Self {
        Self::new(self.0.min(other.0))
    }

    /// Fuzzy OR (t-conorm) - maximum
    pub fn or(&self, other: &Self) -> Self {
        Self::new(self.0.max(other.0))
    }

    /// Algebraic product t-norm
    pub fn product(&self, other: &Self) -> Self {
        Self::new(self.0 * other.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0.0
    }
}

impl Default for FuzzyValue {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for FuzzyValue {
    fn from(v: f64) -> Self {
        Self::new(v)
    }
}

/// Membership function shapes
///
/// Both shapes are piecewise linear. A triangle is stored as its own variant
/// but evaluates exactly like a trapezoid whose plateau collapses to `b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "points", rename_all = "lowercase")]
pub enum MembershipFunction {
    /// Triangular: (left, peak, right)
    Triangular(f64, f64, f64),
    /// Trapezoidal: (left, left_top, right_top, right)
    Trapezoidal(f64, f64, f64, f64),
}

impl MembershipFunction {
    /// Breakpoints as a trapezoid `(a, b, c, d)`
    pub fn breakpoints(&self) -> (f64, f64, f64, f64) {
        match *self {
            MembershipFunction::Triangular(a, b, c) => (a, b, b, c),
            MembershipFunction::Trapezoidal(a, b, c, d) => (a, b, c, d),
        }
    }

    /// Check that breakpoints are finite and non-decreasing
    pub fn validate(&self, term: &str) -> AnemiaResult<()> {
        let (a, b, c, d) = self.breakpoints();
        let points = [a, b, c, d];
        let finite = points.iter().all(|p| p.is_finite());
        let ordered = a <= b && b <= c && c <= d;
        if finite && ordered {
            Ok(())
        } else {
            let raw: Vec<f64> = match *self {
                MembershipFunction::Triangular(a, b, c) => vec![a, b, c],
                MembershipFunction::Trapezoidal(..) => points.to_vec(),
            };
            Err(AnemiaError::invalid_breakpoints(term, &raw))
        }
    }

    /// Evaluate membership for a crisp value
    ///
    /// Zero outside `[a, d]`. A vertical edge (`a == b` or `c == d`) keeps
    /// the shoulder point at full membership.
    pub fn evaluate(&self, x: f64) -> FuzzyValue {
        let (a, b, c, d) = self.breakpoints();
        let result = if x.is_nan() || x < a || x > d {
            0.0
        } else if x < b {
            (x - a) / (b - a)
        } else if x <= c {
            1.0
        } else {
            (d - x) / (d - c)
        };

        FuzzyValue::new(result)
    }

    /// Get the core (where membership = 1)
    pub fn core(&self) -> (f64, f64) {
        let (_, b, c, _) = self.breakpoints();
        (b, c)
    }

    /// Get the support (where membership can be > 0)
    pub fn support(&self) -> (f64, f64) {
        let (a, _, _, d) = self.breakpoints();
        (a, d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuzzy_value_operations() {
        let a = FuzzyValue::new(0.6);
        let b = FuzzyValue::new(0.4);

        assert!((a.and(&b).value() - 0.4).abs() < 0.001);
        assert!((a.or(&b).value() - 0.6).abs() < 0.001);
        assert!((a.not().value() - 0.4).abs() < 0.001);
        assert!((a.product(&b).value() - 0.24).abs() < 0.001);
    }

    #[test]
    fn test_fuzzy_value_clamps() {
        assert_eq!(FuzzyValue::new(1.7).value(), 1.0);
        assert_eq!(FuzzyValue::new(-0.2).value(), 0.0);
        assert_eq!(FuzzyValue::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_triangular_membership() {
        let mf = MembershipFunction::Triangular(11.0, 14.0, 16.0);

        assert_eq!(mf.evaluate(11.0).value(), 0.0);
        assert_eq!(mf.evaluate(14.0).value(), 1.0);
        assert_eq!(mf.evaluate(16.0).value(), 0.0);
        assert!((mf.evaluate(12.5).value() - 0.5).abs() < 1e-12);
        assert!((mf.evaluate(15.0).value() - 0.5).abs() < 1e-12);
        assert_eq!(mf.evaluate(9.0).value(), 0.0);
        assert_eq!(mf.evaluate(17.0).value(), 0.0);
    }

    #[test]
    fn test_trapezoidal_membership() {
        let mf = MembershipFunction::Trapezoidal(28.0, 28.0, 30.0, 32.0);

        assert_eq!(mf.evaluate(28.0).value(), 1.0);
        assert_eq!(mf.evaluate(29.0).value(), 1.0);
        assert_eq!(mf.evaluate(30.0).value(), 1.0);
        assert!((mf.evaluate(31.0).value() - 0.5).abs() < 1e-12);
        assert_eq!(mf.evaluate(32.0).value(), 0.0);
        assert_eq!(mf.evaluate(27.9).value(), 0.0);
    }

    #[test]
    fn test_right_shoulder_reaches_one_at_edge() {
        let mf = MembershipFunction::Trapezoidal(15.0, 17.0, 19.0, 19.0);
        assert_eq!(mf.evaluate(19.0).value(), 1.0);
        assert_eq!(mf.evaluate(18.0).value(), 1.0);
        assert!((mf.evaluate(16.0).value() - 0.5).abs() < 1e-12);
        assert_eq!(mf.evaluate(19.5).value(), 0.0);
    }

    #[test]
    fn test_rising_edge_is_monotone() {
        let mf = MembershipFunction::Triangular(78.0, 95.0, 110.0);
        let mut previous = 0.0;
        let mut x = 78.0;
        while x <= 95.0 {
            let mu = mf.evaluate(x).value();
            assert!(mu >= previous);
            previous = mu;
            x += 0.25;
        }
    }

    #[test]
    fn test_validate() {
        assert!(MembershipFunction::Triangular(1.0, 2.0, 3.0).validate("ok").is_ok());
        assert!(MembershipFunction::Trapezoidal(5.0, 5.0, 10.0, 12.0).validate("ok").is_ok());

        let err = MembershipFunction::Triangular(3.0, 2.0, 4.0).validate("bad").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidBreakpoints);
        assert!(MembershipFunction::Trapezoidal(0.0, f64::NAN, 1.0, 2.0).validate("nan").is_err());
    }

    #[test]
    fn test_core_and_support() {
        let mf = MembershipFunction::Triangular(31.0, 34.0, 37.0);
        assert_eq!(mf.core(), (34.0, 34.0));
        assert_eq!(mf.support(), (31.0, 37.0));
    }
}
