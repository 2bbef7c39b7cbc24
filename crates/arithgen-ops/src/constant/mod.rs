//! Arbitrary-precision constants
//!
//! A [`Constant`] is evaluated once from its textual expression and keeps
//! its sign apart from its magnitude: multipliers work on the magnitude and
//! re-apply the sign when they build their output.

pub mod lexer;
pub mod parser;

use malachite::base::num::arithmetic::traits::PowerOf2;
use malachite::base::num::conversion::traits::RoundingFrom;
use malachite::base::rounding_modes::RoundingMode;
use malachite::rational::Rational;
use malachite::Integer;

use crate::error::{GenerationError, Result};
use crate::numeric;

pub use parser::{binary_exponent, parse_constant};

#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    text: String,
    value: Rational,
    negative: bool,
    magnitude: Rational,
    msb: i64,
}

impl Constant {
    /// Working precision of `pi` and `sqrt`, in fractional bits
    pub const DEFAULT_PRECISION: u64 = 10_000;

    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_precision(text, Self::DEFAULT_PRECISION)
    }

    pub fn parse_with_precision(text: &str, precision: u64) -> Result<Self> {
        let (value, _) = parse_constant(text, precision)?;
        Self::from_rational(text, value)
    }

    pub fn from_rational(text: &str, value: Rational) -> Result<Self> {
        if value == Rational::from(0u32) {
            return Err(GenerationError::constant(text, "constant evaluates to zero"));
        }
        let negative = value < Rational::from(0u32);
        let magnitude = if negative { -value.clone() } else { value.clone() };
        let msb = binary_exponent(&magnitude);
        Ok(Self {
            text: text.to_string(),
            value,
            negative,
            magnitude,
            msb,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> &Rational {
        &self.value
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> &Rational {
        &self.magnitude
    }

    /// Smallest `m` with `|C| < 2^m`
    pub fn msb(&self) -> i64 {
        self.msb
    }

    /// Nearest double, for reports
    pub fn to_f64(&self) -> f64 {
        f64::rounding_from(&self.value, RoundingMode::Nearest).0
    }

    /// Exact `x * |C| * 2^shift`
    pub fn scaled_product(&self, x: &Integer, shift: i64) -> Rational {
        Rational::from(x.clone()) * &self.magnitude * Rational::power_of_2(shift)
    }

    /// `x * |C| * 2^shift` rounded to an integer
    pub fn mul_round(&self, x: &Integer, shift: i64, mode: RoundingMode) -> Integer {
        numeric::round(&self.scaled_product(x, shift), mode)
    }
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (~{:e})", self.text, self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_constant_is_normalized() {
        let c = Constant::parse("-3/4").unwrap();
        assert!(c.is_negative());
        assert_eq!(c.magnitude(), &Rational::from_signeds(3, 4));
        assert_eq!(c.msb(), 0);
    }

    #[test]
    fn test_zero_is_rejected() {
        assert!(matches!(
            Constant::parse("1 - 1"),
            Err(GenerationError::ConstantParse { .. })
        ));
    }

    #[test]
    fn test_mul_round() {
        let c = Constant::parse("1/3").unwrap();
        let x = Integer::from(10);
        assert_eq!(c.mul_round(&x, 0, RoundingMode::Floor), Integer::from(3));
        assert_eq!(c.mul_round(&x, 0, RoundingMode::Ceiling), Integer::from(4));
        assert_eq!(c.mul_round(&x, 2, RoundingMode::Nearest), Integer::from(13));
    }

    #[test]
    fn test_pi_constant_msb() {
        let c = Constant::parse_with_precision("pi/4", 128).unwrap();
        assert_eq!(c.msb(), 0);
        assert!((c.to_f64() - std::f64::consts::FRAC_PI_4).abs() < 1e-15);
    }
}
