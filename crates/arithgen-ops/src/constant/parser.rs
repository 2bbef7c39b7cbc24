//! Recursive-descent evaluator for constant expressions
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! sum     := product (('+' | '-') product)*
//! product := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := atom ('^' unary)?
//! atom    := number | 'pi' | 'sqrt' '(' sum ')' | '(' sum ')'
//! ```
//!
//! Rational arithmetic is exact. `pi` and `sqrt` are truncated to the
//! requested number of fractional bits.

use malachite::base::num::arithmetic::traits::{FloorSqrt, Pow, PowerOf2};
use malachite::rational::Rational;
use malachite::{Integer, Natural};

use super::lexer::{tokenize, Token};
use crate::error::{GenerationError, Result};

/// Largest magnitude accepted for an integer exponent
const MAX_EXPONENT: i64 = 4096;

/// Extra bits carried while summing the arctangent series
const SERIES_GUARD_BITS: u64 = 32;

/// Evaluate `source`, returning its value and its binary exponent
///
/// The exponent `e` is the smallest integer with `|value| < 2^e`.
pub fn parse_constant(source: &str, precision: u64) -> Result<(Rational, i64)> {
    let tokens = tokenize(source).map_err(|offset| {
        GenerationError::constant(source, format!("unexpected character at offset {offset}"))
    })?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        precision,
    };
    let value = parser.sum()?;
    if let Some(token) = parser.peek() {
        return Err(parser.error(format!("unexpected '{token}' after expression")));
    }
    if value == Rational::from(0u32) {
        return Err(parser.error("constant evaluates to zero".to_string()));
    }
    let exponent = binary_exponent(&value);
    Ok((value, exponent))
}

/// Smallest `e` with `|value| < 2^e`; `value` must be non-zero
pub fn binary_exponent(value: &Rational) -> i64 {
    let magnitude = if *value < Rational::from(0u32) {
        -value.clone()
    } else {
        value.clone()
    };
    let mut e = 0i64;
    while magnitude >= Rational::power_of_2(e) {
        e += 1;
    }
    while magnitude < Rational::power_of_2(e - 1) {
        e -= 1;
    }
    e
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    precision: u64,
}

impl Parser<'_> {
    fn error(&self, reason: String) -> GenerationError {
        GenerationError::constant(self.source, reason)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.bump() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(self.error(format!("expected '{expected}', found '{token}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn sum(&mut self) -> Result<Rational> {
        let mut value = self.product()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.product()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.product()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn product(&mut self) -> Result<Rational> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == Rational::from(0u32) {
                        return Err(self.error("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<Rational> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Rational> {
        let base = self.atom()?;
        if self.peek() != Some(&Token::Caret) {
            return Ok(base);
        }
        self.pos += 1;
        let exponent = self.unary()?;
        let exponent = Integer::try_from(&exponent)
            .ok()
            .and_then(|e| i64::try_from(&e).ok())
            .filter(|e| e.abs() <= MAX_EXPONENT)
            .ok_or_else(|| {
                self.error(format!(
                    "exponent must be an integer of magnitude at most {MAX_EXPONENT}"
                ))
            })?;
        if exponent < 0 && base == Rational::from(0u32) {
            return Err(self.error("zero raised to a negative power".to_string()));
        }
        Ok(base.pow(exponent))
    }

    fn atom(&mut self) -> Result<Rational> {
        match self.bump() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::LeftParen) => {
                let value = self.sum()?;
                self.expect(Token::RightParen)?;
                Ok(value)
            }
            Some(Token::Identifier(name)) => match name.as_str() {
                "pi" => Ok(pi(self.precision)),
                "sqrt" => {
                    self.expect(Token::LeftParen)?;
                    let argument = self.sum()?;
                    self.expect(Token::RightParen)?;
                    if argument < Rational::from(0u32) {
                        return Err(self.error("square root of a negative value".to_string()));
                    }
                    Ok(sqrt(&argument, self.precision))
                }
                other => Err(self.error(format!("unknown identifier '{other}'"))),
            },
            Some(token) => Err(self.error(format!("unexpected '{token}'"))),
            None => Err(self.error("unexpected end of input".to_string())),
        }
    }
}

/// `2^bits * atan(1/x)` by its Taylor series, truncated
fn scaled_arctan_inverse(x: u32, bits: u64) -> Integer {
    let x = Integer::from(x);
    let x_squared = &x * &x;
    let zero = Integer::from(0u32);
    let mut term = Integer::power_of_2(bits) / &x;
    let mut sum = Integer::from(0u32);
    let mut k = 0u64;
    while term != zero {
        let contribution = &term / Integer::from(2 * k + 1);
        if k % 2 == 0 {
            sum += contribution;
        } else {
            sum -= contribution;
        }
        term /= &x_squared;
        k += 1;
    }
    sum
}

/// Machin's formula `pi = 16 atan(1/5) - 4 atan(1/239)`, truncated to
/// `precision` fractional bits
fn pi(precision: u64) -> Rational {
    let bits = precision + SERIES_GUARD_BITS;
    let scaled = Integer::from(16u32) * scaled_arctan_inverse(5, bits)
        - Integer::from(4u32) * scaled_arctan_inverse(239, bits);
    let truncated = scaled >> SERIES_GUARD_BITS;
    Rational::from_integers(truncated, Integer::power_of_2(precision))
}

/// Square root of a non-negative value, truncated to `precision` fractional bits
fn sqrt(value: &Rational, precision: u64) -> Rational {
    let factor = Rational::power_of_2(precision as i64);
    let scaled = value * &factor * &factor;
    let floor = scaled.numerator_ref() / scaled.denominator_ref();
    Rational::from_naturals(floor.floor_sqrt(), Natural::power_of_2(precision))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Rational {
        parse_constant(source, 200).unwrap().0
    }

    #[test]
    fn test_arithmetic_is_exact() {
        assert_eq!(eval("1/3"), Rational::from_signeds(1, 3));
        assert_eq!(eval("2*3 + 4"), Rational::from(10u32));
        assert_eq!(eval("2*(3 + 4)"), Rational::from(14u32));
        assert_eq!(eval("-0.75"), Rational::from_signeds(-3, 4));
        assert_eq!(eval("2^-3"), Rational::from_signeds(1, 8));
        assert_eq!(eval("-2^2"), Rational::from_signeds(-4, 1));
        assert_eq!(eval("2^3^2"), Rational::from(512u32));
    }

    #[test]
    fn test_binary_exponent() {
        assert_eq!(parse_constant("0.75", 64).unwrap().1, 0);
        assert_eq!(parse_constant("1/3", 64).unwrap().1, -1);
        assert_eq!(parse_constant("1", 64).unwrap().1, 1);
        assert_eq!(parse_constant("0.5", 64).unwrap().1, 0);
        assert_eq!(parse_constant("-5", 64).unwrap().1, 3);
    }

    #[test]
    fn test_pi_is_close() {
        let pi = eval("pi");
        let low = Rational::from_signeds(3_141_592_653i64, 1_000_000_000);
        let high = Rational::from_signeds(3_141_592_654i64, 1_000_000_000);
        assert!(pi > low && pi < high);
    }

    #[test]
    fn test_sqrt_brackets_root() {
        let root = eval("sqrt(2)");
        let square = &root * &root;
        assert!(square <= Rational::from(2u32));
        let next = root + Rational::power_of_2(-200i64);
        assert!(&next * &next > Rational::from(2u32));
    }

    #[test]
    fn test_errors() {
        for bad in ["", "0", "1/0", "1 +", "2^0.5", "foo", "sqrt(-1)", "(1", "1 2"] {
            assert!(
                matches!(
                    parse_constant(bad, 64),
                    Err(GenerationError::ConstantParse { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }
}
