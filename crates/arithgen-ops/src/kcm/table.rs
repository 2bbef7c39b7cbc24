//! KCM lookup table contents

use arithgen_netlist::LookupTable;
use malachite::base::num::arithmetic::traits::PowerOf2;
use malachite::base::rounding_modes::RoundingMode;
use malachite::rational::Rational;
use malachite::{Integer, Natural};

use crate::constant::Constant;
use crate::numeric;

/// Two's-complement value of a `width`-bit digit
fn digit_value(x: u64, width: usize, signed: bool) -> Integer {
    let mut value = Integer::from(x);
    if signed && width > 0 && x >= 1u64 << (width - 1) {
        value -= Integer::power_of_2(width as u64);
    }
    value
}

/// One table of a fixed-point real-constant multiplier
///
/// Entry `x` holds the digit value `x * 2^weight` times `|C|`, scaled to the
/// output grid (guard bits included) and rounded to nearest. The last table
/// also carries the half-ulp that turns the final truncation into a
/// rounding.
#[derive(Debug, Clone, PartialEq)]
pub struct FixRealKcmTable {
    pub index: usize,
    /// Position of the digit in the input
    pub weight: usize,
    pub input_width: usize,
    pub output_width: usize,
    pub signed: bool,
    pub last: bool,
    /// `lsb_in - lsb_out + g`
    pub shift: i64,
    pub guard_bits: i32,
}

impl FixRealKcmTable {
    /// Exact, unrounded entry value
    pub fn exact(&self, constant: &Constant, x: u64) -> Rational {
        let digit = digit_value(x, self.input_width, self.signed);
        let mut value = constant.scaled_product(&digit, self.weight as i64 + self.shift);
        if self.last && self.guard_bits > 0 {
            value += Rational::power_of_2(self.guard_bits as i64 - 1);
        }
        value
    }

    /// Rounded entry, re-encoded in two's complement on `output_width` bits
    pub fn function(&self, constant: &Constant, x: u64) -> Natural {
        let rounded = numeric::round(&self.exact(constant, x), RoundingMode::Nearest);
        numeric::wrap(&rounded, self.output_width)
    }

    /// Largest rounded entry of an unsigned table
    pub fn max_unsigned_entry(&self, constant: &Constant) -> Integer {
        let top = (1u64 << self.input_width) - 1;
        numeric::round(&self.exact(constant, top), RoundingMode::Nearest)
    }

    pub fn materialize(&self, constant: &Constant, name: impl Into<String>) -> LookupTable {
        LookupTable {
            name: name.into(),
            input_width: self.input_width,
            output_width: self.output_width,
            entries: (0..1u64 << self.input_width)
                .map(|x| numeric::natural_to_bits(&self.function(constant, x), self.output_width))
                .collect(),
        }
    }
}

/// Table of an integer-constant multiplier: entry `x` holds `x * C`
#[derive(Debug, Clone, PartialEq)]
pub struct KcmTable {
    pub input_width: usize,
    pub output_width: usize,
    pub signed: bool,
}

impl KcmTable {
    pub fn function(&self, constant: &Integer, x: u64) -> Natural {
        let product = digit_value(x, self.input_width, self.signed) * constant;
        numeric::wrap(&product, self.output_width)
    }

    pub fn materialize(&self, constant: &Integer, name: impl Into<String>) -> LookupTable {
        LookupTable {
            name: name.into(),
            input_width: self.input_width,
            output_width: self.output_width,
            entries: (0..1u64 << self.input_width)
                .map(|x| numeric::natural_to_bits(&self.function(constant, x), self.output_width))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(signed: bool, last: bool, g: i32) -> FixRealKcmTable {
        FixRealKcmTable {
            index: 0,
            weight: 0,
            input_width: 4,
            output_width: 8,
            signed,
            last,
            shift: g as i64,
            guard_bits: g,
        }
    }

    #[test]
    fn test_unsigned_entries_round_to_nearest() {
        let c = Constant::parse("0.75").unwrap();
        let t = table(false, false, 0);
        assert_eq!(t.function(&c, 0), Natural::from(0u32));
        // 3 * 0.75 = 2.25
        assert_eq!(t.function(&c, 3), Natural::from(2u32));
        // 5 * 0.75 = 3.75
        assert_eq!(t.function(&c, 5), Natural::from(4u32));
    }

    #[test]
    fn test_signed_entries_are_twos_complement() {
        let c = Constant::parse("0.75").unwrap();
        let t = table(true, false, 0);
        // 0b1100 = -4, -4 * 0.75 = -3
        assert_eq!(t.function(&c, 12), Natural::from(256u32 - 3));
    }

    #[test]
    fn test_last_table_carries_half_ulp() {
        let c = Constant::parse("1/3").unwrap();
        let plain = table(false, false, 2);
        let last = table(false, true, 2);
        // 3 * 1/3 * 4 = 4, plus 2^(g-1) = 2
        assert_eq!(plain.function(&c, 3), Natural::from(4u32));
        assert_eq!(last.function(&c, 3), Natural::from(6u32));
        assert_eq!(last.function(&c, 0), Natural::from(2u32));
    }

    #[test]
    fn test_weight_scales_entries() {
        let c = Constant::parse("0.75").unwrap();
        let mut t = table(false, false, 0);
        t.weight = 2;
        assert_eq!(t.function(&c, 1), Natural::from(3u32));
    }

    #[test]
    fn test_int_table() {
        let t = KcmTable {
            input_width: 3,
            output_width: 6,
            signed: true,
        };
        let c = Integer::from(5);
        assert_eq!(t.function(&c, 3), Natural::from(15u32));
        // 0b111 = -1
        assert_eq!(t.function(&c, 7), Natural::from(64u32 - 5));
        let rom = t.materialize(&c, "t");
        assert_eq!(rom.entries.len(), 8);
    }
}
