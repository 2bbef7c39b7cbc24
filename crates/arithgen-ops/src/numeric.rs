//! Conversions between arbitrary-precision numbers and bit vectors

use arithgen_netlist::Bits;
use malachite::base::num::arithmetic::traits::{PowerOf2, RoundToMultiple};
use malachite::base::num::logic::traits::{BitAccess, SignificantBits};
use malachite::base::rounding_modes::RoundingMode;
use malachite::rational::Rational;
use malachite::{Integer, Natural};

/// Round to an integer with the given mode
pub fn round(value: &Rational, mode: RoundingMode) -> Integer {
    let rounded = value.clone().round_to_multiple(Rational::from(1u32), mode).0;
    match Integer::try_from(rounded) {
        Ok(integer) => integer,
        Err(_) => unreachable!("a multiple of one is an integer"),
    }
}

/// Two's-complement encoding of `value` on `width` bits
pub fn wrap(value: &Integer, width: usize) -> Natural {
    let modulus = Integer::power_of_2(width as u64);
    let mut r = value % &modulus;
    if r < Integer::from(0u32) {
        r += modulus;
    }
    match Natural::try_from(r) {
        Ok(natural) => natural,
        Err(_) => unreachable!("remainder was made non-negative"),
    }
}

/// Low `width` bits of a natural number
pub fn natural_to_bits(value: &Natural, width: usize) -> Bits {
    let mut bits = Bits::from_vec(value.to_limbs_asc());
    bits.resize(width, false);
    bits
}

/// `width`-bit two's-complement encoding of an integer
pub fn integer_to_bits(value: &Integer, width: usize) -> Bits {
    natural_to_bits(&wrap(value, width), width)
}

/// Number of bits of a natural number, 0 for zero
pub fn bit_length(value: &Natural) -> usize {
    value.significant_bits() as usize
}

/// Read the low `width` bits of `value` as two's complement when `signed`
pub fn decode(value: &Natural, width: usize, signed: bool) -> Integer {
    let value = Integer::from(value.clone());
    if signed && width > 0 && value.get_bit(width as u64 - 1) {
        value - Integer::power_of_2(width as u64)
    } else {
        value
    }
}
