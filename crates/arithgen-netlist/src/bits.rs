//! Bit-vector helpers
//!
//! All values in the netlist are little-endian bit vectors: index 0 is the
//! least significant bit.

use bitvec::prelude::*;

/// Bit vector used for constants, table entries and simulation values
pub type Bits = BitVec<u64, Lsb0>;

/// Build a `width`-bit vector from the low bits of `value`
pub fn from_u128(value: u128, width: usize) -> Bits {
    let mut bits = Bits::repeat(false, width);
    for i in 0..width.min(128) {
        bits.set(i, (value >> i) & 1 == 1);
    }
    bits
}

/// Read the low 128 bits of a vector as an integer
pub fn to_u128(bits: &BitSlice<u64, Lsb0>) -> u128 {
    bits.iter()
        .by_vals()
        .take(128)
        .enumerate()
        .fold(0u128, |acc, (i, bit)| acc | ((bit as u128) << i))
}

/// Render MSB first, the way a waveform viewer shows it
pub fn to_binary_string(bits: &BitSlice<u64, Lsb0>) -> String {
    bits.iter()
        .by_vals()
        .rev()
        .map(|b| if b { '1' } else { '0' })
        .collect()
}

/// Add two equal-width vectors modulo `2^width`, with an incoming carry
pub fn add_into(acc: &mut Bits, addend: &BitSlice<u64, Lsb0>, carry_in: bool) {
    let mut carry = carry_in;
    for i in 0..acc.len() {
        let a = acc[i];
        let b = addend.get(i).map(|b| *b).unwrap_or(false);
        acc.set(i, a ^ b ^ carry);
        carry = (a & b) | (carry & (a ^ b));
    }
}
