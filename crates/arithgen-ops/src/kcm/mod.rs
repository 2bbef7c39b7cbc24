//! KCM constant multipliers
//!
//! The input is cut into digits of about one LUT each. Every digit drives
//! a table holding `digit * C` at the digit's weight, and the partial
//! products are summed, either in a bit heap or with a chain of adders.
//!
//! - [`FixRealKcm`]: fixed-point input times a real constant, faithfully
//!   rounded to a requested output LSB;
//! - [`IntIntKcm`]: integer input times a non-negative integer constant, exact.

pub mod fix_real;
pub mod int_int;
pub mod sizing;
pub mod table;

use arithgen_netlist::GenerationContext;

pub use fix_real::{FixRealKcm, FixRealKcmLayout, FixRealKcmParams, RakeSchedule};
pub use int_int::{IntIntKcm, IntIntKcmLayout, IntIntKcmParams};
pub use sizing::{guard_bits, size_tables};
pub use table::{FixRealKcmTable, KcmTable};

/// Identifier-safe rendering of a constant expression
///
/// Signs become `P` and `M`, `*` becomes `X`, other punctuation and
/// whitespace collapse into single underscores.
pub fn identifier(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        let mapped = match c {
            '+' => 'P',
            '-' => 'M',
            '*' => 'X',
            c if c.is_ascii_alphanumeric() => c,
            _ => '_',
        };
        if mapped == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(mapped);
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        out.push('x');
    }
    out
}

/// `M3` for -3, `3` for 3
pub fn signed_identifier(value: i32) -> String {
    if value < 0 {
        format!("M{}", value.unsigned_abs())
    } else {
        value.to_string()
    }
}

/// `base`, or `base_uid{n}` when a different operator already took it
fn component_name(ctx: &mut GenerationContext, base: String) -> String {
    if ctx.contains(&base) {
        format!("{}_uid{}", base, ctx.next_uid())
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("1/3"), "1_3");
        assert_eq!(identifier("-0.75"), "M0_75");
        assert_eq!(identifier("2*pi"), "2Xpi");
        assert_eq!(identifier("sqrt( 2 )"), "sqrt_2");
        assert_eq!(identifier("()"), "x");
    }

    #[test]
    fn test_signed_identifier() {
        assert_eq!(signed_identifier(-8), "M8");
        assert_eq!(signed_identifier(7), "7");
    }
}
