//! Table sizing and guard bits for KCM multipliers

use tracing::trace;

use crate::error::{GenerationError, Result};

/// Split a `w_in`-bit input into table input widths, index 0 first
///
/// The first table takes a full LUT, the others `lut - 1` bits. A small
/// remainder is merged into table 1 and the split redone from table 2,
/// so no table ends up with a handful of bits. Inputs of at most
/// `lut + 1` bits use a single table.
pub fn size_tables(w_in: usize, lut: usize) -> Vec<usize> {
    if w_in <= lut + 1 {
        return vec![w_in];
    }
    let mut sizes = greedy(vec![lut], w_in, lut);
    let last = sizes.len() - 1;
    let remainder = sizes[last];
    if remainder <= lut / 2 && last >= 2 {
        sizes = greedy(vec![sizes[0], sizes[1] + remainder], w_in, lut);
    }
    trace!(w_in, lut, ?sizes, "table sizes");
    sizes
}

/// Append `lut - 1` chunks until `w_in` is covered; the last chunk keeps the remainder
fn greedy(mut sizes: Vec<usize>, w_in: usize, lut: usize) -> Vec<usize> {
    let mut covered: usize = sizes.iter().sum();
    while covered < w_in {
        let chunk = (lut - 1).min(w_in - covered);
        sizes.push(chunk);
        covered += chunk;
    }
    sizes
}

/// Extra low-order bits needed for a faithful sum of `tables` correctly
/// rounded tables
///
/// `target_ulp_error` is the allowed error in units of `2^lsb_out` and must
/// lie in `[0.5, 1]`.
pub fn guard_bits(tables: usize, lsb_out: i32, target_ulp_error: f64) -> Result<i32> {
    if !(0.5..=1.0).contains(&target_ulp_error) {
        return Err(GenerationError::configuration(format!(
            "target ulp error {target_ulp_error} is outside [0.5, 1]"
        )));
    }
    if tables <= 1 {
        return Ok(0);
    }
    if tables <= 2 && target_ulp_error == 1.0 {
        return Ok(0);
    }
    if target_ulp_error == 0.5 {
        return Err(GenerationError::configuration(
            "a 0.5 ulp target cannot be met by a sum of several tables",
        ));
    }
    let ulp = (-lsb_out as f64).exp2();
    let g = (tables as f64 / ((target_ulp_error - 0.5) * ulp)).log2().ceil() as i32 - 1 - lsb_out;
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_table() {
        assert_eq!(size_tables(7, 6), vec![7]);
        assert_eq!(size_tables(1, 6), vec![1]);
        assert_eq!(size_tables(5, 4), vec![5]);
    }

    #[test]
    fn test_greedy_split() {
        // 6 + 5 + 5
        assert_eq!(size_tables(16, 6), vec![6, 5, 5]);
        // 6 + 5 + 4: remainder 4 > 3 stays
        assert_eq!(size_tables(15, 6), vec![6, 5, 4]);
    }

    #[test]
    fn test_small_remainder_merged_into_second_table() {
        // 6 + 5 + 2 -> 6 + 7
        assert_eq!(size_tables(13, 6), vec![6, 7]);
        // 4 + 3 + 3 + 1 -> 4 + 4 + 3
        assert_eq!(size_tables(11, 4), vec![4, 4, 3]);
    }

    #[test]
    fn test_remainder_in_second_table_not_doubled() {
        // 6 + 2: the remainder is table 1 itself
        assert_eq!(size_tables(8, 6), vec![6, 2]);
        assert_eq!(size_tables(12, 6), vec![6, 6]);
    }

    #[test]
    fn test_partition_is_complete() {
        for lut in 2..=8 {
            for w in 1..=80 {
                let sizes = size_tables(w, lut);
                assert!(!sizes.is_empty());
                assert_eq!(sizes.iter().sum::<usize>(), w, "w={w} lut={lut}");
                assert!(sizes.iter().all(|&s| s > 0));
            }
        }
    }

    #[test]
    fn test_guard_bits_known_values() {
        assert_eq!(guard_bits(1, 0, 1.0).unwrap(), 0);
        assert_eq!(guard_bits(2, 0, 1.0).unwrap(), 0);
        assert_eq!(guard_bits(3, 0, 1.0).unwrap(), 2);
        assert_eq!(guard_bits(4, 0, 1.0).unwrap(), 2);
        assert_eq!(guard_bits(5, 0, 1.0).unwrap(), 3);
        assert_eq!(guard_bits(8, 0, 1.0).unwrap(), 3);
    }

    #[test]
    fn test_guard_bits_independent_of_lsb() {
        for lsb in [-12, -3, 0, 4] {
            assert_eq!(guard_bits(6, lsb, 1.0).unwrap(), guard_bits(6, 0, 1.0).unwrap());
        }
    }

    #[test]
    fn test_guard_bits_monotonic() {
        for lsb in [-8, 0] {
            for n in 1..12 {
                let loose = guard_bits(n, lsb, 1.0).unwrap();
                for err in [0.51, 0.6, 0.75] {
                    assert!(loose <= guard_bits(n, lsb, err).unwrap());
                }
                assert!(guard_bits(n, lsb, 0.75).unwrap() <= guard_bits(n + 1, lsb, 0.75).unwrap());
                assert!(loose <= guard_bits(n + 1, lsb, 1.0).unwrap());
            }
        }
    }

    #[test]
    fn test_guard_bits_rejects_bad_targets() {
        assert!(guard_bits(3, 0, 0.4).is_err());
        assert!(guard_bits(3, 0, 1.5).is_err());
        assert!(guard_bits(3, 0, 0.5).is_err());
        assert_eq!(guard_bits(1, 0, 0.5).unwrap(), 0);
    }
}
