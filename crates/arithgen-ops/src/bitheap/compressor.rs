//! Compressor selection by exhaustive backtracking
//!
//! A `k`-input compressor maps `k` bits of equal weight to their
//! `ceil(log2(k + 1))`-bit population count. Given `n` bits, the search
//! picks how many compressors of each size to use so that exactly `n`
//! bits are consumed at minimum cost. Larger compressors win ties, which
//! keeps the number of reduction levels low.

use std::collections::HashMap;

use tracing::trace;

/// Output bits of a `k`-input compressor
pub fn compressor_outputs(k: usize) -> usize {
    let mut outs = 0;
    while (1usize << outs) <= k {
        outs += 1;
    }
    outs
}

/// Cost of one `k`-input compressor
///
/// Every output bit costs a LUT; a real compressor (`k >= 2`) also pays for
/// its carry logic. A 1-input compressor is a plain wire into the next level.
pub fn compressor_cost(k: usize) -> u64 {
    let outs = compressor_outputs(k) as u64;
    if k >= 2 {
        5 * outs
    } else {
        4 * outs
    }
}

/// Result of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    /// `counts[k - 1]` compressors with `k` inputs
    pub counts: Vec<usize>,
    pub cost: u64,
}

impl Partition {
    /// Input bits consumed
    pub fn inputs(&self) -> usize {
        self.counts.iter().enumerate().map(|(i, c)| (i + 1) * c).sum()
    }

    /// Output bits produced, over all weights
    pub fn outputs(&self) -> usize {
        self.counts
            .iter()
            .enumerate()
            .map(|(i, c)| compressor_outputs(i + 1) * c)
            .sum()
    }

    /// Compressor sizes, largest first
    pub fn sizes(&self) -> impl Iterator<Item = usize> + '_ {
        self.counts
            .iter()
            .enumerate()
            .rev()
            .flat_map(|(i, &c)| std::iter::repeat(i + 1).take(c))
    }
}

/// Memoizing solver for one maximum compressor size
#[derive(Debug, Clone)]
pub struct CompressorSearch {
    max_inputs: usize,
    cache: HashMap<(usize, usize), (u64, Vec<usize>)>,
}

impl CompressorSearch {
    /// Search over compressors of 1 to `max_inputs` inputs
    pub fn new(max_inputs: usize) -> Self {
        Self {
            max_inputs: max_inputs.max(1),
            cache: HashMap::new(),
        }
    }

    pub fn max_inputs(&self) -> usize {
        self.max_inputs
    }

    /// Cheapest partition of `n` bits
    pub fn best(&mut self, n: usize) -> Partition {
        let (cost, mut counts) = self.solve(n, self.max_inputs);
        counts.resize(self.max_inputs, 0);
        trace!(n, cost, ?counts, "compressor partition");
        Partition { counts, cost }
    }

    /// Best `(cost, counts)` for `n` bits using compressors of at most `k`
    /// inputs; `counts` is indexed by `k - 1` and trimmed to `k` entries
    fn solve(&mut self, n: usize, k: usize) -> (u64, Vec<usize>) {
        if n == 0 {
            return (0, vec![0; k]);
        }
        if k == 1 {
            return (compressor_cost(1) * n as u64, vec![n]);
        }
        if let Some(hit) = self.cache.get(&(n, k)) {
            return hit.clone();
        }
        let unit = compressor_cost(k);
        let mut best: Option<(u64, Vec<usize>)> = None;
        for count in (0..=n / k).rev() {
            let (rest_cost, mut rest) = self.solve(n - count * k, k - 1);
            let cost = rest_cost + unit * count as u64;
            if best.as_ref().map_or(true, |(b, _)| cost < *b) {
                rest.resize(k, 0);
                rest[k - 1] = count;
                best = Some((cost, rest));
            }
        }
        let best = best.unwrap_or_else(|| (0, vec![0; k]));
        self.cache.insert((n, k), best.clone());
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outputs() {
        assert_eq!(compressor_outputs(1), 1);
        assert_eq!(compressor_outputs(2), 2);
        assert_eq!(compressor_outputs(3), 2);
        assert_eq!(compressor_outputs(4), 3);
        assert_eq!(compressor_outputs(7), 3);
        assert_eq!(compressor_outputs(8), 4);
    }

    #[test]
    fn test_small_columns() {
        let mut search = CompressorSearch::new(6);
        // two bits pass through
        assert_eq!(search.best(2).counts, vec![2, 0, 0, 0, 0, 0]);
        assert_eq!(search.best(3).counts, vec![0, 0, 1, 0, 0, 0]);
        assert_eq!(search.best(6).counts, vec![0, 0, 0, 0, 0, 1]);
    }

    #[test]
    fn test_partition_consumes_exactly_n() {
        for lut in 1..=6 {
            let mut search = CompressorSearch::new(lut);
            for n in 0..64 {
                let p = search.best(n);
                assert_eq!(p.inputs(), n, "n={n} lut={lut}");
                assert_eq!(p.counts.len(), lut);
                assert_eq!(p.sizes().count(), p.counts.iter().sum::<usize>());
            }
        }
    }

    #[test]
    fn test_compression_reduces_bits() {
        let mut search = CompressorSearch::new(6);
        for n in 3..64 {
            assert!(search.best(n).outputs() < n, "n={n}");
        }
    }

    #[test]
    fn test_memoized_result_is_stable() {
        let mut search = CompressorSearch::new(4);
        let first = search.best(17);
        let second = search.best(17);
        assert_eq!(first, second);
    }
}
