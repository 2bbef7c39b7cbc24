//! Splitting an addition into carry-chain chunks

use arithgen_target::Target;
use serde::Serialize;
use tracing::trace;

/// Arrival of the adder operands, after normalization against the target
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputTiming {
    /// Arrival time within the first computing cycle (ns)
    pub delay: f64,
    /// The operands arrived too late and get one register stage up front
    pub registered: bool,
}

impl InputTiming {
    /// Delays at or below a register plus a local wire count as registered
    /// operands; delays beyond the period force an input register
    pub fn new(target: &Target, max_delay: f64) -> Self {
        let floor = registered_delay(target);
        if max_delay > target.clock_period() && target.is_pipelined() {
            InputTiming {
                delay: floor,
                registered: true,
            }
        } else {
            InputTiming {
                delay: max_delay.max(floor),
                registered: false,
            }
        }
    }

    /// Whether part of the first cycle is already consumed upstream
    pub fn has_slack(&self, target: &Target) -> bool {
        self.delay > registered_delay(target)
    }
}

fn registered_delay(target: &Target) -> f64 {
    target.ff_delay() + target.local_wire_delay()
}

/// Chunk widths of one carry-propagate addition, least significant first
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunking {
    /// Width of the regular chunks
    pub alpha: usize,
    /// Width of the last chunk, 0 for a single chunk
    pub beta: usize,
    /// Width of the slack-adapted first chunk, 0 when there is none
    pub gamma: usize,
    pub chunks: Vec<usize>,
}

impl Chunking {
    pub fn count(&self) -> usize {
        self.chunks.len()
    }

    fn uniform(width: usize, alpha: usize) -> Self {
        let alpha = alpha.clamp(1, width.max(1));
        if alpha >= width {
            return Chunking {
                alpha: width,
                beta: 0,
                gamma: 0,
                chunks: vec![width],
            };
        }
        let beta = match width % alpha {
            0 => alpha,
            r => r,
        };
        let k = width.div_ceil(alpha);
        let mut chunks = vec![alpha; k - 1];
        chunks.push(beta);
        Chunking {
            alpha,
            beta,
            gamma: 0,
            chunks,
        }
    }
}

/// Chunks that each fill one full clock period
pub fn no_slack(target: &Target, width: usize) -> Chunking {
    let chunking = Chunking::uniform(width, target.suggest_subadd_size(width).size);
    trace!(width, chunks = ?chunking.chunks, "full-period chunking");
    chunking
}

/// A first chunk fitted into what remains of the arrival cycle, then
/// full-period chunks; `None` when nothing fits before the next register
pub fn with_first_chunk(target: &Target, width: usize, delay: f64) -> Option<Chunking> {
    let first = target.suggest_slack_subadd_size(width, delay);
    if !first.feasible {
        return None;
    }
    let gamma = first.size;
    if width <= gamma {
        return Some(Chunking {
            alpha: 0,
            beta: 0,
            gamma: width,
            chunks: vec![width],
        });
    }
    let rest = width - gamma;
    let alpha = target.suggest_subadd_size(rest).size.clamp(1, rest);
    let beta = match rest % alpha {
        0 => alpha,
        r => r,
    };
    let middle = (rest - beta) / alpha;
    let mut chunks = Vec::with_capacity(middle + 2);
    chunks.push(gamma);
    chunks.extend(std::iter::repeat(alpha).take(middle));
    chunks.push(beta);
    trace!(width, delay, ?chunks, "slack-adapted chunking");
    Some(Chunking {
        alpha,
        beta,
        gamma,
        chunks,
    })
}

/// Every chunk sized for the slack left in the arrival cycle; `None` when
/// nothing fits before the next register
pub fn with_slack(target: &Target, width: usize, delay: f64) -> Option<Chunking> {
    let suggestion = target.suggest_slack_subadd_size(width, delay);
    if !suggestion.feasible {
        return None;
    }
    Some(Chunking::uniform(width, suggestion.size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_slack_virtex5() {
        let target = Target::virtex5();
        let c = no_slack(&target, 40);
        assert_eq!(c.chunks, vec![40]);

        let c = no_slack(&target, 100);
        assert_eq!(c.alpha, 40);
        assert_eq!(c.beta, 20);
        assert_eq!(c.chunks, vec![40, 40, 20]);
    }

    #[test]
    fn test_exact_multiple_keeps_full_last_chunk() {
        let target = Target::virtex5();
        let c = no_slack(&target, 80);
        assert_eq!(c.chunks, vec![40, 40]);
        assert_eq!(c.beta, 40);
    }

    #[test]
    fn test_first_chunk_shrinks_with_delay() {
        let target = Target::virtex5();
        let delay = 0.5;
        let c = with_first_chunk(&target, 100, delay).unwrap();
        assert!(c.gamma < 40);
        assert_eq!(c.chunks[0], c.gamma);
        assert_eq!(c.chunks.iter().sum::<usize>(), 100);
    }

    #[test]
    fn test_first_chunk_infeasible() {
        let target = Target::virtex5();
        assert!(with_first_chunk(&target, 100, target.clock_period()).is_none());
        assert!(with_slack(&target, 100, target.clock_period()).is_none());
    }

    #[test]
    fn test_input_timing_normalization() {
        let target = Target::virtex5();
        let t = InputTiming::new(&target, 0.0);
        assert!(!t.registered);
        assert!(!t.has_slack(&target));

        let t = InputTiming::new(&target, 1.5);
        assert!(t.has_slack(&target));

        let t = InputTiming::new(&target, 10.0);
        assert!(t.registered);
        assert!(!t.has_slack(&target));
    }
}
