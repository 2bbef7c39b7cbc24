//! Ripple of carry-chain chunks with one register between chunks

use arithgen_netlist::{ComponentBuilder, Expr};
use arithgen_target::{Target, Vendor};

use super::chunking::{self, Chunking, InputTiming};
use super::{AdderObjective, AdderPorts, ChunkPlan, SlackVersion};
use crate::error::Result;

/// Cost parameters of one chunking, as signed integers
struct Shape {
    w: i64,
    k: i64,
    alpha: i64,
    beta: i64,
    gamma: i64,
}

impl Shape {
    fn new(width: usize, chunking: &Chunking) -> Self {
        Shape {
            w: width as i64,
            k: chunking.count() as i64,
            alpha: chunking.alpha as i64,
            beta: chunking.beta as i64,
            gamma: chunking.gamma as i64,
        }
    }
}

/// Cheapest classical architecture for `objective`
pub fn plan(
    target: &Target,
    width: usize,
    timing: &InputTiming,
    objective: AdderObjective,
    srl: bool,
) -> ChunkPlan {
    let srl = target.vendor == Vendor::Xilinx && srl;
    let plain = chunking::no_slack(target, width);
    if !timing.has_slack(target) {
        let cost = no_slack_cost(objective, srl, &Shape::new(width, &plain));
        return ChunkPlan::new(plain.chunks, SlackVersion::NoSlack, cost);
    }

    let buffered = buffered_cost(objective, srl, &Shape::new(width, &plain));
    match chunking::with_first_chunk(target, width, timing.delay) {
        Some(adapted) => {
            let cost = adapted_cost(objective, srl, &Shape::new(width, &adapted));
            if cost <= buffered {
                ChunkPlan::new(adapted.chunks, SlackVersion::Adapted, cost)
            } else {
                ChunkPlan::new(plain.chunks, SlackVersion::Buffered, buffered)
            }
        }
        None => ChunkPlan::new(plain.chunks, SlackVersion::Buffered, buffered),
    }
}

fn no_slack_cost(objective: AdderObjective, srl: bool, s: &Shape) -> i64 {
    let Shape { w, k, alpha, beta, .. } = *s;
    match objective {
        AdderObjective::Luts => {
            if srl && k > 2 {
                (4 * k - 10) * alpha + 3 * beta + k - 1
            } else {
                w + k - 1
            }
        }
        AdderObjective::Registers => {
            if k == 1 {
                0
            } else if srl {
                w - beta
            } else {
                (3 * k * k - 7 * k + 4) * alpha / 2 + 2 * (k - 1) * beta + k - 1
            }
        }
        AdderObjective::Slices => {
            if k == 1 {
                w
            } else if srl {
                (4 * k - 7) * alpha + 3 * beta + k - 1
            } else {
                w + ((3 * (k * k - 3 * k + 2)) / 2) * alpha + 2 * (k - 1) * beta
            }
        }
    }
}

fn adapted_cost(objective: AdderObjective, srl: bool, s: &Shape) -> i64 {
    let Shape {
        w,
        k,
        alpha,
        beta,
        gamma,
    } = *s;
    match objective {
        AdderObjective::Luts => {
            if !srl {
                w + k - 1
            } else if k == 1 {
                w
            } else if k == 2 {
                w + 1
            } else if k == 3 {
                w + 2 * beta + 2
            } else {
                w + gamma + (3 * k - 10) * alpha + 2 * beta + k - 1
            }
        }
        AdderObjective::Registers => {
            if k == 1 {
                0
            } else if srl {
                match k {
                    2 => gamma + 2 * alpha + 1,
                    3 => 2 * gamma + 3 * alpha + 2 * beta + 2,
                    _ => 2 * gamma + (4 * k - 9) * alpha + 2 * beta + k - 1,
                }
            } else if k == 2 {
                w + alpha + 1
            } else {
                (k - 1) * gamma + alpha * 3 * (k * k - 3 * k + 2) / 2 + 2 * (k - 1) * beta + k - 1
            }
        }
        AdderObjective::Slices => {
            if k == 1 {
                w
            } else if k == 2 {
                gamma + 3 * alpha + 1
            } else if srl {
                if k == 3 {
                    w + 3 * beta + gamma + 2
                } else {
                    w + gamma + (3 * k - 7) * alpha + 2 * beta + k - 1
                }
            } else {
                w + (k - 2) * gamma + 2 * (k - 1) * beta + alpha * (2 * k * k - 11 * k + 10) / 2
            }
        }
    }
}

fn buffered_cost(objective: AdderObjective, srl: bool, s: &Shape) -> i64 {
    let Shape { w, k, alpha, beta, .. } = *s;
    match objective {
        AdderObjective::Luts => {
            if !srl {
                w + k - 1
            } else if k == 1 {
                w
            } else if k == 2 {
                2 * beta + w + 1
            } else {
                (4 * k - 8) * alpha + 3 * beta + k - 1
            }
        }
        AdderObjective::Registers => {
            if k == 1 {
                2 * w + 1
            } else if srl {
                if k == 2 {
                    3 * alpha + 2 * beta + 2
                } else {
                    (4 * k - 5) * alpha + 2 * beta + k
                }
            } else {
                2 * w + 1 + ((3 * k * k - 7 * k + 4) * alpha / 2 + 2 * (k - 1) * beta + k - 1)
            }
        }
        AdderObjective::Slices => {
            let triangle = (k * k - 3 * k + 2) / 2;
            if k == 1 {
                w
            } else if srl {
                if k == 2 {
                    3 * alpha + 3 * beta + 2
                } else {
                    3 * w + (k - 2) * alpha + k - 1
                }
            } else if k == 2 {
                2 * w + 1 + 3 * triangle * alpha + 2 * (k - 1) * beta
            } else {
                3 * w + 1 + 3 * triangle * alpha + 2 * (k - 1) * beta
            }
        }
    }
}

/// Emit `R = X + Y + Cin` as a registered ripple of the planned chunks
pub fn emit(
    b: &mut ComponentBuilder,
    target: &Target,
    plan: &ChunkPlan,
    timing: &InputTiming,
    ports: &AdderPorts,
) -> Result<()> {
    if plan.slack == SlackVersion::Buffered {
        b.next_cycle();
    }
    let k = plan.chunks.len();
    if k == 1 {
        let arrival = if plan.slack == SlackVersion::Buffered {
            0.0
        } else {
            timing.delay
        };
        b.set_critical_path(arrival + target.adder_delay(ports.width));
        b.assign(ports.r, ports.sum_expr())?;
        return Ok(());
    }

    let mut low = 0;
    let mut sums = Vec::with_capacity(k);
    for (i, &c) in plan.chunks.iter().enumerate() {
        let x = b.declare(&format!("x{i}"), c, Expr::range(ports.x, low + c - 1, low))?;
        let y = b.declare(&format!("y{i}"), c, Expr::range(ports.y, low + c - 1, low))?;
        let carry = match sums.last() {
            None => Expr::signal(ports.cin),
            Some(&(prev, width)) => Expr::bit(prev, width),
        };
        let sum = b.declare(
            &format!("sum{i}"),
            c + 1,
            Expr::add(vec![Expr::signal(x), Expr::signal(y), carry], c + 1),
        )?;
        sums.push((sum, c));
        if i + 1 < k {
            b.next_cycle();
        }
        low += c;
    }

    let arrival = if b.cycle() > 0 { 0.0 } else { timing.delay };
    let last = plan.chunks[k - 1];
    b.set_critical_path(arrival + target.adder_delay(last));
    let parts = sums
        .iter()
        .rev()
        .map(|&(sum, c)| Expr::range(sum, c - 1, 0))
        .collect();
    b.assign(ports.r, Expr::concat(parts))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(w: i64, k: i64, alpha: i64, beta: i64, gamma: i64) -> Shape {
        Shape {
            w,
            k,
            alpha,
            beta,
            gamma,
        }
    }

    #[test]
    fn test_single_chunk_costs() {
        let s = shape(32, 1, 32, 0, 0);
        assert_eq!(no_slack_cost(AdderObjective::Luts, true, &s), 32);
        assert_eq!(no_slack_cost(AdderObjective::Registers, true, &s), 0);
        assert_eq!(no_slack_cost(AdderObjective::Slices, false, &s), 32);
    }

    #[test]
    fn test_single_chunk_adapted_cost_is_not_overwritten() {
        let s = shape(16, 1, 0, 0, 16);
        assert_eq!(adapted_cost(AdderObjective::Registers, true, &s), 0);
        assert_eq!(adapted_cost(AdderObjective::Slices, true, &s), 16);
        assert_eq!(buffered_cost(AdderObjective::Slices, true, &s), 16);
        assert_eq!(buffered_cost(AdderObjective::Registers, false, &s), 33);
    }

    #[test]
    fn test_multi_chunk_costs() {
        // 100 bits as 40 + 40 + 20
        let s = shape(100, 3, 40, 20, 0);
        assert_eq!(no_slack_cost(AdderObjective::Luts, true, &s), 2 * 40 + 60 + 2);
        assert_eq!(no_slack_cost(AdderObjective::Luts, false, &s), 102);
        assert_eq!(no_slack_cost(AdderObjective::Registers, true, &s), 80);
        assert_eq!(
            no_slack_cost(AdderObjective::Registers, false, &s),
            (27 - 21 + 4) * 40 / 2 + 4 * 20 + 2
        );
        assert_eq!(no_slack_cost(AdderObjective::Slices, true, &s), 5 * 40 + 60 + 2);
    }

    #[test]
    fn test_no_slack_plan_on_virtex5() {
        let target = Target::virtex5();
        let timing = InputTiming::new(&target, 0.0);
        let p = plan(&target, 100, &timing, AdderObjective::Slices, true);
        assert_eq!(p.slack, SlackVersion::NoSlack);
        assert_eq!(p.chunks, vec![40, 40, 20]);
    }

    #[test]
    fn test_late_inputs_fall_back_to_buffering() {
        let target = Target::virtex5();
        // leaves no room for even one carry bit before the next register
        let timing = InputTiming::new(&target, 2.4);
        let p = plan(&target, 64, &timing, AdderObjective::Luts, true);
        assert_eq!(p.slack, SlackVersion::Buffered);
    }
}
