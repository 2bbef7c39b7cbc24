//! Carry-select adder with a short secondary carry chain
//!
//! Every chunk above the first is summed twice in parallel, once for each
//! possible incoming carry. The real carries come out of one narrow
//! addition over interleaved generate/propagate bits, and the final result
//! is a mux per chunk. Wider inputs fall onto slower latency tiers:
//!
//! | tier | chunks | extra registers |
//! |------|--------|-----------------|
//! | 0 | two halves | none |
//! | 1 | two first-level chunks, then shrinking by 2 | none |
//! | 2 | slack-sized chunks | before the carry addition |
//! | 3 | full-period chunks | before and after the carry addition |
//! | 4 | none fits | not implementable |

use arithgen_netlist::{ComponentBuilder, Expr, SignalId};
use arithgen_target::Target;
use serde::Serialize;
use tracing::trace;

use super::chunking::InputTiming;
use super::{AdderObjective, AdderPorts};
use crate::error::Result;

/// Chunk widths and latency tier of a carry-select adder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortLatencyPlan {
    pub chunks: Vec<usize>,
    pub tier: u8,
    pub cost: i64,
}

/// Cheapest carry-select architecture for `objective`
///
/// Only registered operands are supported; `None` also stands for the
/// unimplementable tier.
pub fn plan(
    target: &Target,
    width: usize,
    timing: &InputTiming,
    objective: AdderObjective,
    srl: bool,
) -> Option<ShortLatencyPlan> {
    if width < 2 || !target.is_pipelined() || timing.has_slack(target) {
        return None;
    }
    let (chunks, tier) = split(target, width);
    let w = width as i64;
    let k = chunks.len() as i64;
    let c0 = chunks[0] as i64;
    let c1 = chunks.get(1).copied().unwrap_or(0) as i64;
    let cost = match objective {
        AdderObjective::Luts => match tier {
            0 => c0 + 3 * c1,
            1 | 2 => 3 * w - 2 * c0 + 2 * (k - 2),
            3 if srl => 5 * w - 3 * c0 + 2 * (k - 2) + 1,
            3 => 3 * w - 2 * c0 + 2 * (k - 2),
            _ => return None,
        },
        AdderObjective::Registers => match tier {
            0 | 1 => 0,
            2 => 2 * w - c0 + 2 * (k - 2) + 1,
            3 if srl => 2 * w - c0 + 3 * (k - 2) + 1,
            3 => 4 * w - 2 * c0 + 3 * k - 4,
            _ => return None,
        },
        AdderObjective::Slices => {
            let doubled = match tier {
                0 => c0 + 3 * c1,
                1 => 3 * w - 2 * c0 + 2 * (k - 2),
                2 => 3 * w - 2 * c0 + 4 * (k - 2) + 1,
                3 => 5 * w - 3 * c0 + 5 * (k - 2) + 1,
                _ => return None,
            };
            (doubled + 1).div_euclid(2)
        }
    };
    trace!(width, tier, ?chunks, cost, "short-latency plan");
    Some(ShortLatencyPlan { chunks, tier, cost })
}

/// Chunk widths and tier for a `width`-bit carry-select adder
fn split(target: &Target, width: usize) -> (Vec<usize>, u8) {
    let period = target.clock_period();
    let select = target.lut_delay() + target.local_wire_delay();
    let (k1, k2) = target.adder_parameters();
    let alpha0 = target.suggest_slack_subadd_size(width, select).size;
    let alpha = target.suggest_subadd_size(width).size;

    let u = ((period - select - 2.0 * k1 + 2.0 * k2) / k2).floor().max(0.0) as usize;
    let max_width = if u % 2 == 0 {
        2 * alpha0 + u * (u + 2) / 4
    } else {
        2 * alpha0 + (u + 1) * (u + 1) / 4
    };
    let u2 = ((period - select - k1 + k2) / (2.0 * k2)).floor().max(-2.0) as i64;
    let u3 = ((period - k1 + k2) / (2.0 * k2)).floor().max(-2.0) as i64;

    if width <= 2 * alpha0 {
        let low = width / 2;
        return (vec![low, width - low], 0);
    }
    if width <= max_width {
        let mut chunks = vec![alpha0, alpha0];
        let mut rest = width - 2 * alpha0;
        let mut step = u;
        while rest > 0 {
            let c = step.max(1).min(rest);
            chunks.push(c);
            rest -= c;
            step = step.saturating_sub(2);
        }
        return (chunks, 1);
    }
    if (width as i64) <= (u2 + 2) * alpha0 as i64 {
        return (uniform(width, alpha0), 2);
    }
    if (width as i64) <= (u3 + 2) * alpha as i64 {
        return (uniform(width, alpha), 3);
    }
    (uniform(width, alpha), 4)
}

fn uniform(width: usize, size: usize) -> Vec<usize> {
    let size = size.max(1);
    let k = width.div_ceil(size);
    let mut chunks = vec![size; k - 1];
    chunks.push(width - size * (k - 1));
    chunks
}

/// Emit the carry-select network for `plan`
pub fn emit(
    b: &mut ComponentBuilder,
    target: &Target,
    plan: &ShortLatencyPlan,
    ports: &AdderPorts,
) -> Result<()> {
    let chunks = &plan.chunks;
    let k = chunks.len();

    let c0 = chunks[0];
    let first = b.declare(
        "sX0_0_l1_Cin",
        c0 + 1,
        Expr::add(
            vec![
                Expr::range(ports.x, c0 - 1, 0),
                Expr::range(ports.y, c0 - 1, 0),
                Expr::signal(ports.cin),
            ],
            c0 + 1,
        ),
    )?;
    let carry0 = Expr::bit(first, c0);

    // index j holds chunk j + 1 summed with an incoming carry of 0 and of 1
    let mut zero: Vec<SignalId> = Vec::with_capacity(k);
    let mut one: Vec<SignalId> = Vec::with_capacity(k);
    let mut low = c0;
    for (j, &c) in chunks.iter().enumerate().skip(1) {
        let x = Expr::range(ports.x, low + c - 1, low);
        let y = Expr::range(ports.y, low + c - 1, low);
        zero.push(b.declare(
            &format!("sX{j}_0_l1_Zero"),
            c + 1,
            Expr::add(vec![x.clone(), y.clone()], c + 1),
        )?);
        one.push(b.declare(
            &format!("sX{j}_0_l1_One"),
            c + 1,
            Expr::add(vec![x, y, Expr::ones(1)], c + 1),
        )?);
        low += c;
    }

    // bit 2m carries chunk m+1; odd bits propagate between chunks
    let mut raw = None;
    if k > 2 {
        let string = |sums: &[SignalId], filler: bool| -> Vec<Expr> {
            (0..2 * (k - 2))
                .rev()
                .map(|i| {
                    if i % 2 == 0 {
                        let m = i / 2;
                        Expr::bit(sums[m], chunks[m + 1])
                    } else if filler {
                        Expr::ones(1)
                    } else {
                        Expr::zeros(1)
                    }
                })
                .collect()
        };
        let width = 2 * (k - 2);
        let zero_string = b.declare("carryStringZero", width, Expr::concat(string(&zero, false)))?;
        let one_string = b.declare("carryStringOne", width, Expr::concat(string(&one, true)))?;
        if plan.tier > 1 {
            b.next_cycle();
        }
        raw = Some(b.declare(
            "rawCarrySum",
            width,
            Expr::add(
                vec![
                    Expr::signal(one_string),
                    Expr::signal(zero_string),
                    carry0.clone(),
                ],
                width,
            ),
        )?);
        if plan.tier > 2 {
            b.next_cycle();
        }
    }

    let mut results = Vec::with_capacity(k);
    results.push(b.declare("res0", c0, Expr::range(first, c0 - 1, 0))?);
    for i in 1..k {
        let c = chunks[i];
        let z = Expr::range(zero[i - 1], c - 1, 0);
        let o = Expr::range(one[i - 1], c - 1, 0);
        let expr = match (i, raw) {
            (1, _) | (_, None) => Expr::mux(carry0.clone(), o, z),
            (_, Some(raw)) => Expr::mux(Expr::bit(raw, 2 * (i - 2) + 1), z, o),
        };
        results.push(b.declare(&format!("res{i}"), c, expr)?);
    }

    b.set_critical_path(target.adder_delay(chunks[k - 1]));
    let parts = results.iter().rev().map(|&r| Expr::signal(r)).collect();
    b.assign(ports.r, Expr::concat(parts))?;
    Ok(())
}
