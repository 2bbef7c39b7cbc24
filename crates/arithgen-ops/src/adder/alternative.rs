//! All chunks summed in the first stage, carries rippled one register later

use arithgen_netlist::{ComponentBuilder, Expr};
use arithgen_target::{Target, Vendor};

use super::chunking::{self, InputTiming};
use super::{AdderObjective, AdderPorts, ChunkPlan, SlackVersion};
use crate::error::Result;

/// Cheapest alternative architecture for `objective`
pub fn plan(
    target: &Target,
    width: usize,
    timing: &InputTiming,
    objective: AdderObjective,
    srl: bool,
) -> ChunkPlan {
    let srl = target.vendor == Vendor::Xilinx && srl;
    let w = width as i64;
    let plain = chunking::no_slack(target, width);
    let plain_cost = cost(
        objective,
        srl,
        w,
        plain.count() as i64,
        plain.alpha as i64,
        plain.beta as i64,
    );
    if !timing.has_slack(target) {
        return ChunkPlan::new(plain.chunks, SlackVersion::NoSlack, plain_cost);
    }

    let buffered = match (objective, plain.count()) {
        (AdderObjective::Luts, _) | (AdderObjective::Registers, 1) => plain_cost,
        _ => {
            let k = plain.count() as i64;
            2 * w + 1 + slack_cost(objective, srl, w, k, plain.alpha as i64, plain.beta as i64)
        }
    };
    let Some(adapted) = chunking::with_slack(target, width, timing.delay) else {
        return ChunkPlan::new(plain.chunks, SlackVersion::Buffered, buffered);
    };
    let adapted_cost = slack_cost(
        objective,
        srl,
        w,
        adapted.count() as i64,
        adapted.alpha as i64,
        adapted.beta as i64,
    );
    let keep_adapted = if objective == AdderObjective::Luts && adapted_cost == buffered {
        adapted.count() <= plain.count()
    } else {
        adapted_cost <= buffered
    };
    if keep_adapted {
        ChunkPlan::new(adapted.chunks, SlackVersion::Adapted, adapted_cost)
    } else {
        ChunkPlan::new(plain.chunks, SlackVersion::Buffered, buffered)
    }
}

/// Long register ripples behind late operands share their carry flops
fn slack_cost(objective: AdderObjective, srl: bool, w: i64, k: i64, alpha: i64, beta: i64) -> i64 {
    if objective == AdderObjective::Registers && srl && k > 3 {
        (4 * k - 8) * alpha + 2 * beta + 3 * k - 9
    } else {
        cost(objective, srl, w, k, alpha, beta)
    }
}

fn cost(objective: AdderObjective, srl: bool, w: i64, k: i64, alpha: i64, beta: i64) -> i64 {
    match objective {
        AdderObjective::Luts => {
            if !srl {
                2 * w - alpha + 2 * k - 3
            } else if k == 1 {
                w
            } else if k <= 3 {
                (k - 1) * w - alpha + k * (k - 1) / 2
            } else {
                (4 * k - 10) * alpha + 3 * beta + 3 * k - 7
            }
        }
        AdderObjective::Registers => {
            if k == 1 {
                0
            } else if !srl {
                (k - 1) * w + k * k - 2 * k + 1
            } else if k <= 3 {
                (k - 1) * w + k * (k - 1) / 2
            } else {
                (4 * k - 8) * alpha + 2 * beta + (k - 1) * k / 2
            }
        }
        AdderObjective::Slices => {
            if k == 1 {
                w
            } else if !srl {
                (k - 1) * w + beta + k * k - 2 * k + 1
            } else if k <= 3 {
                (k - 1) * w + beta + (k - 1) * k / 2
            } else {
                (4 * k - 8) * alpha + 3 * beta + (k - 1) * k / 2
            }
        }
    }
}

/// Emit the two-level architecture: every chunk sum in the arrival cycle,
/// then one carry increment per following cycle
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

    let mut first = Vec::with_capacity(k);
    let mut low = 0;
    for (i, &c) in plan.chunks.iter().enumerate() {
        let mut terms = vec![
            Expr::range(ports.x, low + c - 1, low),
            Expr::range(ports.y, low + c - 1, low),
        ];
        if i == 0 {
            terms.push(Expr::signal(ports.cin));
        }
        first.push(b.declare(&format!("s_sum_l0_idx{i}"), c + 1, Expr::add(terms, c + 1))?);
        low += c;
    }

    let mut results = vec![(first[0], plan.chunks[0])];
    for i in 1..k {
        b.next_cycle();
        let c = plan.chunks[i];
        let (prev, prev_width) = results[i - 1];
        let sum = b.declare(
            &format!("s_sum_l1_idx{i}"),
            c + 1,
            Expr::add(vec![Expr::signal(first[i]), Expr::bit(prev, prev_width)], c + 1),
        )?;
        results.push((sum, c));
    }

    b.set_critical_path(target.adder_delay(plan.chunks[k - 1]));
    let parts = results
        .iter()
        .rev()
        .map(|&(sum, c)| Expr::range(sum, c - 1, 0))
        .collect();
    b.assign(ports.r, Expr::concat(parts))?;
    Ok(())
}
