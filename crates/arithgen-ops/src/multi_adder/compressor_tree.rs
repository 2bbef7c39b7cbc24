use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId};
use arithgen_target::Target;
use tracing::{debug, trace};

use crate::adder::{self, AdditionOperands};
use crate::bitheap::{compressor_outputs, CompressorSearch};
use crate::error::Result;

/// Compress rows level by level until two remain, then add them
///
/// At each level the rows are split into groups by the compressor search.
/// A group of `k` rows is counted column by column, and output bit `t` of
/// every column count forms a new row shifted left by `t`. Bits pushed past
/// `width` are dropped.
pub(super) fn reduce(
    b: &mut ComponentBuilder,
    target: &Target,
    ctx: &mut GenerationContext,
    operands: Vec<Expr>,
    carry_in: Option<Expr>,
    width: usize,
) -> Result<SignalId> {
    let prefix = b.unique_name("ctree");
    let mut search = CompressorSearch::new(target.lut_inputs());
    let mut rows = operands;
    let mut level = 0;
    while rows.len() > 2 {
        let partition = search.best(rows.len());
        b.manage_critical_path(target.lut_delay() + target.local_wire_delay());
        let mut next = Vec::with_capacity(partition.outputs());
        let mut pending = rows.into_iter();
        for (g, k) in partition.sizes().enumerate() {
            let group: Vec<Expr> = pending.by_ref().take(k).collect();
            if k == 1 {
                next.extend(group);
                continue;
            }
            let outs = compressor_outputs(k);
            let mut counts = Vec::with_capacity(width);
            for column in 0..width {
                let bits = group.iter().map(|row| row.clone().slice(column, column)).collect();
                counts.push(b.declare(
                    &format!("{prefix}_l{level}_g{g}_c{column}"),
                    outs,
                    Expr::add(bits, outs),
                )?);
            }
            for t in 0..outs.min(width) {
                // row t holds bit t of each column count, moved up t weights
                let mut parts: Vec<Expr> = counts[..width - t]
                    .iter()
                    .rev()
                    .map(|&count| Expr::bit(count, t))
                    .collect();
                if t > 0 {
                    parts.push(Expr::zeros(t));
                }
                let row = b.declare(
                    &format!("{prefix}_l{level}_g{g}_r{t}"),
                    width,
                    Expr::concat(parts),
                )?;
                next.push(Expr::signal(row));
            }
        }
        trace!(level, rows = next.len(), "compressor level");
        rows = next;
        level += 1;
    }
    debug!(levels = level, "compressor tree reduced to two rows");

    let mut rows = rows.into_iter();
    let x = rows.next().unwrap_or_else(|| Expr::zeros(width));
    let y = rows.next().unwrap_or_else(|| Expr::zeros(width));
    adder::emit_addition(
        b,
        target,
        ctx,
        AdditionOperands {
            x,
            y,
            carry_in: carry_in.unwrap_or_else(|| Expr::zeros(1)),
            width,
            label: format!("{prefix}_adder"),
            result: format!("{prefix}_sum"),
        },
    )
}
