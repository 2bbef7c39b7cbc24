use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId};
use arithgen_target::Target;
use tracing::trace;

use crate::adder::{self, AdditionOperands};
use crate::error::Result;

/// Accumulate the operands one two-operand adder at a time
///
/// The carry-in enters the first adder.
pub(super) fn reduce(
    b: &mut ComponentBuilder,
    target: &Target,
    ctx: &mut GenerationContext,
    operands: Vec<Expr>,
    carry_in: Option<Expr>,
    width: usize,
) -> Result<SignalId> {
    let prefix = b.unique_name("nadd");
    let mut operands = operands.into_iter();
    let mut acc = operands.next().unwrap_or_else(|| Expr::zeros(width));
    let mut carry = Some(carry_in.unwrap_or_else(|| Expr::zeros(1)));
    let mut last = None;
    for (i, operand) in operands.enumerate() {
        let sum = adder::emit_addition(
            b,
            target,
            ctx,
            AdditionOperands {
                x: acc,
                y: operand,
                carry_in: carry.take().unwrap_or_else(|| Expr::zeros(1)),
                width,
                label: format!("{prefix}_adder{i}"),
                result: format!("{prefix}_s{i}"),
            },
        )?;
        trace!(step = i, cycle = b.cycle(), "partial sum");
        acc = Expr::signal(sum);
        last = Some(sum);
    }
    match last {
        Some(sum) => Ok(sum),
        None => Ok(b.declare(&format!("{prefix}_s"), width, acc)?),
    }
}
