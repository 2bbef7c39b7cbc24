//! Multi-operand integer addition
//!
//! `N` buses of `W` bits, plus an optional carry-in, summed modulo `2^W`.
//! Two interchangeable strategies: a chain of two-operand adders, or a tree
//! of row compressors finished by one adder.

mod compressor_tree;
mod nadder;

use std::fmt;

use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId};
use arithgen_target::{Target, Vendor};
use malachite::base::num::arithmetic::traits::PowerOf2;
use malachite::Natural;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adder::{self, AdditionOperands};
use crate::error::{GenerationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultiAdderStrategy {
    /// Linear chain of pipelined two-operand adders
    NAdder,
    /// Levels of row compressors, then a single two-operand adder
    CompressorTree,
}

impl MultiAdderStrategy {
    /// Compressor trees pay off where LUTs are wide enough to count three bits
    pub fn for_target(target: &Target) -> Self {
        if target.vendor == Vendor::Xilinx && target.lut_inputs() >= 3 {
            MultiAdderStrategy::CompressorTree
        } else {
            MultiAdderStrategy::NAdder
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MultiAdderStrategy::NAdder => "IntNAdder",
            MultiAdderStrategy::CompressorTree => "IntCompressorTree",
        }
    }

    /// Sum `operands` inside `b` and return the `width`-bit result
    pub fn reduce(
        self,
        b: &mut ComponentBuilder,
        target: &Target,
        ctx: &mut GenerationContext,
        operands: Vec<Expr>,
        carry_in: Option<Expr>,
        width: usize,
    ) -> Result<SignalId> {
        if operands.is_empty() {
            return Err(GenerationError::configuration("nothing to add"));
        }
        for operand in &operands {
            let found = b.expr_width(operand)?;
            if found != width {
                return Err(GenerationError::configuration(format!(
                    "{found}-bit operand in a {width}-bit sum"
                )));
            }
        }
        let mut reads = Vec::new();
        for e in operands.iter().chain(carry_in.iter()) {
            e.signals(&mut reads);
        }
        for signal in reads {
            b.sync_cycle_from_signal(signal)?;
        }

        if width == 1 {
            // a sum of single bits modulo 2 is their parity
            b.manage_critical_path(target.lut_delay());
            let parity = operands
                .into_iter()
                .chain(carry_in)
                .reduce(Expr::xor)
                .unwrap_or_else(|| Expr::zeros(1));
            let name = b.unique_name("parity");
            return Ok(b.declare(&name, 1, parity)?);
        }
        if operands.len() == 1 {
            let mut operands = operands;
            let x = operands.remove(0);
            let name = b.unique_name("sum");
            return match carry_in {
                None => Ok(b.declare(&name, width, x)?),
                Some(cin) => adder::emit_addition(
                    b,
                    target,
                    ctx,
                    AdditionOperands {
                        x,
                        y: Expr::zeros(width),
                        carry_in: cin,
                        width,
                        label: format!("{name}_adder"),
                        result: name,
                    },
                ),
            };
        }

        match self {
            MultiAdderStrategy::NAdder => nadder::reduce(b, target, ctx, operands, carry_in, width),
            MultiAdderStrategy::CompressorTree => {
                if target.lut_inputs() < 3 {
                    nadder::reduce(b, target, ctx, operands, carry_in, width)
                } else {
                    compressor_tree::reduce(b, target, ctx, operands, carry_in, width)
                }
            }
        }
    }
}

impl fmt::Display for MultiAdderStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sum operands with the strategy preferred on `target`
pub fn reduce(
    b: &mut ComponentBuilder,
    target: &Target,
    ctx: &mut GenerationContext,
    operands: Vec<Expr>,
    carry_in: Option<Expr>,
    width: usize,
) -> Result<SignalId> {
    MultiAdderStrategy::for_target(target).reduce(b, target, ctx, operands, carry_in, width)
}

/// A standalone multi-operand adder with ports `X0..X{N-1}`, `Cin` and `R`
#[derive(Debug, Clone)]
pub struct IntMultiAdder {
    name: String,
    strategy: MultiAdderStrategy,
}

impl IntMultiAdder {
    pub fn new(
        target: &Target,
        ctx: &mut GenerationContext,
        operands: usize,
        width: usize,
        strategy: Option<MultiAdderStrategy>,
    ) -> Result<Self> {
        if operands == 0 || width == 0 {
            return Err(GenerationError::configuration(format!(
                "cannot add {operands} operands of {width} bits"
            )));
        }
        let strategy = strategy.unwrap_or_else(|| MultiAdderStrategy::for_target(target));
        let name = format!(
            "{}_{}_{}_f{}_uid{}",
            strategy.name(),
            width,
            operands,
            target.frequency_mhz.round() as u64,
            ctx.next_uid()
        );
        let mut b = ComponentBuilder::new(&name, target.clock_period(), target.is_pipelined());
        let xs = (0..operands)
            .map(|i| b.add_input(&format!("X{i}"), width))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let cin = b.add_input("Cin", 1)?;
        let r = b.add_output("R", width)?;
        let sum = strategy.reduce(
            &mut b,
            target,
            ctx,
            xs.into_iter().map(Expr::signal).collect(),
            Some(Expr::signal(cin)),
            width,
        )?;
        b.sync_cycle_from_signal(sum)?;
        b.assign(r, Expr::signal(sum))?;
        let component = b.finish()?;
        debug!(
            component = %name,
            %strategy,
            latency = component.latency,
            "multi-operand adder generated"
        );
        ctx.register(component);
        Ok(Self { name, strategy })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn strategy(&self) -> MultiAdderStrategy {
        self.strategy
    }

    /// Reference result `(Σ x + cin) mod 2^width`
    pub fn emulate(width: usize, operands: &[Natural], carry_in: bool) -> Natural {
        let sum = operands
            .iter()
            .fold(Natural::from(u32::from(carry_in)), |acc, x| acc + x);
        sum % Natural::power_of_2(width as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arithgen_netlist::Simulator;

    fn check(target: &Target, strategy: MultiAdderStrategy, n: usize, width: usize) {
        let mut ctx = GenerationContext::new();
        let adder = IntMultiAdder::new(target, &mut ctx, n, width, Some(strategy)).unwrap();
        let component = ctx.component(adder.name()).unwrap();
        let sim = Simulator::new(&ctx);
        let mask = (1u128 << width) - 1;
        let values: Vec<u128> = (0..n as u128)
            .map(|i| (0x9e37_79b9_7f4a_7c15u128.wrapping_mul(i + 1)) & mask)
            .collect();
        for cin in [0u128, 1] {
            let names: Vec<String> = (0..n).map(|i| format!("X{i}")).collect();
            let mut inputs: Vec<(&str, u128)> =
                names.iter().map(String::as_str).zip(values.iter().copied()).collect();
            inputs.push(("Cin", cin));
            let out = sim.run_u128(component, &inputs).unwrap();
            let expected = values.iter().fold(cin, |acc, v| acc.wrapping_add(*v)) & mask;
            assert_eq!(out["R"], expected, "{strategy} n={n} w={width} cin={cin}");
        }
    }

    #[test]
    fn test_strategies_agree() {
        let target = Target::virtex5();
        for strategy in [MultiAdderStrategy::NAdder, MultiAdderStrategy::CompressorTree] {
            for n in [1, 2, 3, 4, 7] {
                for width in [1, 5, 24, 64] {
                    check(&target, strategy, n, width);
                }
            }
        }
    }

    #[test]
    fn test_strategy_per_vendor() {
        assert_eq!(
            MultiAdderStrategy::for_target(&Target::virtex5()),
            MultiAdderStrategy::CompressorTree
        );
        assert_eq!(
            MultiAdderStrategy::for_target(&Target::stratix4()),
            MultiAdderStrategy::NAdder
        );
    }

    #[test]
    fn test_emulate() {
        let ops = [Natural::from(200u32), Natural::from(100u32)];
        assert_eq!(IntMultiAdder::emulate(8, &ops, true), Natural::from(45u32));
    }

    #[test]
    fn test_rejects_empty() {
        let mut ctx = GenerationContext::new();
        assert!(IntMultiAdder::new(&Target::virtex5(), &mut ctx, 0, 8, None).is_err());
    }
}
