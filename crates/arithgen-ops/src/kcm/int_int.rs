//! Exact multiplication of an integer by a non-negative integer constant

use std::str::FromStr;

use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId};
use arithgen_target::Target;
use malachite::{Integer, Natural};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::component_name;
use super::table::KcmTable;
use crate::adder::{self, AdditionOperands};
use crate::bitheap::BitHeap;
use crate::error::{GenerationError, Result};
use crate::multi_adder;
use crate::numeric;

fn default_true() -> bool {
    true
}

/// Parameters of an integer-constant multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntIntKcmParams {
    pub w_in: usize,
    /// Decimal integer
    pub constant: String,
    #[serde(default)]
    pub signed: bool,
    #[serde(default = "default_true")]
    pub use_bit_heap: bool,
    #[serde(default)]
    pub input_delay: f64,
}

impl IntIntKcmParams {
    pub fn new(w_in: usize, constant: &str, signed: bool) -> Self {
        Self {
            w_in,
            constant: constant.to_string(),
            signed,
            use_bit_heap: true,
            input_delay: 0.0,
        }
    }

    pub fn with_bit_heap(mut self, use_bit_heap: bool) -> Self {
        self.use_bit_heap = use_bit_heap;
        self
    }

    pub fn with_input_delay(mut self, delay: f64) -> Self {
        self.input_delay = delay;
        self
    }
}

/// Digit split of an integer-constant multiplier
///
/// All digits are `lut` bits wide except the last one. A 1-bit last digit
/// is folded into its neighbour, giving a last table of `lut + 1` inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct IntIntKcmLayout {
    pub params: IntIntKcmParams,
    pub constant: Integer,
    pub constant_width: usize,
    pub lut: usize,
    pub w_out: usize,
    pub tables: usize,
    pub last_width: usize,
}

impl IntIntKcmLayout {
    pub fn new(target: &Target, params: &IntIntKcmParams) -> Result<Self> {
        if params.w_in == 0 {
            return Err(GenerationError::configuration("input width must be positive"));
        }
        let constant = Integer::from_str(params.constant.trim())
            .map_err(|_| GenerationError::constant(&params.constant, "not a decimal integer"))?;
        let magnitude = Natural::try_from(constant.clone())
            .map_err(|_| GenerationError::constant(&params.constant, "only positive constants are supported"))?;
        // a zero constant still gets one product bit
        let constant_width = numeric::bit_length(&magnitude).max(1);

        let lut = target.lut_inputs();
        let w_in = params.w_in;
        let mut tables = w_in.div_ceil(lut);
        let mut last_width = if w_in % lut == 0 { lut } else { w_in % lut };
        if last_width == 1 && tables > 1 {
            tables -= 1;
            last_width = lut + 1;
        }
        debug!(
            constant = %constant,
            constant_width,
            tables,
            last_width,
            "integer KCM layout"
        );
        Ok(Self {
            params: params.clone(),
            constant,
            constant_width,
            lut,
            w_out: constant_width + w_in,
            tables,
            last_width,
        })
    }

    pub fn base_name(&self) -> String {
        format!(
            "IntIntKCM_{}_{}_{}",
            self.params.w_in,
            self.constant,
            if self.params.signed { "signed" } else { "unsigned" }
        )
    }

    fn table(&self, i: usize) -> KcmTable {
        let input_width = if i + 1 == self.tables {
            self.last_width
        } else {
            self.lut
        };
        KcmTable {
            input_width,
            output_width: self.constant_width + input_width,
            signed: self.params.signed && i + 1 == self.tables,
        }
    }

    /// Exact product of the input bits `x`, in two's complement on `w_out` bits
    pub fn emulate(&self, x: &Natural) -> Natural {
        let x = numeric::decode(x, self.params.w_in, self.params.signed);
        numeric::wrap(&(x * &self.constant), self.w_out)
    }

    fn read_tables(
        &self,
        b: &mut ComponentBuilder,
        x: SignalId,
        table_prefix: &str,
        suffix: &str,
    ) -> Result<Vec<(KcmTable, SignalId)>> {
        let mut products = Vec::with_capacity(self.tables);
        for i in 0..self.tables {
            let table = self.table(i);
            let low = i * self.lut;
            let digit = b.declare(
                &format!("d{i}{suffix}"),
                table.input_width,
                Expr::range(x, low + table.input_width - 1, low),
            )?;
            let rom = table.materialize(&self.constant, format!("{table_prefix}_Table_{i}"));
            let index = b.add_table(rom)?;
            let pp = b.declare(
                &format!("pp{i}{suffix}"),
                table.output_width,
                Expr::lookup(Expr::signal(digit), index),
            )?;
            products.push((table, pp));
        }
        Ok(products)
    }

    fn push_products(&self, heap: &mut BitHeap, products: &[(KcmTable, SignalId)], weight: usize) {
        for (i, (table, pp)) in products.iter().enumerate() {
            let at = weight + i * self.lut;
            if table.signed {
                heap.add_signed_bit_vector(at, *pp, table.output_width);
            } else {
                heap.add_unsigned_bit_vector(at, *pp, table.output_width);
            }
        }
    }
}

/// A generated integer-constant multiplier with ports `X` and `R`
#[derive(Debug, Clone)]
pub struct IntIntKcm {
    name: String,
    layout: IntIntKcmLayout,
}

impl IntIntKcm {
    pub fn new(target: &Target, ctx: &mut GenerationContext, params: &IntIntKcmParams) -> Result<Self> {
        let layout = IntIntKcmLayout::new(target, params)?;
        let name = component_name(ctx, layout.base_name());
        let lut = layout.lut;
        let cw = layout.constant_width;

        let mut b = ComponentBuilder::new(&name, target.clock_period(), target.is_pipelined());
        b.set_input_delay(params.input_delay.min(target.clock_period()));
        let x = b.add_input("X", params.w_in)?;
        let r = b.add_output("R", layout.w_out)?;
        b.manage_critical_path(target.local_wire_delay() + target.lut_delay());
        let products = layout.read_tables(&mut b, x, &name, "")?;

        let result = if products.len() == 1 {
            Expr::signal(products[0].1)
        } else if params.use_bit_heap {
            let mut heap = BitHeap::new(ctx, layout.w_out);
            layout.push_products(&mut heap, &products, 0);
            let sum = heap.compress(&mut b, target, ctx)?;
            b.sync_cycle_from_signal(sum)?;
            Expr::signal(sum)
        } else {
            // the low digit of table 0 is final; everything else is summed above it
            let n = products.len();
            let size = (n - 2) * lut + layout.last_width + cw;
            let mut operands = Vec::with_capacity(n);
            for (i, (table, pp)) in products.iter().enumerate() {
                let high = if i == 0 {
                    Expr::range(*pp, table.output_width - 1, lut)
                } else {
                    Expr::signal(*pp)
                };
                let high_width = if i == 0 { cw } else { table.output_width };
                let mut parts = Vec::new();
                let shift = if i == 0 { 0 } else { (i - 1) * lut };
                if shift + high_width < size {
                    parts.push(Expr::zeros(size - shift - high_width));
                }
                parts.push(high);
                if shift > 0 {
                    parts.push(Expr::zeros(shift));
                }
                operands.push(b.declare(&format!("addOp{i}"), size, Expr::concat(parts))?);
            }
            let sum = if n > 2 {
                multi_adder::reduce(
                    &mut b,
                    target,
                    ctx,
                    operands.into_iter().map(Expr::signal).collect(),
                    None,
                    size,
                )?
            } else {
                adder::emit_addition(
                    &mut b,
                    target,
                    ctx,
                    AdditionOperands {
                        x: Expr::signal(operands[0]),
                        y: Expr::signal(operands[1]),
                        carry_in: Expr::zeros(1),
                        width: size,
                        label: "Result_Adder".to_string(),
                        result: "OutRes".to_string(),
                    },
                )?
            };
            b.sync_cycle_from_signal(sum)?;
            Expr::concat(vec![
                Expr::signal(sum),
                Expr::range(products[0].1, lut - 1, 0),
            ])
        };
        b.assign(r, result)?;

        let component = b.finish()?;
        debug!(
            component = %name,
            tables = layout.tables,
            latency = component.latency,
            "IntIntKCM generated"
        );
        ctx.register(component);
        Ok(Self { name, layout })
    }

    /// Emit the tables into `parent` and push the product into `heap` at `weight`
    pub fn add_to_bit_heap(
        target: &Target,
        ctx: &mut GenerationContext,
        params: &IntIntKcmParams,
        parent: &mut ComponentBuilder,
        x: SignalId,
        heap: &mut BitHeap,
        weight: usize,
    ) -> Result<IntIntKcmLayout> {
        let layout = IntIntKcmLayout::new(target, params)?;
        let found = parent.width(x)?;
        if found != params.w_in {
            return Err(GenerationError::configuration(format!(
                "multiplicand has {found} bits, expected {}",
                params.w_in
            )));
        }
        parent.sync_cycle_from_signal(x)?;
        parent.manage_critical_path(target.local_wire_delay() + target.lut_delay());
        let uid = ctx.next_uid();
        let products = layout.read_tables(
            parent,
            x,
            &format!("{}_uid{}", layout.base_name(), uid),
            &format!("_intKcm{uid}"),
        )?;
        layout.push_products(heap, &products, weight);
        debug!(heap = heap.uid(), weight, tables = layout.tables, "integer KCM products added to bit heap");
        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &IntIntKcmLayout {
        &self.layout
    }

    pub fn emulate(&self, x: &Natural) -> Natural {
        self.layout.emulate(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arithgen_netlist::Simulator;

    fn check_all(target: &Target, params: &IntIntKcmParams) -> IntIntKcm {
        let mut ctx = GenerationContext::new();
        let kcm = IntIntKcm::new(target, &mut ctx, params).unwrap();
        let component = ctx.component(kcm.name()).unwrap();
        let sim = Simulator::new(&ctx);
        for x in 0..1u128 << params.w_in {
            let out = sim.run_u128(component, &[("X", x)]).unwrap();
            let expected = kcm.emulate(&Natural::from(x));
            assert_eq!(Natural::from(out["R"]), expected, "{}: x={x}", kcm.name());
        }
        kcm
    }

    #[test]
    fn test_layout() {
        let target = Target::virtex5();
        let layout = IntIntKcmLayout::new(&target, &IntIntKcmParams::new(13, "1000", false)).unwrap();
        // 6 + 6 + 1: the last bit joins its neighbour
        assert_eq!(layout.tables, 2);
        assert_eq!(layout.last_width, 7);
        assert_eq!(layout.constant_width, 10);
        assert_eq!(layout.w_out, 23);
        let even = IntIntKcmLayout::new(&target, &IntIntKcmParams::new(12, "5", false)).unwrap();
        assert_eq!((even.tables, even.last_width), (2, 6));
    }

    #[test]
    fn test_single_table() {
        check_all(&Target::virtex5(), &IntIntKcmParams::new(5, "23", false));
        check_all(&Target::virtex5(), &IntIntKcmParams::new(6, "23", true));
    }

    #[test]
    fn test_bit_heap_and_adders_agree() {
        let target = Target::virtex4();
        for signed in [false, true] {
            for w in [9, 10, 12] {
                let params = IntIntKcmParams::new(w, "4093", signed);
                check_all(&target, &params);
                check_all(&target, &params.clone().with_bit_heap(false));
            }
        }
    }

    #[test]
    fn test_zero_constant() {
        check_all(&Target::virtex4(), &IntIntKcmParams::new(9, "0", false));
    }

    #[test]
    fn test_rejects_negative_constant() {
        let mut ctx = GenerationContext::new();
        let err = IntIntKcm::new(&Target::virtex5(), &mut ctx, &IntIntKcmParams::new(8, "-3", false))
            .unwrap_err();
        assert!(matches!(err, GenerationError::ConstantParse { .. }));
        let err = IntIntKcm::new(&Target::virtex5(), &mut ctx, &IntIntKcmParams::new(8, "pi", false))
            .unwrap_err();
        assert!(matches!(err, GenerationError::ConstantParse { .. }));
    }

    #[test]
    fn test_incorporated_into_shared_heap() {
        let target = Target::virtex4();
        let mut ctx = GenerationContext::new();
        let mut b = ComponentBuilder::new("dot", target.clock_period(), true);
        let x = b.add_input("X", 8).unwrap();
        let y = b.add_input("Y", 8).unwrap();
        let r = b.add_output("R", 16).unwrap();
        let mut heap = BitHeap::new(&mut ctx, 16);
        // 3 * sx + 20 * sy
        let p3 = IntIntKcmParams::new(8, "3", true);
        let p20 = IntIntKcmParams::new(8, "20", true);
        IntIntKcm::add_to_bit_heap(&target, &mut ctx, &p3, &mut b, x, &mut heap, 0).unwrap();
        IntIntKcm::add_to_bit_heap(&target, &mut ctx, &p20, &mut b, y, &mut heap, 0).unwrap();
        let sum = heap.compress(&mut b, &target, &mut ctx).unwrap();
        b.assign(r, Expr::signal(sum)).unwrap();
        let c = b.finish().unwrap();
        let sim = Simulator::new(&ctx);
        let signed = |v: u128| if v >= 128 { v as i64 - 256 } else { v as i64 };
        for (xv, yv) in [(0u128, 0u128), (1, 1), (127, 200), (128, 255), (255, 127), (77, 3)] {
            let out = sim.run_u128(&c, &[("X", xv), ("Y", yv)]).unwrap();
            let expected = (3 * signed(xv) + 20 * signed(yv)).rem_euclid(1 << 16) as u128;
            assert_eq!(out["R"], expected, "x={xv} y={yv}");
        }
    }
}
