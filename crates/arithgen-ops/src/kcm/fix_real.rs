//! Faithful multiplication of a fixed-point input by a real constant
//!
//! The input `X` has weights `lsb_in..=msb_in` (plus a sign bit when
//! signed). The output `R` has LSB `lsb_out` and satisfies
//! `|R * 2^lsb_out - X * C| < target_ulp_error * 2^lsb_out`.
//!
//! All tables are scaled to one common grid carrying `g` guard bits below
//! `lsb_out`. The last table adds the half-ulp that turns the final
//! truncation by `g` bits into a rounding.

use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId};
use arithgen_target::Target;
use malachite::base::num::arithmetic::traits::PowerOf2;
use malachite::base::rounding_modes::RoundingMode;
use malachite::rational::Rational;
use malachite::{Integer, Natural};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::sizing::{guard_bits, size_tables};
use super::table::FixRealKcmTable;
use super::{component_name, identifier, signed_identifier};
use crate::adder::{self, AdditionOperands};
use crate::bitheap::BitHeap;
use crate::constant::Constant;
use crate::error::{GenerationError, Result};
use crate::numeric;

fn default_ulp_error() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Parameters of a fixed-point real-constant multiplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixRealKcmParams {
    pub lsb_in: i32,
    pub msb_in: i32,
    #[serde(default)]
    pub signed: bool,
    pub lsb_out: i32,
    /// Constant expression, e.g. `"1/3"` or `"-sqrt(2)/2"`
    pub constant: String,
    /// Allowed error in units of `2^lsb_out`, within `[0.5, 1]`
    #[serde(default = "default_ulp_error")]
    pub target_ulp_error: f64,
    /// Sum the tables in a bit heap rather than with a chain of adders
    #[serde(default = "default_true")]
    pub use_bit_heap: bool,
    /// Arrival time of `X` within cycle 0 (ns)
    #[serde(default)]
    pub input_delay: f64,
}

impl FixRealKcmParams {
    pub fn new(lsb_in: i32, msb_in: i32, signed: bool, lsb_out: i32, constant: &str) -> Self {
        Self {
            lsb_in,
            msb_in,
            signed,
            lsb_out,
            constant: constant.to_string(),
            target_ulp_error: default_ulp_error(),
            use_bit_heap: true,
            input_delay: 0.0,
        }
    }

    pub fn with_target_ulp_error(mut self, target_ulp_error: f64) -> Self {
        self.target_ulp_error = target_ulp_error;
        self
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

/// Formats and tables derived from [`FixRealKcmParams`] on a target
#[derive(Debug, Clone, PartialEq)]
pub struct FixRealKcmLayout {
    pub params: FixRealKcmParams,
    pub constant: Constant,
    pub w_in: usize,
    pub msb_out: i32,
    /// Output width, sign bit included
    pub w_out: usize,
    pub guard_bits: usize,
    /// Index order: table 0 reads the least significant digit
    pub tables: Vec<FixRealKcmTable>,
}

impl FixRealKcmLayout {
    pub fn new(target: &Target, params: &FixRealKcmParams) -> Result<Self> {
        if params.lsb_in > params.msb_in {
            return Err(GenerationError::configuration(format!(
                "lsb_in ({}) is above msb_in ({})",
                params.lsb_in, params.msb_in
            )));
        }
        if !(0.5..=1.0).contains(&params.target_ulp_error) {
            return Err(GenerationError::configuration(format!(
                "target ulp error {} should be between 0.5 and 1",
                params.target_ulp_error
            )));
        }
        let constant = Constant::parse(&params.constant)?;
        let sign_bit = params.signed || constant.is_negative();
        let w_in = (params.msb_in - params.lsb_in + 1) as usize + usize::from(params.signed);

        let msb_out = (constant.msb() as i32 + params.msb_in).max(params.lsb_out);
        let w_out = (msb_out - params.lsb_out + 1) as usize + usize::from(sign_bit);

        let sizes = size_tables(w_in, target.lut_inputs());
        let n = sizes.len();
        let g = guard_bits(n, params.lsb_out, params.target_ulp_error)?.max(0);
        let width = w_out + g as usize;
        let sum_width = width + 1;
        let shift = i64::from(params.lsb_in - params.lsb_out) + i64::from(g);

        // output widths shrink by each digit size going down from the last table
        let mut tables = Vec::with_capacity(n);
        let mut low = w_in;
        let mut pp = width as i64;
        for i in (0..n).rev() {
            low -= sizes[i];
            let last = i == n - 1;
            let mut table = FixRealKcmTable {
                index: i,
                weight: low,
                input_width: sizes[i],
                output_width: if last && params.signed {
                    sum_width
                } else {
                    pp.clamp(1, width as i64) as usize
                },
                signed: last && params.signed,
                last: last && n > 1,
                shift,
                guard_bits: g,
            };
            pp -= sizes[i] as i64;
            if !table.signed {
                // rounding up may need one more bit than the exact product
                while table.output_width < sum_width
                    && table.max_unsigned_entry(&constant)
                        >= Integer::power_of_2(table.output_width as u64)
                {
                    table.output_width += 1;
                }
            }
            trace!(
                table = i,
                input = table.input_width,
                output = table.output_width,
                weight = table.weight,
                "KCM table"
            );
            tables.push(table);
        }
        tables.reverse();

        debug!(
            constant = %constant,
            msb_c = constant.msb(),
            msb_out,
            w_out,
            tables = n,
            guard_bits = g,
            "KCM layout"
        );
        Ok(Self {
            params: params.clone(),
            constant,
            w_in,
            msb_out,
            w_out,
            guard_bits: g as usize,
            tables,
        })
    }

    /// Width of the internal sum, `w_out + g` plus a carry bit
    pub fn sum_width(&self) -> usize {
        self.w_out + self.guard_bits + 1
    }

    pub fn sign_bit(&self) -> bool {
        self.params.signed || self.constant.is_negative()
    }

    pub fn base_name(&self) -> String {
        format!(
            "FixRealKCM_{}_{}_{}_{}_{}",
            signed_identifier(self.params.lsb_in),
            signed_identifier(self.params.msb_in),
            signed_identifier(self.params.lsb_out),
            identifier(&self.params.constant),
            if self.params.signed { "signed" } else { "unsigned" }
        )
    }

    /// The two accepted outputs for input bits `x`: `x * C` rounded down and up
    pub fn emulate(&self, x: &Natural) -> (Integer, Integer) {
        let x = numeric::decode(x, self.w_in, self.params.signed);
        let exact = Rational::from(x)
            * self.constant.value()
            * Rational::power_of_2(i64::from(self.params.lsb_in - self.params.lsb_out));
        (
            numeric::round(&exact, RoundingMode::Floor),
            numeric::round(&exact, RoundingMode::Ceiling),
        )
    }

    /// Slice `x` into digits and read every table, partial products in index order
    fn read_tables(
        &self,
        b: &mut ComponentBuilder,
        x: SignalId,
        table_prefix: &str,
        suffix: &str,
    ) -> Result<Vec<SignalId>> {
        let mut products = Vec::with_capacity(self.tables.len());
        for t in &self.tables {
            let digit = b.declare(
                &format!("d{}{}", t.index, suffix),
                t.input_width,
                Expr::range(x, t.weight + t.input_width - 1, t.weight),
            )?;
            let rom = t.materialize(&self.constant, format!("{}_Table_{}", table_prefix, t.index));
            let index = b.add_table(rom)?;
            products.push(b.declare(
                &format!("pp{}{}", t.index, suffix),
                t.output_width,
                Expr::lookup(Expr::signal(digit), index),
            )?);
        }
        Ok(products)
    }

    /// Push the partial products at `weight`, re-applying the constant's sign
    fn push_products(&self, heap: &mut BitHeap, products: &[SignalId], weight: usize) {
        let negative = self.constant.is_negative();
        for (t, &pp) in self.tables.iter().zip(products) {
            match (negative, t.signed) {
                (false, false) => heap.add_unsigned_bit_vector(weight, pp, t.output_width),
                (false, true) => heap.add_signed_bit_vector(weight, pp, t.output_width),
                (true, false) => heap.subtract_unsigned_bit_vector(weight, pp, t.output_width),
                (true, true) => heap.subtract_signed_bit_vector(weight, pp, t.output_width),
            }
        }
        if negative && self.guard_bits > 0 {
            // the half-ulp was negated with the products: add back one ulp
            heap.add_constant(&Integer::from(1u32), weight + self.guard_bits);
        }
    }

    /// `R` out of the internal sum
    ///
    /// The carry bit is only set when rounding up went past the largest
    /// output; that output is then the rounded-down product.
    fn saturate(&self, sum: SignalId) -> Expr {
        let width = self.sum_width();
        let body = Expr::range(sum, width - 2, self.guard_bits);
        if self.sign_bit() {
            let overflow = Expr::bit(sum, width - 1).not().and(Expr::bit(sum, width - 2));
            let max = Expr::concat(vec![Expr::zeros(1), Expr::ones(self.w_out - 1)]);
            Expr::mux(overflow, max, body)
        } else {
            Expr::mux(Expr::bit(sum, width - 1), Expr::ones(self.w_out), body)
        }
    }

    /// `-sum`, plus one ulp when the sum carried the rounding half-ulp
    fn negate(
        &self,
        b: &mut ComponentBuilder,
        target: &Target,
        ctx: &mut GenerationContext,
        sum: SignalId,
    ) -> Result<SignalId> {
        let width = self.sum_width();
        let ulp = if self.guard_bits > 0 {
            Natural::power_of_2(self.guard_bits as u64)
        } else {
            Natural::from(0u32)
        };
        adder::emit_addition(
            b,
            target,
            ctx,
            AdditionOperands {
                x: Expr::signal(sum).not(),
                y: Expr::Const(numeric::natural_to_bits(&ulp, width)),
                carry_in: Expr::ones(1),
                width,
                label: "Negate_Adder".to_string(),
                result: "OutRes".to_string(),
            },
        )
    }
}

/// Register placement of the adder chain, evaluated ahead of emission
#[derive(Debug, Clone, PartialEq)]
pub struct RakeSchedule {
    /// Register `X` before the first table
    pub register_inputs: bool,
    /// Register before step `i` (table 0, then each partial sum)
    pub registers: Vec<bool>,
    /// Critical path at the end of the chain
    pub critical_path: f64,
}

impl RakeSchedule {
    /// Table 0 costs a LUT, step 1 an adder as wide as its operand, and the
    /// later steps one small adder each
    pub fn new(target: &Target, input_delay: f64, output_widths: &[usize]) -> Self {
        let period = target.clock_period();
        let pipelined = target.is_pipelined();
        let mut slack = period - input_delay;
        let register_inputs = pipelined && slack < 0.0;
        if register_inputs {
            slack = period - target.ff_delay();
        }
        let mut registers = Vec::with_capacity(output_widths.len());
        for (i, &width) in output_widths.iter().enumerate() {
            let step = target.local_wire_delay_with_fanout(width)
                + match i {
                    0 => target.lut_delay(),
                    1 => target.adder_delay(width),
                    _ => target.adder_delay(target.lut_inputs() - 1),
                };
            slack -= step;
            let register = pipelined && slack < 0.0;
            if register {
                slack = period - target.ff_delay() - step;
            }
            registers.push(register);
        }
        Self {
            register_inputs,
            registers,
            critical_path: period - slack,
        }
    }
}

/// A generated fixed-point real-constant multiplier with ports `X` and `R`
#[derive(Debug, Clone)]
pub struct FixRealKcm {
    name: String,
    layout: FixRealKcmLayout,
}

impl FixRealKcm {
    pub fn new(target: &Target, ctx: &mut GenerationContext, params: &FixRealKcmParams) -> Result<Self> {
        let layout = FixRealKcmLayout::new(target, params)?;
        let name = component_name(ctx, layout.base_name());
        let width = layout.sum_width();
        let g = layout.guard_bits;
        let negative = layout.constant.is_negative();

        let mut b = ComponentBuilder::new(&name, target.clock_period(), target.is_pipelined());
        b.set_input_delay(params.input_delay.min(target.clock_period()));
        let x = b.add_input("X", layout.w_in)?;
        let r = b.add_output("R", layout.w_out)?;
        let table_read = target.local_wire_delay() + target.lut_delay();

        let out = match layout.tables.len() {
            1 => {
                b.manage_critical_path(table_read);
                let y = layout.read_tables(&mut b, x, &name, "")?[0];
                let y = Expr::signal(y).zero_extend(layout.tables[0].output_width, width);
                if negative {
                    b.manage_critical_path(table_read);
                    b.declare(
                        "Y_negated",
                        width,
                        Expr::add(vec![y.not(), Expr::constant_u64(1, width)], width),
                    )?
                } else {
                    b.declare("Y", width, y)?
                }
            }
            2 => {
                b.manage_critical_path(table_read);
                let pp = layout.read_tables(&mut b, x, &name, "")?;
                let sum = adder::emit_addition(
                    &mut b,
                    target,
                    ctx,
                    AdditionOperands {
                        x: Expr::signal(pp[0]).zero_extend(layout.tables[0].output_width, width),
                        y: Expr::signal(pp[1]).zero_extend(layout.tables[1].output_width, width),
                        carry_in: Expr::zeros(1),
                        width,
                        label: "Result_Adder".to_string(),
                        result: if negative { "OutRes_int" } else { "OutRes" }.to_string(),
                    },
                )?;
                if negative {
                    layout.negate(&mut b, target, ctx, sum)?
                } else {
                    sum
                }
            }
            _ if params.use_bit_heap => {
                b.manage_critical_path(table_read);
                let pp = layout.read_tables(&mut b, x, &name, "")?;
                let mut heap = BitHeap::new(ctx, width);
                layout.push_products(&mut heap, &pp, 0);
                let sum = heap.compress(&mut b, target, ctx)?;
                b.sync_cycle_from_signal(sum)?;
                sum
            }
            _ => {
                let widths: Vec<usize> = layout.tables.iter().map(|t| t.output_width).collect();
                let schedule = RakeSchedule::new(target, b.critical_path(), &widths);
                trace!(?schedule, "adder chain schedule");
                if schedule.register_inputs {
                    b.next_cycle();
                }
                let pp = layout.read_tables(&mut b, x, &name, "")?;
                if schedule.registers[0] {
                    b.next_cycle();
                }
                let mut acc = b.declare(
                    "sum0",
                    width,
                    Expr::signal(pp[0]).zero_extend(widths[0], width),
                )?;
                for i in 1..pp.len() {
                    if schedule.registers[i] {
                        b.next_cycle();
                    }
                    acc = b.declare(
                        &format!("sum{i}"),
                        width,
                        Expr::add(vec![Expr::signal(pp[i]), Expr::signal(acc)], width),
                    )?;
                }
                b.set_critical_path(schedule.critical_path);
                if negative {
                    layout.negate(&mut b, target, ctx, acc)?
                } else {
                    acc
                }
            }
        };
        b.sync_cycle_from_signal(out)?;
        b.manage_critical_path(target.lut_delay());
        b.assign(r, layout.saturate(out))?;

        let component = b.finish()?;
        debug!(
            component = %name,
            tables = layout.tables.len(),
            guard_bits = g,
            latency = component.latency,
            "FixRealKCM generated"
        );
        ctx.register(component);
        Ok(Self { name, layout })
    }

    /// Emit the tables into `parent` and push their products into `heap`
    ///
    /// The product lands at `weight` on the grid `2^(lsb_out - g)`; the
    /// caller compresses the heap and drops the `g` guard bits. The product
    /// is sign-extended up to the top of the heap.
    pub fn add_to_bit_heap(
        target: &Target,
        ctx: &mut GenerationContext,
        params: &FixRealKcmParams,
        parent: &mut ComponentBuilder,
        x: SignalId,
        heap: &mut BitHeap,
        weight: usize,
    ) -> Result<FixRealKcmLayout> {
        let layout = FixRealKcmLayout::new(target, params)?;
        let found = parent.width(x)?;
        if found != layout.w_in {
            return Err(GenerationError::configuration(format!(
                "multiplicand has {found} bits, the format needs {}",
                layout.w_in
            )));
        }
        parent.sync_cycle_from_signal(x)?;
        parent.manage_critical_path(target.local_wire_delay() + target.lut_delay());
        let uid = ctx.next_uid();
        let products = layout.read_tables(
            parent,
            x,
            &format!("{}_uid{}", layout.base_name(), uid),
            &format!("_kcm{uid}"),
        )?;
        layout.push_products(heap, &products, weight);
        debug!(
            heap = heap.uid(),
            weight,
            tables = layout.tables.len(),
            guard_bits = layout.guard_bits,
            "KCM products added to bit heap"
        );
        Ok(layout)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &FixRealKcmLayout {
        &self.layout
    }

    pub fn emulate(&self, x: &Natural) -> (Integer, Integer) {
        self.layout.emulate(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arithgen_netlist::Simulator;

    /// Check every input against the two accepted roundings
    fn check_all(target: &Target, params: &FixRealKcmParams) -> FixRealKcm {
        let mut ctx = GenerationContext::new();
        let kcm = FixRealKcm::new(target, &mut ctx, params).unwrap();
        let layout = kcm.layout();
        let component = ctx.component(kcm.name()).unwrap();
        let sim = Simulator::new(&ctx);
        for x in 0..1u128 << layout.w_in {
            let out = sim.run_u128(component, &[("X", x)]).unwrap();
            let r = numeric::decode(&Natural::from(out["R"]), layout.w_out, layout.sign_bit());
            let (down, up) = kcm.emulate(&Natural::from(x));
            assert!(
                r == down || r == up,
                "{}: x={x} gave {r}, expected {down} or {up}",
                kcm.name()
            );
        }
        kcm
    }

    #[test]
    fn test_three_quarters_two_tables() {
        let params = FixRealKcmParams::new(0, 7, false, 0, "0.75");
        let kcm = check_all(&Target::virtex5(), &params);
        assert_eq!(kcm.layout().tables.len(), 2);
        assert_eq!(kcm.layout().guard_bits, 0);
        assert_eq!(kcm.layout().w_out, 8);
    }

    #[test]
    fn test_one_third_bit_heap() {
        let target = Target::virtex4();
        let params = FixRealKcmParams::new(0, 11, false, 0, "1/3");
        let kcm = check_all(&target, &params);
        let layout = kcm.layout();
        assert_eq!(layout.tables.len(), 3);
        assert_eq!(layout.guard_bits, 2);
        let widths: Vec<usize> = layout.tables.iter().map(|t| t.output_width).collect();
        assert_eq!(widths, vec![5, 10, 13]);
    }

    #[test]
    fn test_zero_stays_zero() {
        let target = Target::virtex4();
        let mut ctx = GenerationContext::new();
        let params = FixRealKcmParams::new(0, 11, false, 0, "1/3");
        let kcm = FixRealKcm::new(&target, &mut ctx, &params).unwrap();
        let sim = Simulator::new(&ctx);
        let component = ctx.component(kcm.name()).unwrap();
        assert_eq!(sim.run_u128(component, &[("X", 0)]).unwrap()["R"], 0);
        let nine = sim.run_u128(component, &[("X", 9)]).unwrap()["R"];
        assert!(nine.abs_diff(3) <= 1);
    }

    #[test]
    fn test_adder_chain() {
        let target = Target::virtex4();
        let params = FixRealKcmParams::new(-12, -1, false, -10, "0.7").with_bit_heap(false);
        let kcm = check_all(&target, &params);
        assert!(kcm.layout().tables.len() > 2);
    }

    #[test]
    fn test_negative_constant_signed_input() {
        let target = Target::virtex4();
        let params = FixRealKcmParams::new(-8, 1, true, -9, "-0.3");
        let kcm = check_all(&target, &params);
        assert!(kcm.layout().sign_bit());
        assert!(kcm.layout().tables.len() > 2);
        check_all(&target, &params.clone().with_bit_heap(false));
    }

    #[test]
    fn test_negative_constant_small_inputs() {
        let target = Target::virtex5();
        // one table, then two tables
        check_all(&target, &FixRealKcmParams::new(0, 4, false, -2, "-0.75"));
        check_all(&target, &FixRealKcmParams::new(0, 9, true, -1, "-0.6"));
    }

    #[test]
    fn test_rounding_past_the_largest_output_saturates() {
        // 15 * 0.99 / 4 = 3.71 on two output bits
        let kcm = check_all(&Target::virtex5(), &FixRealKcmParams::new(0, 3, false, 2, "0.99"));
        assert_eq!(kcm.layout().w_out, 2);

        let target = Target::virtex4();
        let near_one = FixRealKcmParams::new(0, 11, false, 3, "0.9999");
        check_all(&target, &near_one.clone().with_bit_heap(false));
        check_all(&target, &near_one);
        check_all(&target, &FixRealKcmParams::new(0, 6, true, 2, "0.99"));
        check_all(&target, &FixRealKcmParams::new(0, 6, true, 2, "-0.99"));
    }

    #[test]
    fn test_tighter_error_bound() {
        let target = Target::virtex5();
        let params = FixRealKcmParams::new(-10, 1, false, -8, "0.9").with_target_ulp_error(0.75);
        let kcm = check_all(&target, &params);
        assert!(kcm.layout().guard_bits > 0);
    }

    #[test]
    fn test_late_input_pipelines() {
        let target = Target::virtex4().with_frequency_mhz(400.0).unwrap();
        let params = FixRealKcmParams::new(-16, -1, false, -16, "0.7")
            .with_bit_heap(false)
            .with_input_delay(2.4);
        let mut ctx = GenerationContext::new();
        let kcm = FixRealKcm::new(&target, &mut ctx, &params).unwrap();
        assert!(ctx.component(kcm.name()).unwrap().latency >= 1);
    }

    #[test]
    fn test_rake_schedule_registers_under_pressure() {
        let target = Target::virtex5().with_frequency_mhz(500.0).unwrap();
        let relaxed = RakeSchedule::new(&target, 0.0, &[8, 12]);
        assert!(!relaxed.register_inputs);
        let late = RakeSchedule::new(&target, 5.0, &[8, 12, 16, 20]);
        assert!(late.register_inputs);
        let combinational = RakeSchedule::new(&target.clone().with_pipelining(false), 5.0, &[8; 6]);
        assert!(!combinational.register_inputs);
        assert!(combinational.registers.iter().all(|r| !r));
    }

    #[test]
    fn test_incorporated_product_sign_extends() {
        let target = Target::virtex4();
        let params = FixRealKcmParams::new(-9, 0, true, -8, "-0.45");
        let layout = FixRealKcmLayout::new(&target, &params).unwrap();
        let extra = 3;
        let width = layout.sum_width() + extra;

        let mut ctx = GenerationContext::new();
        let mut b = ComponentBuilder::new("parent", target.clock_period(), true);
        let x = b.add_input("X", layout.w_in).unwrap();
        let r = b.add_output("R", width).unwrap();
        let mut heap = BitHeap::new(&mut ctx, width);
        let layout = FixRealKcm::add_to_bit_heap(&target, &mut ctx, &params, &mut b, x, &mut heap, 0).unwrap();
        let sum = heap.compress(&mut b, &target, &mut ctx).unwrap();
        b.assign(r, Expr::signal(sum)).unwrap();
        let parent = b.finish().unwrap();

        let sim = Simulator::new(&ctx);
        let ulp = Integer::power_of_2(layout.guard_bits as u64);
        for xv in 0..1u128 << layout.w_in {
            let out = sim.run_u128(&parent, &[("X", xv)]).unwrap();
            let full = numeric::decode(&Natural::from(out["R"]), width, true);
            let r = numeric::round(&(Rational::from(full) / Rational::from(ulp.clone())), RoundingMode::Floor);
            let (down, up) = layout.emulate(&Natural::from(xv));
            assert!(r == down || r == up, "x={xv} gave {r}, expected {down} or {up}");
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let target = Target::virtex5();
        let mut ctx = GenerationContext::new();
        let inverted = FixRealKcmParams::new(3, 1, false, 0, "0.5");
        assert!(matches!(
            FixRealKcm::new(&target, &mut ctx, &inverted),
            Err(GenerationError::Configuration { .. })
        ));
        let loose = FixRealKcmParams::new(0, 7, false, 0, "0.5").with_target_ulp_error(1.5);
        assert!(FixRealKcm::new(&target, &mut ctx, &loose).is_err());
        let exact = FixRealKcmParams::new(0, 15, false, 0, "0.3").with_target_ulp_error(0.5);
        assert!(FixRealKcm::new(&target, &mut ctx, &exact).is_err());
        let garbage = FixRealKcmParams::new(0, 7, false, 0, "1/");
        assert!(matches!(
            FixRealKcm::new(&target, &mut ctx, &garbage),
            Err(GenerationError::ConstantParse { .. })
        ));
    }

    #[test]
    fn test_name_and_params_serde() {
        let mut ctx = GenerationContext::new();
        let params = FixRealKcmParams::new(-4, 3, true, -2, "1/3");
        let kcm = FixRealKcm::new(&Target::virtex5(), &mut ctx, &params).unwrap();
        assert_eq!(kcm.name(), "FixRealKCM_M4_3_M2_1_3_signed");
        let again = FixRealKcm::new(&Target::virtex5(), &mut ctx, &params).unwrap();
        assert_ne!(again.name(), kcm.name());

        let json = r#"{"lsb_in":0,"msb_in":7,"lsb_out":0,"constant":"0.75"}"#;
        let parsed: FixRealKcmParams = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, FixRealKcmParams::new(0, 7, false, 0, "0.75"));
    }
}
