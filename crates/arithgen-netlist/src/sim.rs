//! Bit-accurate evaluation of generated components
//!
//! The simulator ignores the schedule: registers only delay values, so the
//! steady-state output for a held input equals the combinational value.

use indexmap::IndexMap;

use crate::bits::{self, Bits};
use crate::component::{Component, Statement};
use crate::context::GenerationContext;
use crate::error::{NetlistError, Result};
use crate::expr::Expr;
use crate::signal::SignalKind;

pub struct Simulator<'a> {
    ctx: &'a GenerationContext,
}

impl<'a> Simulator<'a> {
    pub fn new(ctx: &'a GenerationContext) -> Self {
        Self { ctx }
    }

    /// Evaluate `component` for one set of input values
    pub fn run(
        &self,
        component: &Component,
        inputs: &IndexMap<String, Bits>,
    ) -> Result<IndexMap<String, Bits>> {
        let mut values: Vec<Option<Bits>> = vec![None; component.signals.len()];
        for (i, signal) in component.signals.iter().enumerate() {
            if signal.kind != SignalKind::Input {
                continue;
            }
            let value = inputs.get(&signal.name).ok_or_else(|| NetlistError::MissingInput {
                component: component.name.clone(),
                port: signal.name.clone(),
            })?;
            if value.len() != signal.width {
                return Err(NetlistError::WidthMismatch {
                    context: format!("input '{}'", signal.name),
                    expected: signal.width,
                    found: value.len(),
                });
            }
            values[i] = Some(value.clone());
        }

        for statement in &component.statements {
            match statement {
                Statement::Assign { target, expr } => {
                    let v = self.eval(component, &values, expr)?;
                    values[target.0] = Some(v);
                }
                Statement::Instance(inst) => {
                    let child = self.ctx.component(&inst.component)?;
                    let mut child_inputs = IndexMap::new();
                    for (port, expr) in &inst.inputs {
                        child_inputs.insert(port.clone(), self.eval(component, &values, expr)?);
                    }
                    let mut child_outputs = self.run(child, &child_inputs)?;
                    for (port, id) in &inst.outputs {
                        let v = child_outputs.swap_remove(port).ok_or_else(|| {
                            NetlistError::UnknownSignal(format!("{}.{}", child.name, port))
                        })?;
                        values[id.0] = Some(v);
                    }
                }
            }
        }

        let mut outputs = IndexMap::new();
        for (i, signal) in component.signals.iter().enumerate() {
            if signal.kind == SignalKind::Output {
                let v = values[i]
                    .take()
                    .ok_or_else(|| NetlistError::UnassignedSignal(signal.name.clone()))?;
                outputs.insert(signal.name.clone(), v);
            }
        }
        Ok(outputs)
    }

    /// Convenience wrapper over [`Simulator::run`] for ports up to 128 bits
    pub fn run_u128(
        &self,
        component: &Component,
        inputs: &[(&str, u128)],
    ) -> Result<IndexMap<String, u128>> {
        let mut bound = IndexMap::new();
        for (name, value) in inputs {
            let width = component.port_width(name)?;
            bound.insert(name.to_string(), bits::from_u128(*value, width));
        }
        let outputs = self.run(component, &bound)?;
        Ok(outputs
            .into_iter()
            .map(|(name, v)| (name, bits::to_u128(&v)))
            .collect())
    }

    fn eval(&self, component: &Component, values: &[Option<Bits>], expr: &Expr) -> Result<Bits> {
        match expr {
            Expr::Signal(id) => values
                .get(id.0)
                .and_then(|v| v.clone())
                .ok_or_else(|| match component.signals.get(id.0) {
                    Some(s) => NetlistError::UnassignedSignal(s.name.clone()),
                    None => NetlistError::UnknownSignal(format!("#{}", id.0)),
                }),
            Expr::Const(bits) => Ok(bits.clone()),
            Expr::Slice { expr, hi, lo } => {
                let v = self.eval(component, values, expr)?;
                if lo > hi || *hi >= v.len() {
                    return Err(NetlistError::SliceOutOfRange {
                        hi: *hi,
                        lo: *lo,
                        width: v.len(),
                    });
                }
                Ok(v[*lo..=*hi].to_bitvec())
            }
            Expr::Concat(parts) => {
                let mut out = Bits::new();
                for part in parts.iter().rev() {
                    out.extend_from_bitslice(self.eval(component, values, part)?.as_bitslice());
                }
                Ok(out)
            }
            Expr::Not(inner) => {
                let v = self.eval(component, values, inner)?;
                Ok(v.iter().by_vals().map(|b| !b).collect())
            }
            Expr::And(a, b) | Expr::Or(a, b) | Expr::Xor(a, b) => {
                let va = self.eval(component, values, a)?;
                let vb = self.eval(component, values, b)?;
                if va.len() != vb.len() {
                    return Err(NetlistError::WidthMismatch {
                        context: "bitwise operator".to_string(),
                        expected: va.len(),
                        found: vb.len(),
                    });
                }
                let op: fn(bool, bool) -> bool = match expr {
                    Expr::And(..) => |x, y| x & y,
                    Expr::Or(..) => |x, y| x | y,
                    _ => |x, y| x ^ y,
                };
                Ok(va
                    .iter()
                    .by_vals()
                    .zip(vb.iter().by_vals())
                    .map(|(x, y)| op(x, y))
                    .collect())
            }
            Expr::Add { terms, width } => {
                let mut acc = Bits::repeat(false, *width);
                for term in terms {
                    let mut v = self.eval(component, values, term)?;
                    v.resize(*width, false);
                    bits::add_into(&mut acc, &v, false);
                }
                Ok(acc)
            }
            Expr::Mux {
                select,
                if_one,
                if_zero,
            } => {
                let s = self.eval(component, values, select)?;
                if s.len() != 1 {
                    return Err(NetlistError::WidthMismatch {
                        context: "mux select".to_string(),
                        expected: 1,
                        found: s.len(),
                    });
                }
                if s[0] {
                    self.eval(component, values, if_one)
                } else {
                    self.eval(component, values, if_zero)
                }
            }
            Expr::Lookup { index, table } => {
                let t = component
                    .tables
                    .get(*table)
                    .ok_or_else(|| NetlistError::InvalidTable {
                        table: format!("#{table}"),
                        reason: "no such table".to_string(),
                    })?;
                let i = bits::to_u128(&self.eval(component, values, index)?) as usize;
                t.entries.get(i).cloned().ok_or_else(|| NetlistError::InvalidTable {
                    table: t.name.clone(),
                    reason: format!("index {i} out of range"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ComponentBuilder, LookupTable};

    #[test]
    fn test_add_and_concat() {
        let ctx = GenerationContext::new();
        let mut b = ComponentBuilder::new("c", 2.0, true);
        let x = b.add_input("X", 4).unwrap();
        let y = b.add_input("Y", 4).unwrap();
        let r = b.add_output("R", 5).unwrap();
        let s = b
            .declare(
                "s",
                5,
                Expr::add(vec![Expr::signal(x), Expr::signal(y)], 5),
            )
            .unwrap();
        b.assign(r, Expr::signal(s)).unwrap();
        let c = b.finish().unwrap();
        let out = Simulator::new(&ctx)
            .run_u128(&c, &[("X", 15), ("Y", 9)])
            .unwrap();
        assert_eq!(out["R"], 24);
    }

    #[test]
    fn test_concat_msb_first() {
        let ctx = GenerationContext::new();
        let mut b = ComponentBuilder::new("c", 2.0, true);
        let x = b.add_input("X", 2).unwrap();
        let r = b.add_output("R", 5).unwrap();
        b.assign(
            r,
            Expr::concat(vec![Expr::constant_u64(0b101, 3), Expr::signal(x)]),
        )
        .unwrap();
        let c = b.finish().unwrap();
        let out = Simulator::new(&ctx).run_u128(&c, &[("X", 0b10)]).unwrap();
        assert_eq!(out["R"], 0b10110);
    }

    #[test]
    fn test_lookup_and_mux() {
        let ctx = GenerationContext::new();
        let mut b = ComponentBuilder::new("c", 2.0, true);
        let x = b.add_input("X", 2).unwrap();
        let s = b.add_input("S", 1).unwrap();
        let r = b.add_output("R", 4).unwrap();
        let t = b
            .add_table(LookupTable {
                name: "sq".to_string(),
                input_width: 2,
                output_width: 4,
                entries: (0..4u128).map(|v| bits::from_u128(v * v, 4)).collect(),
            })
            .unwrap();
        let sq = b.declare("sq", 4, Expr::lookup(Expr::signal(x), t)).unwrap();
        b.assign(
            r,
            Expr::mux(Expr::signal(s), Expr::signal(sq), Expr::signal(sq).not()),
        )
        .unwrap();
        let c = b.finish().unwrap();
        let sim = Simulator::new(&ctx);
        assert_eq!(sim.run_u128(&c, &[("X", 3), ("S", 1)]).unwrap()["R"], 9);
        assert_eq!(sim.run_u128(&c, &[("X", 3), ("S", 0)]).unwrap()["R"], 6);
    }

    #[test]
    fn test_missing_input() {
        let ctx = GenerationContext::new();
        let mut b = ComponentBuilder::new("c", 2.0, true);
        let x = b.add_input("X", 2).unwrap();
        let r = b.add_output("R", 2).unwrap();
        b.assign(r, Expr::signal(x)).unwrap();
        let c = b.finish().unwrap();
        assert!(matches!(
            Simulator::new(&ctx).run(&c, &IndexMap::new()),
            Err(NetlistError::MissingInput { .. })
        ));
    }
}
