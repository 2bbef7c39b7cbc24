//! Components and the builder that emits them
//!
//! A [`Component`] is a flat list of signals, combinational assignments,
//! lookup tables and sub-component instances. It is produced by a
//! [`ComponentBuilder`], which owns the [`PipelineCursor`] of the component
//! and stamps every declared signal with the cursor position at the time of
//! declaration.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bits::Bits;
use crate::error::{NetlistError, Result};
use crate::expr::Expr;
use crate::pipeline::{PipelineCursor, Timing};
use crate::signal::{Signal, SignalId, SignalKind};

/// Largest supported lookup table index width
pub const MAX_TABLE_INPUTS: usize = 24;

/// A ROM read combinationally through [`Expr::Lookup`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupTable {
    pub name: String,
    pub input_width: usize,
    pub output_width: usize,
    /// One entry per index value, `2^input_width` in total
    pub entries: Vec<Bits>,
}

impl LookupTable {
    /// Total storage in bits
    pub fn size_bits(&self) -> usize {
        self.entries.len() * self.output_width
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| NetlistError::InvalidTable {
            table: self.name.clone(),
            reason,
        };
        if self.input_width > MAX_TABLE_INPUTS {
            return Err(invalid(format!(
                "{} index bits exceed the supported {}",
                self.input_width, MAX_TABLE_INPUTS
            )));
        }
        if self.entries.len() != 1usize << self.input_width {
            return Err(invalid(format!(
                "{} entries for a {}-bit index",
                self.entries.len(),
                self.input_width
            )));
        }
        if let Some(pos) = self.entries.iter().position(|e| e.len() != self.output_width) {
            return Err(invalid(format!(
                "entry {} is {} bits wide, expected {}",
                pos,
                self.entries[pos].len(),
                self.output_width
            )));
        }
        Ok(())
    }
}

/// A sub-component instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub label: String,
    /// Name of the instantiated component in the generation context
    pub component: String,
    /// Input port bindings
    pub inputs: IndexMap<String, Expr>,
    /// Output port to local wire
    pub outputs: IndexMap<String, SignalId>,
    /// Cycle at which the inputs are sampled
    pub cycle: u32,
}

/// One step of a component body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    Assign { target: SignalId, expr: Expr },
    Instance(Instance),
}

/// A generated operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub signals: Vec<Signal>,
    pub statements: Vec<Statement>,
    pub tables: Vec<LookupTable>,
    /// Cycles from inputs to outputs
    pub latency: u32,
    /// Critical path at the outputs within the last cycle (ns)
    pub output_delay: f64,
}

impl Component {
    pub fn signal(&self, id: SignalId) -> Result<&Signal> {
        self.signals
            .get(id.0)
            .ok_or_else(|| NetlistError::UnknownSignal(format!("#{}", id.0)))
    }

    pub fn signal_by_name(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .position(|s| s.name == name)
            .map(SignalId)
    }

    pub fn inputs(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.kind == SignalKind::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().filter(|s| s.kind == SignalKind::Output)
    }

    /// Width of a port, input or output
    pub fn port_width(&self, port: &str) -> Result<usize> {
        self.signals
            .iter()
            .find(|s| s.is_port() && s.name == port)
            .map(|s| s.width)
            .ok_or_else(|| NetlistError::UnknownSignal(format!("{}.{}", self.name, port)))
    }

    pub fn instances(&self) -> impl Iterator<Item = &Instance> {
        self.statements.iter().filter_map(|s| match s {
            Statement::Instance(inst) => Some(inst),
            Statement::Assign { .. } => None,
        })
    }

    /// Width of an expression, checking every operand along the way
    pub fn expr_width(&self, expr: &Expr) -> Result<usize> {
        match expr {
            Expr::Signal(id) => Ok(self.signal(*id)?.width),
            Expr::Const(bits) => Ok(bits.len()),
            Expr::Slice { expr, hi, lo } => {
                let width = self.expr_width(expr)?;
                if lo > hi || *hi >= width {
                    return Err(NetlistError::SliceOutOfRange {
                        hi: *hi,
                        lo: *lo,
                        width,
                    });
                }
                Ok(hi - lo + 1)
            }
            Expr::Concat(parts) => {
                if parts.is_empty() {
                    return Err(NetlistError::MalformedExpression(
                        "empty concatenation".to_string(),
                    ));
                }
                let mut width = 0;
                for part in parts {
                    width += self.expr_width(part)?;
                }
                Ok(width)
            }
            Expr::Not(inner) => self.expr_width(inner),
            Expr::And(a, b) | Expr::Or(a, b) | Expr::Xor(a, b) => {
                let wa = self.expr_width(a)?;
                let wb = self.expr_width(b)?;
                if wa != wb {
                    return Err(NetlistError::WidthMismatch {
                        context: "bitwise operator".to_string(),
                        expected: wa,
                        found: wb,
                    });
                }
                Ok(wa)
            }
            Expr::Add { terms, width } => {
                if terms.is_empty() || *width == 0 {
                    return Err(NetlistError::MalformedExpression(
                        "addition needs terms and a width".to_string(),
                    ));
                }
                for term in terms {
                    self.expr_width(term)?;
                }
                Ok(*width)
            }
            Expr::Mux {
                select,
                if_one,
                if_zero,
            } => {
                let ws = self.expr_width(select)?;
                if ws != 1 {
                    return Err(NetlistError::WidthMismatch {
                        context: "mux select".to_string(),
                        expected: 1,
                        found: ws,
                    });
                }
                let w1 = self.expr_width(if_one)?;
                let w0 = self.expr_width(if_zero)?;
                if w1 != w0 {
                    return Err(NetlistError::WidthMismatch {
                        context: "mux branches".to_string(),
                        expected: w1,
                        found: w0,
                    });
                }
                Ok(w1)
            }
            Expr::Lookup { index, table } => {
                let t = self.tables.get(*table).ok_or_else(|| NetlistError::InvalidTable {
                    table: format!("#{table}"),
                    reason: "no such table".to_string(),
                })?;
                let wi = self.expr_width(index)?;
                if wi != t.input_width {
                    return Err(NetlistError::WidthMismatch {
                        context: format!("index of table '{}'", t.name),
                        expected: t.input_width,
                        found: wi,
                    });
                }
                Ok(t.output_width)
            }
        }
    }

    /// Register bits implied by the schedule
    ///
    /// Each signal is held from the cycle it is produced in up to the last
    /// cycle that reads it; outputs are read at the component latency.
    pub fn register_bits(&self) -> u64 {
        let mut last_use: Vec<u32> = self.signals.iter().map(|s| s.timing.cycle).collect();
        let mut reads = Vec::new();
        for statement in &self.statements {
            reads.clear();
            let at = match statement {
                Statement::Assign { target, expr } => {
                    expr.signals(&mut reads);
                    self.signals.get(target.0).map(|s| s.timing.cycle).unwrap_or(0)
                }
                Statement::Instance(inst) => {
                    for e in inst.inputs.values() {
                        e.signals(&mut reads);
                    }
                    inst.cycle
                }
            };
            for id in &reads {
                if let Some(slot) = last_use.get_mut(id.0) {
                    *slot = (*slot).max(at);
                }
            }
        }
        for (i, s) in self.signals.iter().enumerate() {
            if s.kind == SignalKind::Output {
                last_use[i] = last_use[i].max(self.latency);
            }
        }
        self.signals
            .iter()
            .zip(last_use)
            .map(|(s, last)| s.width as u64 * last.saturating_sub(s.timing.cycle) as u64)
            .sum()
    }
}

/// Incremental construction of a [`Component`]
#[derive(Debug, Clone)]
pub struct ComponentBuilder {
    component: Component,
    cursor: PipelineCursor,
    names: IndexMap<String, SignalId>,
    assigned_outputs: IndexSet<SignalId>,
    fresh: usize,
}

impl ComponentBuilder {
    /// Start a component clocked at `period` ns
    ///
    /// A non-pipelined builder never inserts registers.
    pub fn new(name: impl Into<String>, period: f64, pipelined: bool) -> Self {
        let period = if pipelined { period } else { f64::INFINITY };
        Self {
            component: Component {
                name: name.into(),
                signals: Vec::new(),
                statements: Vec::new(),
                tables: Vec::new(),
                latency: 0,
                output_delay: 0.0,
            },
            cursor: PipelineCursor::new(period),
            names: IndexMap::new(),
            assigned_outputs: IndexSet::new(),
            fresh: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.component.name
    }

    /// Inputs added after this call arrive `delay` ns into cycle 0
    pub fn set_input_delay(&mut self, delay: f64) {
        self.cursor = PipelineCursor::with_input_delay(self.cursor.period(), delay);
    }

    pub fn cursor(&self) -> &PipelineCursor {
        &self.cursor
    }

    pub fn cycle(&self) -> u32 {
        self.cursor.cycle()
    }

    pub fn critical_path(&self) -> f64 {
        self.cursor.critical_path()
    }

    pub fn period(&self) -> f64 {
        self.cursor.period()
    }

    pub fn is_pipelined(&self) -> bool {
        self.cursor.period().is_finite()
    }

    /// Name not yet used in this component
    pub fn unique_name(&mut self, prefix: &str) -> String {
        loop {
            let candidate = format!("{}_{}", prefix, self.fresh);
            self.fresh += 1;
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn signal(&self, id: SignalId) -> Result<&Signal> {
        self.component.signal(id)
    }

    pub fn width(&self, id: SignalId) -> Result<usize> {
        Ok(self.component.signal(id)?.width)
    }

    pub fn timing(&self, id: SignalId) -> Result<Timing> {
        Ok(self.component.signal(id)?.timing)
    }

    pub fn lookup(&self, name: &str) -> Option<SignalId> {
        self.names.get(name).copied()
    }

    pub fn expr_width(&self, expr: &Expr) -> Result<usize> {
        self.component.expr_width(expr)
    }

    fn push_signal(&mut self, name: &str, width: usize, kind: SignalKind) -> Result<SignalId> {
        if self.names.contains_key(name) {
            return Err(NetlistError::DuplicateSignal {
                component: self.component.name.clone(),
                name: name.to_string(),
            });
        }
        if width == 0 {
            return Err(NetlistError::MalformedExpression(format!(
                "signal '{name}' has zero width"
            )));
        }
        let id = SignalId(self.component.signals.len());
        self.component.signals.push(Signal {
            name: name.to_string(),
            width,
            kind,
            timing: self.cursor.snapshot(),
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_input(&mut self, name: &str, width: usize) -> Result<SignalId> {
        self.push_signal(name, width, SignalKind::Input)
    }

    pub fn add_output(&mut self, name: &str, width: usize) -> Result<SignalId> {
        self.push_signal(name, width, SignalKind::Output)
    }

    /// Declare a wire driven by `expr`, valid at the current cursor position
    pub fn declare(&mut self, name: &str, width: usize, expr: Expr) -> Result<SignalId> {
        let found = self.component.expr_width(&expr)?;
        if found != width {
            return Err(NetlistError::WidthMismatch {
                context: format!("declaration of '{name}'"),
                expected: width,
                found,
            });
        }
        let id = self.push_signal(name, width, SignalKind::Wire)?;
        trace!(signal = name, width, cycle = self.cursor.cycle(), "declared");
        self.component
            .statements
            .push(Statement::Assign { target: id, expr });
        Ok(id)
    }

    /// Drive an output port
    pub fn assign(&mut self, output: SignalId, expr: Expr) -> Result<()> {
        let signal = self.component.signal(output)?;
        if signal.kind != SignalKind::Output {
            return Err(NetlistError::MalformedExpression(format!(
                "'{}' is not an output",
                signal.name
            )));
        }
        let expected = signal.width;
        let context = format!("assignment of '{}'", signal.name);
        let found = self.component.expr_width(&expr)?;
        if found != expected {
            return Err(NetlistError::WidthMismatch {
                context,
                expected,
                found,
            });
        }
        self.component.signals[output.0].timing = self.cursor.snapshot();
        self.assigned_outputs.insert(output);
        self.component
            .statements
            .push(Statement::Assign { target: output, expr });
        Ok(())
    }

    /// Attach a lookup table, returning its index for [`Expr::Lookup`]
    pub fn add_table(&mut self, table: LookupTable) -> Result<usize> {
        table.validate()?;
        self.component.tables.push(table);
        Ok(self.component.tables.len() - 1)
    }

    /// Instantiate `child` at the current cycle
    ///
    /// Every input port of the child must be bound. `outputs` maps child
    /// output ports to new local wire names; the wires become valid
    /// `child.latency` cycles later. Ids are returned in `outputs` order.
    pub fn instantiate(
        &mut self,
        child: &Component,
        label: &str,
        inputs: IndexMap<String, Expr>,
        outputs: &[(&str, &str)],
    ) -> Result<Vec<SignalId>> {
        for port in child.inputs() {
            let expr = inputs.get(&port.name).ok_or_else(|| NetlistError::MissingInput {
                component: child.name.clone(),
                port: port.name.clone(),
            })?;
            let found = self.component.expr_width(expr)?;
            if found != port.width {
                return Err(NetlistError::WidthMismatch {
                    context: format!("port {}.{}", label, port.name),
                    expected: port.width,
                    found,
                });
            }
        }
        for name in inputs.keys() {
            if child.inputs().all(|p| &p.name != name) {
                return Err(NetlistError::UnknownSignal(format!("{}.{}", child.name, name)));
            }
        }

        let start = self.cursor.cycle();
        let ready = Timing::new(start + child.latency, child.output_delay);
        let mut bound = IndexMap::new();
        let mut ids = Vec::with_capacity(outputs.len());
        for (port, local) in outputs {
            let width = child
                .outputs()
                .find(|p| p.name == *port)
                .map(|p| p.width)
                .ok_or_else(|| NetlistError::UnknownSignal(format!("{}.{}", child.name, port)))?;
            let id = self.push_signal(local, width, SignalKind::Wire)?;
            self.component.signals[id.0].timing = ready;
            bound.insert(port.to_string(), id);
            ids.push(id);
        }
        trace!(label, component = %child.name, cycle = start, "instance");
        self.component.statements.push(Statement::Instance(Instance {
            label: label.to_string(),
            component: child.name.clone(),
            inputs,
            outputs: bound,
            cycle: start,
        }));
        Ok(ids)
    }

    /// Insert a register boundary; no-op when not pipelined
    pub fn next_cycle(&mut self) {
        if self.is_pipelined() {
            self.cursor.advance_cycle();
        }
    }

    /// Account for `delay` ns of logic; true when a register was inserted
    pub fn manage_critical_path(&mut self, delay: f64) -> bool {
        self.cursor.consume_delay(delay)
    }

    pub fn set_critical_path(&mut self, delay: f64) {
        self.cursor.set_critical_path(delay);
    }

    /// Move the cursor to the arrival time of a signal
    pub fn set_cycle_from_signal(&mut self, id: SignalId) -> Result<()> {
        let timing = self.timing(id)?;
        self.cursor.reset_to(timing);
        Ok(())
    }

    /// Advance the cursor to a signal if it arrives later
    pub fn sync_cycle_from_signal(&mut self, id: SignalId) -> Result<()> {
        let timing = self.timing(id)?;
        self.cursor.sync_to(timing);
        Ok(())
    }

    pub fn sync_to(&mut self, timing: Timing) {
        self.cursor.sync_to(timing);
    }

    /// Close the component
    pub fn finish(mut self) -> Result<Component> {
        let mut latency = 0;
        let mut output_delay: f64 = 0.0;
        for (i, signal) in self.component.signals.iter().enumerate() {
            if signal.kind != SignalKind::Output {
                continue;
            }
            if !self.assigned_outputs.contains(&SignalId(i)) {
                return Err(NetlistError::UnassignedOutput {
                    component: self.component.name.clone(),
                    port: signal.name.clone(),
                });
            }
            let t = signal.timing;
            if t.cycle > latency {
                latency = t.cycle;
                output_delay = t.critical_path;
            } else if t.cycle == latency {
                output_delay = output_delay.max(t.critical_path);
            }
        }
        self.component.latency = latency;
        self.component.output_delay = output_delay;
        Ok(self.component)
    }
}
