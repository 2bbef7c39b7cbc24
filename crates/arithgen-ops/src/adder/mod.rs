//! Pipelined two-operand integer adders
//!
//! Three architectures share the ports `X`, `Y`, `Cin` and `R = X + Y + Cin`
//! modulo `2^width`:
//!
//! - [`classical`]: carry-chain chunks rippled through one register each;
//! - [`alternative`]: every chunk summed at once, carries rippled afterwards;
//! - [`short_latency`]: carry-select over precomputed chunk sums.
//!
//! Each comes with a closed-form resource model. [`select_adder`] evaluates
//! all of them against the operand arrival time and keeps the cheapest one.

pub mod alternative;
pub mod chunking;
pub mod classical;
pub mod select;
pub mod short_latency;

use std::fmt;
use std::str::FromStr;

use arithgen_netlist::{ComponentBuilder, Expr, GenerationContext, SignalId};
use arithgen_target::Target;
use indexmap::IndexMap;
use malachite::base::num::arithmetic::traits::PowerOf2;
use malachite::Natural;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub use chunking::{Chunking, InputTiming};
pub use select::{select_adder, AdderChoice, AdderVariant};
pub use short_latency::ShortLatencyPlan;

use crate::error::{GenerationError, Result};

/// Resource an adder is optimized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdderObjective {
    Luts,
    Registers,
    #[default]
    Slices,
}

impl AdderObjective {
    pub fn name(&self) -> &'static str {
        match self {
            AdderObjective::Luts => "luts",
            AdderObjective::Registers => "registers",
            AdderObjective::Slices => "slices",
        }
    }
}

impl fmt::Display for AdderObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdderObjective {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "luts" | "lut" => Ok(AdderObjective::Luts),
            "registers" | "reg" => Ok(AdderObjective::Registers),
            "slices" | "slice" => Ok(AdderObjective::Slices),
            other => Err(GenerationError::configuration(format!(
                "unknown adder objective '{other}'"
            ))),
        }
    }
}

/// How an architecture copes with operands that arrive late in the cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SlackVersion {
    /// Operands come straight from registers
    NoSlack,
    /// The first chunk is shrunk to fit the remaining slack
    Adapted,
    /// The operands are registered once more, then the full period is used
    Buffered,
}

/// Chunk widths, least significant first, with the predicted cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkPlan {
    pub chunks: Vec<usize>,
    pub slack: SlackVersion,
    pub cost: i64,
}

impl ChunkPlan {
    pub fn new(chunks: Vec<usize>, slack: SlackVersion, cost: i64) -> Self {
        Self {
            chunks,
            slack,
            cost,
        }
    }
}

/// Parameters of one adder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdderRequest {
    pub width: usize,
    /// Arrival time of each input port within cycle 0 (ns)
    pub input_delays: IndexMap<String, f64>,
    pub objective: AdderObjective,
    /// Shift-register based carry storage; defaults to the target's capability
    pub use_srl: Option<bool>,
}

impl AdderRequest {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            input_delays: IndexMap::new(),
            objective: AdderObjective::default(),
            use_srl: None,
        }
    }

    pub fn with_input_delay(mut self, port: &str, delay: f64) -> Self {
        self.input_delays.insert(port.to_string(), delay);
        self
    }

    pub fn with_objective(mut self, objective: AdderObjective) -> Self {
        self.objective = objective;
        self
    }

    pub fn with_srl(mut self, use_srl: bool) -> Self {
        self.use_srl = Some(use_srl);
        self
    }

    pub fn max_input_delay(&self) -> f64 {
        self.input_delays.values().copied().fold(0.0, f64::max)
    }
}

/// Port signals of an adder component under construction
#[derive(Debug, Clone, Copy)]
pub struct AdderPorts {
    pub x: SignalId,
    pub y: SignalId,
    pub cin: SignalId,
    pub r: SignalId,
    pub width: usize,
}

impl AdderPorts {
    fn sum_expr(&self) -> Expr {
        Expr::add(
            vec![
                Expr::signal(self.x),
                Expr::signal(self.y),
                Expr::signal(self.cin),
            ],
            self.width,
        )
    }
}

/// A generated adder component
#[derive(Debug, Clone)]
pub struct IntAdder {
    name: String,
    choice: AdderChoice,
}

impl IntAdder {
    /// Select, emit and register an adder
    pub fn new(target: &Target, ctx: &mut GenerationContext, request: &AdderRequest) -> Result<Self> {
        if request.width == 0 {
            return Err(GenerationError::configuration("adder width must be positive"));
        }
        let choice = select_adder(target, request)?;
        let name = format!(
            "{}_{}_f{}_uid{}",
            choice.variant.kind(),
            request.width,
            target.frequency_mhz.round() as u64,
            ctx.next_uid()
        );

        let mut b = ComponentBuilder::new(&name, target.clock_period(), target.is_pipelined());
        b.set_input_delay(request.max_input_delay().min(target.clock_period()));
        let ports = AdderPorts {
            x: b.add_input("X", request.width)?,
            y: b.add_input("Y", request.width)?,
            cin: b.add_input("Cin", 1)?,
            r: b.add_output("R", request.width)?,
            width: request.width,
        };
        if choice.timing.registered {
            b.next_cycle();
        }
        if !target.is_pipelined() {
            b.set_critical_path(choice.timing.delay + target.adder_delay(request.width));
            b.assign(ports.r, ports.sum_expr())?;
        } else {
            match &choice.variant {
                AdderVariant::Classical(plan) => {
                    classical::emit(&mut b, target, plan, &choice.timing, &ports)?
                }
                AdderVariant::Alternative(plan) => {
                    alternative::emit(&mut b, target, plan, &choice.timing, &ports)?
                }
                AdderVariant::ShortLatency(plan) => short_latency::emit(&mut b, target, plan, &ports)?,
            }
        }
        let component = b.finish()?;
        debug!(
            component = %name,
            variant = choice.variant.kind(),
            cost = choice.variant.cost(),
            latency = component.latency,
            "adder generated"
        );
        ctx.register(component);
        Ok(Self { name, choice })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn choice(&self) -> &AdderChoice {
        &self.choice
    }

    /// Reference result `(x + y + cin) mod 2^width`
    pub fn emulate(width: usize, x: &Natural, y: &Natural, carry_in: bool) -> Natural {
        let sum = x + y + Natural::from(u32::from(carry_in));
        sum % Natural::power_of_2(width as u64)
    }
}

/// Operands of an addition emitted inside a parent component
#[derive(Debug, Clone)]
pub struct AdditionOperands {
    pub x: Expr,
    pub y: Expr,
    /// One-bit carry input
    pub carry_in: Expr,
    pub width: usize,
    /// Instance label inside the parent
    pub label: String,
    /// Name of the parent wire receiving the sum
    pub result: String,
}

/// Instantiate an adder sized for the parent's current critical path
///
/// The parent cursor moves to the arrival time of the result, which is
/// returned as a new wire of `operands.width` bits.
pub fn emit_addition(
    b: &mut ComponentBuilder,
    target: &Target,
    ctx: &mut GenerationContext,
    operands: AdditionOperands,
) -> Result<SignalId> {
    let delay = b.critical_path() + target.local_wire_delay();
    let request = AdderRequest::new(operands.width).with_input_delay("X", delay);
    let adder = IntAdder::new(target, ctx, &request)?;
    let child = ctx.component(adder.name())?;

    let mut inputs = IndexMap::new();
    inputs.insert("X".to_string(), operands.x);
    inputs.insert("Y".to_string(), operands.y);
    inputs.insert("Cin".to_string(), operands.carry_in);
    let ids = b.instantiate(child, &operands.label, inputs, &[("R", &operands.result)])?;
    let sum = ids[0];
    b.sync_cycle_from_signal(sum)?;
    Ok(sum)
}
