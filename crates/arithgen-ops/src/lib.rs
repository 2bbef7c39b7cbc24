//! Arithgen operator generators
//!
//! Structural generators for FPGA arithmetic: table-based constant
//! multipliers (KCM), bit heaps reduced by generalized compressors, and
//! two-operand and multi-operand integer adders pipelined against a target
//! clock. Every generator writes a component into a
//! [`GenerationContext`](arithgen_netlist::GenerationContext) and exposes
//! an `emulate` reference model for checking it.

pub mod adder;
pub mod bitheap;
pub mod constant;
pub mod error;
pub mod kcm;
pub mod multi_adder;
pub mod numeric;

pub use adder::{
    emit_addition, select_adder, AdderChoice, AdderObjective, AdderRequest, AdderVariant,
    AdditionOperands, IntAdder,
};
pub use bitheap::{BitHeap, CompressorSearch};
pub use constant::Constant;
pub use error::{GenerationError, Result};
pub use kcm::{FixRealKcm, FixRealKcmParams, IntIntKcm, IntIntKcmParams};
pub use multi_adder::{IntMultiAdder, MultiAdderStrategy};
