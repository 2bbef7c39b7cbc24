//! Arithgen structural netlists
//!
//! The emission layer the operator generators write into: named bit-vector
//! signals, combinational expressions, lookup tables and sub-component
//! instances, scheduled by a [`PipelineCursor`]. Generated components are
//! collected in a [`GenerationContext`] and can be evaluated bit by bit
//! with the [`Simulator`].

pub mod bits;
pub mod component;
pub mod context;
pub mod error;
pub mod expr;
pub mod pipeline;
pub mod signal;
pub mod sim;
pub mod stats;

pub use bits::Bits;
pub use component::{Component, ComponentBuilder, Instance, LookupTable, Statement};
pub use context::GenerationContext;
pub use error::{NetlistError, Result};
pub use expr::Expr;
pub use pipeline::{PipelineCursor, Timing};
pub use signal::{Signal, SignalId, SignalKind};
pub use sim::Simulator;
pub use stats::ComponentStats;
