//! Arithgen target models
//!
//! Timing and geometry of the FPGA families the operator generators know
//! about, plus the oracles they query to size pipeline stages.

pub mod device;
pub mod error;

pub use device::{ChunkSuggestion, Target, Vendor};
pub use error::{Result, TargetError};
