//! Error types for operator generation

use arithgen_netlist::NetlistError;
use arithgen_target::TargetError;
use thiserror::Error;

/// Errors that abort the generation of one operator
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Caller-supplied parameters outside the supported domain
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// The constant expression could not be evaluated
    #[error("Cannot use constant '{expression}': {reason}")]
    ConstantParse { expression: String, reason: String },

    /// No adder architecture meets the clock period
    #[error("No {width}-bit adder architecture meets {frequency_mhz} MHz")]
    AdditionInfeasible { width: usize, frequency_mhz: f64 },

    #[error(transparent)]
    Netlist(#[from] NetlistError),

    #[error(transparent)]
    Target(#[from] TargetError),
}

impl GenerationError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    pub fn constant(expression: &str, reason: impl Into<String>) -> Self {
        Self::ConstantParse {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for operator generation
pub type Result<T> = std::result::Result<T, GenerationError>;
