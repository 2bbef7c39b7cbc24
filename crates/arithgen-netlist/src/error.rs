//! Error types for netlist construction and simulation

use thiserror::Error;

/// Errors raised while building or evaluating a component
#[derive(Debug, Error)]
pub enum NetlistError {
    /// A signal name is declared twice in one component
    #[error("Duplicate signal '{name}' in component '{component}'")]
    DuplicateSignal { component: String, name: String },

    /// A signal name or id does not exist
    #[error("Unknown signal '{0}'")]
    UnknownSignal(String),

    /// A sub-component has not been registered in the context
    #[error("Unknown component '{0}'")]
    UnknownComponent(String),

    /// A port of an instance or of a simulation run is left unbound
    #[error("Missing input '{port}' for component '{component}'")]
    MissingInput { component: String, port: String },

    /// An output port was never assigned
    #[error("Output '{port}' of component '{component}' is never assigned")]
    UnassignedOutput { component: String, port: String },

    /// A signal is read before it receives a value
    #[error("Signal '{0}' is read before it is assigned")]
    UnassignedSignal(String),

    /// Operand widths disagree
    #[error("Width mismatch in {context}: expected {expected}, found {found}")]
    WidthMismatch {
        context: String,
        expected: usize,
        found: usize,
    },

    /// A slice reaches outside its operand
    #[error("Slice [{hi}:{lo}] out of range for a {width}-bit operand")]
    SliceOutOfRange { hi: usize, lo: usize, width: usize },

    /// An expression that can never produce a value
    #[error("Malformed expression: {0}")]
    MalformedExpression(String),

    /// A lookup table index does not exist or the table is incomplete
    #[error("Invalid lookup table '{table}': {reason}")]
    InvalidTable { table: String, reason: String },

    /// JSON serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for netlist operations
pub type Result<T> = std::result::Result<T, NetlistError>;
