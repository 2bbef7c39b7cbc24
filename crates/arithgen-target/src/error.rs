//! Error types for target construction

use thiserror::Error;

/// Errors that can occur while building or adjusting a target model
#[derive(Debug, Error)]
pub enum TargetError {
    /// No preset with this name
    #[error("Unknown target preset: {0}")]
    UnknownPreset(String),

    /// A parameter is outside the range the model supports
    #[error("Invalid target parameter {parameter}: {reason}")]
    InvalidParameter { parameter: String, reason: String },
}

/// Result type for target operations
pub type Result<T> = std::result::Result<T, TargetError>;
