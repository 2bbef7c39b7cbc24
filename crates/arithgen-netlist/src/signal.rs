//! Signals and their arrival times

use serde::{Deserialize, Serialize};

use crate::pipeline::Timing;

/// Index of a signal within its component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId(pub usize);

/// Role of a signal in its component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    Input,
    Output,
    Wire,
}

/// A named bit-vector signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub name: String,
    pub width: usize,
    pub kind: SignalKind,
    /// When the value becomes valid
    pub timing: Timing,
}

impl Signal {
    pub fn is_port(&self) -> bool {
        matches!(self.kind, SignalKind::Input | SignalKind::Output)
    }
}
