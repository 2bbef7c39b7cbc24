//! Per-component resource and timing summary

use serde::{Deserialize, Serialize};

use crate::component::Component;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStats {
    pub name: String,
    pub latency: u32,
    pub output_delay: f64,
    pub signals: usize,
    pub tables: usize,
    pub table_bits: usize,
    pub instances: usize,
    pub register_bits: u64,
}

impl ComponentStats {
    pub fn of(component: &Component) -> Self {
        Self {
            name: component.name.clone(),
            latency: component.latency,
            output_delay: component.output_delay,
            signals: component.signals.len(),
            tables: component.tables.len(),
            table_bits: component.tables.iter().map(|t| t.size_bits()).sum(),
            instances: component.instances().count(),
            register_bits: component.register_bits(),
        }
    }
}

impl std::fmt::Display for ComponentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: latency {} cycle(s), output delay {:.3} ns, {} signals, {} tables ({} bits), {} instances, {} register bits",
            self.name,
            self.latency,
            self.output_delay,
            self.signals,
            self.tables,
            self.table_bits,
            self.instances,
            self.register_bits
        )
    }
}
