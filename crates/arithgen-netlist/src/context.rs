//! Generation context
//!
//! Carries the unique-id counter and the registry of generated components
//! through one generation run. Nothing here is global: independent runs
//! use independent contexts.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::component::Component;
use crate::error::{NetlistError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    next_uid: u64,
    components: IndexMap<String, Component>,
}

impl GenerationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh id for naming generated signals and components
    pub fn next_uid(&mut self) -> u64 {
        let uid = self.next_uid;
        self.next_uid += 1;
        uid
    }

    /// Register a component; a component with the same name wins over later ones
    pub fn register(&mut self, component: Component) -> String {
        let name = component.name.clone();
        if self.components.contains_key(&name) {
            debug!(component = %name, "already registered");
        } else {
            debug!(component = %name, latency = component.latency, "registered");
            self.components.insert(name.clone(), component);
        }
        name
    }

    pub fn component(&self, name: &str) -> Result<&Component> {
        self.components
            .get(name)
            .ok_or_else(|| NetlistError::UnknownComponent(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Components in registration order, sub-components first
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
