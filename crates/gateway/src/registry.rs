use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::GatewayError;
use crate::tool::Tool;

/// Externally visible tool metadata, suitable for building an action catalog
/// for a function-calling caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Name-to-tool map. Populated during a single-threaded bootstrap phase and
/// treated as read-only afterwards; shared as `Arc<ToolRegistry>` so
/// concurrent `execute` calls look tools up without locking.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Duplicate names are a startup-time configuration error, not a runtime
    /// condition: registration fails and the existing tool stays in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<&mut Self, GatewayError> {
        let name = tool.name().to_string();
        match self.tools.entry(name.clone()) {
            std::collections::hash_map::Entry::Occupied(_) => {
                Err(GatewayError::DuplicateTool { name })
            }
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(tool);
                Ok(self)
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Catalog of tools whose required scope set is a subset of `granted`.
    /// Tools requiring ungranted scopes never appear, even as metadata.
    /// Sorted by name so the catalog is stable across calls.
    pub fn list_for_scopes(&self, granted: &BTreeSet<String>) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .filter(|tool| {
                tool.required_scopes()
                    .iter()
                    .all(|scope| granted.contains(scope))
            })
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        specs
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
