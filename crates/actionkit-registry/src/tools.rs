//! LLM tool-definition export.
//!
//! Derives `{ name, description, parameters }` entries mechanically from a
//! registry's function names and input-schema documents, in the shape
//! expected by OpenAI-style function-calling APIs.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::RegistryResult;
use crate::registry::ActionRegistry;

/// One function-calling tool entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The action's `function_name`.
    pub name: String,
    /// The action's metadata description.
    pub description: String,
    /// JSON Schema document of the action's input.
    pub parameters: JsonValue,
}

/// Emit tool definitions for every action in the registry, in registry
/// order. `subset` restricts the export to the given ids; unknown ids are
/// an error.
pub fn tool_definitions(
    registry: &ActionRegistry,
    subset: Option<&[&str]>,
) -> RegistryResult<Vec<ToolDefinition>> {
    let scoped;
    let registry = match subset {
        Some(ids) => {
            scoped = registry.pick(ids)?;
            &scoped
        }
        None => registry,
    };

    let tools = registry
        .iter()
        .map(|(_, action)| ToolDefinition {
            name: action.function_name().to_string(),
            description: action.metadata().description.clone(),
            parameters: action.input_json_schema().clone(),
        })
        .collect();
    Ok(tools)
}
