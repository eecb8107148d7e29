//! Request translator (§4.6, §4.7): Anthropic-request → vendor-request, for
//! both the Chat-Completions and Responses wire shapes.
//!
//! Synchronous and pure per §5: given identical input it produces identical
//! output with no shared mutable state, so both entry points are free
//! functions rather than methods on a translator value.

mod chat;
mod responses;

pub use chat::translate_request_chat;
pub use responses::translate_request_responses;

use serde_json::Value;

use crate::tools;
use crate::types::{FunctionToolSpec, ToolSpec};

/// Resolves a client [`ToolSpec`] to its wire definition. Client-supplied
/// schemas for recognised catalogue tools (§4.4) are replaced outright;
/// `ComputerUse` tags are expanded; anything else passes through as the
/// client declared it.
pub(super) fn resolve_tool_definition(tool: &ToolSpec) -> (String, String, Value) {
    match tool {
        ToolSpec::Function(function) => {
            if let Some(canonical) = tools::canonical(&function.name) {
                (canonical.name.clone(), canonical.description.clone().unwrap_or_default(), canonical.input_schema.clone())
            } else {
                (function.name.clone(), function.description.clone().unwrap_or_default(), function.input_schema.clone())
            }
        }
        ToolSpec::ComputerUse { r#type } => {
            let expanded = tools::expand_computer_use(r#type).unwrap_or_else(|| FunctionToolSpec {
                name: r#type.clone(),
                description: None,
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            });
            (expanded.name, expanded.description.unwrap_or_default(), expanded.input_schema)
        }
    }
}
