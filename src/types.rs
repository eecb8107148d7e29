//! Canonical entities (§3): the client-facing Anthropic request shape and
//! the vendor-facing Chat/Responses shapes it is translated into.
//!
//! Field layout follows `protocol/anthropic/messages/request.rs` from the
//! teacher: plain structs with `#[serde(default)]` optionals and a flattened
//! `unknown_fields` bag so fields this crate doesn't model round-trip rather
//! than vanish.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Extra wire fields preserved verbatim across translation.
pub type UnknownFields = HashMap<String, Value>;

/// A request in the Anthropic Messages wire format — the sole input shape
/// this crate accepts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientRequest {
    pub model: String,
    pub messages: Vec<Message>,

    #[serde(default)]
    pub system: Option<SystemPrompt>,

    pub max_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub top_p: Option<f32>,

    #[serde(default)]
    pub stop_sequences: Option<Vec<String>>,

    #[serde(default)]
    pub stream: Option<bool>,

    #[serde(default)]
    pub tools: Option<Vec<ToolSpec>>,

    #[serde(default)]
    pub tool_choice: Option<ToolChoice>,

    #[serde(default)]
    pub thinking: Option<ThinkingConfig>,

    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

/// System prompt: one plain string, or an ordered sequence of text
/// fragments (the richer form some clients send to attach cache hints).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SystemPrompt {
    Text(String),
    Blocks(Vec<SystemTextBlock>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SystemTextBlock {
    pub text: String,
    #[serde(flatten)]
    pub unknown_fields: UnknownFields,
}

impl SystemPrompt {
    /// Flattens to a single string the way the request translator needs it
    /// before identity filtering and vendor-specific appends.
    pub fn as_text(&self) -> String {
        match self {
            SystemPrompt::Text(s) => s.clone(),
            SystemPrompt::Blocks(blocks) => blocks.iter().map(|b| b.text.as_str()).collect::<Vec<_>>().join("\n"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl MessageContent {
    pub fn as_blocks(&self) -> Vec<ContentBlock> {
        match self {
            MessageContent::Text(text) => vec![ContentBlock::Text { text: text.clone() }],
            MessageContent::Blocks(blocks) => blocks.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        #[serde(flatten)]
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: ToolResultContent,
        #[serde(default)]
        is_error: Option<bool>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageSource {
    pub media_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<TextFragment>),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TextFragment {
    pub text: String,
}

impl ToolResultContent {
    pub fn as_text(&self) -> String {
        match self {
            ToolResultContent::Text(s) => s.clone(),
            ToolResultContent::Blocks(fragments) => {
                fragments.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join("\n")
            }
        }
    }
}

/// A tool definition. `ComputerUse` carries a vendor type tag
/// (`computer` | `text_editor` | `bash`) instead of a name and is expanded
/// by the tool catalogue (§4.4) into a concrete function schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ToolSpec {
    Function(FunctionToolSpec),
    ComputerUse { r#type: String },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolChoice {
    Auto {
        #[serde(default)]
        disable_parallel_tool_use: bool,
    },
    Any {
        #[serde(default)]
        disable_parallel_tool_use: bool,
    },
    Tool {
        name: String,
        #[serde(default)]
        disable_parallel_tool_use: bool,
    },
    None,
}

impl ToolChoice {
    /// Whether the client asked the vendor not to call more than one tool
    /// per turn — forwarded as `parallel_tool_calls: false` on dialects that
    /// support it (§4.6, §4.7).
    pub fn disable_parallel_tool_use(&self) -> bool {
        match self {
            ToolChoice::Auto { disable_parallel_tool_use }
            | ToolChoice::Any { disable_parallel_tool_use }
            | ToolChoice::Tool { disable_parallel_tool_use, .. } => *disable_parallel_tool_use,
            ToolChoice::None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ThinkingConfig {
    pub budget_tokens: u32,
}
