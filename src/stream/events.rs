//! Wire payloads for the Anthropic-dialect SSE events this crate emits
//! (§6): `message_start`, `content_block_start`, `content_block_delta`,
//! `content_block_stop`, `message_delta`, `message_stop`.

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct MessageStartEvent {
    pub message: MessageStartPayload,
}

#[derive(Debug, Serialize)]
pub struct MessageStartPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub role: &'static str,
    pub content: [(); 0],
    pub model: String,
    pub stop_reason: Option<&'static str>,
    pub stop_sequence: Option<&'static str>,
    pub usage: UsagePayload,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct UsagePayload {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ContentBlockStartEvent {
    pub index: u32,
    pub content_block: ContentBlockStartPayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockStartPayload {
    Text { text: &'static str },
    Thinking { thinking: &'static str },
    ToolUse { id: String, name: String, input: Value },
}

#[derive(Debug, Serialize)]
pub struct ContentBlockDeltaEvent {
    pub index: u32,
    pub delta: ContentBlockDeltaPayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockDeltaPayload {
    TextDelta { text: String },
    ThinkingDelta { thinking: String },
    InputJsonDelta { partial_json: String },
}

#[derive(Debug, Serialize)]
pub struct ContentBlockStopEvent {
    pub index: u32,
}

#[derive(Debug, Serialize)]
pub struct MessageDeltaEvent {
    pub delta: MessageDeltaPayload,
    pub usage: UsagePayload,
}

#[derive(Debug, Serialize)]
pub struct MessageDeltaPayload {
    pub stop_reason: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageStopEvent {}

/// `message_start` is always emitted with placeholder usage `{input:100,
/// output:1}` per §4.9; the real usage trailer replaces it in the closing
/// `message_delta`.
pub const PLACEHOLDER_USAGE: UsagePayload = UsagePayload { input_tokens: 100, output_tokens: 1 };
