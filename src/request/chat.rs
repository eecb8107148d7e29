//! Chat-form request translator (§4.6).

use std::collections::HashSet;

use serde_json::{Map, Value, json};

use crate::identity;
use crate::reasoning::{self, ChatReasoning};
use crate::registry::{self, Vendor};
use crate::request::resolve_tool_definition;
use crate::schema::{self, SchemaTarget};
use crate::types::*;

const GROK_TOOL_FORMAT_INSTRUCTION: &str = "\n\nWhen you need to call a tool, emit it as \
<xai:function_call name=\"tool_name\"><xai:parameter name=\"param\">value</xai:parameter></xai:function_call>.";

/// Translates a [`ClientRequest`] into a Chat-Completions-shaped JSON body
/// addressed to `target_model` (the resolved backend model id, which may
/// differ from `request.model` after upstream routing/aliasing).
pub fn translate_request_chat(request: &ClientRequest, target_model: &str) -> Value {
    let model = target_model;
    let is_grok = registry::is_grok(model);

    let mut messages: Vec<Value> = Vec::new();
    match &request.system {
        Some(system) => {
            let mut text = identity::filter(&system.as_text());
            if is_grok {
                text.push_str(GROK_TOOL_FORMAT_INSTRUCTION);
            }
            messages.push(json!({"role": "system", "content": text}));
        }
        None if is_grok => {
            messages.push(json!({"role": "system", "content": GROK_TOOL_FORMAT_INSTRUCTION.trim_start()}));
        }
        None => {}
    }
    messages.extend(apply_azure_sequencing_buffer(translate_messages(&request.messages)));

    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    body.insert("messages".to_string(), Value::Array(messages));

    let capped = registry::output_token_cap(model, request.max_tokens);
    if reasoning::uses_max_completion_tokens(model) {
        body.insert("max_completion_tokens".to_string(), json!(capped));
        body.insert("max_tokens".to_string(), json!(0));
    } else {
        body.insert("max_tokens".to_string(), json!(capped));
    }

    if let Some(t) = request.temperature {
        body.insert("temperature".to_string(), json!(t));
    }
    if let Some(p) = request.top_p {
        body.insert("top_p".to_string(), json!(p));
    }
    if let Some(stops) = &request.stop_sequences {
        body.insert("stop".to_string(), json!(stops));
    }
    if request.stream.unwrap_or(false) {
        body.insert("stream".to_string(), json!(true));
        body.insert("stream_options".to_string(), json!({"include_usage": true}));
    }

    if let Some(tools) = &request.tools {
        if !tools.is_empty() {
            let target = schema_target_for(registry::detect_vendor(model), model);
            let envelopes: Vec<Value> = tools.iter().map(|t| tool_envelope(t, target)).collect();
            body.insert("tools".to_string(), Value::Array(envelopes));
        }
    }

    if let Some(choice) = &request.tool_choice {
        body.insert("tool_choice".to_string(), tool_choice_value(choice));
        if choice.disable_parallel_tool_use() {
            body.insert("parallel_tool_calls".to_string(), json!(false));
        }
    }

    if let Some(thinking) = &request.thinking {
        apply_reasoning(&mut body, model, thinking);
    }

    for (key, value) in &request.unknown_fields {
        body.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(body)
}

fn schema_target_for(vendor: Vendor, model: &str) -> SchemaTarget {
    match vendor {
        Vendor::Gemini => SchemaTarget::Gemini,
        Vendor::DeepSeek => SchemaTarget::DeepSeek { v3_2: registry::is_deepseek_v3_2(model) },
        Vendor::Ollama => SchemaTarget::Ollama,
        Vendor::OpenAi | Vendor::Qwen | Vendor::MiniMax | Vendor::Grok | Vendor::Routed => SchemaTarget::Chat,
    }
}

fn tool_envelope(tool: &ToolSpec, target: SchemaTarget) -> Value {
    let (name, description, schema) = resolve_tool_definition(tool);
    let parameters = schema::sanitize(schema, target);
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
            "strict": false,
        },
    })
}

fn tool_choice_value(choice: &ToolChoice) -> Value {
    match choice {
        ToolChoice::None => json!("none"),
        ToolChoice::Any { .. } => json!("required"),
        ToolChoice::Auto { .. } => json!("auto"),
        ToolChoice::Tool { name, .. } => json!({"type": "function", "function": {"name": name}}),
    }
}

fn apply_reasoning(body: &mut Map<String, Value>, model: &str, thinking: &ThinkingConfig) {
    match reasoning::chat_reasoning_for(model, thinking) {
        Some(ChatReasoning::Effort(effort)) => {
            body.insert("reasoning_effort".to_string(), json!(effort));
        }
        Some(ChatReasoning::ThinkingLevel(level)) => {
            body.insert("thinking_level".to_string(), json!(level));
        }
        Some(ChatReasoning::ThinkingBudget(budget)) => {
            body.insert("thinking_config".to_string(), json!({"thinking_budget": budget}));
        }
        Some(ChatReasoning::QwenThinking { enable, budget }) => {
            body.insert("enable_thinking".to_string(), json!(enable));
            body.insert("thinking_budget".to_string(), json!(budget));
        }
        Some(ChatReasoning::ReasoningSplit) => {
            body.insert("reasoning_split".to_string(), json!(true));
        }
        Some(ChatReasoning::EnableThinking) => {
            body.insert("enable_thinking".to_string(), json!(true));
        }
        None => {}
    }
}

/// Translates the client message sequence into flat Chat-dialect turns,
/// per §4.6 steps 4-5: tool results split into their own `tool`-role
/// messages, user content collapsed to string-or-parts, assistant text and
/// tool_use blocks merged into one message with a `tool_calls` array.
fn translate_messages(messages: &[Message]) -> Vec<Value> {
    let mut out = Vec::new();

    for message in messages {
        match message.role {
            Role::User => translate_user_message(message, &mut out),
            Role::Assistant => translate_assistant_message(message, &mut out),
            Role::Other => {
                if let MessageContent::Text(text) = &message.content {
                    out.push(json!({"role": "user", "content": text}));
                }
            }
        }
    }

    out
}

fn translate_user_message(message: &Message, out: &mut Vec<Value>) {
    let mut parts: Vec<Value> = Vec::new();

    for block in message.content.as_blocks() {
        match block {
            ContentBlock::ToolResult { tool_use_id, content, .. } => {
                out.push(json!({"role": "tool", "tool_call_id": tool_use_id, "content": content.as_text()}));
            }
            ContentBlock::Text { text } => parts.push(json!({"type": "text", "text": text})),
            ContentBlock::Image { source } => parts.push(json!({
                "type": "image_url",
                "image_url": {"url": format!("data:{};base64,{}", source.media_type, source.data)},
            })),
            ContentBlock::ToolUse { .. } => {}
        }
    }

    if parts.is_empty() {
        return;
    }
    let content = if parts.len() == 1 && parts[0]["type"] == "text" {
        parts[0]["text"].clone()
    } else {
        Value::Array(parts)
    };
    out.push(json!({"role": "user", "content": content}));
}

fn translate_assistant_message(message: &Message, out: &mut Vec<Value>) {
    let mut text = String::new();
    let mut tool_calls: Vec<Value> = Vec::new();

    for block in message.content.as_blocks() {
        match block {
            ContentBlock::Text { text: fragment } => text.push_str(&fragment),
            ContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(json!({
                    "id": id,
                    "type": "function",
                    "function": {"name": name, "arguments": serde_json::to_string(&input).unwrap_or_default()},
                }));
            }
            ContentBlock::ToolResult { .. } | ContentBlock::Image { .. } => {}
        }
    }

    if text.is_empty() && tool_calls.is_empty() {
        return;
    }

    let mut entry = Map::new();
    entry.insert("role".to_string(), json!("assistant"));
    entry.insert("content".to_string(), if text.is_empty() { Value::Null } else { json!(text) });
    if !tool_calls.is_empty() {
        entry.insert("tool_calls".to_string(), Value::Array(tool_calls));
    }
    out.push(Value::Object(entry));
}

/// Defers any `user` message that arrives while tool-call ids from a prior
/// assistant turn remain unresolved, flushing them once every pending id has
/// a matching `tool` response (§4.6 step 6). Anything still deferred at the
/// end of the sequence is flushed as-is.
fn apply_azure_sequencing_buffer(items: Vec<Value>) -> Vec<Value> {
    let mut output = Vec::with_capacity(items.len());
    let mut deferred: Vec<Value> = Vec::new();
    let mut pending: HashSet<String> = HashSet::new();

    for item in items {
        match item.get("role").and_then(Value::as_str).unwrap_or("") {
            "assistant" => {
                if let Some(calls) = item.get("tool_calls").and_then(Value::as_array) {
                    for call in calls {
                        if let Some(id) = call.get("id").and_then(Value::as_str) {
                            pending.insert(id.to_string());
                        }
                    }
                }
                output.push(item);
            }
            "tool" => {
                if let Some(id) = item.get("tool_call_id").and_then(Value::as_str) {
                    pending.remove(id);
                }
                output.push(item);
                if pending.is_empty() && !deferred.is_empty() {
                    output.append(&mut deferred);
                }
            }
            "user" if !pending.is_empty() => deferred.push(item),
            _ => output.push(item),
        }
    }

    output.append(&mut deferred);
    output
}
