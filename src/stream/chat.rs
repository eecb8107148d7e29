//! Chat-Completions stream translator (§4.9): the state machine converting
//! upstream Chat-Completions SSE chunks into the Anthropic SSE dialect.
//!
//! Shaped after `provider/anthropic/output.rs::AnthropicStreamProcessor` —
//! the teacher's same accumulate-then-emit loop, run in the opposite
//! direction and against a different wire vocabulary.

use std::io::Read;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::registry;
use crate::scaler::ContextScaler;
use crate::stream::events::{
    ContentBlockDeltaEvent, ContentBlockDeltaPayload, ContentBlockStartEvent, ContentBlockStartPayload,
    ContentBlockStopEvent, MessageDeltaEvent, MessageDeltaPayload, MessageStartEvent, MessageStartPayload,
    MessageStopEvent, PLACEHOLDER_USAGE, UsagePayload,
};
use crate::stream::scanner::LineScanner;
use crate::stream::sink::{EventSink, emit};
use crate::stream::state::{Phase, StreamState};

#[derive(Debug, Default, Deserialize)]
struct UpstreamChunk {
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
    #[serde(default)]
    usage: Option<UpstreamUsage>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamChoice {
    #[serde(default)]
    delta: UpstreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<UpstreamToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct UpstreamToolCallDelta {
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<UpstreamFunctionDelta>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct UpstreamUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

struct Inner {
    state: StreamState,
    grok_buffer: String,
    usage_callback: Option<Box<dyn FnMut(u32, u32) + Send>>,
}

/// Converts one in-flight Chat-Completions response into Anthropic-dialect
/// SSE, per §4.9. One instance is created per response (§3 Lifecycle).
pub struct ChatStreamTranslator {
    message_id: String,
    target_model: String,
    scaler: ContextScaler,
    inner: tokio::sync::Mutex<Inner>,
}

impl ChatStreamTranslator {
    pub fn new(message_id: impl Into<String>, target_model: impl Into<String>) -> Self {
        let target_model = target_model.into();
        let scaler = crate::scaler::new_context_scaler(&target_model);
        Self {
            message_id: message_id.into(),
            target_model,
            scaler,
            inner: tokio::sync::Mutex::new(Inner {
                state: StreamState::new(),
                grok_buffer: String::new(),
                usage_callback: None,
            }),
        }
    }

    pub fn set_usage_callback(&self, callback: impl FnMut(u32, u32) + Send + 'static) {
        self.inner.blocking_lock().usage_callback = Some(Box::new(callback));
    }

    pub fn get_usage(&self) -> (u32, u32) {
        let usage = self.inner.blocking_lock().state.usage;
        (usage.input_tokens, usage.output_tokens)
    }

    pub fn get_response_id(&self) -> String {
        self.inner.blocking_lock().state.response_id.clone().unwrap_or_default()
    }

    /// Reads upstream SSE lines from `reader` until `data: [DONE]` or EOF,
    /// translating each chunk and writing the result to `sink`.
    pub fn process<R: Read, S: EventSink>(&self, reader: R, sink: &mut S) -> Result<()> {
        let mut scanner = LineScanner::new(reader);
        let is_grok = registry::is_grok(&self.target_model);

        while let Some(line) = scanner.next_line()? {
            let line = line.trim();
            let Some(payload) = line.strip_prefix("data:") else { continue };
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if payload == "[DONE]" {
                break;
            }

            let chunk = match sonic_rs::from_str::<UpstreamChunk>(payload) {
                Ok(chunk) => chunk,
                Err(e) => {
                    log::warn!("skipping malformed Chat-Completions chunk: {e}");
                    continue;
                }
            };

            let mut guard = self.inner.blocking_lock();
            let done = self.apply_chunk(&mut guard, sink, chunk, is_grok)?;
            drop(guard);
            if done {
                sink.write_done()?;
                return Ok(());
            }
        }

        // Upstream closed without a finish_reason: treat as a normal
        // completion (§5 — a dropped socket is terminal, not an error).
        let mut guard = self.inner.blocking_lock();
        if guard.state.phase != Phase::Done {
            close_open_content_block(&mut guard.state, sink)?;
            emit_message_delta(&mut guard.state, sink, "end_turn", self.scaler)?;
            emit(sink, "message_stop", &MessageStopEvent {})?;
            guard.state.phase = Phase::Done;
        }
        drop(guard);
        sink.write_done()
    }

    /// Returns `true` once the response has reached `Done`.
    fn apply_chunk<S: EventSink>(&self, inner: &mut Inner, sink: &mut S, chunk: UpstreamChunk, is_grok: bool) -> Result<bool> {
        for choice in chunk.choices {
            ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;

            if let Some(reasoning) = choice.delta.reasoning {
                if !reasoning.is_empty() {
                    open_thinking_block(&mut inner.state, sink)?;
                    emit(
                        sink,
                        "content_block_delta",
                        &ContentBlockDeltaEvent {
                            index: inner.state.thinking_block_index.unwrap(),
                            delta: ContentBlockDeltaPayload::ThinkingDelta { thinking: reasoning },
                        },
                    )?;
                }
            }

            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    if is_grok {
                        inner.grok_buffer.push_str(&content);
                        let chunks = drain_grok_buffer(&mut inner.grok_buffer);
                        for grok_chunk in chunks {
                            emit_grok_chunk(&mut inner.state, sink, grok_chunk)?;
                        }
                    } else {
                        emit_text_delta(&mut inner.state, sink, &content)?;
                    }
                }
            }

            if let Some(tool_calls) = choice.delta.tool_calls {
                for tc in tool_calls {
                    apply_tool_call_delta(&mut inner.state, sink, tc)?;
                }
            }

            if let Some(finish_reason) = choice.finish_reason {
                if is_grok && !inner.grok_buffer.is_empty() {
                    let leftover = std::mem::take(&mut inner.grok_buffer);
                    emit_grok_chunk(&mut inner.state, sink, GrokChunk::Text(leftover))?;
                }

                close_open_content_block(&mut inner.state, sink)?;
                if let Some(usage) = chunk.usage {
                    inner.state.usage.input_tokens = self.scaler.scale(usage.prompt_tokens);
                    inner.state.usage.output_tokens = self.scaler.scale(usage.completion_tokens);
                    if let Some(callback) = &mut inner.usage_callback {
                        callback(inner.state.usage.input_tokens, inner.state.usage.output_tokens);
                    }
                }
                let stop_reason = map_finish_reason(&finish_reason);
                emit_message_delta(&mut inner.state, sink, stop_reason, self.scaler)?;
                emit(sink, "message_stop", &MessageStopEvent {})?;
                inner.state.phase = Phase::Done;
                return Ok(true);
            }
        }

        Ok(false)
    }
}

fn map_finish_reason(reason: &str) -> &'static str {
    match reason {
        "stop" => "end_turn",
        "tool_calls" => "tool_use",
        "length" => "max_tokens",
        "content_filter" => "end_turn",
        _ => "end_turn",
    }
}

fn ensure_started<S: EventSink>(state: &mut StreamState, sink: &mut S, message_id: &str, model: &str) -> Result<()> {
    if state.phase != Phase::Idle {
        return Ok(());
    }
    emit(
        sink,
        "message_start",
        &MessageStartEvent {
            message: MessageStartPayload {
                id: message_id.to_string(),
                kind: "message",
                role: "assistant",
                content: [],
                model: model.to_string(),
                stop_reason: None,
                stop_sequence: None,
                usage: PLACEHOLDER_USAGE,
            },
        },
    )?;
    emit(sink, "ping", &serde_json::json!({"type": "ping"}))?;
    state.phase = Phase::MessageStarted;
    Ok(())
}

fn open_thinking_block<S: EventSink>(state: &mut StreamState, sink: &mut S) -> Result<()> {
    if state.phase == Phase::ThinkingContent {
        return Ok(());
    }
    let index = state.allocate_index();
    state.thinking_block_index = Some(index);
    emit(
        sink,
        "content_block_start",
        &ContentBlockStartEvent { index, content_block: ContentBlockStartPayload::Thinking { thinking: "" } },
    )?;
    state.phase = Phase::ThinkingContent;
    Ok(())
}

fn emit_text_delta<S: EventSink>(state: &mut StreamState, sink: &mut S, text: &str) -> Result<()> {
    if state.phase == Phase::ThinkingContent {
        let index = state.thinking_block_index.unwrap();
        emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
    }
    if state.text_block_index.is_none() {
        let index = state.allocate_index();
        state.text_block_index = Some(index);
        emit(
            sink,
            "content_block_start",
            &ContentBlockStartEvent { index, content_block: ContentBlockStartPayload::Text { text: "" } },
        )?;
    }
    state.phase = Phase::TextContent;
    emit(
        sink,
        "content_block_delta",
        &ContentBlockDeltaEvent {
            index: state.text_block_index.unwrap(),
            delta: ContentBlockDeltaPayload::TextDelta { text: text.to_string() },
        },
    )
}

/// Closes whatever block is currently open (thinking, text, or the active
/// tool call), per "Any --finish_reason--> (close open blocks) --> Done".
fn close_open_content_block<S: EventSink>(state: &mut StreamState, sink: &mut S) -> Result<()> {
    if let Phase::ThinkingContent = state.phase {
        if let Some(index) = state.thinking_block_index {
            emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
        }
    }
    if let Phase::TextContent = state.phase {
        if let Some(index) = state.text_block_index {
            emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
        }
    }
    if let Phase::ToolCall = state.phase {
        for builder in state.tool_calls.values_mut() {
            if builder.started && !builder.closed {
                if let Some(index) = builder.block_index {
                    emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
                }
                builder.closed = true;
            }
        }
    }
    Ok(())
}

fn emit_message_delta<S: EventSink>(state: &mut StreamState, sink: &mut S, stop_reason: &'static str, scaler: ContextScaler) -> Result<()> {
    let _ = scaler;
    emit(
        sink,
        "message_delta",
        &MessageDeltaEvent {
            delta: MessageDeltaPayload { stop_reason },
            usage: UsagePayload { input_tokens: state.usage.input_tokens, output_tokens: state.usage.output_tokens },
        },
    )
}

fn apply_tool_call_delta<S: EventSink>(state: &mut StreamState, sink: &mut S, tc: UpstreamToolCallDelta) -> Result<()> {
    let frag = tc.function.as_ref().and_then(|f| f.arguments.clone()).unwrap_or_default();
    let name_now = tc.function.as_ref().and_then(|f| f.name.clone());

    {
        let entry = state.tool_calls.entry(tc.index).or_default();
        if let Some(id) = tc.id {
            entry.id = Some(id);
        }
        if let Some(name) = name_now {
            entry.name = Some(name);
        }
        if !frag.is_empty() {
            entry.arguments.push_str(&frag);
        }
    }

    let entry = state.tool_calls.get(&tc.index).expect("just inserted above");
    let should_open = !entry.started && entry.id.is_some() && entry.name.is_some();
    let already_active = entry.started && !entry.closed;

    if should_open {
        let id = entry.id.clone().unwrap();
        let name = entry.name.clone().unwrap();

        if let Phase::TextContent | Phase::ThinkingContent = state.phase {
            close_open_content_block(state, sink)?;
        }

        let index = state.allocate_index();
        let entry = state.tool_calls.get_mut(&tc.index).expect("present");
        entry.block_index = Some(index);
        entry.started = true;
        state.phase = Phase::ToolCall;
        state.any_tool_call_opened = true;

        emit(
            sink,
            "content_block_start",
            &ContentBlockStartEvent {
                index,
                content_block: ContentBlockStartPayload::ToolUse { id, name, input: Value::Object(Default::default()) },
            },
        )?;

        if !frag.is_empty() {
            emit(
                sink,
                "content_block_delta",
                &ContentBlockDeltaEvent { index, delta: ContentBlockDeltaPayload::InputJsonDelta { partial_json: frag } },
            )?;
        }
    } else if already_active && !frag.is_empty() {
        let index = entry.block_index.unwrap();
        emit(
            sink,
            "content_block_delta",
            &ContentBlockDeltaEvent { index, delta: ContentBlockDeltaPayload::InputJsonDelta { partial_json: frag } },
        )?;
    }

    Ok(())
}

enum GrokChunk {
    Text(String),
    ToolCall { name: String, input: Value },
}

static GROK_FUNCTION_CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<xai:function_call name="([^"]*)">(.*?)</xai:function_call>"#).unwrap());
static GROK_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?s)<xai:parameter name="([^"]*)">(.*?)</xai:parameter>"#).unwrap());

/// Extracts as many complete `<xai:function_call>` envelopes as currently
/// present in `buffer`, leaving a trailing partial envelope (if any) for the
/// next call. Text outside envelopes is returned as [`GrokChunk::Text`].
fn drain_grok_buffer(buffer: &mut String) -> Vec<GrokChunk> {
    let mut out = Vec::new();

    loop {
        if let Some(m) = GROK_FUNCTION_CALL_RE.captures(buffer) {
            let whole = m.get(0).unwrap();
            let pre = buffer[..whole.start()].to_string();
            if !pre.is_empty() {
                out.push(GrokChunk::Text(pre));
            }

            let name = m.get(1).unwrap().as_str().to_string();
            let body = m.get(2).unwrap().as_str().to_string();
            let mut input = serde_json::Map::new();
            for pc in GROK_PARAM_RE.captures_iter(&body) {
                let pname = pc.get(1).unwrap().as_str().to_string();
                let pval = pc.get(2).unwrap().as_str();
                let value = serde_json::from_str::<Value>(pval).unwrap_or_else(|_| Value::String(pval.to_string()));
                input.insert(pname, value);
            }
            out.push(GrokChunk::ToolCall { name, input: Value::Object(input) });

            let rest_start = whole.end();
            *buffer = buffer[rest_start..].to_string();
        } else if let Some(partial_start) = buffer.find("<xai:function_call") {
            if partial_start > 0 {
                out.push(GrokChunk::Text(buffer[..partial_start].to_string()));
            }
            *buffer = buffer[partial_start..].to_string();
            break;
        } else {
            if !buffer.is_empty() {
                out.push(GrokChunk::Text(std::mem::take(buffer)));
            }
            break;
        }
    }

    out
}

fn emit_grok_chunk<S: EventSink>(state: &mut StreamState, sink: &mut S, chunk: GrokChunk) -> Result<()> {
    match chunk {
        GrokChunk::Text(text) => {
            if !text.is_empty() {
                emit_text_delta(state, sink, &text)?;
            }
            Ok(())
        }
        GrokChunk::ToolCall { name, input } => {
            if let Phase::TextContent | Phase::ThinkingContent = state.phase {
                close_open_content_block(state, sink)?;
            }
            let index = state.allocate_index();
            let id = format!("call_{}", uuid::Uuid::new_v4());
            state.phase = Phase::ToolCall;
            state.any_tool_call_opened = true;

            emit(
                sink,
                "content_block_start",
                &ContentBlockStartEvent { index, content_block: ContentBlockStartPayload::ToolUse { id, name, input: input.clone() } },
            )?;
            emit(
                sink,
                "content_block_delta",
                &ContentBlockDeltaEvent {
                    index,
                    delta: ContentBlockDeltaPayload::InputJsonDelta { partial_json: serde_json::to_string(&input).unwrap_or_default() },
                },
            )?;
            emit(sink, "content_block_stop", &ContentBlockStopEvent { index })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::sink::test_support::RecordingSink;
    use indoc::indoc;

    fn run(body: &str, model: &str) -> RecordingSink {
        let translator = ChatStreamTranslator::new("msg_1", model);
        let mut sink = RecordingSink::default();
        translator.process(body.as_bytes(), &mut sink).unwrap();
        sink
    }

    #[test]
    fn s5_tool_call_streaming_scenario() {
        let body = indoc! {r#"
            data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_x","function":{"name":"f","arguments":""}}]}}]}

            data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"a\":"}}]}}]}

            data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"1}"}}]}}]}

            data: {"choices":[{"delta":{},"finish_reason":"tool_calls"}]}

            data: [DONE]
        "#};

        let sink = run(body, "gpt-4o");
        let names: Vec<&str> = sink.events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "message_start",
                "ping",
                "content_block_start",
                "content_block_delta",
                "content_block_delta",
                "content_block_stop",
                "message_delta",
                "message_stop",
            ]
        );
        assert!(sink.done);
        assert!(sink.events[2].1.contains(r#""id":"call_x""#));
        assert!(sink.events[6].1.contains(r#""stop_reason":"tool_use""#));
    }

    #[test]
    fn text_only_stream_closes_cleanly() {
        let body = indoc! {r#"
            data: {"choices":[{"delta":{"content":"Hello"}}]}

            data: {"choices":[{"delta":{"content":" world"},"finish_reason":"stop"}]}

            data: [DONE]
        "#};

        let sink = run(body, "gpt-4o");
        let names: Vec<&str> = sink.events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["message_start", "ping", "content_block_start", "content_block_delta", "content_block_delta", "content_block_stop", "message_delta", "message_stop"]
        );
        assert!(sink.events[6].1.contains(r#""stop_reason":"end_turn""#));
    }

    #[test]
    fn thinking_then_text_closes_thinking_before_opening_text() {
        let body = indoc! {r#"
            data: {"choices":[{"delta":{"reasoning":"hmm"}}]}

            data: {"choices":[{"delta":{"content":"answer"},"finish_reason":"stop"}]}

            data: [DONE]
        "#};

        let sink = run(body, "gpt-4o");
        let names: Vec<&str> = sink.events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "message_start",
                "ping",
                "content_block_start",
                "content_block_delta",
                "content_block_stop",
                "content_block_start",
                "content_block_delta",
                "content_block_stop",
                "message_delta",
                "message_stop",
            ]
        );
    }

    #[test]
    fn malformed_chunk_is_skipped_not_fatal() {
        let body = indoc! {r#"
            data: not json at all

            data: {"choices":[{"delta":{"content":"ok"},"finish_reason":"stop"}]}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-4o");
        assert!(sink.done);
        assert!(sink.events.iter().any(|(n, _)| n == "message_stop"));
    }

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(map_finish_reason("stop"), "end_turn");
        assert_eq!(map_finish_reason("tool_calls"), "tool_use");
        assert_eq!(map_finish_reason("length"), "max_tokens");
        assert_eq!(map_finish_reason("content_filter"), "end_turn");
        assert_eq!(map_finish_reason("something_else"), "end_turn");
    }

    #[test]
    fn grok_xml_envelope_split_across_chunks_yields_one_tool_use() {
        let body = indoc! {r#"
            data: {"choices":[{"delta":{"content":"before <xai:function_call "}}]}

            data: {"choices":[{"delta":{"content":"name=\"search\"><xai:parameter name=\"q\">"}}]}

            data: {"choices":[{"delta":{"content":"hello</xai:parameter></xai:function_call> after"},"finish_reason":"stop"}]}

            data: [DONE]
        "#};

        let sink = run(body, "grok-4");
        let tool_starts: Vec<_> = sink
            .events
            .iter()
            .filter(|(n, json)| n == "content_block_start" && json.contains("tool_use"))
            .collect();
        assert_eq!(tool_starts.len(), 1);
        assert!(tool_starts[0].1.contains(r#""name":"search""#));

        let text_deltas: Vec<_> =
            sink.events.iter().filter(|(n, json)| n == "content_block_delta" && json.contains("text_delta")).collect();
        assert!(text_deltas.iter().any(|(_, j)| j.contains("before")));
        assert!(text_deltas.iter().any(|(_, j)| j.contains("after")));
    }

    #[test]
    fn drain_grok_buffer_retains_partial_envelope() {
        let mut buf = "leading text <xai:function_call name=\"f\">".to_string();
        let chunks = drain_grok_buffer(&mut buf);
        assert_eq!(chunks.len(), 1);
        assert!(matches!(&chunks[0], GrokChunk::Text(t) if t == "leading text "));
        assert!(buf.starts_with("<xai:function_call"));
    }
}
