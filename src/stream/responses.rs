//! Responses stream translator (§4.10): consumes the newer, richer
//! Responses-API event vocabulary and emits the same Anthropic-dialect SSE
//! as [`crate::stream::chat::ChatStreamTranslator`].
//!
//! The Responses vocabulary is far less uniform per-event than
//! Chat-Completions chunks, so events are matched on their `type` tag over
//! `serde_json::Value` rather than deserialised into one fixed struct —
//! the same shape `provider/anthropic/output.rs` uses for its own tagged
//! `AnthropicStreamEvent`, just read generically instead of derived.

use std::collections::HashMap;
use std::io::Read;

use serde_json::Value;

use crate::error::Result;
use crate::ids;
use crate::scaler::ContextScaler;
use crate::stream::events::{
    ContentBlockDeltaEvent, ContentBlockDeltaPayload, ContentBlockStartEvent, ContentBlockStartPayload,
    ContentBlockStopEvent, MessageDeltaEvent, MessageDeltaPayload, MessageStartEvent, MessageStartPayload,
    MessageStopEvent, PLACEHOLDER_USAGE, UsagePayload,
};
use crate::stream::scanner::LineScanner;
use crate::stream::sink::{EventSink, emit};
use crate::stream::state::{Citation, Phase, StreamState, ToolCallBuilder};

struct Inner {
    state: StreamState,
    /// Open function-call blocks, keyed by the raw upstream item id (the
    /// Responses-dialect `fc_*`/`call_*` id, pre-translation) since arguments
    /// deltas and `output_item.done` reference it in that form.
    function_calls: HashMap<String, ToolCallBuilder>,
    refusal_started: bool,
    usage_callback: Option<Box<dyn FnMut(u32, u32) + Send>>,
}

/// Converts one in-flight Responses-API response into Anthropic-dialect
/// SSE, per §4.10.
pub struct ResponsesStreamTranslator {
    message_id: String,
    target_model: String,
    scaler: ContextScaler,
    inner: tokio::sync::Mutex<Inner>,
}

impl ResponsesStreamTranslator {
    pub fn new(message_id: impl Into<String>, target_model: impl Into<String>) -> Self {
        let target_model = target_model.into();
        let scaler = crate::scaler::new_context_scaler(&target_model);
        Self {
            message_id: message_id.into(),
            target_model,
            scaler,
            inner: tokio::sync::Mutex::new(Inner {
                state: StreamState::new(),
                function_calls: HashMap::new(),
                refusal_started: false,
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

    pub fn process<R: Read, S: EventSink>(&self, reader: R, sink: &mut S) -> Result<()> {
        let mut scanner = LineScanner::new(reader);

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

            let value: Value = match serde_json::from_str(payload) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("skipping malformed Responses event: {e}");
                    continue;
                }
            };

            let mut guard = self.inner.blocking_lock();
            if let Some(seq) = value.get("sequence_number").and_then(Value::as_u64) {
                if guard.state.is_duplicate_sequence(seq) {
                    continue;
                }
            }
            let done = self.apply_event(&mut guard, sink, &value)?;
            drop(guard);
            if done {
                sink.write_done()?;
                return Ok(());
            }
        }

        let mut guard = self.inner.blocking_lock();
        if guard.state.phase != Phase::Done {
            close_open_content_block(&mut guard, sink)?;
            emit_message_delta(&mut guard.state, sink, "end_turn")?;
            emit(sink, "message_stop", &MessageStopEvent {})?;
            guard.state.phase = Phase::Done;
        }
        drop(guard);
        sink.write_done()
    }

    fn apply_event<S: EventSink>(&self, inner: &mut Inner, sink: &mut S, value: &Value) -> Result<bool> {
        let event_type = value.get("type").and_then(Value::as_str).unwrap_or("");

        match event_type {
            "response.created" | "response.queued" | "response.in_progress" => {
                ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;
                if let Some(id) = value.get("response").and_then(|r| r.get("id")).and_then(Value::as_str) {
                    inner.state.response_id = Some(id.to_string());
                }
            }

            "response.output_item.added" => {
                let Some(item) = value.get("item") else { return Ok(false) };
                match item.get("type").and_then(Value::as_str).unwrap_or("") {
                    "function_call" => self.open_function_call(inner, sink, item)?,
                    "web_search_call" => self.open_web_search(inner, sink, item)?,
                    _ => {}
                }
            }

            "response.function_call_arguments.delta" => {
                let item_id = value.get("item_id").and_then(Value::as_str).unwrap_or("");
                let fragment = value.get("delta").and_then(Value::as_str).unwrap_or("");
                if !fragment.is_empty() {
                    if let Some(builder) = inner.function_calls.get_mut(item_id) {
                        builder.arguments.push_str(fragment);
                        if let Some(index) = builder.block_index {
                            emit(
                                sink,
                                "content_block_delta",
                                &ContentBlockDeltaEvent {
                                    index,
                                    delta: ContentBlockDeltaPayload::InputJsonDelta { partial_json: fragment.to_string() },
                                },
                            )?;
                        }
                    }
                }
            }

            "response.output_item.done" => {
                let Some(item) = value.get("item") else { return Ok(false) };
                if item.get("type").and_then(Value::as_str) == Some("function_call") {
                    let raw_id =
                        item.get("call_id").and_then(Value::as_str).or_else(|| item.get("id").and_then(Value::as_str)).unwrap_or("");
                    if let Some(builder) = inner.function_calls.get_mut(raw_id) {
                        if builder.started && !builder.closed {
                            if let Some(index) = builder.block_index {
                                emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
                            }
                            builder.closed = true;
                        }
                    }
                }
            }

            "response.output_text.delta" => {
                let text = value.get("delta").and_then(Value::as_str).unwrap_or("");
                if !text.is_empty() {
                    ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;
                    emit_text_delta(&mut inner.state, sink, text)?;
                }
            }

            "response.output_text.annotation.added" => {
                if let Some(annotation) = value.get("annotation") {
                    if annotation.get("type").and_then(Value::as_str) == Some("url_citation") {
                        let url = annotation.get("url").and_then(Value::as_str).unwrap_or("").to_string();
                        let title = annotation.get("title").and_then(Value::as_str).unwrap_or(&url).to_string();
                        if !url.is_empty() {
                            inner.state.citations.push(Citation { url, title });
                        }
                    }
                }
            }

            "response.refusal.delta" => {
                let fragment = value.get("delta").and_then(Value::as_str).unwrap_or("");
                if !fragment.is_empty() {
                    let text = if !inner.refusal_started {
                        inner.refusal_started = true;
                        format!("[Refused] {fragment}")
                    } else {
                        fragment.to_string()
                    };
                    ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;
                    emit_text_delta(&mut inner.state, sink, &text)?;
                }
            }

            "response.reasoning_text.delta" | "response.reasoning_summary_text.delta" => {
                let text = value.get("delta").and_then(Value::as_str).unwrap_or("");
                if !text.is_empty() {
                    ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;
                    open_thinking_block(&mut inner.state, sink)?;
                    emit(
                        sink,
                        "content_block_delta",
                        &ContentBlockDeltaEvent {
                            index: inner.state.thinking_block_index.unwrap(),
                            delta: ContentBlockDeltaPayload::ThinkingDelta { thinking: text.to_string() },
                        },
                    )?;
                }
            }

            "response.completed" => {
                self.emit_citations_if_any(inner, sink)?;
                close_open_content_block(inner, sink)?;
                self.apply_usage(inner, value.get("response").and_then(|r| r.get("usage")));
                let stop_reason = if inner.state.any_tool_call_opened { "tool_use" } else { "end_turn" };
                emit_message_delta(&mut inner.state, sink, stop_reason)?;
                if let Some(callback) = &mut inner.usage_callback {
                    callback(inner.state.usage.input_tokens, inner.state.usage.output_tokens);
                }
                emit(sink, "message_stop", &MessageStopEvent {})?;
                inner.state.phase = Phase::Done;
                return Ok(true);
            }

            "response.incomplete" => {
                close_open_content_block(inner, sink)?;
                self.apply_usage(inner, value.get("response").and_then(|r| r.get("usage")));
                emit_message_delta(&mut inner.state, sink, "max_tokens")?;
                emit(sink, "message_stop", &MessageStopEvent {})?;
                inner.state.phase = Phase::Done;
                return Ok(true);
            }

            "response.failed" => {
                let error = value.get("response").and_then(|r| r.get("error")).or_else(|| value.get("error"));
                let code = error.and_then(|e| e.get("code")).and_then(Value::as_str).unwrap_or("unknown_error");
                let message = error.and_then(|e| e.get("message")).and_then(Value::as_str).unwrap_or("");
                emit_text_delta(&mut inner.state, sink, &format!("Error: {code} - {message}"))?;
                close_open_content_block(inner, sink)?;
                emit_message_delta(&mut inner.state, sink, "end_turn")?;
                emit(sink, "message_stop", &MessageStopEvent {})?;
                inner.state.phase = Phase::Done;
                return Ok(true);
            }

            // Structural/telemetry events with no content of their own.
            "response.content_part.added"
            | "response.content_part.delta"
            | "response.content_part.done"
            | "response.output_text.done"
            | "response.refusal.done"
            | "response.reasoning_text.done"
            | "response.reasoning_summary_part.added"
            | "response.reasoning_summary_part.done"
            | "response.reasoning_summary_text.done"
            | "response.function_call_arguments.done"
            | "response.rate_limits.updated" => {}

            other => {
                log::debug!("ignoring unrecognised Responses event type: {other}");
            }
        }

        Ok(false)
    }

    fn open_function_call<S: EventSink>(&self, inner: &mut Inner, sink: &mut S, item: &Value) -> Result<()> {
        ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;
        if let Phase::TextContent | Phase::ThinkingContent = inner.state.phase {
            close_open_content_block(inner, sink)?;
        }

        let raw_id =
            item.get("call_id").and_then(Value::as_str).or_else(|| item.get("id").and_then(Value::as_str)).unwrap_or("").to_string();
        let name = item.get("name").and_then(Value::as_str).unwrap_or("").to_string();
        let translated_id = ids::reverse(&raw_id);

        let index = inner.state.allocate_index();
        inner.state.phase = Phase::ToolCall;
        inner.state.any_tool_call_opened = true;

        inner.function_calls.insert(
            raw_id,
            ToolCallBuilder {
                id: Some(translated_id.clone()),
                name: Some(name.clone()),
                arguments: String::new(),
                block_index: Some(index),
                started: true,
                closed: false,
            },
        );

        emit(
            sink,
            "content_block_start",
            &ContentBlockStartEvent {
                index,
                content_block: ContentBlockStartPayload::ToolUse { id: translated_id, name, input: Value::Object(Default::default()) },
            },
        )
    }

    fn open_web_search<S: EventSink>(&self, inner: &mut Inner, sink: &mut S, item: &Value) -> Result<()> {
        ensure_started(&mut inner.state, sink, &self.message_id, &self.target_model)?;
        if let Phase::TextContent | Phase::ThinkingContent = inner.state.phase {
            close_open_content_block(inner, sink)?;
        }

        let query = item
            .get("action")
            .and_then(|a| a.get("query"))
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        let raw_id = item.get("id").and_then(Value::as_str).unwrap_or("");
        let id = if raw_id.is_empty() { format!("call_{}", uuid::Uuid::new_v4()) } else { ids::reverse(raw_id) };

        let input = serde_json::json!({ "query": query });
        let index = inner.state.allocate_index();
        inner.state.phase = Phase::ToolCall;

        emit(
            sink,
            "content_block_start",
            &ContentBlockStartEvent {
                index,
                content_block: ContentBlockStartPayload::ToolUse { id, name: "WebSearch".to_string(), input: input.clone() },
            },
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

    fn emit_citations_if_any<S: EventSink>(&self, inner: &mut Inner, sink: &mut S) -> Result<()> {
        if inner.state.citations.is_empty() {
            return Ok(());
        }
        // If the text block was already opened and then closed by an
        // interleaved tool call, it can't accept further deltas — a closed
        // block index never reopens. Only append when text is still the
        // live block (or hasn't started yet, in which case one opens here).
        if inner.state.text_block_index.is_some() && inner.state.phase != Phase::TextContent {
            return Ok(());
        }
        let mut seen = std::collections::HashSet::new();
        let mut lines = String::from("\n\nSources:");
        for citation in &inner.state.citations {
            if seen.insert(citation.url.clone()) {
                lines.push_str(&format!("\n- [{}]({})", citation.title, citation.url));
            }
        }
        emit_text_delta(&mut inner.state, sink, &lines)
    }

    fn apply_usage(&self, inner: &mut Inner, usage: Option<&Value>) {
        let Some(usage) = usage else { return };
        let input = usage.get("input_tokens").and_then(Value::as_u64).unwrap_or(0) as u32;
        let output = usage.get("output_tokens").and_then(Value::as_u64).unwrap_or(0) as u32;
        inner.state.usage.input_tokens = self.scaler.scale(input);
        inner.state.usage.output_tokens = self.scaler.scale(output);
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

fn close_open_content_block<S: EventSink>(inner: &mut Inner, sink: &mut S) -> Result<()> {
    if let Phase::ThinkingContent = inner.state.phase {
        if let Some(index) = inner.state.thinking_block_index {
            emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
        }
    }
    if let Phase::TextContent = inner.state.phase {
        if let Some(index) = inner.state.text_block_index {
            emit(sink, "content_block_stop", &ContentBlockStopEvent { index })?;
        }
    }
    if let Phase::ToolCall = inner.state.phase {
        for builder in inner.function_calls.values_mut() {
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

fn emit_message_delta<S: EventSink>(state: &mut StreamState, sink: &mut S, stop_reason: &'static str) -> Result<()> {
    emit(
        sink,
        "message_delta",
        &MessageDeltaEvent {
            delta: MessageDeltaPayload { stop_reason },
            usage: UsagePayload { input_tokens: state.usage.input_tokens, output_tokens: state.usage.output_tokens },
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::sink::test_support::RecordingSink;
    use indoc::indoc;

    fn run(body: &str, model: &str) -> RecordingSink {
        let translator = ResponsesStreamTranslator::new("msg_1", model);
        let mut sink = RecordingSink::default();
        translator.process(body.as_bytes(), &mut sink).unwrap();
        sink
    }

    #[test]
    fn text_response_completes_with_end_turn() {
        let body = indoc! {r#"
            data: {"type":"response.created","sequence_number":1,"response":{"id":"resp_1"}}

            data: {"type":"response.output_text.delta","sequence_number":2,"delta":"Hi "}

            data: {"type":"response.output_text.delta","sequence_number":3,"delta":"there"}

            data: {"type":"response.completed","sequence_number":4,"response":{"usage":{"input_tokens":10,"output_tokens":2}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let names: Vec<&str> = sink.events.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec!["message_start", "ping", "content_block_start", "content_block_delta", "content_block_delta", "content_block_stop", "message_delta", "message_stop"]
        );
        assert!(sink.events[6].1.contains(r#""stop_reason":"end_turn""#));
    }

    #[test]
    fn duplicate_sequence_number_is_discarded() {
        let body = indoc! {r#"
            data: {"type":"response.created","sequence_number":1,"response":{"id":"resp_1"}}

            data: {"type":"response.output_text.delta","sequence_number":2,"delta":"Hi"}

            data: {"type":"response.output_text.delta","sequence_number":2,"delta":"Hi"}

            data: {"type":"response.completed","sequence_number":3,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let deltas = sink.events.iter().filter(|(n, _)| n == "content_block_delta").count();
        assert_eq!(deltas, 1);
    }

    #[test]
    fn function_call_round_trips_id_translation() {
        let body = indoc! {r#"
            data: {"type":"response.output_item.added","sequence_number":1,"item":{"type":"function_call","call_id":"fc_abc","name":"search"}}

            data: {"type":"response.function_call_arguments.delta","sequence_number":2,"item_id":"fc_abc","delta":"{\"q\":1}"}

            data: {"type":"response.output_item.done","sequence_number":3,"item":{"type":"function_call","call_id":"fc_abc","name":"search"}}

            data: {"type":"response.completed","sequence_number":4,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let start = sink.events.iter().find(|(n, _)| n == "content_block_start").unwrap();
        assert!(start.1.contains(r#""id":"call_abc""#));
        let delta_event = sink.events.iter().find(|(n, _)| n == "message_delta").unwrap();
        assert!(delta_event.1.contains(r#""stop_reason":"tool_use""#));
    }

    #[test]
    fn reasoning_then_text_closes_thinking_block() {
        let body = indoc! {r#"
            data: {"type":"response.reasoning_text.delta","sequence_number":1,"delta":"pondering"}

            data: {"type":"response.output_text.delta","sequence_number":2,"delta":"answer"}

            data: {"type":"response.completed","sequence_number":3,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
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
    fn citations_deduped_and_appended_as_sources_block() {
        let body = indoc! {r#"
            data: {"type":"response.output_text.delta","sequence_number":1,"delta":"see this"}

            data: {"type":"response.output_text.annotation.added","sequence_number":2,"annotation":{"type":"url_citation","url":"https://a.example","title":"A"}}

            data: {"type":"response.output_text.annotation.added","sequence_number":3,"annotation":{"type":"url_citation","url":"https://a.example","title":"A"}}

            data: {"type":"response.completed","sequence_number":4,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let sources_delta = sink.events.iter().find(|(n, j)| n == "content_block_delta" && j.contains("Sources")).unwrap();
        assert_eq!(sources_delta.1.matches("https://a.example").count(), 1);
    }

    #[test]
    fn refusal_prefixes_first_chunk_only() {
        let body = indoc! {r#"
            data: {"type":"response.refusal.delta","sequence_number":1,"delta":"I can't help"}

            data: {"type":"response.refusal.delta","sequence_number":2,"delta":" with that"}

            data: {"type":"response.completed","sequence_number":3,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let deltas: Vec<&str> = sink.events.iter().filter(|(n, _)| n == "content_block_delta").map(|(_, j)| j.as_str()).collect();
        assert!(deltas[0].contains("[Refused] I can't help"));
        assert!(deltas[1].contains(" with that"));
        assert!(!deltas[1].contains("[Refused]"));
    }

    #[test]
    fn incomplete_maps_to_max_tokens() {
        let body = indoc! {r#"
            data: {"type":"response.output_text.delta","sequence_number":1,"delta":"partial"}

            data: {"type":"response.incomplete","sequence_number":2,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let delta_event = sink.events.iter().find(|(n, _)| n == "message_delta").unwrap();
        assert!(delta_event.1.contains(r#""stop_reason":"max_tokens""#));
    }

    #[test]
    fn incomplete_closes_a_function_call_left_open() {
        let body = indoc! {r#"
            data: {"type":"response.output_item.added","sequence_number":1,"item":{"type":"function_call","call_id":"fc_abc","name":"search"}}

            data: {"type":"response.function_call_arguments.delta","sequence_number":2,"item_id":"fc_abc","delta":"{\"q\":1}"}

            data: {"type":"response.incomplete","sequence_number":3,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let names: Vec<&str> = sink.events.iter().map(|(n, _)| n.as_str()).collect();
        let starts = names.iter().filter(|n| **n == "content_block_start").count();
        let stops = names.iter().filter(|n| **n == "content_block_stop").count();
        assert_eq!(starts, stops);
        assert_eq!(stops, 1);
    }

    #[test]
    fn failed_emits_error_text_and_closes() {
        let body = indoc! {r#"
            data: {"type":"response.failed","sequence_number":1,"response":{"error":{"code":"server_error","message":"boom"}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        assert!(sink.events.iter().any(|(n, j)| n == "content_block_delta" && j.contains("Error: server_error - boom")));
        assert!(sink.events.iter().any(|(n, j)| n == "message_delta" && j.contains(r#""stop_reason":"end_turn""#)));
    }

    #[test]
    fn web_search_call_becomes_synthetic_tool_use() {
        let body = indoc! {r#"
            data: {"type":"response.output_item.added","sequence_number":1,"item":{"type":"web_search_call","id":"ws_1","action":{"query":"rust async"}}}

            data: {"type":"response.completed","sequence_number":2,"response":{"usage":{"input_tokens":1,"output_tokens":1}}}

            data: [DONE]
        "#};
        let sink = run(body, "gpt-5");
        let start = sink.events.iter().find(|(n, _)| n == "content_block_start").unwrap();
        assert!(start.1.contains(r#""name":"WebSearch""#));
        assert!(start.1.contains(r#""id":"call_ws_1""#));
    }
}
