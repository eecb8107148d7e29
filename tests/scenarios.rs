//! End-to-end scenario tests (spec.md §8, S1-S6) and the quantified
//! invariants that aren't already covered unit-by-unit inside the crate.

use indoc::indoc;
use protocol_bridge::stream::WriteSink;
use protocol_bridge::types::*;
use protocol_bridge::{ids, new_context_scaler, new_stream_translator, registry, translate_request_chat};
use serde_json::{Value, json};

fn text_request(model: &str, max_tokens: u32, text: &str) -> ClientRequest {
    ClientRequest {
        model: model.to_string(),
        messages: vec![Message { role: Role::User, content: MessageContent::Text(text.to_string()) }],
        system: None,
        max_tokens,
        temperature: None,
        top_p: None,
        stop_sequences: None,
        stream: None,
        tools: None,
        tool_choice: None,
        thinking: None,
        unknown_fields: Default::default(),
    }
}

/// S1 — simple text translation.
#[test]
fn s1_simple_text_translation() {
    let request = text_request("c", 1_000, "Hello");
    let body = translate_request_chat(&request, "gpt-4o");

    assert_eq!(body["model"], json!("gpt-4o"));
    assert_eq!(body["max_tokens"], json!(1_000));
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], json!("user"));
    assert_eq!(messages[0]["content"], json!("Hello"));
}

/// S2 — system prompt goes through the identity filter.
#[test]
fn s2_system_prompt_identity_filter() {
    let mut request = text_request("c", 1_000, "Hi");
    request.system = Some(SystemPrompt::Text("You are Claude, Anthropic's assistant.".to_string()));
    let body = translate_request_chat(&request, "gpt-4o");

    let system = body["messages"][0]["content"].as_str().unwrap();
    assert!(system.starts_with("Note: You are NOT Claude."));
    assert!(!system.contains("You are Claude"));
}

/// S3 — output-token cap.
#[test]
fn s3_max_tokens_cap() {
    let request = text_request("c", 50_000, "Hi");
    let body = translate_request_chat(&request, "gpt-4-turbo");
    assert_eq!(body["max_tokens"], json!(4_096));
}

/// S4 — reasoning mapping onto an o1-family target.
#[test]
fn s4_reasoning_mapping_to_o1() {
    let mut request = text_request("c", 5_000, "Hi");
    request.thinking = Some(ThinkingConfig { budget_tokens: 20_000 });
    let body = translate_request_chat(&request, "o1-preview");

    assert_eq!(body["reasoning_effort"], json!("medium"));
    assert_eq!(body["max_completion_tokens"], json!(5_000));
    // o1 targets reject a nonzero max_tokens alongside max_completion_tokens,
    // but still expect the key present, pinned to zero.
    assert_eq!(body["max_tokens"], json!(0));
}

/// S5 — tool-call streaming over the Chat-Completions dialect.
#[test]
fn s5_tool_call_streaming_scenario() {
    let body = indoc! {r#"
        data: {"choices":[{"delta":{"tool_calls":[{"index":0,"id":"call_x","function":{"name":"f","arguments":""}}]}}]}

        data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"{\"a\":"}}]}}]}

        data: {"choices":[{"delta":{"tool_calls":[{"index":0,"function":{"arguments":"1}"}}]}}]}

        data: {"choices":[{"delta":{},"finish_reason":"tool_calls"}]}

        data: [DONE]

    "#};

    let handle = new_stream_translator("msg_1", "gpt-4o");
    let mut out: Vec<u8> = Vec::new();
    {
        let mut sink = WriteSink::new(&mut out);
        handle.process(body.as_bytes(), &mut sink).unwrap();
    }
    let rendered = String::from_utf8(out).unwrap();

    let names: Vec<&str> = event_names(&rendered);
    assert_eq!(names, vec!["message_start", "ping", "content_block_start", "content_block_delta", "content_block_delta", "content_block_stop", "message_delta", "message_stop"]);
    assert!(rendered.contains(r#""stop_reason":"tool_use""#));
    assert!(rendered.contains(r#""id":"call_x""#));
    assert!(rendered.contains(r#""name":"f""#));
    assert!(rendered.ends_with("data: [DONE]\n\n"));
}

/// S6 — Responses dialect: reasoning then text then completion.
#[test]
fn s6_responses_reasoning_then_text() {
    let body = indoc! {r#"
        data: {"type":"response.created","response":{"id":"resp_1"}}

        data: {"type":"response.reasoning_text.delta","delta":"hm"}

        data: {"type":"response.output_text.delta","delta":"Hi"}

        data: {"type":"response.completed","response":{"usage":{"input_tokens":10,"output_tokens":2}}}

    "#};

    let handle = new_stream_translator("msg_1", "o1-preview");
    let mut out: Vec<u8> = Vec::new();
    {
        let mut sink = WriteSink::new(&mut out);
        handle.process(body.as_bytes(), &mut sink).unwrap();
    }
    let rendered = String::from_utf8(out).unwrap();

    let names: Vec<&str> = event_names(&rendered);
    assert_eq!(
        names,
        vec!["message_start", "ping", "content_block_start", "content_block_delta", "content_block_stop", "content_block_start", "content_block_delta", "content_block_stop", "message_delta", "message_stop"]
    );
    assert!(rendered.contains(r#""type":"thinking""#));
    assert!(rendered.contains(r#""thinking":"hm""#));
    assert!(rendered.contains(r#""type":"text""#));
    assert!(rendered.contains(r#""text":"Hi""#));
    assert!(rendered.contains(r#""stop_reason":"end_turn""#));
}

/// Invariant 1 — deterministic, idempotent request translation.
#[test]
fn invariant_request_translation_is_deterministic() {
    let request = text_request("c", 1_000, "Hello");
    let first = translate_request_chat(&request, "gpt-4o");
    let second = translate_request_chat(&request, "gpt-4o");
    assert_eq!(first, second);
}

/// Invariant 2 — id round trip preserves the suffix for recognised prefixes.
#[test]
fn invariant_id_round_trip_preserves_suffix() {
    for original in ["call_abc123", "toolu_xyz"] {
        let suffix = &original[original.find('_').unwrap() + 1..];
        let round_tripped = ids::reverse(&ids::forward(original));
        assert_eq!(&round_tripped[round_tripped.find('_').unwrap() + 1..], suffix);
    }
}

/// Invariant 3 & 4 — block start/stop balance and message_start/stop placement.
#[test]
fn invariant_block_balance_and_message_envelope() {
    let body = indoc! {r#"
        data: {"choices":[{"delta":{"content":"hello"}}]}

        data: {"choices":[{"delta":{},"finish_reason":"stop"}]}

        data: [DONE]

    "#};
    let handle = new_stream_translator("msg_1", "gpt-4o");
    let mut out: Vec<u8> = Vec::new();
    {
        let mut sink = WriteSink::new(&mut out);
        handle.process(body.as_bytes(), &mut sink).unwrap();
    }
    let rendered = String::from_utf8(out).unwrap();
    let names = event_names(&rendered);

    assert_eq!(names.iter().filter(|n| **n == "message_start").count(), 1);
    assert_eq!(names.iter().filter(|n| **n == "message_stop").count(), 1);
    let start_pos = names.iter().position(|n| *n == "message_start").unwrap();
    let stop_pos = names.iter().position(|n| *n == "message_stop").unwrap();
    let first_block = names.iter().position(|n| n.starts_with("content_block"));
    let last_block = names.iter().rposition(|n| n.starts_with("content_block"));
    if let (Some(first), Some(last)) = (first_block, last_block) {
        assert!(start_pos < first);
        assert!(stop_pos > last);
    }

    let starts = names.iter().filter(|n| **n == "content_block_start").count();
    let stops = names.iter().filter(|n| **n == "content_block_stop").count();
    assert_eq!(starts, stops);
}

/// Invariant 5 — context scaler bounds and monotonicity.
#[test]
fn invariant_scaler_bounds() {
    let small = new_context_scaler("gpt-4o");
    assert_eq!(small.scale(100_000), 100_000);

    let big = new_context_scaler("gemini-2.5-pro");
    assert!(big.scale(500_000) <= 500_000);

    let mut prev = 0;
    for t in (0..2_000_000).step_by(10_000) {
        let scaled = big.scale(t);
        assert!(scaled >= prev);
        prev = scaled;
    }
}

/// Invariant 6 — output-token cap is min(requested, table cap).
#[test]
fn invariant_output_token_cap_is_min() {
    assert_eq!(registry::output_token_cap("gpt-4-turbo", 50_000), 4_096);
    assert_eq!(registry::output_token_cap("gpt-4-turbo", 100), 100);
}

/// Invariant 7 — endpoint selection matches the responses-only prefix list
/// after stripping a leading vendor route prefix.
#[test]
fn invariant_endpoint_selection() {
    assert_eq!(registry::choose_endpoint("o1-preview"), registry::Endpoint::Responses);
    assert_eq!(registry::choose_endpoint("openrouter/gpt-5"), registry::Endpoint::Responses);
    assert_eq!(registry::choose_endpoint("gpt-4o"), registry::Endpoint::ChatCompletions);
}

/// Invariant 8 — a Grok XML function-call envelope split across two chunks
/// yields exactly one synthetic tool-use block.
#[test]
fn invariant_grok_envelope_split_yields_one_tool_use() {
    let body = indoc! {r#"
        data: {"choices":[{"delta":{"content":"<xai:function_call name=\"search\"><xai:para"}}]}

        data: {"choices":[{"delta":{"content":"meter name=\"q\">rust</xai:parameter></xai:function_call>"},"finish_reason":"stop"}]}

        data: [DONE]

    "#};
    let handle = new_stream_translator("msg_1", "grok-4");
    let mut out: Vec<u8> = Vec::new();
    {
        let mut sink = WriteSink::new(&mut out);
        handle.process(body.as_bytes(), &mut sink).unwrap();
    }
    let rendered = String::from_utf8(out).unwrap();
    let names = event_names(&rendered);

    assert_eq!(names.iter().filter(|n| **n == "content_block_start").count(), 1);
    assert!(rendered.contains(r#""type":"tool_use""#));
    assert!(rendered.contains(r#""name":"search""#));
}

fn event_names(rendered: &str) -> Vec<&str> {
    rendered
        .lines()
        .filter_map(|line| line.strip_prefix("event: "))
        .collect()
}
