//! Responses-form request translator (§4.7): reuses the Chat-form message
//! parsing rules but builds the tagged `input` array the Responses dialect
//! expects instead of flat role turns.

use serde_json::{Map, Value, json};

use crate::identity;
use crate::ids;
use crate::reasoning;
use crate::registry;
use crate::request::resolve_tool_definition;
use crate::schema::{self, SchemaTarget};
use crate::types::*;

/// Translates a [`ClientRequest`] into a Responses-shaped JSON body
/// addressed to `target_model`, threading `previous_response_id` through for
/// continuation (§3 Lifecycle: the stream translator owns and returns it).
pub fn translate_request_responses(request: &ClientRequest, target_model: &str, previous_response_id: Option<&str>) -> Value {
    let model = target_model;

    let mut input: Vec<Value> = Vec::new();
    for message in &request.messages {
        match message.role {
            Role::User => translate_user_message(message, &mut input),
            Role::Assistant => translate_assistant_message(message, &mut input),
            Role::Other => {
                if let MessageContent::Text(text) = &message.content {
                    input.push(json!({"type": "message", "role": "user", "content": [{"type": "input_text", "text": text}]}));
                }
            }
        }
    }

    let mut body = Map::new();
    body.insert("model".to_string(), json!(model));
    body.insert("input".to_string(), Value::Array(input));

    let max_output_tokens = registry::output_token_cap(model, request.max_tokens).max(16);
    body.insert("max_output_tokens".to_string(), json!(max_output_tokens));

    if let Some(system) = &request.system {
        body.insert("instructions".to_string(), json!(identity::filter(&system.as_text())));
    }
    if let Some(t) = request.temperature {
        body.insert("temperature".to_string(), json!(t));
    }
    if let Some(p) = request.top_p {
        body.insert("top_p".to_string(), json!(p));
    }
    if request.stream.unwrap_or(false) {
        body.insert("stream".to_string(), json!(true));
    }

    if let Some(tools) = &request.tools {
        if !tools.is_empty() {
            let envelopes: Vec<Value> = tools.iter().map(tool_envelope).collect();
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
        body.insert("reasoning".to_string(), json!({"effort": reasoning::responses_effort_for(thinking)}));
    }

    if let Some(previous) = previous_response_id {
        body.insert("previous_response_id".to_string(), json!(previous));
    }

    for (key, value) in &request.unknown_fields {
        body.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(body)
}

fn tool_envelope(tool: &ToolSpec) -> Value {
    let (name, description, schema) = resolve_tool_definition(tool);
    let parameters = schema::sanitize(schema, SchemaTarget::Responses);
    json!({
        "type": "function",
        "name": name,
        "description": description,
        "parameters": parameters,
        "strict": false,
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
        ToolChoice::Tool { name, .. } => json!({"type": "function", "name": name}),
    }
}

fn translate_user_message(message: &Message, input: &mut Vec<Value>) {
    for block in message.content.as_blocks() {
        match block {
            ContentBlock::ToolResult { tool_use_id, content, .. } => {
                let call_id = ids::forward(&tool_use_id);
                input.push(json!({"type": "function_call_output", "call_id": call_id, "output": content.as_text()}));
            }
            ContentBlock::Text { text } => {
                input.push(json!({"type": "message", "role": "user", "content": [{"type": "input_text", "text": text}]}));
            }
            ContentBlock::Image { source } => {
                input.push(json!({
                    "type": "message",
                    "role": "user",
                    "content": [{"type": "input_image", "image_url": format!("data:{};base64,{}", source.media_type, source.data)}],
                }));
            }
            ContentBlock::ToolUse { .. } => {}
        }
    }
}

fn translate_assistant_message(message: &Message, input: &mut Vec<Value>) {
    let mut text = String::new();
    let mut calls: Vec<Value> = Vec::new();

    for block in message.content.as_blocks() {
        match block {
            ContentBlock::Text { text: fragment } => text.push_str(&fragment),
            ContentBlock::ToolUse { id, name, input: args } => {
                let call_id = ids::forward(&id);
                calls.push(json!({
                    "type": "function_call",
                    "id": id,
                    "call_id": call_id,
                    "name": name,
                    "arguments": serde_json::to_string(&args).unwrap_or_default(),
                }));
            }
            ContentBlock::ToolResult { .. } | ContentBlock::Image { .. } => {}
        }
    }

    if !text.is_empty() {
        input.push(json!({"type": "message", "role": "assistant", "content": [{"type": "output_text", "text": text}]}));
    }
    input.extend(calls);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(model: &str) -> ClientRequest {
        ClientRequest {
            model: model.to_string(),
            messages: Vec::new(),
            system: None,
            max_tokens: 10,
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

    #[test]
    fn max_output_tokens_is_floored_at_16() {
        let mut request = req("gpt-5");
        request.max_tokens = 1;
        let body = translate_request_responses(&request, "gpt-5", None);
        assert_eq!(body["max_output_tokens"], json!(16));
    }

    #[test]
    fn system_prompt_goes_into_instructions() {
        let mut request = req("gpt-5");
        request.system = Some(SystemPrompt::Text("Be terse.".to_string()));
        let body = translate_request_responses(&request, "gpt-5", None);
        let instructions = body["instructions"].as_str().unwrap();
        assert!(instructions.contains("Be terse."));
        assert!(instructions.starts_with("Note: You are NOT Claude"));
    }

    #[test]
    fn tool_use_id_translated_to_fc_form() {
        let mut request = req("gpt-5");
        request.messages = vec![Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(vec![ContentBlock::ToolUse {
                id: "toolu_abc".to_string(),
                name: "search".to_string(),
                input: json!({}),
            }]),
        }];
        let body = translate_request_responses(&request, "gpt-5", None);
        let item = &body["input"][0];
        assert_eq!(item["type"], json!("function_call"));
        assert_eq!(item["call_id"], json!("fc_abc"));
    }

    #[test]
    fn tool_result_becomes_function_call_output_with_translated_id() {
        let mut request = req("gpt-5");
        request.messages = vec![Message {
            role: Role::User,
            content: MessageContent::Blocks(vec![ContentBlock::ToolResult {
                tool_use_id: "call_xyz".to_string(),
                content: ToolResultContent::Text("done".to_string()),
                is_error: None,
            }]),
        }];
        let body = translate_request_responses(&request, "gpt-5", None);
        let item = &body["input"][0];
        assert_eq!(item["type"], json!("function_call_output"));
        assert_eq!(item["call_id"], json!("fc_xyz"));
        assert_eq!(item["output"], json!("done"));
    }

    #[test]
    fn tool_spec_emitted_flattened_and_nested() {
        let mut request = req("gpt-5");
        request.tools = Some(vec![ToolSpec::Function(FunctionToolSpec {
            name: "custom_tool".to_string(),
            description: Some("does a thing".to_string()),
            input_schema: json!({"type": "object", "properties": {}}),
        })]);
        let body = translate_request_responses(&request, "gpt-5", None);
        let tool = &body["tools"][0];
        assert_eq!(tool["name"], json!("custom_tool"));
        assert_eq!(tool["function"]["name"], json!("custom_tool"));
        assert_eq!(tool["strict"], json!(false));
    }

    #[test]
    fn reasoning_collapses_to_three_level_effort() {
        let mut request = req("gpt-5");
        request.thinking = Some(ThinkingConfig { budget_tokens: 20_000 });
        let body = translate_request_responses(&request, "gpt-5", None);
        assert_eq!(body["reasoning"]["effort"], json!("high"));
    }

    #[test]
    fn previous_response_id_threaded_through_as_parameter() {
        let request = req("gpt-5");
        let body = translate_request_responses(&request, "gpt-5", Some("resp_123"));
        assert_eq!(body["previous_response_id"], json!("resp_123"));
    }

    #[test]
    fn disable_parallel_tool_use_forwards_parallel_tool_calls_false() {
        let mut request = req("gpt-5");
        request.tool_choice = Some(ToolChoice::Tool { name: "search".to_string(), disable_parallel_tool_use: true });
        let body = translate_request_responses(&request, "gpt-5", None);
        assert_eq!(body["tool_choice"], json!({"type": "function", "name": "search"}));
        assert_eq!(body["parallel_tool_calls"], json!(false));
    }

    #[test]
    fn unknown_fields_round_trip_into_output_body() {
        let mut request = req("gpt-5");
        request.unknown_fields.insert("metadata".to_string(), json!({"user_id": "u_1"}));
        let body = translate_request_responses(&request, "gpt-5", None);
        assert_eq!(body["metadata"], json!({"user_id": "u_1"}));
    }
}
