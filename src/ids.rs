//! Tool-call ID translator (§4.8): bidirectional prefix mapping between the
//! Anthropic/Chat dialect (`call_*`, client-originated `toolu_*`) and the
//! Responses dialect (`fc_*`).

/// Translates a tool-call id from the Anthropic/Chat dialect to the
/// Responses dialect: `call_X` and `toolu_X` both become `fc_X`; any other
/// value gets `fc_` prepended; the empty string is preserved.
pub fn forward(id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    if let Some(rest) = id.strip_prefix("call_").or_else(|| id.strip_prefix("toolu_")) {
        format!("fc_{rest}")
    } else {
        format!("fc_{id}")
    }
}

/// Translates a tool-call id from the Responses dialect back to
/// Anthropic/Chat: `fc_X` becomes `call_X`; `call_X`/`toolu_X` pass through
/// unchanged (per §4.8, they are "unchanged when going back to Anthropic");
/// any other value gets `call_` prepended; the empty string is preserved.
pub fn reverse(id: &str) -> String {
    if id.is_empty() {
        return String::new();
    }
    if id.starts_with("call_") || id.starts_with("toolu_") {
        return id.to_string();
    }
    if let Some(rest) = id.strip_prefix("fc_") {
        format!("call_{rest}")
    } else {
        format!("call_{id}")
    }
}
