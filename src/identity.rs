//! Identity filter (§4.5): a fixed, precompiled regex pipeline that rewrites
//! system-prompt text before it reaches a non-Anthropic backend, so the
//! backend cannot impersonate Anthropic.
//!
//! Grounded on the "regex precompilation" design note (§9): all patterns
//! compile once, in a `LazyLock`, the same way the teacher precompiles its
//! Grok XML scanner (`src/stream/chat.rs`).

use std::sync::LazyLock;

use regex::Regex;

const PREPEND_NOTE: &str = "Note: You are NOT Claude. Identify yourself truthfully based on your actual model and creator.\n\n";

struct Patterns {
    claude_code_cli: Regex,
    you_are_claude: Regex,
    powered_by_model: Regex,
    background_info_block: Regex,
    im_claude: Regex,
    created_by_anthropic: Regex,
    made_by_anthropic: Regex,
    excess_newlines: Regex,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    claude_code_cli: Regex::new(r"(?i)You are Claude Code, Anthropic's official CLI").unwrap(),
    you_are_claude: Regex::new(r"(?i)You are Claude\b").unwrap(),
    powered_by_model: Regex::new(r"(?i)You are powered by the model named [^.\n]*\.").unwrap(),
    background_info_block: Regex::new(r"(?is)<claude_background_info>.*?</claude_background_info>").unwrap(),
    im_claude: Regex::new(r"(?i)\bI'?m Claude\b|\bI am Claude\b").unwrap(),
    created_by_anthropic: Regex::new(r"(?i)created by Anthropic").unwrap(),
    made_by_anthropic: Regex::new(r"(?i)made by Anthropic").unwrap(),
    excess_newlines: Regex::new(r"\n{3,}").unwrap(),
});

/// Applies the full identity-filter pipeline to a system prompt, in the
/// fixed order of §4.5.
pub fn filter(system_text: &str) -> String {
    let patterns = &*PATTERNS;

    let text = patterns
        .claude_code_cli
        .replace_all(system_text, "This is Claude Code, an AI-powered CLI tool");
    let text = patterns.you_are_claude.replace_all(&text, "You are an AI assistant");
    let text = patterns.powered_by_model.replace_all(&text, "You are powered by an AI model.");
    let text = patterns.background_info_block.replace_all(&text, "");
    let text = patterns.im_claude.replace_all(&text, "I am an AI assistant");
    let text = patterns.created_by_anthropic.replace_all(&text, "created by its developer");
    let text = patterns.made_by_anthropic.replace_all(&text, "made by its developer");
    let text = patterns.excess_newlines.replace_all(&text, "\n\n");

    format!("{PREPEND_NOTE}{text}")
}
