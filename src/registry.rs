//! Static model tables and vendor/family predicates (§4.1).
//!
//! Built the way the teacher's `ModelManager` (`provider/openai.rs`) is
//! built from a static config map, minus the file-parsing step: these are
//! literal tables, process-wide, read-only, safe for concurrent read.

/// Endpoint a translated request should be sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    ChatCompletions,
    Responses,
}

/// Vendor family a model id belongs to, used to pick reasoning-budget and
/// schema-sanitisation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    OpenAi,
    Gemini,
    DeepSeek,
    Qwen,
    MiniMax,
    Grok,
    Ollama,
    Routed,
}

const DEFAULT_OUTPUT_CAP: u32 = 4_096;
const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;
pub const CLIENT_ASSUMED_WINDOW: u32 = 200_000;

/// Exact and prefix entries for output-token caps. Checked exact-first, then
/// longest-matching-prefix, then `DEFAULT_OUTPUT_CAP`.
const OUTPUT_CAPS: &[(&str, u32)] = &[
    ("gpt-4o", 16_384),
    ("gpt-4o-mini", 16_384),
    ("gpt-4-turbo", 4_096),
    ("gpt-4", 4_096),
    ("gpt-3.5-turbo", 4_096),
    ("gpt-5", 128_000),
    ("o1-preview", 32_768),
    ("o1-mini", 65_536),
    ("o1", 100_000),
    ("o3", 100_000),
    ("o3-mini", 100_000),
    ("grok-", 131_072),
    ("gemini-2.5", 65_536),
    ("gemini-3", 65_536),
    ("deepseek-", 8_192),
    ("qwen", 8_192),
    ("minimax-", 8_192),
];

/// Exact, then prefix, then suffix entries for context window size.
const CONTEXT_WINDOWS: &[(&str, u32)] = &[
    ("gpt-4o", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo", 16_385),
    ("gpt-5", 400_000),
    ("o1-preview", 128_000),
    ("o1-mini", 128_000),
    ("o1", 200_000),
    ("o3", 200_000),
    ("o3-mini", 200_000),
    ("grok-", 131_072),
    ("gemini-2.5", 1_048_576),
    ("gemini-3", 1_000_000),
    ("deepseek-", 64_000),
    ("qwen", 32_768),
    ("minimax-", 1_000_000),
];

/// Model prefixes (after stripping a leading `vendor/`) that are always
/// served over the Responses endpoint.
const RESPONSES_ONLY_PREFIXES: &[&str] = &["o1", "o3", "gpt-5", "computer-use"];

/// Caps the requested output-token count at the model's table value.
/// `min(requested, table_value)` per §4.1/§8 invariant 6.
pub fn output_token_cap(model: &str, requested: u32) -> u32 {
    let cap = lookup_exact_then_prefix(OUTPUT_CAPS, model).unwrap_or(DEFAULT_OUTPUT_CAP);
    requested.min(cap)
}

/// Context window size for `model`: exact, then prefix, then suffix match.
pub fn context_window(model: &str) -> u32 {
    let lower = model.to_ascii_lowercase();

    if let Some((_, size)) = CONTEXT_WINDOWS.iter().find(|(k, _)| *k == lower) {
        return *size;
    }
    if let Some((_, size)) = CONTEXT_WINDOWS.iter().find(|(k, _)| lower.starts_with(k)) {
        return *size;
    }
    if let Some((_, size)) = CONTEXT_WINDOWS.iter().find(|(k, _)| lower.ends_with(k)) {
        return *size;
    }
    DEFAULT_CONTEXT_WINDOW
}

fn lookup_exact_then_prefix(table: &[(&str, u32)], model: &str) -> Option<u32> {
    let lower = model.to_ascii_lowercase();

    if let Some((_, v)) = table.iter().find(|(k, _)| *k == lower) {
        return Some(*v);
    }

    table
        .iter()
        .filter(|(k, _)| lower.starts_with(k))
        .max_by_key(|(k, _)| k.len())
        .map(|(_, v)| *v)
}

/// Strips a leading `vendor/` route prefix (case-insensitive), as used by
/// OpenRouter-style model ids.
fn strip_vendor_prefix(model: &str) -> &str {
    model.find('/').map(|i| &model[i + 1..]).unwrap_or(model)
}

/// Chooses which OpenAI-family endpoint a model should be translated for.
/// Any prefix in the responses-only list forces `Responses`.
pub fn choose_endpoint(model: &str) -> Endpoint {
    let stripped = strip_vendor_prefix(model).to_ascii_lowercase();

    if RESPONSES_ONLY_PREFIXES.iter().any(|p| stripped.starts_with(p)) {
        Endpoint::Responses
    } else {
        Endpoint::ChatCompletions
    }
}

/// Detects the vendor family from a model id via case-insensitive
/// prefix/substring tests, in the fixed priority order of §4.1.
pub fn detect_vendor(model: &str) -> Vendor {
    let lower = model.to_ascii_lowercase();

    if lower.contains("gemini") {
        Vendor::Gemini
    } else if lower.contains("deepseek") {
        Vendor::DeepSeek
    } else if lower.contains("qwen") {
        Vendor::Qwen
    } else if lower.contains("minimax") {
        Vendor::MiniMax
    } else if lower.contains("grok") {
        Vendor::Grok
    } else if lower.starts_with("llama") || lower.starts_with("mistral") || lower.starts_with("phi") {
        Vendor::Ollama
    } else if lower.contains('/') {
        Vendor::Routed
    } else {
        Vendor::OpenAi
    }
}

pub fn is_o1_or_o3(model: &str) -> bool {
    let lower = model.to_ascii_lowercase();
    lower.starts_with("o1") || lower.starts_with("o3")
}

pub fn is_gpt5_family(model: &str) -> bool {
    model.to_ascii_lowercase().starts_with("gpt-5")
}

/// GPT-5.2 and later support the `xhigh` reasoning-effort level.
pub fn is_gpt5_2_or_later(model: &str) -> bool {
    let lower = model.to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix("gpt-5.") else {
        return false;
    };
    rest.split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|n| n.parse::<u32>().ok())
        .is_some_and(|minor| minor >= 2)
}

pub fn is_grok(model: &str) -> bool {
    model.to_ascii_lowercase().contains("grok")
}

pub fn is_gemini_3(model: &str) -> bool {
    model.to_ascii_lowercase().contains("gemini-3")
}

pub fn is_gemini_25(model: &str) -> bool {
    model.to_ascii_lowercase().contains("gemini-2.5")
}

pub fn is_qwen(model: &str) -> bool {
    model.to_ascii_lowercase().contains("qwen")
}

pub fn is_minimax(model: &str) -> bool {
    model.to_ascii_lowercase().contains("minimax")
}

pub fn is_deepseek(model: &str) -> bool {
    model.to_ascii_lowercase().contains("deepseek")
}

/// DeepSeek models with a dedicated thinking mode: R1 and V3.1+.
pub fn is_deepseek_thinking(model: &str) -> bool {
    let lower = model.to_ascii_lowercase();
    if !lower.contains("deepseek") {
        return false;
    }
    if lower.contains("r1") {
        return true;
    }
    if let Some(idx) = lower.find("v3.") {
        let rest = &lower[idx + 3..];
        let minor: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        return minor.parse::<u32>().is_ok_and(|m| m >= 1);
    }
    false
}

/// DeepSeek V3.2 and later, which additionally require
/// `additionalProperties: false` on tool schemas (§4.3).
pub fn is_deepseek_v3_2(model: &str) -> bool {
    let lower = model.to_ascii_lowercase();
    let Some(idx) = lower.find("v3.") else {
        return false;
    };
    let rest = &lower[idx + 3..];
    let minor: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    minor.parse::<u32>().is_ok_and(|m| m >= 2)
}
