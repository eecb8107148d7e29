//! Reasoning-budget mapping (§4.2): translates the Anthropic
//! `thinking.budget_tokens` knob into each vendor family's own reasoning
//! parameter. Intentionally lossy, always monotone in `budget_tokens`.

use crate::registry;
use crate::types::ThinkingConfig;

/// A reasoning parameter to attach to a Chat-form vendor request. Each
/// variant corresponds to exactly one vendor family's wire shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatReasoning {
    /// `reasoning_effort: "minimal" | "low" | "medium" | "high" | "xhigh"`.
    Effort(&'static str),
    /// Gemini 3's `thinking_level: "low" | "high"`.
    ThinkingLevel(&'static str),
    /// Gemini 2.5's `thinking_config.thinking_budget`.
    ThinkingBudget(u32),
    /// Qwen's `enable_thinking` + `thinking_budget` pair.
    QwenThinking { enable: bool, budget: u32 },
    /// MiniMax's bare `reasoning_split` flag.
    ReasoningSplit,
    /// DeepSeek's bare `enable_thinking` flag.
    EnableThinking,
}

/// Resolves the Chat-form reasoning parameter for `model` given the
/// client's thinking config, per the family table in §4.2. Returns `None`
/// when the family drops the parameter entirely (DeepSeek base and other
/// models with no reasoning knob).
pub fn chat_reasoning_for(model: &str, thinking: &ThinkingConfig) -> Option<ChatReasoning> {
    let budget = thinking.budget_tokens;

    if registry::is_gpt5_family(model) {
        let effort = if budget >= 80_000 && registry::is_gpt5_2_or_later(model) {
            "xhigh"
        } else if budget >= 16_000 {
            "high"
        } else if budget >= 4_000 {
            "medium"
        } else if budget >= 1 {
            "low"
        } else {
            "none"
        };
        return Some(ChatReasoning::Effort(effort));
    }

    if registry::is_o1_or_o3(model) {
        let effort = if budget >= 32_000 {
            "high"
        } else if budget >= 16_000 {
            "medium"
        } else if budget >= 4_000 {
            "low"
        } else {
            "minimal"
        };
        return Some(ChatReasoning::Effort(effort));
    }

    if registry::is_grok(model) {
        let effort = if budget >= 20_000 { "high" } else { "low" };
        return Some(ChatReasoning::Effort(effort));
    }

    if registry::is_gemini_3(model) {
        let level = if budget >= 16_000 { "high" } else { "low" };
        return Some(ChatReasoning::ThinkingLevel(level));
    }

    if registry::is_gemini_25(model) {
        return Some(ChatReasoning::ThinkingBudget(budget.min(24_576)));
    }

    if registry::is_qwen(model) {
        return Some(ChatReasoning::QwenThinking { enable: true, budget });
    }

    if registry::is_minimax(model) {
        return Some(ChatReasoning::ReasoningSplit);
    }

    if registry::is_deepseek_thinking(model) {
        return Some(ChatReasoning::EnableThinking);
    }

    None
}

/// Whether `translate_request_chat` should move `max_tokens` into
/// `max_completion_tokens` for this model, per §4.2's O1/O3 row.
pub fn uses_max_completion_tokens(model: &str) -> bool {
    registry::is_o1_or_o3(model)
}

/// Resolves the collapsed Responses-dialect `reasoning.effort` value for any
/// model with a thinking config: `<4000→low, <16000→medium, else high`.
pub fn responses_effort_for(thinking: &ThinkingConfig) -> &'static str {
    let budget = thinking.budget_tokens;
    if budget >= 16_000 {
        "high"
    } else if budget >= 4_000 {
        "medium"
    } else {
        "low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(n: u32) -> ThinkingConfig {
        ThinkingConfig { budget_tokens: n }
    }

    #[test]
    fn gpt5_family_levels() {
        assert_eq!(chat_reasoning_for("gpt-5", &budget(0)), Some(ChatReasoning::Effort("none")));
        assert_eq!(chat_reasoning_for("gpt-5", &budget(2_000)), Some(ChatReasoning::Effort("low")));
        assert_eq!(chat_reasoning_for("gpt-5", &budget(10_000)), Some(ChatReasoning::Effort("medium")));
        assert_eq!(chat_reasoning_for("gpt-5", &budget(20_000)), Some(ChatReasoning::Effort("high")));
    }

    #[test]
    fn gpt5_xhigh_requires_5_2_or_later() {
        assert_eq!(chat_reasoning_for("gpt-5.2", &budget(90_000)), Some(ChatReasoning::Effort("xhigh")));
        assert_eq!(chat_reasoning_for("gpt-5", &budget(90_000)), Some(ChatReasoning::Effort("high")));
    }

    #[test]
    fn o1_o3_levels_and_max_completion_tokens() {
        assert_eq!(chat_reasoning_for("o1-preview", &budget(20_000)), Some(ChatReasoning::Effort("medium")));
        assert_eq!(chat_reasoning_for("o3-mini", &budget(40_000)), Some(ChatReasoning::Effort("high")));
        assert!(uses_max_completion_tokens("o1-preview"));
        assert!(!uses_max_completion_tokens("gpt-4o"));
    }

    #[test]
    fn grok_two_levels() {
        assert_eq!(chat_reasoning_for("grok-4", &budget(19_999)), Some(ChatReasoning::Effort("low")));
        assert_eq!(chat_reasoning_for("grok-4", &budget(20_000)), Some(ChatReasoning::Effort("high")));
    }

    #[test]
    fn gemini_2_5_clamps_budget() {
        assert_eq!(chat_reasoning_for("gemini-2.5-pro", &budget(100_000)), Some(ChatReasoning::ThinkingBudget(24_576)));
    }

    #[test]
    fn deepseek_base_drops_parameter() {
        assert_eq!(chat_reasoning_for("deepseek-chat", &budget(10_000)), None);
        assert_eq!(chat_reasoning_for("deepseek-r1", &budget(10_000)), Some(ChatReasoning::EnableThinking));
    }

    #[test]
    fn responses_dialect_collapses_to_three_levels() {
        assert_eq!(responses_effort_for(&budget(3_999)), "low");
        assert_eq!(responses_effort_for(&budget(15_999)), "medium");
        assert_eq!(responses_effort_for(&budget(16_000)), "high");
    }
}
