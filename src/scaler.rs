//! Context scaler (§4.11): rescales reported token usage so a client's
//! auto-compaction heuristic (tuned for a fixed 200k window) fires at the
//! correct utilisation percentage regardless of the real backend window.
//!
//! Pure function over an owned ratio, per the "no global mutable state"
//! design note (§9) — a value is created per request, not shared.

use crate::registry::{self, CLIENT_ASSUMED_WINDOW};

/// Created once per request from the target model's real context window.
#[derive(Debug, Clone, Copy)]
pub struct ContextScaler {
    model_window: u32,
    ratio: f64,
}

impl ContextScaler {
    pub fn new(model_window: u32) -> Self {
        let ratio = CLIENT_ASSUMED_WINDOW as f64 / model_window.max(1) as f64;
        Self { model_window, ratio }
    }

    /// `scaled = t` if `ratio ≥ 1` (model window ≤ client's assumed window),
    /// else `round(t * ratio)`.
    pub fn scale(&self, actual: u32) -> u32 {
        if self.ratio >= 1.0 {
            actual
        } else {
            (actual as f64 * self.ratio).round() as u32
        }
    }

    /// Real, unscaled utilisation percentage against the model's own window.
    pub fn real_usage_percent(&self, actual: u32) -> f64 {
        100.0 * actual as f64 / self.model_window.max(1) as f64
    }
}

/// Constructs a scaler for `model` from the registry's context-window table.
pub fn new_context_scaler(model: &str) -> ContextScaler {
    ContextScaler::new(registry::context_window(model))
}
