//! Bidirectional translator between the Anthropic Messages wire protocol
//! and the two OpenAI-family dialects (Chat Completions and Responses).
//!
//! This crate only translates. It has no opinion on transport, retries, or
//! routing — those are the caller's concern, the same separation the
//! teacher draws between its `provider/` translators and its `server/`
//! request-handling layer.
//!
//! # Layout
//! - [`request`] — synchronous request translation (§4.6, §4.7)
//! - [`stream`] — stateful streaming-event translation (§4.9, §4.10)
//! - [`registry`] — model tables and vendor predicates (§4.1)
//! - [`ids`] — tool-call id translation (§4.8)
//! - [`scaler`] — context-window usage rescaling (§4.11)
//! - [`schema`], [`tools`], [`identity`], [`reasoning`] — request-side
//!   sub-translators used by both wire shapes

pub mod error;
pub mod ids;
pub mod identity;
pub mod reasoning;
pub mod registry;
pub mod request;
pub mod scaler;
pub mod schema;
pub mod stream;
pub mod tools;
pub mod types;

use std::io::Read;

pub use error::{BridgeError, Result};
pub use registry::{Endpoint, Vendor, choose_endpoint, detect_vendor};
pub use request::{translate_request_chat, translate_request_responses};
pub use scaler::{ContextScaler, new_context_scaler};
pub use stream::{ChatStreamTranslator, EventSink, ResponsesStreamTranslator};

/// A per-response stream translator, picked for whichever OpenAI-family
/// dialect `target_model` is served over. Callers that already know the
/// endpoint can construct [`ChatStreamTranslator`]/[`ResponsesStreamTranslator`]
/// directly; this wrapper exists for callers who only know the model id,
/// mirroring how `choose_endpoint` already makes that same decision for
/// request translation.
pub enum StreamHandle {
    Chat(ChatStreamTranslator),
    Responses(ResponsesStreamTranslator),
}

impl StreamHandle {
    /// Consumes an upstream chunked event stream and writes the translated
    /// Anthropic SSE stream to `sink`.
    pub fn process<R: Read, S: EventSink>(&self, reader: R, sink: &mut S) -> Result<()> {
        match self {
            Self::Chat(t) => t.process(reader, sink),
            Self::Responses(t) => t.process(reader, sink),
        }
    }

    /// Installs a callback invoked once, at stream completion, with the
    /// scaled `(input_tokens, output_tokens)` usage.
    pub fn set_usage_callback(&self, callback: impl FnMut(u32, u32) + Send + 'static) {
        match self {
            Self::Chat(t) => t.set_usage_callback(callback),
            Self::Responses(t) => t.set_usage_callback(callback),
        }
    }

    /// Scaled `(input_tokens, output_tokens)` usage observed so far.
    pub fn get_usage(&self) -> (u32, u32) {
        match self {
            Self::Chat(t) => t.get_usage(),
            Self::Responses(t) => t.get_usage(),
        }
    }

    /// The upstream response id captured from the stream, for threading
    /// into a subsequent request's `previous_response_id` (Responses dialect
    /// only; empty for Chat Completions, which has no such concept).
    pub fn get_response_id(&self) -> String {
        match self {
            Self::Chat(t) => t.get_response_id(),
            Self::Responses(t) => t.get_response_id(),
        }
    }
}

/// Builds the stream translator for `target_model`, dispatching on the same
/// endpoint rule request translation uses (§4.1).
pub fn new_stream_translator(message_id: impl Into<String>, target_model: impl Into<String>) -> StreamHandle {
    let message_id = message_id.into();
    let target_model = target_model.into();

    match registry::choose_endpoint(&target_model) {
        Endpoint::ChatCompletions => StreamHandle::Chat(ChatStreamTranslator::new(message_id, target_model)),
        Endpoint::Responses => StreamHandle::Responses(ResponsesStreamTranslator::new(message_id, target_model)),
    }
}
