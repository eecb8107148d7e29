//! Streaming-event translation (§4.9, §4.10): stateful, per-response finite
//! state machines that consume an upstream chunked event stream in one of
//! two OpenAI-family dialects and emit a well-formed Anthropic SSE stream.
//!
//! Grounded on `provider/anthropic/output.rs::AnthropicStreamProcessor`
//! (same event-driven accumulator shape, reverse direction).

mod chat;
mod events;
mod responses;
mod scanner;
mod sink;
mod state;

pub use chat::ChatStreamTranslator;
pub use responses::ResponsesStreamTranslator;
pub use scanner::{LineScanner, MAX_LINE_BYTES};
pub use sink::{EventSink, WriteSink};
pub use state::{Phase, StreamState, Usage};
