//! Downstream SSE writer (§6): `event: <name>\ndata: <json>\n\n` framing,
//! terminated by a bare `data: [DONE]\n\n`.

use std::io::Write;

use serde::Serialize;

use crate::error::{BridgeError, Result};

/// Anything that can accept translated Anthropic-dialect SSE events. The
/// core only ever writes through this trait — the concrete transport (a
/// socket, a channel, a test buffer) is an external collaborator per §1.
pub trait EventSink {
    /// Writes one already-encoded event. `json` is the event's `data:`
    /// payload, without the `data: ` prefix or trailing newlines.
    fn write_event(&mut self, name: &str, json: &str) -> Result<()>;

    /// Writes the stream terminator: a bare `data: [DONE]\n\n`.
    fn write_done(&mut self) -> Result<()>;
}

/// Adapts any `std::io::Write` into an [`EventSink`], the way a downstream
/// HTTP body writer would be wired in by a caller.
pub struct WriteSink<W> {
    writer: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> EventSink for WriteSink<W> {
    fn write_event(&mut self, name: &str, json: &str) -> Result<()> {
        write!(self.writer, "event: {name}\ndata: {json}\n\n").map_err(|e| BridgeError::SinkWrite(e.to_string()))
    }

    fn write_done(&mut self) -> Result<()> {
        write!(self.writer, "data: [DONE]\n\n").map_err(|e| BridgeError::SinkWrite(e.to_string()))
    }
}

/// Serialises `value` and writes it as a single named SSE event.
pub fn emit<S: EventSink + ?Sized, T: Serialize>(sink: &mut S, name: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string(value).map_err(|e| BridgeError::SinkWrite(e.to_string()))?;
    sink.write_event(name, &json)
}
