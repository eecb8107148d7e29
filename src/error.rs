use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors raised while translating between the Anthropic and OpenAI-family
/// wire protocols.
///
/// The variants mirror the taxonomy the core is specified against: request
/// translation is synchronous and fails the whole call; stream translation
/// distinguishes recoverable per-chunk problems (logged and skipped) from
/// terminal ones (abort the stream).
#[derive(Debug, Error)]
pub enum BridgeError {
    /// A client content block could not be understood. `phase` names the
    /// step that was in progress, e.g. `"extracting system content"` or
    /// `"transforming message"`.
    #[error("{phase}: {message}")]
    InvalidRequest { phase: &'static str, message: String },

    /// The downstream sink could not accept an event. Always terminal.
    #[error("failed to write downstream event: {0}")]
    SinkWrite(String),

    /// The upstream line scanner exceeded its 1 MiB buffer without finding a
    /// line terminator.
    #[error("upstream line exceeded scanner buffer of {limit} bytes")]
    ScannerOverflow { limit: usize },

    /// The upstream connection ended or errored before the stream reached a
    /// terminal event. A dropped socket is treated as a normal completion
    /// signal, not a protocol violation, but callers that want to know may
    /// match on this variant.
    #[error("upstream I/O error: {0}")]
    UpstreamIo(String),
}

impl BridgeError {
    pub fn invalid_request(phase: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            phase,
            message: message.into(),
        }
    }
}

// Malformed individual chunks, duplicate sequence numbers, and unknown event
// types are recovered inline in the stream loops (logged and skipped) and
// never constructed as a `BridgeError` at all — every variant above is fatal
// to the call it's returned from.
