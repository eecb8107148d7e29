//! Shared per-response state (§3 `StreamState`) for both stream translators.
//!
//! One value lives for exactly one response: created at `message_start`
//! emission, destroyed after `message_stop` (§3 Lifecycle). Guarded by a
//! `tokio::sync::Mutex` per §5 so accessor calls from another thread (e.g. a
//! telemetry reader) can't race the owning task's writes.

use std::collections::{HashMap, HashSet};

/// Where the state machine currently is, per the diagram in §4.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    MessageStarted,
    ThinkingContent,
    TextContent,
    ToolCall,
    Done,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Accumulator for one in-flight tool-call / function-call block.
#[derive(Debug, Clone, Default)]
pub struct ToolCallBuilder {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
    pub block_index: Option<u32>,
    pub started: bool,
    pub closed: bool,
}

#[derive(Debug, Clone)]
pub struct Citation {
    pub url: String,
    pub title: String,
}

pub struct StreamState {
    pub phase: Phase,
    pub text_block_index: Option<u32>,
    pub thinking_block_index: Option<u32>,
    next_free_index: u32,
    /// Keyed by the upstream's own index/id, not by block index.
    pub tool_calls: HashMap<u32, ToolCallBuilder>,
    pub usage: Usage,
    pub response_id: Option<String>,
    pub seen_sequence_numbers: HashSet<u64>,
    pub citations: Vec<Citation>,
    pub any_tool_call_opened: bool,
}

impl StreamState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            text_block_index: None,
            thinking_block_index: None,
            next_free_index: 0,
            tool_calls: HashMap::new(),
            usage: Usage::default(),
            response_id: None,
            seen_sequence_numbers: HashSet::new(),
            citations: Vec::new(),
            any_tool_call_opened: false,
        }
    }

    /// Allocates the next free block index. Once assigned, an index never
    /// changes (§3 invariant 1).
    pub fn allocate_index(&mut self) -> u32 {
        let index = self.next_free_index;
        self.next_free_index += 1;
        index
    }

    /// Records a sequence number, returning `true` if it was already seen
    /// (§4.10: duplicates are silently discarded).
    ///
    /// TODO: narrow this to a per-`(output_item, content_part)` scope if an
    /// upstream is ever found reusing sequence numbers across distinct
    /// content pieces (§9 open question — dedup scope).
    pub fn is_duplicate_sequence(&mut self, sequence_number: u64) -> bool {
        !self.seen_sequence_numbers.insert(sequence_number)
    }
}

impl Default for StreamState {
    fn default() -> Self {
        Self::new()
    }
}
