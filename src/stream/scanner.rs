//! Bounded line scanner for upstream SSE bodies (§7, §9): a hand-rolled
//! scanner rather than a generic crate, because the protocol caps a single
//! line at 1 MiB and treats overflow as a fatal stream error — behaviour a
//! `bufio.Scanner`-style bounded reader expresses directly but an unbounded
//! line-splitting iterator does not.

use std::io::Read;

use crate::error::{BridgeError, Result};

pub const MAX_LINE_BYTES: usize = 1024 * 1024;
const READ_CHUNK: usize = 8 * 1024;

/// Reads `\n`-terminated lines from an upstream byte stream, stripping a
/// trailing `\r`. Each line is capped at [`MAX_LINE_BYTES`]; exceeding it
/// without finding a terminator is a fatal [`BridgeError::ScannerOverflow`].
pub struct LineScanner<R> {
    reader: R,
    buf: Vec<u8>,
    chunk: [u8; READ_CHUNK],
}

impl<R: Read> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, buf: Vec::new(), chunk: [0u8; READ_CHUNK] }
    }

    /// Returns the next line, or `None` at clean end-of-stream. A final
    /// unterminated line at EOF is still returned once.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
                line.pop(); // trailing '\n'
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            if self.buf.len() >= MAX_LINE_BYTES {
                return Err(BridgeError::ScannerOverflow { limit: MAX_LINE_BYTES });
            }

            let n = self.reader.read(&mut self.chunk).map_err(|e| BridgeError::UpstreamIo(e.to_string()))?;
            if n == 0 {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                let line = std::mem::take(&mut self.buf);
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            self.buf.extend_from_slice(&self.chunk[..n]);
        }
    }
}
