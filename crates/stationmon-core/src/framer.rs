//! Byte-stream to command-line reassembly.
//!
//! Serial input arrives in chunks that bear no relation to line boundaries: a
//! single read may hold half a command, several commands, or nothing useful.
//! [`LineFramer`] accumulates chunks in a bounded buffer and hands back every
//! line completed by a `\n`.
//!
//! # Overflow
//!
//! The buffer never grows past its capacity. When appending a chunk would
//! exceed it, every unread byte is discarded first and the chunk starts a
//! fresh accumulation. A chunk that is itself larger than the capacity keeps
//! nothing of its oversized parts: the next terminator frames from an empty
//! buffer. Nothing is reported to the caller beyond the
//! [`LineFramer::overflow_resets`] counter; a runaway unterminated stream is
//! abandoned, not buffered.

use crate::config::DEFAULT_LINE_CAPACITY;

/// Byte that terminates a command line.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Stateful reassembler turning raw chunks into complete lines.
///
/// # Invariants
///
/// - `pending().len() <= capacity()`
/// - After [`LineFramer::ingest`] returns, `pending()` contains no
///   [`LINE_TERMINATOR`]
#[derive(Debug, Clone)]
pub struct LineFramer {
    buffer: Vec<u8>,
    capacity: usize,
    overflow_resets: u64,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(DEFAULT_LINE_CAPACITY)
    }
}

impl LineFramer {
    /// Create a framer holding at most `capacity` unterminated bytes.
    ///
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { buffer: Vec::with_capacity(capacity), capacity, overflow_resets: 0 }
    }

    /// Append `chunk` and return every line it completes, in order.
    ///
    /// Lines are trimmed of leading spaces, `\r` and `\n` and of trailing `\r`
    /// and `\n`. Lines that trim to nothing are dropped. Bytes after the last
    /// terminator stay buffered for the next call.
    ///
    /// A chunk larger than the capacity cannot be held at all: any line in it
    /// longer than the capacity is dropped whole, and an unterminated tail
    /// longer than the capacity is discarded instead of buffered.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.buffer.len() + chunk.len() > self.capacity {
            self.buffer.clear();
            self.overflow_resets += 1;
        }

        let mut lines = Vec::new();
        let mut rest = chunk;
        while let Some(offset) = rest.iter().position(|&byte| byte == LINE_TERMINATOR) {
            let segment = &rest[..offset];
            if self.buffer.len() + segment.len() <= self.capacity {
                self.buffer.extend_from_slice(segment);
                if let Some(line) = trim_line(&self.buffer) {
                    lines.push(line);
                }
            }
            self.buffer.clear();
            rest = &rest[offset + 1..];
        }

        // Oversized tail: only reachable when the reset above already fired
        if self.buffer.len() + rest.len() <= self.capacity {
            self.buffer.extend_from_slice(rest);
        }

        debug_assert!(self.buffer.len() <= self.capacity);
        lines
    }

    /// Unterminated bytes carried over to the next call.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    /// Number of buffered, unterminated bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when no partial line is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of unterminated bytes held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many times buffered data was discarded to stay within capacity.
    pub fn overflow_resets(&self) -> u64 {
        self.overflow_resets
    }
}

fn trim_line(raw: &[u8]) -> Option<String> {
    let start = raw.iter().position(|&b| !matches!(b, b' ' | b'\r' | b'\n'))?;
    let end = raw.iter().rposition(|&b| !matches!(b, b'\r' | b'\n'))?;
    if end < start {
        return None;
    }
    Some(String::from_utf8_lossy(&raw[start..=end]).into_owned())
}
