//! Key/value extraction from a single log line

use crate::types::NO_VALUE;

/// Key and value tokens of a `Key: value` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyValue<'a> {
    pub key: &'a str,
    pub value: &'a str,
}

impl KeyValue<'_> {
    pub fn has_value(&self) -> bool {
        self.value != NO_VALUE
    }
}

/// Split a line on whitespace; the key is the first token and the value is
/// the last. A line with fewer than two tokens yields the `NA` sentinel.
///
/// Multi-word values keep only their last word, which is how the log format
/// has always been read.
pub fn extract_key_value(line: &str) -> KeyValue<'_> {
    let mut tokens = line.split_whitespace();
    let key = tokens.next().unwrap_or("");
    let value = tokens.last().unwrap_or(NO_VALUE);
    KeyValue { key, value }
}

/// Whether a line marks the start of a trial frame
pub fn is_frame_start(line: &str) -> bool {
    line.contains(super::FRAME_START)
}

/// Whether a line marks the end of a trial frame
pub fn is_frame_end(line: &str) -> bool {
    line.contains(super::FRAME_END)
}
