//! Exact-match binary search over the lines of a mapped log file.
//!
//! The search is deliberately strict: if a bisection midpoint does not start
//! with a valid timestamp the whole search fails with
//! [`LogError::InvalidFormat`], even when the wanted line sits elsewhere in the
//! file. Callers that route by file bounds report that case as not found.

use std::borrow::Cow;

use crate::error::{LogError, Result};
use crate::timestamp::Timestamp;

/// A single line resolved from file content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLine<'a> {
    /// Parsed timestamp prefix.
    pub timestamp: Timestamp,
    /// Raw bytes of the line, without its line terminator.
    pub raw: &'a [u8],
}

impl LogLine<'_> {
    /// Returns the line as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.raw)
    }
}

/// Splits content into lines on `\n`, dropping a trailing `\r` from each.
///
/// The trailing run of line terminators is ignored, so blank lines at the
/// end of a file never become search candidates.
fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    let Some(last) = content.iter().rposition(|b| *b != b'\n' && *b != b'\r') else {
        return Vec::new();
    };
    content[..=last]
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .collect()
}

/// Finds the line whose timestamp equals `target`.
///
/// Lines must be sorted ascending by timestamp.
///
/// # Errors
///
/// - [`LogError::InvalidFormat`] if a probed line has no valid timestamp.
/// - [`LogError::NotFound`] if the search interval is exhausted.
pub fn resolve(content: &[u8], target: Timestamp) -> Result<LogLine<'_>> {
    let lines = split_lines(content);

    let mut low = 0usize;
    let mut high = lines.len();

    // Half-open [low, high).
    while low < high {
        let mid = low + (high - low) / 2;
        let raw = lines[mid];
        let timestamp = Timestamp::parse_bytes(raw)?;

        if timestamp == target {
            return Ok(LogLine { timestamp, raw });
        }

        if target.is_before(&timestamp) {
            high = mid;
        } else {
            low = mid + 1;
        }
    }

    Err(LogError::NotFound)
}
