//! Newline index with LF/CRLF-robust line/byte mapping.
//!
//! Goals
//! - Single pass over bytes to record '\n' positions.
//! - 1-based external line numbers (friendly for UX).
//! - O(1) line→byte start/end via the index.
//! - End byte excludes trailing '\r' for CRLF lines.
//! - Binary search for byte→line mapping.
//!
//! Notes
//! - An empty buffer has 0 lines.
//! - A non-empty buffer without '\n' has 1 line.
//! - A trailing '\n' opens a final, empty line.
//! - A '\n' byte belongs to the line it terminates.
//! - For ranges, end is exclusive (Rust slicing convention).

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewlineIndex {
    /// Byte positions of every '\n' in the buffer.
    nl_positions: Vec<usize>,
    /// Total byte length of the buffer.
    len: usize,
}

impl NewlineIndex {
    /// Build an index recording positions of '\n'.
    pub fn build(bytes: &[u8]) -> Self {
        let nl_positions: Vec<usize> = memchr::memchr_iter(b'\n', bytes).collect();

        Self {
            nl_positions,
            len: bytes.len(),
        }
    }

    /// Total number of logical lines.
    /// Empty buffer => 0 lines; else (#'\n' + 1).
    pub fn line_count(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.nl_positions.len() + 1
        }
    }

    /// Byte length of the indexed buffer.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start byte (inclusive) of a 1-based line.
    /// Returns None if line is out of range.
    pub fn start_byte_of_line(&self, line1: usize) -> Option<usize> {
        if line1 == 0 || line1 > self.line_count() {
            return None;
        }
        if line1 == 1 {
            return Some(0);
        }
        // For line L>1, start is one past the previous '\n'.
        self.nl_positions
            .get(line1 - 2)
            .map(|&prev_nl| prev_nl + 1)
    }

    /// End byte (exclusive) of a 1-based line's content.
    /// Returns None if line is out of range.
    /// For CRLF, excludes trailing '\r' before '\n'.
    pub fn end_byte_of_line(&self, line1: usize, bytes: &[u8]) -> Option<usize> {
        if line1 == 0 || line1 > self.line_count() {
            return None;
        }

        // Lines that end with '\n' (not the last line without NL)
        if let Some(&nl) = self.nl_positions.get(line1 - 1) {
            if nl > 0 && bytes.get(nl - 1) == Some(&b'\r') {
                return Some(nl - 1);
            }
            return Some(nl);
        }

        // Last line without trailing '\n' ends at EOF.
        Some(self.len)
    }

    /// End byte (exclusive) of a 1-based line including its terminator.
    pub fn end_byte_with_terminator(&self, line1: usize) -> Option<usize> {
        if line1 == 0 || line1 > self.line_count() {
            return None;
        }
        Some(
            self.nl_positions
                .get(line1 - 1)
                .map_or(self.len, |&nl| nl + 1),
        )
    }

    /// Byte range (start..end) for an inclusive 1-based line span.
    /// The end excludes the last line's terminator.
    /// Returns None if the span is invalid or out of range.
    pub fn byte_range_for_lines(
        &self,
        start_line1: usize,
        end_line1: usize,
        bytes: &[u8],
    ) -> Option<(usize, usize)> {
        if start_line1 == 0 || start_line1 > end_line1 || end_line1 > self.line_count() {
            return None;
        }

        let s = self.start_byte_of_line(start_line1)?;
        let e = self.end_byte_of_line(end_line1, bytes)?;

        (s <= e && e <= self.len).then_some((s, e))
    }

    /// 1-based line number covering the given byte offset.
    /// An offset equal to the buffer length maps to the last line.
    /// Returns None for empty buffers and offsets past the end.
    pub fn line_of_byte(&self, byte: usize) -> Option<usize> {
        if self.len == 0 || byte > self.len {
            return None;
        }
        // Number of '\n' strictly before `byte`.
        let before = self.nl_positions.partition_point(|&nl| nl < byte);
        Some(before + 1)
    }
}
