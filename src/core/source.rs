//! Immutable source snapshot with a position index.
//!
//! Lines are 1-based, columns are 1-based character columns. Every
//! coordinate translation either succeeds exactly or reports a
//! `PositionError`; nothing is clamped.

use std::ops::Range;
use std::sync::Arc;

use crate::core::errors::PositionError;
use crate::infra::line_index::NewlineIndex;

#[derive(Debug, Clone)]
pub struct SourceText {
    text: Arc<str>,
    index: NewlineIndex,
}

impl SourceText {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        let text = text.into();
        let index = NewlineIndex::build(text.as_bytes());
        Self { text, index }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Shared handle to the snapshot, cheap to clone.
    pub fn snapshot(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.index.line_count()
    }

    /// Content of one line, without its terminator.
    pub fn line(&self, line: usize) -> Result<&str, PositionError> {
        let span = self.line_span(line, line)?;
        Ok(&self.text[span])
    }

    /// Inclusive line range joined with the original terminators.
    /// The last line's terminator is not included.
    pub fn lines(&self, start: usize, end: usize) -> Result<&str, PositionError> {
        let span = self.line_span(start, end)?;
        Ok(&self.text[span])
    }

    /// Byte span of an inclusive line range.
    pub fn line_span(&self, start: usize, end: usize) -> Result<Range<usize>, PositionError> {
        let total = self.line_count();
        for line in [start, end] {
            if line == 0 || line > total {
                return Err(PositionError::LineOutOfBounds { line, total });
            }
        }
        if start > end {
            return Err(PositionError::LineOutOfBounds { line: start, total });
        }
        let bytes = self.text.as_bytes();
        self.index
            .byte_range_for_lines(start, end, bytes)
            .map(|(s, e)| s..e)
            .ok_or(PositionError::LineOutOfBounds { line: end, total })
    }

    /// Byte offset of a (line, column) position. The column one past the
    /// last character addresses the end of the line.
    pub fn offset_of(&self, line: usize, column: usize) -> Result<usize, PositionError> {
        let content = self.line(line)?;
        let start = self.line_span(line, line)?.start;
        let width = content.chars().count();
        if column == 0 || column > width + 1 {
            return Err(PositionError::ColumnOutOfBounds { line, column, width });
        }
        let rel = content
            .char_indices()
            .nth(column - 1)
            .map_or(content.len(), |(i, _)| i);
        Ok(start + rel)
    }

    /// (line, column) of a byte offset.
    pub fn position_of(&self, offset: usize) -> Result<(usize, usize), PositionError> {
        let len = self.text.len();
        if offset > len || self.text.is_empty() {
            return Err(PositionError::OffsetOutOfBounds { offset, len });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(PositionError::NotCharBoundary { offset });
        }
        let line = self.line_of_offset(offset)?;
        let start = self
            .index
            .start_byte_of_line(line)
            .ok_or(PositionError::OffsetOutOfBounds { offset, len })?;
        let column = self.text[start..offset].chars().count() + 1;
        Ok((line, column))
    }

    /// 1-based line containing a byte offset.
    pub fn line_of_offset(&self, offset: usize) -> Result<usize, PositionError> {
        self.index
            .line_of_byte(offset)
            .ok_or(PositionError::OffsetOutOfBounds {
                offset,
                len: self.text.len(),
            })
    }

    /// Lines `line - radius ..= end_line + radius`, clipped at file bounds.
    pub fn window(&self, line: usize, end_line: usize, radius: usize) -> Result<&str, PositionError> {
        let lo = line.saturating_sub(radius).max(1);
        let hi = (end_line + radius).min(self.line_count());
        self.lines(lo, hi)
    }
}

impl From<String> for SourceText {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SourceText {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
