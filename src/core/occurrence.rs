//! Literal occurrence search.
//!
//! Matching is case-sensitive and literal: the search text is never a
//! pattern. Matches are non-overlapping and found over the whole text,
//! so a search string may span several lines.

use std::ops::Range;

use memchr::memmem;
use serde::Serialize;
use tracing::trace;

use crate::core::errors::PositionError;
use crate::core::scope::{ScopeId, ScopeTable};
use crate::core::source::SourceText;

/// Lines captured on each side of a match by default.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    /// 1-based line of the first matched character.
    pub line: usize,
    /// 1-based character column of the first matched character.
    pub column: usize,
    /// 1-based line of the last matched character.
    pub end_line: usize,
    #[serde(skip)]
    pub byte_range: Range<usize>,
    pub line_text: String,
    /// Innermost scope containing the match.
    #[serde(skip)]
    pub scope: Option<ScopeId>,
    /// Qualified name of `scope`, for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing_scope: Option<String>,
    pub surrounding_context: String,
}

pub struct OccurrenceFinder<'a> {
    source: &'a SourceText,
    scopes: &'a ScopeTable,
    context_lines: usize,
}

impl<'a> OccurrenceFinder<'a> {
    pub fn new(source: &'a SourceText, scopes: &'a ScopeTable) -> Self {
        Self {
            source,
            scopes,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Every match of `search`, restricted to the line spans of `within`
    /// when given. An empty search yields nothing.
    pub fn find(
        &self,
        search: &str,
        within: Option<&[ScopeId]>,
    ) -> Result<Vec<Occurrence>, PositionError> {
        if search.is_empty() {
            return Ok(Vec::new());
        }

        let text = self.source.as_str();
        let mut out = Vec::new();

        for start in memmem::find_iter(text.as_bytes(), search.as_bytes()) {
            let byte_range = start..start + search.len();
            let line = self.source.line_of_offset(start)?;
            let end_line = self.source.line_of_offset(byte_range.end - 1)?;

            // Both ends must sit inside one resolved scope.
            if let Some(ids) = within {
                let inside = ids.iter().any(|&id| {
                    self.scopes
                        .get(id)
                        .is_some_and(|s| s.contains_lines(line, end_line))
                });
                if !inside {
                    trace!(line, "match outside requested scopes");
                    continue;
                }
            }

            let (_, column) = self.source.position_of(start)?;
            let scope = self
                .scopes
                .innermost_containing(line, end_line, &byte_range);

            out.push(Occurrence {
                line,
                column,
                end_line,
                line_text: self.source.line(line)?.to_string(),
                scope,
                enclosing_scope: scope.map(|id| self.scopes.qualified_name(id)),
                surrounding_context: self
                    .source
                    .window(line, end_line, self.context_lines)?
                    .to_string(),
                byte_range,
            });
        }

        Ok(out)
    }
}
