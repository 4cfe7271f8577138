//! Ranked alternatives for a non-unique search string.
//!
//! Three strategies run for every occurrence and all valid results are
//! returned; the caller picks. Order is part of the contract: confidence
//! descending, then line ascending.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::core::occurrence::{DEFAULT_CONTEXT_LINES, Occurrence};
use crate::core::scope::ScopeTable;
use crate::core::source::SourceText;
use crate::core::syntax::{Language, is_generic_comment_line};
use crate::core::validate::EditContext;

/// How far from a match a comment may sit and still anchor it.
pub const DEFAULT_COMMENT_RADIUS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Widen to the lines preceding the match.
    SurroundingContext,
    /// Widen to an adjacent comment block.
    CommentContext,
    /// Re-issue the edit constrained to the enclosing scope.
    ScopeContext,
}

impl Strategy {
    pub fn confidence(self) -> f32 {
        match self {
            Strategy::SurroundingContext => 0.9,
            Strategy::CommentContext => 0.8,
            Strategy::ScopeContext => 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisambiguationSuggestion {
    pub strategy: Strategy,
    pub description: String,
    pub old_string: String,
    pub new_string: String,
    pub confidence: f32,
    /// Line of the occurrence this suggestion targets.
    pub line: usize,
    /// Scope constraint to re-issue the edit with (scope strategy only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<EditContext>,
}

type SuggestionKey = (Strategy, String, String, Option<EditContext>);

pub struct Disambiguator<'a> {
    source: &'a SourceText,
    scopes: &'a ScopeTable,
    language: Option<Language>,
    context_lines: usize,
    comment_radius: usize,
}

impl<'a> Disambiguator<'a> {
    pub fn new(source: &'a SourceText, scopes: &'a ScopeTable, language: Option<Language>) -> Self {
        Self {
            source,
            scopes,
            language,
            context_lines: DEFAULT_CONTEXT_LINES,
            comment_radius: DEFAULT_COMMENT_RADIUS,
        }
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn with_comment_radius(mut self, radius: usize) -> Self {
        self.comment_radius = radius;
        self
    }

    /// Suggestions for every occurrence, de-duplicated and ranked.
    pub fn suggest(&self, old: &str, new: &str, occurrences: &[Occurrence]) -> Vec<DisambiguationSuggestion> {
        let mut unique: IndexMap<SuggestionKey, DisambiguationSuggestion> = IndexMap::new();

        for occ in occurrences {
            let candidates = [
                self.surrounding(old, new, occ),
                self.comment(old, new, occ),
                self.scope(old, new, occ, occurrences),
            ];
            for s in candidates.into_iter().flatten() {
                let key = (s.strategy, s.old_string.clone(), s.new_string.clone(), s.context.clone());
                let slot = unique.entry(key).or_insert_with(|| s.clone());
                if s.line < slot.line {
                    *slot = s;
                }
            }
        }

        let mut out: Vec<_> = unique.into_values().collect();
        out.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.line.cmp(&b.line))
        });
        debug!(count = out.len(), "ranked disambiguation suggestions");
        out
    }

    fn is_comment(&self, line: &str) -> bool {
        match self.language {
            Some(lang) => lang.is_comment_line(line),
            None => is_generic_comment_line(line),
        }
    }

    /// Widen `lo..=hi` around the match; None unless the result is usable
    /// as a unique search string on its own.
    fn widen(&self, old: &str, new: &str, occ: &Occurrence, lo: usize, hi: usize) -> Option<(String, String)> {
        let span = self.source.line_span(lo, hi).ok()?;
        let widened = &self.source.as_str()[span.clone()];

        // The block must hold the original match exactly once...
        if widened.matches(old).count() != 1 {
            trace!(line = occ.line, "widened block repeats the search text");
            return None;
        }
        // ...and must itself be unique in the file.
        if self.source.as_str().matches(widened).count() != 1 {
            trace!(line = occ.line, "widened block is not unique");
            return None;
        }

        let rel = occ.byte_range.start.checked_sub(span.start)?;
        let replaced = format!("{}{}{}", &widened[..rel], new, &widened[rel + old.len()..]);
        Some((widened.to_string(), replaced))
    }

    fn surrounding(&self, old: &str, new: &str, occ: &Occurrence) -> Option<DisambiguationSuggestion> {
        let lo = occ.line.saturating_sub(self.context_lines).max(1);
        let (old_string, new_string) = self.widen(old, new, occ, lo, occ.end_line)?;
        Some(DisambiguationSuggestion {
            strategy: Strategy::SurroundingContext,
            description: format!(
                "Include lines {lo}-{} so the match at line {} is unique",
                occ.end_line, occ.line
            ),
            old_string,
            new_string,
            confidence: Strategy::SurroundingContext.confidence(),
            line: occ.line,
            context: None,
        })
    }

    /// Nearest comment line within the radius, looking above first.
    fn nearest_comment(&self, occ: &Occurrence) -> Option<usize> {
        let total = self.source.line_count();
        (1..=self.comment_radius).find_map(|d| {
            let above = occ.line.checked_sub(d).filter(|&l| l >= 1);
            let below = Some(occ.end_line + d).filter(|&l| l <= total);
            [above, below]
                .into_iter()
                .flatten()
                .find(|&l| self.source.line(l).is_ok_and(|t| self.is_comment(t)))
        })
    }

    fn comment(&self, old: &str, new: &str, occ: &Occurrence) -> Option<DisambiguationSuggestion> {
        let at = self.nearest_comment(occ)?;
        let total = self.source.line_count();
        let mut lo = at.min(occ.line);
        let mut hi = at.max(occ.end_line);

        // Take the whole contiguous comment block.
        if at < occ.line {
            while lo > 1 && self.source.line(lo - 1).is_ok_and(|t| self.is_comment(t)) {
                lo -= 1;
            }
        } else {
            while hi < total && self.source.line(hi + 1).is_ok_and(|t| self.is_comment(t)) {
                hi += 1;
            }
        }

        let (old_string, new_string) = self.widen(old, new, occ, lo, hi)?;
        Some(DisambiguationSuggestion {
            strategy: Strategy::CommentContext,
            description: format!(
                "Anchor on the comment at line {at} (lines {lo}-{hi}) to target line {}",
                occ.line
            ),
            old_string,
            new_string,
            confidence: Strategy::CommentContext.confidence(),
            line: occ.line,
            context: None,
        })
    }

    fn scope(
        &self,
        old: &str,
        new: &str,
        occ: &Occurrence,
        all: &[Occurrence],
    ) -> Option<DisambiguationSuggestion> {
        let scope = self.scopes.get(occ.scope?)?;
        let inside = all
            .iter()
            .filter(|o| scope.contains_lines(o.line, o.end_line))
            .count();

        Some(DisambiguationSuggestion {
            strategy: Strategy::ScopeContext,
            description: format!(
                "Restrict the edit to {} ({inside} occurrence{} inside)",
                scope.describe(),
                if inside == 1 { "" } else { "s" }
            ),
            old_string: old.to_string(),
            new_string: new.to_string(),
            confidence: Strategy::ScopeContext.confidence(),
            line: occ.line,
            context: Some(EditContext::for_scope(scope.kind, scope.name.clone())),
        })
    }
}
