//! Error taxonomy for the edit engine.
//!
//! One enum, one variant family per failure class. Every variant carries
//! enough structure (counts, lines, suggestions) for a caller to decide
//! whether to narrow the request, override, or give up.

use std::path::PathBuf;

use miette::Diagnostic;

use crate::core::disambiguate::DisambiguationSuggestion;
use crate::core::scope::ScopeKind;
use crate::core::validate::EditValidation;

/// Coordinate translation failures. Never clamped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("line {line} is out of bounds (source has {total} lines)")]
    LineOutOfBounds { line: usize, total: usize },

    #[error("column {column} is out of bounds for line {line} ({width} characters)")]
    ColumnOutOfBounds {
        line: usize,
        column: usize,
        width: usize,
    },

    #[error("offset {offset} is out of bounds (source is {len} bytes)")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("offset {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },
}

/// Requests rejected before any scanning happens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("search text is empty")]
    EmptySearch,

    #[error("replacement is identical to the search text")]
    NoOp,

    #[error("batch contains no operations")]
    EmptyBatch,
}

#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum EditError {
    #[error(transparent)]
    #[diagnostic(code(scopedit::input))]
    Input(#[from] InputError),

    #[error("{kind} `{name}` not found")]
    #[diagnostic(
        code(scopedit::scope_not_found),
        help("list the available scopes with `scopedit scopes <FILE>`")
    )]
    ScopeNotFound { kind: ScopeKind, name: String },

    /// Every filter resolved, but no candidate satisfies all of them.
    #[error("{inner_kind} `{inner}` is not inside {outer_kind} `{outer}`")]
    #[diagnostic(code(scopedit::scope_not_found))]
    ScopeMismatch {
        inner_kind: ScopeKind,
        inner: String,
        outer_kind: ScopeKind,
        outer: String,
    },

    #[error("`{search}` not found{}", scope.as_deref().map(|s| format!(" in {s}")).unwrap_or_default())]
    #[diagnostic(code(scopedit::text_not_found))]
    TextNotFound {
        search: String,
        scope: Option<String>,
    },

    #[error("{kind} `{name}` is ambiguous: {} scopes match (lines {})", lines.len(), join_lines(lines))]
    #[diagnostic(
        code(scopedit::ambiguous_context),
        help("combine filters (e.g. --within-class with --within-method) to pick one scope")
    )]
    AmbiguousContext {
        kind: ScopeKind,
        name: String,
        lines: Vec<usize>,
        /// Occurrences across all matching scopes.
        count: usize,
        suggestions: Vec<DisambiguationSuggestion>,
    },

    #[error("`{search}` occurs {count} times (lines {})", join_lines(lines))]
    #[diagnostic(
        code(scopedit::ambiguous_occurrence),
        help("retry with one of the suggested unique replacements, or allow multiple matches")
    )]
    AmbiguousOccurrence {
        search: String,
        count: usize,
        lines: Vec<usize>,
        suggestions: Vec<DisambiguationSuggestion>,
    },

    #[error("edit rejected as unsafe: {}", reasons.join("; "))]
    #[diagnostic(
        code(scopedit::unsafe_edit),
        help("indentation issues can be overridden; unbalanced braces or parentheses cannot")
    )]
    Unsafe {
        reasons: Vec<String>,
        validation: Box<EditValidation>,
    },

    #[error("operation {index} failed validation: {source}")]
    #[diagnostic(code(scopedit::batch))]
    Batch {
        index: usize,
        source: Box<EditError>,
    },

    #[error("transaction rolled back at operation {index}: {reason}")]
    #[diagnostic(code(scopedit::transaction))]
    Transaction { index: usize, reason: String },

    #[error("rollback after operation {index} failed: {reason}")]
    #[diagnostic(
        code(scopedit::rollback),
        help("the file may be partially edited; restore it from version control")
    )]
    RollbackFailed { index: usize, reason: String },

    #[error("{} changed on disk since it was loaded", path.display())]
    #[diagnostic(code(scopedit::file_changed), help("reload the file and retry"))]
    FileChanged { path: PathBuf },

    #[error("failed to {action} {}: {message}", path.display())]
    #[diagnostic(code(scopedit::io))]
    Io {
        action: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error(transparent)]
    #[diagnostic(code(scopedit::position))]
    Position(#[from] PositionError),

    #[error("unable to parse source: {0}")]
    #[diagnostic(code(scopedit::parse))]
    Parse(String),
}

fn join_lines(lines: &[usize]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl EditError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        EditError::Io {
            action,
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Process exit code for this failure class.
    /// 2=ambiguous, 3=invalid, 4=not found, 5=unsafe, 6=rolled back, 7=io/internal
    pub fn exit_code(&self) -> i32 {
        match self {
            EditError::AmbiguousContext { .. } | EditError::AmbiguousOccurrence { .. } => 2,
            EditError::Input(_) | EditError::Position(_) => 3,
            EditError::ScopeNotFound { .. }
            | EditError::ScopeMismatch { .. }
            | EditError::TextNotFound { .. } => 4,
            EditError::Unsafe { .. } => 5,
            EditError::Batch { source, .. } => source.exit_code(),
            EditError::Transaction { .. } => 6,
            EditError::RollbackFailed { .. }
            | EditError::FileChanged { .. }
            | EditError::Io { .. }
            | EditError::Parse(_) => 7,
        }
    }

    /// Stable snake_case class name, used in JSON results.
    pub fn class(&self) -> &'static str {
        match self {
            EditError::Input(_) | EditError::Position(_) => "input",
            EditError::ScopeNotFound { .. }
            | EditError::ScopeMismatch { .. }
            | EditError::TextNotFound { .. } => "not_found",
            EditError::AmbiguousContext { .. } => "ambiguous_context",
            EditError::AmbiguousOccurrence { .. } => "ambiguous_occurrence",
            EditError::Unsafe { .. } => "unsafe",
            EditError::Batch { source, .. } => source.class(),
            EditError::Transaction { .. } => "transaction",
            EditError::RollbackFailed { .. }
            | EditError::FileChanged { .. }
            | EditError::Io { .. }
            | EditError::Parse(_) => "io",
        }
    }

    /// True when a narrower or overridden request may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EditError::AmbiguousContext { .. }
            | EditError::AmbiguousOccurrence { .. }
            | EditError::Unsafe { .. } => true,
            EditError::Batch { source, .. } => source.is_recoverable(),
            _ => false,
        }
    }

    /// Ranked suggestions carried by ambiguity failures.
    pub fn suggestions(&self) -> &[DisambiguationSuggestion] {
        match self {
            EditError::AmbiguousContext { suggestions, .. }
            | EditError::AmbiguousOccurrence { suggestions, .. } => suggestions,
            EditError::Batch { source, .. } => source.suggestions(),
            _ => &[],
        }
    }

    /// Validation report attached to unsafe rejections.
    pub fn validation(&self) -> Option<&EditValidation> {
        match self {
            EditError::Unsafe { validation, .. } => Some(validation),
            EditError::Batch { source, .. } => source.validation(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_class() {
        assert_eq!(EditError::from(InputError::EmptySearch).exit_code(), 3);
        let nf = EditError::ScopeNotFound {
            kind: ScopeKind::Function,
            name: "f".into(),
        };
        assert_eq!(nf.exit_code(), 4);
        assert_eq!(nf.class(), "not_found");

        let amb = EditError::AmbiguousOccurrence {
            search: "x".into(),
            count: 2,
            lines: vec![1, 4],
            suggestions: vec![],
        };
        assert_eq!(amb.exit_code(), 2);
        assert!(amb.is_recoverable());
        assert_eq!(amb.to_string(), "`x` occurs 2 times (lines 1, 4)");
    }

    #[test]
    fn ambiguous_context_carries_suggestions() {
        let suggestion = DisambiguationSuggestion {
            strategy: crate::core::disambiguate::Strategy::ScopeContext,
            description: "Restrict the edit to method `a`".into(),
            old_string: "x".into(),
            new_string: "y".into(),
            confidence: 0.7,
            line: 3,
            context: None,
        };
        let err = EditError::AmbiguousContext {
            kind: ScopeKind::Class,
            name: "C".into(),
            lines: vec![1, 9],
            count: 2,
            suggestions: vec![suggestion],
        };
        assert_eq!(err.exit_code(), 2);
        assert!(err.is_recoverable());
        assert_eq!(err.suggestions().len(), 1);
        assert_eq!(err.to_string(), "class `C` is ambiguous: 2 scopes match (lines 1, 9)");
    }

    #[test]
    fn batch_errors_delegate_to_inner_class() {
        let inner = EditError::TextNotFound {
            search: "gone".into(),
            scope: Some("function `f`".into()),
        };
        let err = EditError::Batch {
            index: 1,
            source: Box::new(inner),
        };
        assert_eq!(err.exit_code(), 4);
        assert_eq!(err.class(), "not_found");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("`gone` not found in function `f`"));
    }

    #[test]
    fn io_helper_keeps_path_and_message() {
        let err = EditError::io("write", "src/a.rs", "disk full");
        assert_eq!(err.to_string(), "failed to write src/a.rs: disk full");
        assert_eq!(err.exit_code(), 7);
    }
}
