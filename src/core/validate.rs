//! Edit validation: uniqueness, indentation, bracket balance and
//! (optionally) parser diagnostics for the replacement text.
//!
//! Validation never mutates anything. Its verdict is summarised by
//! `EditValidation::is_safe`, which is derived from the other fields.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::disambiguate::{DisambiguationSuggestion, Disambiguator};
use crate::core::errors::{EditError, InputError};
use crate::core::occurrence::{DEFAULT_CONTEXT_LINES, Occurrence, OccurrenceFinder};
use crate::core::scope::{ScopeKind, ScopeTable};
use crate::core::source::SourceText;
use crate::core::syntax::Language;

/// Cap on parser diagnostics surfaced per snippet.
pub const MAX_CHECKER_DIAGNOSTICS: usize = 5;

/// Caller-supplied constraint on where an edit may land.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_namespace: Option<String>,
    pub require_unique: bool,
    /// Downgrade indentation issues to warnings.
    pub allow_indentation_changes: bool,
}

impl Default for EditContext {
    fn default() -> Self {
        Self {
            within_function: None,
            within_class: None,
            within_method: None,
            within_interface: None,
            within_namespace: None,
            require_unique: true,
            allow_indentation_changes: false,
        }
    }
}

impl EditContext {
    /// Context restricted to one named scope.
    pub fn for_scope(kind: ScopeKind, name: impl Into<String>) -> Self {
        let name = Some(name.into());
        let mut ctx = Self::default();
        match kind {
            ScopeKind::Function => ctx.within_function = name,
            ScopeKind::Method => ctx.within_method = name,
            ScopeKind::Class => ctx.within_class = name,
            ScopeKind::Interface => ctx.within_interface = name,
            ScopeKind::Namespace => ctx.within_namespace = name,
        }
        ctx
    }

    /// Active filters, most specific first.
    pub fn filters(&self) -> Vec<(ScopeKind, &str)> {
        let mut out: Vec<(ScopeKind, &str)> = [
            (ScopeKind::Function, &self.within_function),
            (ScopeKind::Method, &self.within_method),
            (ScopeKind::Class, &self.within_class),
            (ScopeKind::Interface, &self.within_interface),
            (ScopeKind::Namespace, &self.within_namespace),
        ]
        .into_iter()
        .filter_map(|(kind, name)| name.as_deref().map(|n| (kind, n)))
        .collect();
        out.sort_by_key(|(kind, _)| kind.specificity());
        out
    }

    pub fn is_scoped(&self) -> bool {
        !self.filters().is_empty()
    }

    /// "method `m` in class `C`", or None when unscoped.
    pub fn describe(&self) -> Option<String> {
        let parts: Vec<String> = self
            .filters()
            .into_iter()
            .map(|(kind, name)| format!("{kind} `{name}`"))
            .collect();
        (!parts.is_empty()).then(|| parts.join(" in "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditValidation {
    is_unique: bool,
    is_safe: bool,
    syntax_valid: bool,
    occurrence_count: usize,
    /// The scope filters matched more than one scope.
    ambiguous_context: bool,
    indentation_issues: Vec<String>,
    syntax_warnings: Vec<String>,
    suggestions: Vec<DisambiguationSuggestion>,
    #[serde(skip)]
    occurrences: Vec<Occurrence>,
}

impl EditValidation {
    pub fn new(
        occurrences: Vec<Occurrence>,
        require_unique: bool,
        ambiguous_context: bool,
        indentation_issues: Vec<String>,
        syntax_warnings: Vec<String>,
        syntax_valid: bool,
        suggestions: Vec<DisambiguationSuggestion>,
    ) -> Self {
        let occurrence_count = occurrences.len();
        let is_unique = occurrence_count == 1;
        let is_safe = syntax_valid && indentation_issues.is_empty() && (is_unique || !require_unique);
        Self {
            is_unique,
            is_safe,
            syntax_valid,
            occurrence_count,
            ambiguous_context,
            indentation_issues,
            syntax_warnings,
            suggestions,
            occurrences,
        }
    }

    pub fn is_unique(&self) -> bool {
        self.is_unique
    }

    pub fn is_safe(&self) -> bool {
        self.is_safe
    }

    pub fn syntax_valid(&self) -> bool {
        self.syntax_valid
    }

    pub fn occurrence_count(&self) -> usize {
        self.occurrence_count
    }

    pub fn ambiguous_context(&self) -> bool {
        self.ambiguous_context
    }

    pub fn indentation_issues(&self) -> &[String] {
        &self.indentation_issues
    }

    pub fn syntax_warnings(&self) -> &[String] {
        &self.syntax_warnings
    }

    pub fn suggestions(&self) -> &[DisambiguationSuggestion] {
        &self.suggestions
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }
}

/// Optional deeper check of a snippet parsed in isolation.
pub trait SyntaxChecker: Send + Sync {
    /// Diagnostics for `snippet`; empty when it parses cleanly.
    fn diagnostics(&self, snippet: &str) -> Vec<String>;
}

/// Reject requests that cannot mean anything.
pub fn check_input(old: &str, new: &str) -> Result<(), InputError> {
    if old.is_empty() {
        return Err(InputError::EmptySearch);
    }
    if old == new {
        return Err(InputError::NoOp);
    }
    Ok(())
}

fn leading_ws(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

/// Line-pairwise comparison of leading whitespace. Blank lines on either
/// side are exempt; nothing is re-indented.
pub fn indentation_issues(old: &str, new: &str) -> Vec<String> {
    old.lines()
        .zip(new.lines())
        .enumerate()
        .filter(|(_, (o, n))| !o.trim().is_empty() && !n.trim().is_empty())
        .filter_map(|(i, (o, n))| {
            let (ow, nw) = (leading_ws(o), leading_ws(n));
            (ow != nw).then(|| {
                format!(
                    "line {} of the edit: indentation changes from {:?} to {:?}",
                    i + 1,
                    ow,
                    nw
                )
            })
        })
        .collect()
}

/// Net and lowest running depth of one delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub net: i64,
    pub lowest: i64,
}

impl Balance {
    /// Count `open`/`close` without regard to strings or comments.
    pub fn scan(text: &str, open: char, close: char) -> Self {
        let mut depth = 0i64;
        let mut lowest = 0i64;
        for c in text.chars() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                lowest = lowest.min(depth);
            }
        }
        Self { net: depth, lowest }
    }
}

/// Brace and parenthesis balance of the replacement on its own. A close
/// before its open, or any unclosed delimiter, is reported.
pub fn balance_warnings(new: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (label, open, close) in [("braces", '{', '}'), ("parentheses", '(', ')')] {
        let balance = Balance::scan(new, open, close);
        if balance.lowest < 0 {
            out.push(format!(
                "unbalanced {label}: replacement closes `{close}` before it is opened"
            ));
        } else if balance.net != 0 {
            out.push(format!(
                "unbalanced {label}: replacement leaves {} unclosed `{open}`",
                balance.net
            ));
        }
    }
    out
}

/// Runs the validation steps against one snapshot.
pub struct EditValidator<'a> {
    source: &'a SourceText,
    scopes: &'a ScopeTable,
    language: Option<Language>,
    checker: Option<&'a dyn SyntaxChecker>,
    context_lines: usize,
    comment_radius: usize,
}

impl<'a> EditValidator<'a> {
    pub fn new(source: &'a SourceText, scopes: &'a ScopeTable, language: Option<Language>) -> Self {
        Self {
            source,
            scopes,
            language,
            checker: None,
            context_lines: DEFAULT_CONTEXT_LINES,
            comment_radius: crate::core::disambiguate::DEFAULT_COMMENT_RADIUS,
        }
    }

    pub fn with_checker(mut self, checker: Option<&'a dyn SyntaxChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    pub fn with_comment_radius(mut self, radius: usize) -> Self {
        self.comment_radius = radius;
        self
    }

    /// Validate replacing `old` with `new` under `ctx`.
    ///
    /// Input errors and unresolvable scope filters are returned as errors;
    /// everything else, including zero or many occurrences, is reported in
    /// the validation.
    #[instrument(level = "debug", skip_all, fields(old_len = old.len(), new_len = new.len()))]
    pub fn validate(&self, old: &str, new: &str, ctx: &EditContext) -> Result<EditValidation, EditError> {
        check_input(old, new)?;

        let resolved = self.scopes.resolve(ctx)?;
        let ambiguous_context = resolved.as_ref().is_some_and(|ids| ids.len() > 1);

        let occurrences = OccurrenceFinder::new(self.source, self.scopes)
            .with_context_lines(self.context_lines)
            .find(old, resolved.as_deref())?;

        let indentation = indentation_issues(old, new);
        let mut syntax_warnings = balance_warnings(new);
        let syntax_valid = syntax_warnings.is_empty();

        // Advisory only, and only when the original snippet is itself clean.
        if let Some(checker) = self.checker
            && checker.diagnostics(old).is_empty()
        {
            syntax_warnings.extend(
                checker
                    .diagnostics(new)
                    .into_iter()
                    .take(MAX_CHECKER_DIAGNOSTICS)
                    .map(|d| format!("parser: {d}")),
            );
        }

        let suggestions = if occurrences.len() > 1 {
            Disambiguator::new(self.source, self.scopes, self.language)
                .with_context_lines(self.context_lines)
                .with_comment_radius(self.comment_radius)
                .suggest(old, new, &occurrences)
        } else {
            Vec::new()
        };

        let validation = EditValidation::new(
            occurrences,
            ctx.require_unique,
            ambiguous_context,
            indentation,
            syntax_warnings,
            syntax_valid,
            suggestions,
        );
        debug!(
            count = validation.occurrence_count(),
            safe = validation.is_safe(),
            "validated edit"
        );
        Ok(validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_errors_come_first() {
        assert_eq!(check_input("", "x"), Err(InputError::EmptySearch));
        assert_eq!(check_input("x", "x"), Err(InputError::NoOp));
        assert_eq!(check_input("x", ""), Ok(()));
    }

    #[test]
    fn indentation_is_compared_pairwise_and_skips_blanks() {
        assert!(indentation_issues("    a\n\n    b", "    c\n  \n    d").is_empty());
        let issues = indentation_issues("    a\n    b", "    a\n  b");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("line 2"));
        // Extra lines in the replacement are not compared
        assert!(indentation_issues("a", "a2\nb").is_empty());
    }

    #[test]
    fn balance_is_judged_on_the_replacement_alone() {
        assert!(balance_warnings("return user;").is_empty());
        assert!(balance_warnings("f()").is_empty());
        assert_eq!(balance_warnings("return null; }").len(), 1);
        assert_eq!(balance_warnings("f(a").len(), 1);
        // Running depth below zero even though the total is zero
        assert_eq!(balance_warnings("} {").len(), 1);
        // Opening line of a block leaves one brace unclosed
        let w = balance_warnings("if (b) {");
        assert_eq!(w.len(), 1);
        assert!(w[0].contains("1 unclosed `{`"));
    }

    #[test]
    fn unbalanced_replacement_clears_syntax_valid() {
        let source = SourceText::from("if (a) {
    f(
}
");
        let scopes = ScopeTable::default();
        let validator = EditValidator::new(&source, &scopes, None);

        let v = validator.validate("if (a) {", "if (b) {", &EditContext::default()).unwrap();
        assert!(!v.syntax_valid());
        assert!(!v.is_safe());

        let v = validator.validate("f(", "f()", &EditContext::default()).unwrap();
        assert!(v.syntax_valid());
        assert!(v.syntax_warnings().is_empty());
        assert!(v.is_safe());
    }

    #[test]
    fn context_filters_are_ordered_by_specificity() {
        let ctx = EditContext {
            within_class: Some("C".into()),
            within_method: Some("m".into()),
            ..EditContext::default()
        };
        assert_eq!(
            ctx.filters(),
            vec![(ScopeKind::Method, "m"), (ScopeKind::Class, "C")]
        );
        assert_eq!(ctx.describe().as_deref(), Some("method `m` in class `C`"));
        assert!(EditContext::default().require_unique);
        assert!(!EditContext::default().is_scoped());
    }

    #[test]
    fn context_deserializes_camel_case_with_defaults() {
        let ctx: EditContext = serde_json::from_str(r#"{"withinMethod":"login"}"#).unwrap();
        assert_eq!(ctx, EditContext::for_scope(ScopeKind::Method, "login"));
        assert!(ctx.require_unique);
    }

    #[test]
    fn is_safe_is_derived() {
        let v = EditValidation::new(vec![], false, false, vec![], vec![], true, vec![]);
        assert!(v.is_safe());
        assert!(!v.is_unique());

        let v = EditValidation::new(vec![], true, false, vec![], vec![], true, vec![]);
        assert!(!v.is_safe());

        let v = EditValidation::new(vec![], false, false, vec!["i".into()], vec![], true, vec![]);
        assert!(!v.is_safe());
    }
}
