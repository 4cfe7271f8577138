//! Context-aware edit engine.
//!
//! One engine owns one file (or in-memory buffer): its current snapshot,
//! the syntax tree and scope table derived from it, and the content id
//! used to detect external changes. Every successful write replaces the
//! snapshot and rebuilds the tree and scopes from scratch.
//!
//! Pipeline per request: input checks → scope resolution → occurrence
//! search → validation → (preview | apply). Batches validate every
//! operation against the unmodified content first, then apply them in
//! order inside a transaction.

use std::cell::Cell;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::core::diff::{count_changed_lines, render_unified};
use crate::core::disambiguate::DisambiguationSuggestion;
use crate::core::errors::{EditError, InputError};
use crate::core::occurrence::{Occurrence, OccurrenceFinder};
use crate::core::scope::ScopeTable;
use crate::core::source::SourceText;
use crate::core::syntax::{Language, SyntaxTree};
use crate::core::transaction::Transaction;
use crate::core::validate::{EditContext, EditValidation, EditValidator, SyntaxChecker};
use crate::infra::config::{Config, EngineConfig};
use crate::infra::io::{read_file_smart, write_atomic};

/// Content id type (xxh64 hex)
pub type ContentId = String;

/// Deterministic content id of the exact bytes
pub fn generate_cid(content: &str) -> ContentId {
    let h = xxhash_rust::xxh64::xxh64(content.as_bytes(), 0);
    format!("{:016x}", h)
}

/// Per-file lifecycle, tracked for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditState {
    Idle,
    Validating,
    Applying,
    Applied,
    Rejected,
}

/// One find/replace request in a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditOperation {
    pub old_string: String,
    pub new_string: String,
    #[serde(default)]
    pub context: EditContext,
}

impl EditOperation {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old_string: old.into(),
            new_string: new.into(),
            context: EditContext::default(),
        }
    }

    pub fn within(mut self, context: EditContext) -> Self {
        self.context = context;
        self
    }
}

/// Outcome of a single edit or preview
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Failure class (`not_found`, `ambiguous_occurrence`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines_changed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<EditValidation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<DisambiguationSuggestion>,
}

impl From<EditError> for EditResult {
    fn from(e: EditError) -> Self {
        Self {
            success: false,
            error: Some(e.to_string()),
            error_kind: Some(e.class().to_string()),
            validation: e.validation().cloned(),
            suggestions: e.suggestions().to_vec(),
            ..Self::default()
        }
    }
}

/// Outcome of a batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiEditResult {
    pub success: bool,
    pub edits_applied: usize,
    pub lines_changed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
}

impl From<EditError> for MultiEditResult {
    fn from(e: EditError) -> Self {
        Self {
            success: false,
            error: Some(e.to_string()),
            error_kind: Some(e.class().to_string()),
            ..Self::default()
        }
    }
}

/// A validated edit, ready to apply to the snapshot it was planned on
#[derive(Debug)]
struct Plan {
    range: Range<usize>,
    line: usize,
    validation: EditValidation,
    warnings: Vec<String>,
}

pub struct EditEngine {
    path: Option<PathBuf>,
    language: Option<Language>,
    source: SourceText,
    scopes: ScopeTable,
    cid: ContentId,
    config: EngineConfig,
    preview_context: usize,
    checker: Option<Box<dyn SyntaxChecker>>,
    state: Cell<EditState>,
}

#[cfg(feature = "syntax-check")]
fn default_checker(language: Option<Language>, config: &EngineConfig) -> Option<Box<dyn SyntaxChecker>> {
    let lang = language.filter(|_| config.syntax_checker)?;
    Some(Box::new(crate::parsers::TreeSitterChecker::new(lang)))
}

#[cfg(not(feature = "syntax-check"))]
fn default_checker(_language: Option<Language>, _config: &EngineConfig) -> Option<Box<dyn SyntaxChecker>> {
    None
}

/// Parse `text` into a scope table; unknown languages have no scopes.
fn build_scopes(language: Option<Language>, text: Arc<str>) -> Result<ScopeTable, EditError> {
    let tree = match language {
        Some(lang) => SyntaxTree::parse(lang, text)?,
        None => SyntaxTree::plain(text),
    };
    Ok(ScopeTable::build(&tree))
}

impl EditEngine {
    /// Load `path`, detecting the language from its extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EditError> {
        let path = path.as_ref();
        Self::open_with_language(path, Language::from_path(path))
    }

    #[instrument(level = "debug", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open_with_language(path: impl AsRef<Path>, language: Option<Language>) -> Result<Self, EditError> {
        let path = path.as_ref();
        let text = read_file_smart(path).map_err(|e| EditError::io("read", path, format!("{e:#}")))?;
        let mut engine = Self::in_memory(text, language)?;
        engine.path = Some(path.to_path_buf());
        Ok(engine)
    }

    /// An engine over a buffer; applies update the buffer only.
    pub fn in_memory(text: impl Into<String>, language: Option<Language>) -> Result<Self, EditError> {
        let text: Arc<str> = Arc::from(text.into());
        let config = EngineConfig::default();
        let scopes = build_scopes(language, Arc::clone(&text))?;
        let cid = generate_cid(&text);

        debug!(language = ?language, scopes = scopes.len(), "engine ready");
        Ok(Self {
            path: None,
            language,
            source: SourceText::new(text),
            scopes,
            cid,
            checker: default_checker(language, &config),
            config,
            preview_context: 3,
            state: Cell::new(EditState::Idle),
        })
    }

    /// Apply engine and preview settings from a loaded config.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.config = config.engine.clone();
        self.preview_context = config.preview.context_lines;
        self.checker = default_checker(self.language, &self.config);
        self
    }

    /// Replace (or remove) the snippet checker.
    pub fn with_checker(mut self, checker: Option<Box<dyn SyntaxChecker>>) -> Self {
        self.checker = checker;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn content(&self) -> &str {
        self.source.as_str()
    }

    pub fn source(&self) -> &SourceText {
        &self.source
    }

    pub fn scopes(&self) -> &ScopeTable {
        &self.scopes
    }

    pub fn cid(&self) -> &str {
        &self.cid
    }

    pub fn state(&self) -> EditState {
        self.state.get()
    }

    fn transition(&self, to: EditState) {
        let from = self.state.replace(to);
        if from != to {
            debug!(?from, ?to, "edit state");
        }
    }

    fn label(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| "buffer".to_string(), |p| p.display().to_string())
    }

    fn validator(&self) -> EditValidator<'_> {
        EditValidator::new(&self.source, &self.scopes, self.language)
            .with_checker(self.checker.as_deref())
            .with_context_lines(self.config.context_lines)
            .with_comment_radius(self.config.comment_radius)
    }

    /// Every occurrence of `search` allowed by `ctx`'s scope filters.
    pub fn find_occurrences(&self, search: &str, ctx: &EditContext) -> Result<Vec<Occurrence>, EditError> {
        if search.is_empty() {
            return Err(InputError::EmptySearch.into());
        }
        let resolved = self.scopes.resolve(ctx)?;
        Ok(OccurrenceFinder::new(&self.source, &self.scopes)
            .with_context_lines(self.config.context_lines)
            .find(search, resolved.as_deref())?)
    }

    /// Validation report without any blocking decision.
    #[instrument(level = "debug", skip_all)]
    pub fn validate(&self, old: &str, new: &str, ctx: &EditContext) -> Result<EditValidation, EditError> {
        self.transition(EditState::Validating);
        let result = self.validator().validate(old, new, ctx);
        self.transition(EditState::Idle);
        result
    }

    /// Full pipeline up to (not including) the write.
    fn plan(&self, old: &str, new: &str, ctx: &EditContext) -> Result<Plan, EditError> {
        let validation = self.validator().validate(old, new, ctx)?;

        if validation.ambiguous_context()
            && ctx.require_unique
            && let Some(&(kind, name)) = ctx.filters().first()
        {
            let ids = self.scopes.resolve(ctx)?.unwrap_or_default();
            return Err(EditError::AmbiguousContext {
                kind,
                name: name.to_string(),
                lines: ids
                    .iter()
                    .filter_map(|&id| self.scopes.get(id).map(|s| s.start_line))
                    .collect(),
                count: validation.occurrence_count(),
                suggestions: validation.suggestions().to_vec(),
            });
        }

        let Some(target) = validation.occurrences().first() else {
            return Err(EditError::TextNotFound {
                search: old.to_string(),
                scope: ctx.describe(),
            });
        };

        if !validation.is_unique() && ctx.require_unique {
            return Err(EditError::AmbiguousOccurrence {
                search: old.to_string(),
                count: validation.occurrence_count(),
                lines: validation.occurrences().iter().map(|o| o.line).collect(),
                suggestions: validation.suggestions().to_vec(),
            });
        }

        let blocked_by_indent = !validation.indentation_issues().is_empty() && !ctx.allow_indentation_changes;
        if !validation.syntax_valid() || blocked_by_indent {
            let mut reasons: Vec<String> = validation.syntax_warnings().to_vec();
            if blocked_by_indent {
                reasons.extend(validation.indentation_issues().iter().cloned());
            }
            return Err(EditError::Unsafe {
                reasons,
                validation: Box::new(validation),
            });
        }

        let mut warnings: Vec<String> = validation.syntax_warnings().to_vec();
        warnings.extend(validation.indentation_issues().iter().cloned());
        if validation.occurrence_count() > 1 {
            warnings.push(format!(
                "{} occurrences found; replaced the first at line {}",
                validation.occurrence_count(),
                target.line
            ));
        }

        Ok(Plan {
            range: target.byte_range.clone(),
            line: target.line,
            warnings,
            validation,
        })
    }

    fn splice(&self, range: &Range<usize>, new: &str) -> String {
        let text = self.source.as_str();
        let mut out = String::with_capacity(text.len() + new.len());
        out.push_str(&text[..range.start]);
        out.push_str(new);
        out.push_str(&text[range.end..]);
        out
    }

    /// Run the whole pipeline and return the diff it would produce.
    #[instrument(level = "debug", skip_all, fields(file = %self.label()))]
    pub fn preview(&self, old: &str, new: &str, ctx: &EditContext) -> Result<EditResult, EditError> {
        self.transition(EditState::Validating);
        let plan = self.plan(old, new, ctx);
        self.transition(EditState::Idle);
        let plan = plan?;

        let after = self.splice(&plan.range, new);
        let before = self.source.as_str();
        Ok(EditResult {
            success: true,
            message: Some(format!("Preview of change at line {}", plan.line)),
            warnings: plan.warnings,
            lines_changed: Some(count_changed_lines(before, &after)),
            preview: Some(render_unified(&self.label(), before, &after, self.preview_context)),
            validation: Some(plan.validation),
            ..EditResult::default()
        })
    }

    /// Validate and apply one edit, then persist it.
    #[instrument(level = "debug", skip_all, fields(file = %self.label()))]
    pub fn edit(&mut self, old: &str, new: &str, ctx: &EditContext) -> Result<EditResult, EditError> {
        self.transition(EditState::Validating);
        let plan = match self.plan(old, new, ctx) {
            Ok(plan) => plan,
            Err(e) => {
                self.transition(EditState::Rejected);
                return Err(e);
            }
        };

        self.transition(EditState::Applying);
        let before = self.source.snapshot();
        let after = self.splice(&plan.range, new);

        if let Err(e) = self.commit(after) {
            self.transition(EditState::Rejected);
            return Err(e);
        }
        self.transition(EditState::Applied);

        let lines_changed = count_changed_lines(&before, self.source.as_str());
        info!(line = plan.line, lines_changed, "applied edit");

        let scope_note = ctx
            .describe()
            .map(|d| format!(" in {d}"))
            .unwrap_or_default();
        Ok(EditResult {
            success: true,
            message: Some(format!("Replaced 1 occurrence at line {}{scope_note}", plan.line)),
            warnings: plan.warnings,
            lines_changed: Some(lines_changed),
            validation: Some(plan.validation),
            ..EditResult::default()
        })
    }

    /// Apply `ops` as one transaction: all land, or the content is left
    /// exactly as it was.
    #[instrument(level = "debug", skip_all, fields(file = %self.label(), ops = ops.len()))]
    pub fn multi_edit(&mut self, ops: &[EditOperation]) -> Result<MultiEditResult, EditError> {
        if ops.is_empty() {
            return Err(InputError::EmptyBatch.into());
        }

        // 1) Validate everything against the unmodified content.
        self.transition(EditState::Validating);
        let mut warnings = Vec::new();
        for (i, op) in ops.iter().enumerate() {
            match self.plan(&op.old_string, &op.new_string, &op.context) {
                Ok(plan) => warnings.extend(
                    plan.warnings
                        .into_iter()
                        .map(|w| format!("operation {}: {w}", i + 1)),
                ),
                Err(e) => {
                    self.transition(EditState::Rejected);
                    return Err(EditError::Batch {
                        index: i + 1,
                        source: Box::new(e),
                    });
                }
            }
        }

        // 2) Apply in order on a staged snapshot.
        self.transition(EditState::Applying);
        let mut tx = Transaction::begin(&self.source, &self.cid);

        for (i, op) in ops.iter().enumerate() {
            let step = match self.locate(op) {
                Ok(range) => {
                    let staged = self.splice(&range, &op.new_string);
                    self.restage(staged)
                }
                Err(e) => Err(e),
            };

            if let Err(e) = step {
                let index = i + 1;
                self.restore(tx, index)?;
                self.transition(EditState::Rejected);
                return Err(EditError::Transaction {
                    index,
                    reason: e.to_string(),
                });
            }
            tx.record();
        }

        // 3) Persist once; a failed write restores the staged state.
        let after = self.source.snapshot();
        if let Err(e) = self.persist(&after, tx.cid()) {
            self.restore(tx, ops.len())?;
            self.transition(EditState::Rejected);
            return Err(e);
        }

        let lines_changed = count_changed_lines(tx.snapshot(), &after);
        let edits_applied = tx.commit();
        self.transition(EditState::Applied);
        info!(edits_applied, lines_changed, "applied batch");

        Ok(MultiEditResult {
            success: true,
            edits_applied,
            lines_changed,
            warnings,
            ..MultiEditResult::default()
        })
    }

    /// Target of `op` in the current (possibly staged) content: the first
    /// match allowed by its scope filters.
    fn locate(&self, op: &EditOperation) -> Result<Range<usize>, EditError> {
        self.find_occurrences(&op.old_string, &op.context)?
            .into_iter()
            .next()
            .map(|o| o.byte_range)
            .ok_or_else(|| EditError::TextNotFound {
                search: op.old_string.clone(),
                scope: op.context.describe(),
            })
    }

    /// Replace the snapshot and rebuild everything derived from it.
    fn restage(&mut self, text: String) -> Result<(), EditError> {
        let text: Arc<str> = Arc::from(text);
        self.scopes = build_scopes(self.language, Arc::clone(&text))?;
        self.source = SourceText::new(text);
        Ok(())
    }

    fn restore(&mut self, tx: Transaction, index: usize) -> Result<(), EditError> {
        let snapshot = tx.rollback();
        self.restage(snapshot.to_string())
            .map_err(|e| EditError::RollbackFailed {
                index,
                reason: e.to_string(),
            })
    }

    /// Write `text` if backed by a file, guarding against external edits.
    fn persist(&mut self, text: &str, expected_cid: &str) -> Result<(), EditError> {
        if let Some(path) = self.path.clone() {
            if self.config.detect_external_changes {
                let on_disk = read_file_smart(&path).map_err(|e| EditError::io("re-read", &path, format!("{e:#}")))?;
                if generate_cid(&on_disk) != expected_cid {
                    return Err(EditError::FileChanged { path });
                }
            }
            write_atomic(&path, text.as_bytes()).map_err(|e| EditError::io("write", &path, format!("{e:#}")))?;
        }
        self.cid = generate_cid(text);
        Ok(())
    }

    /// Persist `after` and make it the current snapshot.
    fn commit(&mut self, after: String) -> Result<(), EditError> {
        let expected = self.cid.clone();
        self.persist(&after, &expected)?;
        self.restage(after)
    }
}
