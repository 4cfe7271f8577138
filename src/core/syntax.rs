//! Owned syntax tree built from a Tree-sitter parse.
//!
//! The engine never touches Tree-sitter types directly; it sees a small,
//! immutable node tree (kind, optional scope classification, positions,
//! byte span, children) tied to one text snapshot. A new snapshot means a
//! new tree.
//!
//! Notes:
//!   - Only named nodes are kept; anonymous tokens carry no structure the
//!     scope resolver needs.
//!   - Scope classification is delegated to a per-language `ScopeGrammar`
//!     while the Tree-sitter node is still available.

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::core::errors::EditError;
use crate::core::scope::ScopeKind;
use crate::parsers::{CppGrammar, EcmaScriptGrammar, GoGrammar, PythonGrammar, RustGrammar};

/// Languages with a scope grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Cpp,
}

impl Language {
    /// Map file extensions to languages.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        let lang = match ext.as_str() {
            "rs" => Language::Rust,
            "py" | "pyi" => Language::Python,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "go" => Language::Go,
            "cpp" | "cxx" | "cc" | "hpp" | "hh" | "hxx" | "h" => Language::Cpp,
            _ => return None,
        };
        Some(lang)
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Go => "go",
            Language::Cpp => "cpp",
        }
    }

    pub(crate) fn grammar(self) -> tree_sitter::Language {
        match self {
            Language::Rust => tree_sitter_rust::LANGUAGE.into(),
            Language::Python => tree_sitter_python::LANGUAGE.into(),
            Language::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Language::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Language::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Language::Go => tree_sitter_go::LANGUAGE.into(),
            Language::Cpp => tree_sitter_cpp::LANGUAGE.into(),
        }
    }

    /// True when `line` contains a comment marker of this language.
    pub fn is_comment_line(self, line: &str) -> bool {
        match self {
            Language::Python => line.contains('#'),
            _ => {
                line.contains("//")
                    || line.contains("/*")
                    || line.contains("*/")
                    || line.trim_start().starts_with('*')
            }
        }
    }
}

/// Comment detection when the language is unknown.
pub fn is_generic_comment_line(line: &str) -> bool {
    line.contains("//") || line.contains('#') || line.contains("/*")
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rust" | "rs" => Ok(Language::Rust),
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" | "jsx" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "tsx" => Ok(Language::Tsx),
            "go" | "golang" => Ok(Language::Go),
            "cpp" | "c++" | "cxx" => Ok(Language::Cpp),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// 0-based row/column (column in bytes), as reported by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl From<tree_sitter::Point> for Point {
    fn from(p: tree_sitter::Point) -> Self {
        Self {
            row: p.row,
            column: p.column,
        }
    }
}

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: &'static str,
    /// Present when the grammar recognises this node as a named scope.
    pub scope: Option<ScopeKind>,
    pub name: Option<String>,
    pub start: Point,
    pub end: Point,
    pub byte_range: Range<usize>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl SyntaxNode {
    fn leaf(kind: &'static str, len: usize, end: Point) -> Self {
        Self {
            kind,
            scope: None,
            name: None,
            start: Point { row: 0, column: 0 },
            end,
            byte_range: 0..len,
            parent: None,
            children: Vec::new(),
        }
    }

    fn from_ts(node: tree_sitter::Node<'_>, bytes: &[u8], grammar: &dyn ScopeGrammar, parent: Option<NodeId>) -> Self {
        let (scope, name) = match grammar.classify(node, bytes) {
            Some((kind, name)) => (Some(kind), Some(name)),
            None => (None, None),
        };
        Self {
            kind: node.kind(),
            scope,
            name,
            start: node.start_position().into(),
            end: node.end_position().into(),
            byte_range: node.byte_range(),
            parent,
            children: Vec::new(),
        }
    }
}

/// A parsed snapshot. Read-only; rebuilt after every text change.
///
/// Nodes live in one pre-ordered arena, so depth never costs stack.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    language: Option<Language>,
    source: Arc<str>,
    nodes: Vec<SyntaxNode>,
    has_errors: bool,
}

impl SyntaxTree {
    /// Parse `source` with the grammar for `language`.
    #[instrument(level = "debug", skip(source), fields(len = source.len()))]
    pub fn parse(language: Language, source: Arc<str>) -> Result<Self, EditError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&language.grammar())
            .map_err(|e| EditError::Parse(format!("set {language} grammar: {e}")))?;

        let tree = parser
            .parse(source.as_bytes(), None)
            .ok_or_else(|| EditError::Parse(format!("{language} parser produced no tree")))?;

        let grammar = get_grammar(language);
        let root_ts = tree.root_node();
        let nodes = flatten(root_ts, source.as_bytes(), grammar.as_ref());
        if nodes.is_empty() {
            return Err(EditError::Parse(format!("{language} parser produced an unnamed root")));
        }
        let has_errors = root_ts.has_error();

        debug!(grammar = %grammar.language(), nodes = nodes.len(), has_errors, "parsed syntax tree");
        Ok(Self {
            language: Some(language),
            source,
            nodes,
            has_errors,
        })
    }

    /// A structure-less tree for text whose language is unknown.
    pub fn plain(source: Arc<str>) -> Self {
        let rows = source.matches('\n').count();
        let last_col = source.rsplit('\n').next().map_or(0, str::len);
        let root = SyntaxNode::leaf(
            "text",
            source.len(),
            Point {
                row: rows,
                column: last_col,
            },
        );
        Self {
            language: None,
            source,
            nodes: vec![root],
            has_errors: false,
        }
    }

    pub fn language(&self) -> Option<Language> {
        self.language
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &SyntaxNode {
        &self.nodes[0]
    }

    /// Every node in pre-order; the root is first.
    pub fn nodes(&self) -> &[SyntaxNode] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id)
    }

    /// True when the parser had to recover from syntax errors.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Verbatim source spanned by `node`.
    pub fn text(&self, node: &SyntaxNode) -> &str {
        self.source
            .get(node.byte_range.clone())
            .unwrap_or_default()
    }
}

/// Pre-order copy of the named nodes, driven by a `TreeCursor`.
fn flatten(root: tree_sitter::Node<'_>, bytes: &[u8], grammar: &dyn ScopeGrammar) -> Vec<SyntaxNode> {
    let mut nodes: Vec<SyntaxNode> = Vec::new();
    // Nearest recorded ancestor for each level of the cursor
    let mut path: Vec<Option<NodeId>> = Vec::new();
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        let parent = path.last().copied().flatten();
        let mut here = parent;

        if node.is_named() {
            let id = nodes.len();
            nodes.push(SyntaxNode::from_ts(node, bytes, grammar, parent));
            if let Some(p) = parent {
                nodes[p].children.push(id);
            }
            here = Some(id);
        }

        if cursor.goto_first_child() {
            path.push(here);
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return nodes;
            }
            path.pop();
        }
    }
}

/// Per-language recognition of named scopes.
pub trait ScopeGrammar: Send + Sync {
    fn language(&self) -> Language;

    /// Return the scope kind and name when `node` declares a named scope.
    fn classify(&self, node: tree_sitter::Node<'_>, bytes: &[u8]) -> Option<(ScopeKind, String)>;
}

// Simple grammar registry
pub fn get_grammar(language: Language) -> Box<dyn ScopeGrammar> {
    match language {
        Language::Rust => Box::new(RustGrammar),
        Language::Python => Box::new(PythonGrammar),
        Language::JavaScript | Language::TypeScript | Language::Tsx => {
            Box::new(EcmaScriptGrammar::new(language))
        }
        Language::Go => Box::new(GoGrammar),
        Language::Cpp => Box::new(CppGrammar),
    }
}
