//! Filepath: src/parsers/checker.rs
//! ------------------------------------------------------------------
//! Parser-backed snippet checker (feature `syntax-check`).
//! Parses a snippet on its own and reports the error and missing
//! nodes Tree-sitter had to recover from.
//!
//! Notes:
//!   - Snippets rarely parse as whole files, so the validator only
//!     consults this when the original text parses cleanly.
//!   - Diagnostics are capped; the first few carry the signal.
//! ------------------------------------------------------------------

use tree_sitter::{Node, Parser};

use crate::core::syntax::Language;
use crate::core::validate::{MAX_CHECKER_DIAGNOSTICS, SyntaxChecker};

pub struct TreeSitterChecker {
    language: Language,
}

impl TreeSitterChecker {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

fn diagnostic(node: Node<'_>, snippet: &str) -> Option<String> {
    let line = node.start_position().row + 1;
    if node.is_missing() {
        return Some(format!("line {line}: missing `{}`", node.kind()));
    }
    if node.is_error() {
        let text = snippet
            .get(node.byte_range())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .trim();
        return Some(format!("line {line}: unexpected `{text}`"));
    }
    None
}

/// Error and missing nodes in document order, descending only into
/// subtrees that contain an error.
fn collect(root: Node<'_>, snippet: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if out.len() >= MAX_CHECKER_DIAGNOSTICS {
            break;
        }
        if let Some(d) = diagnostic(node, snippet) {
            out.push(d);
            continue;
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    out
}

impl SyntaxChecker for TreeSitterChecker {
    fn diagnostics(&self, snippet: &str) -> Vec<String> {
        let mut parser = Parser::new();
        if parser.set_language(&self.language.grammar()).is_err() {
            return Vec::new();
        }
        let Some(tree) = parser.parse(snippet, None) else {
            return Vec::new();
        };

        collect(tree.root_node(), snippet)
    }
}
