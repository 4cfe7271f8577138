//! Filepath: src/parsers/python_parser.rs
//! ------------------------------------------------------------------
//! Python scope grammar built on Tree-sitter 0.25.x.
//! Scopes:
//!   - `def`: Method when the nearest enclosing definition is a
//!     class, Function otherwise (module level or nested in a def).
//!   - `class`: Class.
//!
//! Notes:
//!   - Decorators sit outside the `function_definition` node, so a
//!     scope's span starts at `def`, not at the first decorator.
//! ------------------------------------------------------------------

use tree_sitter::Node;

use crate::core::scope::ScopeKind;
use crate::core::syntax::{Language, ScopeGrammar};
use crate::infra::utils::TsNodeUtils;

pub struct PythonGrammar;

impl ScopeGrammar for PythonGrammar {
    fn language(&self) -> Language {
        Language::Python
    }

    fn classify(&self, node: Node<'_>, bytes: &[u8]) -> Option<(ScopeKind, String)> {
        match node.kind() {
            "function_definition" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                let owner = TsNodeUtils::nearest_ancestor(
                    node,
                    &["function_definition", "class_definition"],
                );
                let kind = match owner.map(|n| n.kind()) {
                    Some("class_definition") => ScopeKind::Method,
                    _ => ScopeKind::Function,
                };
                Some((kind, name))
            }
            "class_definition" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Class, name))
            }
            _ => None,
        }
    }
}
