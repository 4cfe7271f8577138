//! Filepath: src/parsers/go_parser.rs
//! ------------------------------------------------------------------
//! Go scope grammar built on Tree-sitter 0.25.x.
//! Scopes:
//!   - `func f()`: Function; `func (r T) m()`: Method.
//!   - `type T struct {}`: Class; `type I interface {}`: Interface.
//! ------------------------------------------------------------------

use tree_sitter::Node;

use crate::core::scope::ScopeKind;
use crate::core::syntax::{Language, ScopeGrammar};
use crate::infra::utils::TsNodeUtils;

pub struct GoGrammar;

impl ScopeGrammar for GoGrammar {
    fn language(&self) -> Language {
        Language::Go
    }

    fn classify(&self, node: Node<'_>, bytes: &[u8]) -> Option<(ScopeKind, String)> {
        match node.kind() {
            "function_declaration" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Function, name))
            }
            "method_declaration" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Method, name))
            }
            "type_spec" => {
                let kind = match node.child_by_field_name("type")?.kind() {
                    "struct_type" => ScopeKind::Class,
                    "interface_type" => ScopeKind::Interface,
                    _ => return None,
                };
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((kind, name))
            }
            _ => None,
        }
    }
}
