//! Filepath: src/parsers/cpp_parser.rs
//! ------------------------------------------------------------------
//! C++ scope grammar built on Tree-sitter 0.25.x.
//! Scopes:
//!   - function definitions: Method when defined in a class body or
//!     with a qualified name (`Widget::draw`), Function otherwise.
//!   - class/struct specifiers with a body: Class.
//!   - named namespace definitions: Namespace.
//!
//! Notes:
//!   - The function name sits at the bottom of a declarator chain
//!     (pointer/reference/function declarators); we descend it.
//! ------------------------------------------------------------------

use tree_sitter::Node;

use crate::core::scope::ScopeKind;
use crate::core::syntax::{Language, ScopeGrammar};
use crate::infra::utils::TsNodeUtils;

pub struct CppGrammar;

/// Walk `declarator` fields down to the name-bearing node.
fn declarator_name(node: Node<'_>) -> Option<Node<'_>> {
    let mut cur = node.child_by_field_name("declarator")?;
    loop {
        match cur.kind() {
            "function_declarator"
            | "pointer_declarator"
            | "reference_declarator"
            | "parenthesized_declarator" => {
                cur = match cur.child_by_field_name("declarator") {
                    Some(next) => next,
                    // reference_declarator has no field; take its last named child
                    None => cur.named_child(cur.named_child_count().checked_sub(1)?)?,
                };
            }
            _ => return Some(cur),
        }
    }
}

impl ScopeGrammar for CppGrammar {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn classify(&self, node: Node<'_>, bytes: &[u8]) -> Option<(ScopeKind, String)> {
        match node.kind() {
            "function_definition" => {
                let name_node = declarator_name(node)?;
                let full = TsNodeUtils::node_text(name_node, bytes)?;
                let qualified = name_node.kind() == "qualified_identifier";
                let in_class = TsNodeUtils::nearest_ancestor(
                    node,
                    &["field_declaration_list", "function_definition"],
                )
                .is_some_and(|n| n.kind() == "field_declaration_list");

                let kind = if qualified || in_class {
                    ScopeKind::Method
                } else {
                    ScopeKind::Function
                };
                Some((kind, TsNodeUtils::simple_name(&full).to_string()))
            }
            "class_specifier" | "struct_specifier" => {
                node.child_by_field_name("body")?;
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Class, TsNodeUtils::simple_name(&name).to_string()))
            }
            "namespace_definition" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Namespace, name))
            }
            _ => None,
        }
    }
}
