//! Filepath: src/parsers/rust_parser.rs
//! ------------------------------------------------------------------
//! Rust scope grammar built on Tree-sitter 0.25.x.
//! Scopes:
//!   - `fn` items: Method inside `impl`/`trait`, Function otherwise.
//!   - `impl` blocks: Class, named by the self type (no generics).
//!   - `trait` items: Interface.
//!   - inline `mod` items: Namespace (`mod foo;` has no span to edit).
//!
//! Notes:
//!   - Structs and enums are not scopes: they hold no statements.
//!   - A function nested in a function stays a Function.
//! ------------------------------------------------------------------

use tree_sitter::Node;

use crate::core::scope::ScopeKind;
use crate::core::syntax::{Language, ScopeGrammar};
use crate::infra::utils::TsNodeUtils;

pub struct RustGrammar;

impl ScopeGrammar for RustGrammar {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn classify(&self, node: Node<'_>, bytes: &[u8]) -> Option<(ScopeKind, String)> {
        match node.kind() {
            "function_item" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                // The nearest item decides: impl/trait → method.
                let owner = TsNodeUtils::nearest_ancestor(
                    node,
                    &["impl_item", "trait_item", "function_item"],
                );
                let kind = match owner.map(|n| n.kind()) {
                    Some("impl_item" | "trait_item") => ScopeKind::Method,
                    _ => ScopeKind::Function,
                };
                Some((kind, name))
            }
            "impl_item" => {
                let ty = TsNodeUtils::field_text(node, "type", bytes)?;
                Some((ScopeKind::Class, TsNodeUtils::simple_name(&ty).to_string()))
            }
            "trait_item" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Interface, name))
            }
            "mod_item" => {
                node.child_by_field_name("body")?;
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Namespace, name))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::errors::EditError;
    use crate::core::syntax::SyntaxTree;

    fn scopes(src: &str) -> Result<Vec<(ScopeKind, String)>, EditError> {
        let tree = SyntaxTree::parse(Language::Rust, Arc::from(src))?;
        Ok(tree
            .nodes()
            .iter()
            .filter_map(|n| Some((n.scope?, n.name.clone()?)))
            .collect())
    }

    #[test]
    fn rust_functions_methods_and_impls() -> Result<(), EditError> {
        let src = r#"
fn free() {
    fn inner() {}
}

struct Counter<T> { n: T }

impl<T> Counter<T> {
    fn bump(&mut self) {}
}

trait Reset {
    fn reset(&mut self) {}
}

mod util {
    pub fn help() {}
}

mod external;
"#;
        let got = scopes(src)?;
        assert_eq!(
            got,
            vec![
                (ScopeKind::Function, "free".to_string()),
                (ScopeKind::Function, "inner".to_string()),
                (ScopeKind::Class, "Counter".to_string()),
                (ScopeKind::Method, "bump".to_string()),
                (ScopeKind::Interface, "Reset".to_string()),
                (ScopeKind::Method, "reset".to_string()),
                (ScopeKind::Namespace, "util".to_string()),
                (ScopeKind::Function, "help".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn trait_impl_is_named_by_self_type() -> Result<(), EditError> {
        let got = scopes("impl std::fmt::Display for Point { fn fmt(&self) {} }")?;
        assert_eq!(got[0], (ScopeKind::Class, "Point".to_string()));
        assert_eq!(got[1], (ScopeKind::Method, "fmt".to_string()));
        Ok(())
    }
}
