//! Filepath: src/parsers/ecmascript_parser.rs
//! ------------------------------------------------------------------
//! JavaScript / TypeScript / TSX scope grammar (Tree-sitter 0.25.x).
//! The three grammars share node kinds for everything we classify,
//! so one grammar type serves all of them.
//!
//! Scopes:
//!   - function and generator declarations: Function.
//!   - `const f = () => {}` / `let f = function () {}`: Function.
//!   - class methods and arrow-valued class fields: Method.
//!   - classes (incl. abstract and named class expressions): Class.
//!   - TS interfaces: Interface.
//!   - TS `namespace` / `module` blocks: Namespace.
//! ------------------------------------------------------------------

use tree_sitter::Node;

use crate::core::scope::ScopeKind;
use crate::core::syntax::{Language, ScopeGrammar};
use crate::infra::utils::TsNodeUtils;

/// Value kinds that make a binding a callable scope.
const CALLABLE_VALUES: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

pub struct EcmaScriptGrammar {
    language: Language,
}

impl EcmaScriptGrammar {
    pub fn new(language: Language) -> Self {
        Self { language }
    }
}

fn callable_value(node: Node<'_>) -> bool {
    node.child_by_field_name("value")
        .is_some_and(|v| CALLABLE_VALUES.contains(&v.kind()))
}

impl ScopeGrammar for EcmaScriptGrammar {
    fn language(&self) -> Language {
        self.language
    }

    fn classify(&self, node: Node<'_>, bytes: &[u8]) -> Option<(ScopeKind, String)> {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Function, name))
            }
            "method_definition" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Method, name))
            }
            "class_declaration" | "abstract_class_declaration" | "class" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Class, name))
            }
            "interface_declaration" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                Some((ScopeKind::Interface, name))
            }
            "internal_module" | "module" => {
                let name = TsNodeUtils::field_text(node, "name", bytes)?;
                let name = name.trim_matches(|c| c == '"' || c == '\'').to_string();
                Some((ScopeKind::Namespace, name))
            }
            "variable_declarator" if callable_value(node) => {
                let name_node = node.child_by_field_name("name")?;
                if name_node.kind() != "identifier" {
                    return None;
                }
                let name = TsNodeUtils::node_text(name_node, bytes)?;
                Some((ScopeKind::Function, name))
            }
            "public_field_definition" | "field_definition" if callable_value(node) => {
                let name = TsNodeUtils::field_text(node, "name", bytes)
                    .or_else(|| TsNodeUtils::field_text(node, "property", bytes))?;
                Some((ScopeKind::Method, name))
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

    fn scopes(lang: Language, src: &str) -> Result<Vec<(ScopeKind, String)>, EditError> {
        let tree = SyntaxTree::parse(lang, Arc::from(src))?;
        Ok(tree
            .nodes()
            .iter()
            .filter_map(|n| Some((n.scope?, n.name.clone()?)))
            .collect())
    }

    #[test]
    fn javascript_functions_classes_and_bindings() -> Result<(), EditError> {
        let src = r#"
export function authenticate(user) { return user; }
const hash = (s) => s + "!";
let legacy = function () {};
const value = 42;
class Store {
  load() {}
}
"#;
        let got = scopes(Language::JavaScript, src)?;
        assert_eq!(
            got,
            vec![
                (ScopeKind::Function, "authenticate".to_string()),
                (ScopeKind::Function, "hash".to_string()),
                (ScopeKind::Function, "legacy".to_string()),
                (ScopeKind::Class, "Store".to_string()),
                (ScopeKind::Method, "load".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn typescript_interfaces_namespaces_and_field_arrows() -> Result<(), EditError> {
        let src = r#"
namespace Auth {
  export interface Session { id: string }
  export class Manager {
    private refresh = () => {};
    open(): void {}
  }
}
"#;
        let got = scopes(Language::TypeScript, src)?;
        assert!(got.contains(&(ScopeKind::Namespace, "Auth".to_string())));
        assert!(got.contains(&(ScopeKind::Interface, "Session".to_string())));
        assert!(got.contains(&(ScopeKind::Class, "Manager".to_string())));
        assert!(got.contains(&(ScopeKind::Method, "refresh".to_string())));
        assert!(got.contains(&(ScopeKind::Method, "open".to_string())));
        Ok(())
    }

    #[test]
    fn tsx_uses_the_same_classification() -> Result<(), EditError> {
        let got = scopes(Language::Tsx, "function App() { return <div />; }\n")?;
        assert_eq!(got, vec![(ScopeKind::Function, "App".to_string())]);
        Ok(())
    }
}
