//! Filepath: src/infra/utils.rs
//! Tree-sitter node helpers shared by the scope grammars.
//! All functions are associated fns to keep call sites
//! ergonomic and discoverable.

use tree_sitter::Node;

/// Tree-sitter node helpers
pub struct TsNodeUtils;

impl TsNodeUtils
{
    /// Nearest ancestor whose kind is one of `kinds`
    pub fn nearest_ancestor<'a>(
        node: Node<'a>,
        kinds: &[&str],
    ) -> Option<Node<'a>>
    {
        let mut cur = node.parent();

        while let Some(n) = cur
        {
            if kinds.contains(&n.kind())
            {
                return Some(n);
            }

            cur = n.parent();
        }

        None
    }

    /// UTF-8 text of a field child, trimmed; None when absent or empty
    pub fn field_text(
        node: Node<'_>,
        field: &str,
        bytes: &[u8],
    ) -> Option<String>
    {
        let child = node.child_by_field_name(field)?;

        Self::node_text(child, bytes)
    }

    /// UTF-8 text of a node, trimmed; None when empty or not UTF-8
    pub fn node_text(
        node: Node<'_>,
        bytes: &[u8],
    ) -> Option<String>
    {
        let text = node
            .utf8_text(bytes)
            .ok()?
            .trim();

        (!text.is_empty()).then(|| text.to_string())
    }

    /// Last `::`/`.` separated segment with any generic arguments removed
    pub fn simple_name(text: &str) -> &str
    {
        // Drop generic arguments first, `Foo<a::B>` must yield `Foo`
        let head = text
            .split('<')
            .next()
            .unwrap_or(text);

        head.rsplit("::")
            .next()
            .unwrap_or(head)
            .rsplit('.')
            .next()
            .unwrap_or(head)
            .trim()
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn simple_name_strips_paths_and_generics()
    {
        assert_eq!(TsNodeUtils::simple_name("Foo<T>"), "Foo");
        assert_eq!(TsNodeUtils::simple_name("crate::a::Foo<a::B>"), "Foo");
        assert_eq!(TsNodeUtils::simple_name("ns::Widget::draw"), "draw");
        assert_eq!(TsNodeUtils::simple_name("plain"), "plain");
    }

    #[test]
    fn field_text_reads_named_children()
    {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_python::LANGUAGE.into())
            .unwrap();
        let src = "class A:\n    def m(self):\n        pass\n";
        let tree = parser
            .parse(src, None)
            .unwrap();
        let class = tree
            .root_node()
            .named_child(0)
            .unwrap();
        assert_eq!(
            TsNodeUtils::field_text(class, "name", src.as_bytes()).as_deref(),
            Some("A")
        );

        let body = class
            .child_by_field_name("body")
            .unwrap();
        let method = body
            .named_child(0)
            .unwrap();
        let owner = TsNodeUtils::nearest_ancestor(method, &["class_definition"]).unwrap();
        assert_eq!(owner.id(), class.id());
    }
}
