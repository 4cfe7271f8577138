//! Filepath: src/core/scope.rs
//! Flat table of named scopes built from one syntax tree.
//! Built once per snapshot with a single pre-order walk;
//! read-only afterwards. Parents are indices into the
//! table, never pointers.
use std::{fmt, ops::Range};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{
    errors::EditError,
    syntax::{SyntaxNode, SyntaxTree},
    validate::EditContext,
};

/// Kinds of named regions a caller can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind
{
    Function,
    Method,
    Class,
    Interface,
    Namespace,
}

impl ScopeKind
{
    /// Lower value = narrower region; drives combined filters
    pub fn specificity(self) -> u8
    {
        match self
        {
            ScopeKind::Method => 0,
            ScopeKind::Function => 1,
            ScopeKind::Interface => 2,
            ScopeKind::Class => 3,
            ScopeKind::Namespace => 4,
        }
    }

    /// Lowercase label used in messages
    pub fn label(self) -> &'static str
    {
        match self
        {
            ScopeKind::Function => "function",
            ScopeKind::Method => "method",
            ScopeKind::Class => "class",
            ScopeKind::Interface => "interface",
            ScopeKind::Namespace => "namespace",
        }
    }
}

impl fmt::Display for ScopeKind
{
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    {
        f.write_str(self.label())
    }
}

/// Index into a `ScopeTable`
pub type ScopeId = usize;

/// One named scope; lines and columns are 1-based, columns in bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeNode
{
    pub kind: ScopeKind,
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_col: usize,
    pub end_col: usize,
    #[serde(skip)]
    pub byte_range: Range<usize>,
    /// Enclosing named scope, if any
    pub parent: Option<ScopeId>,
}

impl ScopeNode
{
    /// True when the inclusive line span covers `start..=end`
    pub fn contains_lines(
        &self,
        start: usize,
        end: usize,
    ) -> bool
    {
        self.start_line <= start && end <= self.end_line
    }

    /// True when the byte span covers `range`
    pub fn contains_bytes(
        &self,
        range: &Range<usize>,
    ) -> bool
    {
        self.byte_range
            .start
            <= range.start
            && range.end
                <= self
                    .byte_range
                    .end
    }

    /// Human label such as "method `login`"
    pub fn describe(&self) -> String
    {
        format!("{} `{}`", self.kind, self.name)
    }
}

/// Flat, pre-ordered scope table
#[derive(Debug, Clone, Default)]
pub struct ScopeTable
{
    scopes: Vec<ScopeNode>,
}

impl ScopeTable
{
    /// Walk the tree once and record every classified node
    pub fn build(tree: &SyntaxTree) -> Self
    {
        let source = tree.source();
        let mut scopes: Vec<ScopeNode> = Vec::new();

        // Arena is pre-ordered, so a node's parent is always resolved first
        let mut owner: Vec<Option<ScopeId>> = Vec::with_capacity(tree.nodes().len());

        for node in tree.nodes()
        {
            let parent = node
                .parent
                .and_then(|p| owner.get(p).copied().flatten());

            // A classified node becomes the parent of its subtree
            let mut here = parent;

            if let (Some(kind), Some(name)) = (node.scope, node.name.as_ref())
            {
                let id = scopes.len();
                scopes.push(Self::to_scope(node, kind, name, parent, source));
                here = Some(id);
            }

            owner.push(here);
        }

        debug!(count = scopes.len(), "built scope table");
        Self { scopes }
    }

    /// Convert node positions into 1-based inclusive spans
    fn to_scope(
        node: &SyntaxNode,
        kind: ScopeKind,
        name: &str,
        parent: Option<ScopeId>,
        source: &str,
    ) -> ScopeNode
    {
        let start_line = node.start.row + 1;

        // A node ending at column 0 stops at the previous line's terminator
        let (end_line, end_col) = if node.end.column == 0 && node.end.row > node.start.row
        {
            let before = &source[..node
                .byte_range
                .end
                .min(source.len())];
            let trimmed = before
                .strip_suffix('\n')
                .unwrap_or(before);
            let trimmed = trimmed
                .strip_suffix('\r')
                .unwrap_or(trimmed);
            let width = trimmed.len() - trimmed.rfind('\n').map_or(0, |i| i + 1);
            (node.end.row, width + 1)
        }
        else
        {
            (node.end.row + 1, node.end.column + 1)
        };

        ScopeNode {
            kind,
            name: name.to_string(),
            start_line,
            end_line: end_line.max(start_line),
            start_col: node.start.column + 1,
            end_col,
            byte_range: node
                .byte_range
                .clone(),
            parent,
        }
    }

    pub fn len(&self) -> usize
    {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool
    {
        self.scopes.is_empty()
    }

    pub fn get(
        &self,
        id: ScopeId,
    ) -> Option<&ScopeNode>
    {
        self.scopes.get(id)
    }

    /// Iterate (id, scope) in pre-order
    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &ScopeNode)>
    {
        self.scopes
            .iter()
            .enumerate()
    }

    /// Exact (kind, name) lookup; duplicates are all returned
    pub fn find(
        &self,
        kind: ScopeKind,
        name: &str,
    ) -> Vec<ScopeId>
    {
        self.iter()
            .filter(|(_, s)| s.kind == kind && s.name == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// True when `outer` strictly encloses `inner`
    pub fn encloses(
        &self,
        outer: ScopeId,
        inner: ScopeId,
    ) -> bool
    {
        match (self.get(outer), self.get(inner))
        {
            (Some(o), Some(i)) => outer != inner && o.contains_bytes(&i.byte_range),
            _ => false,
        }
    }

    /// Resolve the scope filters of `ctx`.
    ///
    /// Returns `Ok(None)` for an unfiltered (global) request. With several
    /// filters, the most specific one selects the candidates and every other
    /// filter must enclose them. A filter that matches nothing is NotFound.
    pub fn resolve(
        &self,
        ctx: &EditContext,
    ) -> Result<Option<Vec<ScopeId>>, EditError>
    {
        let filters = ctx.filters();
        let Some(&(primary_kind, primary_name)) = filters.first()
        else
        {
            return Ok(None);
        };

        // Every filter must name at least one existing scope
        let mut matched: Vec<Vec<ScopeId>> = Vec::with_capacity(filters.len());
        for &(kind, name) in &filters
        {
            let ids = self.find(kind, name);
            if ids.is_empty()
            {
                return Err(EditError::ScopeNotFound {
                    kind,
                    name: name.to_string(),
                });
            }
            matched.push(ids);
        }

        // Narrow the primary candidates by the outer filters
        let mut candidates = matched[0].clone();
        for (i, &(kind, name)) in filters
            .iter()
            .enumerate()
            .skip(1)
        {
            candidates.retain(|&c| {
                matched[i]
                    .iter()
                    .any(|&o| self.encloses(o, c))
            });

            if candidates.is_empty()
            {
                return Err(EditError::ScopeMismatch {
                    inner_kind: primary_kind,
                    inner: primary_name.to_string(),
                    outer_kind: kind,
                    outer: name.to_string(),
                });
            }
        }

        debug!(filters = filters.len(), candidates = candidates.len(), "resolved scope filters");
        Ok(Some(candidates))
    }

    /// Innermost scope whose line span covers `start..=end`.
    /// Among equal line spans, a byte-containing scope wins.
    pub fn innermost_containing(
        &self,
        start: usize,
        end: usize,
        bytes: &Range<usize>,
    ) -> Option<ScopeId>
    {
        let by_lines: Vec<ScopeId> = self
            .iter()
            .filter(|(_, s)| s.contains_lines(start, end))
            .map(|(id, _)| id)
            .collect();

        // Prefer the deepest scope that truly holds the bytes
        by_lines
            .iter()
            .rev()
            .copied()
            .find(|&id| self.scopes[id].contains_bytes(bytes))
            .or_else(|| {
                by_lines
                    .last()
                    .copied()
            })
    }

    /// `Outer::Inner::name` following parent links
    pub fn qualified_name(
        &self,
        id: ScopeId,
    ) -> String
    {
        let mut parts: Vec<&str> = Vec::new();
        let mut cur = Some(id);

        while let Some(i) = cur
        {
            let Some(scope) = self.get(i)
            else
            {
                break;
            };
            parts.push(&scope.name);
            cur = scope.parent;
        }

        parts.reverse();
        parts.join("::")
    }
}

#[cfg(test)]
mod tests
{
    use std::sync::Arc;

    use super::*;
    use crate::core::syntax::Language;

    const SERVICE: &str = "\
class UserService:
    def login(self):
        return None

    def logout(self):
        return None

def login():
    return None
";

    fn table(src: &str) -> ScopeTable
    {
        let tree = SyntaxTree::parse(Language::Python, Arc::from(src)).unwrap();
        ScopeTable::build(&tree)
    }

    #[test]
    fn builds_preorder_table_with_parent_links()
    {
        let t = table(SERVICE);
        let names: Vec<_> = t
            .iter()
            .map(|(_, s)| (s.kind, s.name.as_str(), s.start_line, s.end_line, s.parent))
            .collect();
        assert_eq!(
            names,
            vec![
                (ScopeKind::Class, "UserService", 1, 6, None),
                (ScopeKind::Method, "login", 2, 3, Some(0)),
                (ScopeKind::Method, "logout", 5, 6, Some(0)),
                (ScopeKind::Function, "login", 8, 9, None),
            ]
        );
        assert_eq!(t.qualified_name(2), "UserService::logout");
        assert_eq!(
            t.get(1)
                .unwrap()
                .start_col,
            5
        );
    }

    #[test]
    fn find_is_exact_on_kind_and_name()
    {
        let t = table(SERVICE);
        assert_eq!(t.find(ScopeKind::Method, "login"), vec![1]);
        assert_eq!(t.find(ScopeKind::Function, "login"), vec![3]);
        assert!(
            t.find(ScopeKind::Function, "logout")
                .is_empty()
        );
    }

    #[test]
    fn resolve_combines_filters_by_containment()
    {
        let t = table(SERVICE);

        let ctx = EditContext::default();
        assert_eq!(t.resolve(&ctx).unwrap(), None);

        let ctx = EditContext {
            within_class: Some("UserService".into()),
            within_method: Some("logout".into()),
            ..EditContext::default()
        };
        assert_eq!(t.resolve(&ctx).unwrap(), Some(vec![2]));

        let ctx = EditContext {
            within_function: Some("logout".into()),
            ..EditContext::default()
        };
        assert!(matches!(
            t.resolve(&ctx),
            Err(EditError::ScopeNotFound {
                kind: ScopeKind::Function,
                ..
            })
        ));
    }

    #[test]
    fn resolve_reports_filters_that_do_not_nest()
    {
        let src = "class A:\n    def m(self):\n        pass\n\nclass B:\n    pass\n";
        let t = table(src);
        let ctx = EditContext {
            within_class: Some("B".into()),
            within_method: Some("m".into()),
            ..EditContext::default()
        };
        assert!(matches!(
            t.resolve(&ctx),
            Err(EditError::ScopeMismatch {
                inner_kind: ScopeKind::Method,
                outer_kind: ScopeKind::Class,
                ..
            })
        ));
    }

    #[test]
    fn innermost_prefers_deepest_scope()
    {
        let t = table(SERVICE);
        assert_eq!(t.innermost_containing(3, 3, &(40..51)), Some(1));
        assert_eq!(t.innermost_containing(9, 9, &(0..0)), Some(3));
        assert_eq!(t.innermost_containing(7, 7, &(0..0)), None);
    }
}
