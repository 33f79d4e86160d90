//! Arena representation of a parsed syntax tree
//!
//! Every node gets a dense `NodeId` at conversion time, so per-node data
//! (canonical strings, frequency maps) lives in plain vectors indexed by id
//! and is dropped together with the tree. The arena owns the source text,
//! which keeps raw-text extraction valid for as long as the tree exists.

use std::borrow::Cow;
use std::ops::Range;

/// Stable index of a node within one `SyntaxTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Position of the node in the arena
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// Byte range plus 0-based rows of a node, as tree-sitter reports them.
///
/// Rows are what gets persisted; `start_line`/`end_line` are for people.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start_byte: usize,
    pub end_byte: usize,
    pub start_row: u32,
    pub end_row: u32,
}

impl Span {
    pub fn byte_range(&self) -> Range<usize> {
        self.start_byte..self.end_byte
    }

    /// 1-based first line
    pub fn start_line(&self) -> u32 {
        self.start_row + 1
    }

    /// 1-based last line, inclusive
    pub fn end_line(&self) -> u32 {
        self.end_row + 1
    }
}

#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: Cow<'static, str>,
    named: bool,
    span: Span,
    children: Vec<NodeId>,
}

impl SyntaxNode {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn is_named(&self) -> bool {
        self.named
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// All children, named and unnamed, in source order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A parsed file: node arena plus the source it was parsed from.
///
/// The root is always `NodeId(0)`.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<SyntaxNode>,
    first_error: Option<(u32, u32)>,
}

impl SyntaxTree {
    /// Convert a tree-sitter tree into the arena form.
    ///
    /// Nodes are numbered in pre-order. The traversal is iterative so deeply
    /// nested sources cannot overflow the stack.
    pub fn from_tree_sitter(tree: &tree_sitter::Tree, source: String) -> Self {
        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut first_error = None;
        let mut stack: Vec<(tree_sitter::Node, Option<NodeId>)> = vec![(tree.root_node(), None)];

        while let Some((node, parent)) = stack.pop() {
            let id = NodeId::from_index(nodes.len());
            if first_error.is_none() && (node.is_error() || node.is_missing()) {
                let pos = node.start_position();
                first_error = Some((pos.row as u32 + 1, pos.column as u32 + 1));
            }
            nodes.push(SyntaxNode {
                kind: Cow::Borrowed(node.kind()),
                named: node.is_named(),
                span: Span {
                    start_byte: node.start_byte(),
                    end_byte: node.end_byte(),
                    start_row: node.start_position().row as u32,
                    end_row: node.end_position().row as u32,
                },
                children: Vec::with_capacity(node.child_count()),
            });
            if let Some(parent) = parent {
                nodes[parent.index()].children.push(id);
            }

            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            // Reversed so the first child is popped, and numbered, next
            for child in children.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        Self {
            source,
            nodes,
            first_error,
        }
    }

    /// Start building a tree by hand over `source`
    pub fn builder(source: impl Into<String>) -> SyntaxTreeBuilder {
        SyntaxTreeBuilder {
            source: source.into(),
            nodes: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &SyntaxNode {
        &self.nodes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Raw source text covered by a node
    pub fn text(&self, id: NodeId) -> &str {
        self.source
            .get(self.node(id).span.byte_range())
            .unwrap_or_default()
    }

    /// Line/column (1-based) of the first error or missing node, if any
    pub fn first_error(&self) -> Option<(u32, u32)> {
        self.first_error
    }

    pub fn has_errors(&self) -> bool {
        self.first_error.is_some()
    }

    /// Children before parents, siblings in source order
    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder {
            tree: self,
            stack: if self.nodes.is_empty() {
                Vec::new()
            } else {
                vec![(self.root(), false)]
            },
        }
    }
}

/// Iterative post-order walk over a `SyntaxTree`
pub struct PostOrder<'a> {
    tree: &'a SyntaxTree,
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for PostOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((id, expanded)) = self.stack.pop() {
            if expanded {
                return Some(id);
            }
            self.stack.push((id, true));
            for &child in self.tree.node(id).children.iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}

/// Hand-assembled trees, used for grammars without a tree-sitter binding
/// and for tests. Children must be added in source order.
pub struct SyntaxTreeBuilder {
    source: String,
    nodes: Vec<SyntaxNode>,
}

impl SyntaxTreeBuilder {
    /// Add the root node. Must be called exactly once, before any child.
    pub fn root(&mut self, kind: impl Into<String>, bytes: Range<usize>) -> NodeId {
        assert!(self.nodes.is_empty(), "root must be the first node");
        self.push(kind.into(), true, bytes)
    }

    pub fn child(
        &mut self,
        parent: NodeId,
        kind: impl Into<String>,
        named: bool,
        bytes: Range<usize>,
    ) -> NodeId {
        let id = self.push(kind.into(), named, bytes);
        self.nodes[parent.index()].children.push(id);
        id
    }

    pub fn build(self) -> SyntaxTree {
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
            first_error: None,
        }
    }

    fn push(&mut self, kind: String, named: bool, bytes: Range<usize>) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        let span = Span {
            start_row: self.row_of(bytes.start),
            end_row: self.row_of(bytes.end),
            start_byte: bytes.start,
            end_byte: bytes.end,
        };
        self.nodes.push(SyntaxNode {
            kind: Cow::Owned(kind),
            named,
            span,
            children: Vec::new(),
        });
        id
    }

    fn row_of(&self, byte: usize) -> u32 {
        let end = byte.min(self.source.len());
        self.source.as_bytes()[..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxTree {
        let src = "type A struct{}\nfunc f() {}";
        let mut b = SyntaxTree::builder(src);
        let root = b.root("source_file", 0..src.len());
        let ty = b.child(root, "type_declaration", true, 0..15);
        b.child(ty, "type", false, 0..4);
        b.child(ty, "type_identifier", true, 5..6);
        b.child(root, "function_declaration", true, 16..src.len());
        b.build()
    }

    #[test]
    fn test_builder_assigns_spans_and_text() {
        let tree = sample();
        assert_eq!(tree.len(), 5);
        let func = tree.node(tree.root()).children()[1];
        assert_eq!(tree.node(func).kind(), "function_declaration");
        assert_eq!(tree.node(func).span().start_row, 1);
        assert_eq!(tree.node(func).span().start_line(), 2);
        assert_eq!(tree.text(func), "func f() {}");
        assert_eq!(tree.text(NodeId(3)), "A");
    }

    #[test]
    fn test_post_order_visits_children_first() {
        let tree = sample();
        let kinds: Vec<&str> = tree.post_order().map(|id| tree.node(id).kind()).collect();
        assert_eq!(
            kinds,
            vec![
                "type",
                "type_identifier",
                "type_declaration",
                "function_declaration",
                "source_file"
            ]
        );
    }

    #[test]
    fn test_from_tree_sitter_numbers_in_pre_order() {
        let code = "package main\n\nfunc add(a int, b int) int { return a + b }\n";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .unwrap();
        let ts_tree = parser.parse(code, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts_tree, code.to_string());

        assert_eq!(tree.node(tree.root()).kind(), "source_file");
        assert!(!tree.has_errors());
        // Every node is visited exactly once
        assert_eq!(tree.post_order().count(), tree.len());
        // Children always have larger ids than their parent in pre-order
        for id in tree.post_order() {
            for &child in tree.node(id).children() {
                assert!(child > id);
            }
        }
        let func = tree
            .post_order()
            .find(|&id| tree.node(id).kind() == "function_declaration")
            .unwrap();
        assert_eq!(tree.node(func).span().start_row, 2);
        assert_eq!(tree.node(func).span().start_line(), 3);
        assert!(tree.text(func).starts_with("func add"));
    }

    #[test]
    fn test_from_tree_sitter_records_first_error() {
        let code = "package main\n\nfunc broken( {\n";
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .unwrap();
        let ts_tree = parser.parse(code, None).unwrap();
        let tree = SyntaxTree::from_tree_sitter(&ts_tree, code.to_string());
        assert!(tree.has_errors());
    }
}
