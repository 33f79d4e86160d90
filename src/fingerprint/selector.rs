//! Which nodes are declaration roots.
//!
//! Only declaration roots are fingerprinted and persisted. The set of kinds
//! is closed and configurable per grammar.

use crate::parsing::{NodeId, SyntaxNode, SyntaxTree};

/// Declaration kinds for the Go grammar
pub const GO_DECLARATION_KINDS: &[&str] = &[
    "function_declaration",
    "method_declaration",
    "type_declaration",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSelector {
    kinds: Vec<String>,
}

impl Default for DeclarationSelector {
    fn default() -> Self {
        Self::go()
    }
}

impl DeclarationSelector {
    pub fn new<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn go() -> Self {
        Self::new(GO_DECLARATION_KINDS.iter().copied())
    }

    pub fn kinds(&self) -> &[String] {
        &self.kinds
    }

    pub fn is_declaration(&self, node: &SyntaxNode) -> bool {
        self.kinds.iter().any(|kind| kind == node.kind())
    }

    /// Declaration roots in traversal order.
    ///
    /// The traversal is post-order, the same order the canonicalizer uses, so
    /// a declaration nested inside another comes before its enclosing one.
    pub fn select(&self, tree: &SyntaxTree) -> Vec<NodeId> {
        tree.post_order()
            .filter(|&id| self.is_declaration(tree.node(id)))
            .collect()
    }
}
