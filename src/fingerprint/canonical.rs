//! Bottom-up canonical strings for every node of a syntax tree.
//!
//! A node's string is its kind label followed by the strings of its named
//! children, in order, joined with [`DELIMITER`]. Identifiers stay
//! anonymous so renamed code still matches, with one exception: a
//! `type_identifier` contributes `type_identifier_<name>`, so references to
//! different types do not collapse into one label.

use crate::parsing::{NodeId, SyntaxTree};
use crate::vector::DELIMITER;

/// Node kind whose canonical form embeds the referenced type name
pub const TYPE_IDENTIFIER_KIND: &str = "type_identifier";

/// Canonical string of every node in one tree, indexed by `NodeId`.
///
/// Unnamed nodes get an entry too, although parents never read it.
#[derive(Debug, Clone)]
pub struct CanonicalStrings {
    strings: Vec<String>,
}

impl CanonicalStrings {
    pub fn get(&self, id: NodeId) -> &str {
        &self.strings[id.index()]
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Canonicalize every node reachable from the root, each exactly once.
///
/// Post-order guarantees a child's string exists before its parent is
/// composed. Linear in node count.
pub fn canonicalize(tree: &SyntaxTree) -> CanonicalStrings {
    let mut strings = vec![String::new(); tree.len()];
    for id in tree.post_order() {
        let composed = compose(tree, id, &strings);
        strings[id.index()] = composed;
    }
    CanonicalStrings { strings }
}

fn compose(tree: &SyntaxTree, id: NodeId, strings: &[String]) -> String {
    let node = tree.node(id);
    let mut out = if node.kind() == TYPE_IDENTIFIER_KIND {
        format!("{TYPE_IDENTIFIER_KIND}_{}", tree.text(id))
    } else {
        node.kind().to_string()
    };

    for &child in node.children() {
        if tree.node(child).is_named() {
            out.push(DELIMITER);
            out.push_str(&strings[child.index()]);
        }
    }
    out
}
