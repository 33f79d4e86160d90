//! Fingerprinting pipeline: canonicalize, select declaration roots,
//! vectorize.
//!
//! Everything here is synchronous and allocation-local to one tree, so a
//! worker can run it on a blocking thread while sharing the `Fingerprinter`
//! (and its vocabulary) with every other worker.

mod canonical;
mod selector;

pub use canonical::{CanonicalStrings, TYPE_IDENTIFIER_KIND, canonicalize};
pub use selector::{DeclarationSelector, GO_DECLARATION_KINDS};

use crate::parsing::{NodeId, Span, SyntaxTree};
use crate::vector::{Embedding, NodeFrequency, Vocabulary};
use std::sync::Arc;

/// Fingerprint of one declaration root
#[derive(Debug, Clone)]
pub struct DeclarationFingerprint {
    pub node: NodeId,
    pub kind: String,
    pub span: Span,
    pub canonical: String,
    pub raw_text: String,
    pub frequency: NodeFrequency,
    pub embedding: Embedding,
}

/// Result of fingerprinting one tree
#[derive(Debug, Clone)]
pub struct FileFingerprint {
    pub canonical: CanonicalStrings,
    /// Declaration roots in traversal order
    pub declarations: Vec<DeclarationFingerprint>,
}

impl FileFingerprint {
    /// Look up the fingerprint of a declaration root
    pub fn declaration(&self, node: NodeId) -> Option<&DeclarationFingerprint> {
        self.declarations.iter().find(|d| d.node == node)
    }
}

/// Immutable pipeline configuration shared by all workers
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    vocabulary: Arc<Vocabulary>,
    selector: DeclarationSelector,
}

impl Fingerprinter {
    pub fn new(vocabulary: Arc<Vocabulary>, selector: DeclarationSelector) -> Self {
        Self {
            vocabulary,
            selector,
        }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn selector(&self) -> &DeclarationSelector {
        &self.selector
    }

    /// Run the whole pipeline over one tree
    pub fn fingerprint(&self, tree: &SyntaxTree) -> FileFingerprint {
        let canonical = canonicalize(tree);
        let declarations = self
            .selector
            .select(tree)
            .into_iter()
            .map(|node| {
                let canonical_string = canonical.get(node).to_string();
                let frequency = NodeFrequency::from_canonical(&canonical_string);
                let embedding = frequency.to_embedding(&self.vocabulary);
                let syntax = tree.node(node);
                DeclarationFingerprint {
                    node,
                    kind: syntax.kind().to_string(),
                    span: syntax.span(),
                    canonical: canonical_string,
                    raw_text: tree.text(node).to_string(),
                    frequency,
                    embedding,
                }
            })
            .collect();

        FileFingerprint {
            canonical,
            declarations,
        }
    }

    /// Embedding of an arbitrary canonical string
    pub fn embed(&self, canonical: &str) -> Embedding {
        crate::vector::vectorize(canonical, &self.vocabulary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprinter(terms: &[&str]) -> Fingerprinter {
        Fingerprinter::new(
            Arc::new(Vocabulary::new(terms.iter().copied()).unwrap()),
            DeclarationSelector::go(),
        )
    }

    #[test]
    fn test_function_with_type_reference() {
        let src = "func f(x Foo)";
        let mut b = SyntaxTree::builder(src);
        let root = b.root("source_file", 0..src.len());
        let func = b.child(root, "function_declaration", true, 0..src.len());
        b.child(func, "type_identifier", true, 9..12);
        let tree = b.build();

        let fp = fingerprinter(&["identifier", "type_identifier_Foo", "function_declaration"])
            .fingerprint(&tree);
        assert_eq!(fp.declarations.len(), 1);
        let decl = &fp.declarations[0];
        assert_eq!(decl.canonical, "function_declaration:type_identifier_Foo");
        assert_eq!(decl.embedding.as_slice(), &[0.0, 1.0, 1.0]);
        assert_eq!(decl.raw_text, src);
        assert_eq!(decl.kind, "function_declaration");
        assert!(fp.declaration(func).is_some());
    }

    #[test]
    fn test_empty_declaration_baseline() {
        let src = "type T";
        let mut b = SyntaxTree::builder(src);
        let root = b.root("source_file", 0..src.len());
        b.child(root, "type_declaration", true, 0..src.len());
        let tree = b.build();

        let inside = fingerprinter(&["type_declaration", "identifier"]).fingerprint(&tree);
        let decl = &inside.declarations[0];
        assert_eq!(decl.canonical, "type_declaration");
        assert_eq!(decl.embedding.nonzero_count(), 1);

        let outside = fingerprinter(&["identifier"]).fingerprint(&tree);
        assert!(outside.declarations[0].embedding.is_zero());
    }

    #[test]
    fn test_fingerprint_is_deterministic() {
        let src = "func a(b int) {}";
        let mut b = SyntaxTree::builder(src);
        let root = b.root("source_file", 0..src.len());
        let func = b.child(root, "function_declaration", true, 0..src.len());
        b.child(func, "identifier", true, 5..6);
        let params = b.child(func, "parameter_list", true, 6..13);
        let param = b.child(params, "parameter_declaration", true, 7..12);
        b.child(param, "identifier", true, 7..8);
        b.child(param, "type_identifier", true, 9..12);
        b.child(func, "block", true, 14..16);
        let tree = b.build();

        let f = fingerprinter(&["function_declaration", "identifier", "type_identifier_int"]);
        let first = f.fingerprint(&tree);
        let second = f.fingerprint(&tree);
        assert_eq!(
            first.declarations[0].canonical,
            second.declarations[0].canonical
        );
        assert_eq!(
            first.declarations[0].embedding,
            second.declarations[0].embedding
        );
        assert_eq!(first.declarations[0].embedding.dimension(), 3);
        assert_eq!(
            first.declarations[0].canonical,
            "function_declaration:identifier:parameter_list:parameter_declaration:identifier:type_identifier_int:block"
        );
    }
}
