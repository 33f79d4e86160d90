//! Parser collaborator: source bytes in, arena syntax tree out.

pub mod go;
pub mod parser;
pub mod tree;

pub use go::GoSourceParser;
pub use parser::SourceParser;
pub use tree::{NodeId, PostOrder, Span, SyntaxNode, SyntaxTree, SyntaxTreeBuilder};
