//! Go grammar support
//!
//! Wraps tree-sitter-go (ABI-15). Declarations of interest for Go are
//! function, method and type declarations; see
//! [`crate::fingerprint::DeclarationSelector::go`].

pub mod parser;

pub use parser::GoSourceParser;
