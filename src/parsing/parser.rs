//! Source parser trait
//!
//! The fingerprinting core never builds trees itself. Anything that can turn
//! source bytes into a `SyntaxTree` can be plugged into ingestion through
//! this trait.

use crate::error::ParseResult;
use crate::parsing::SyntaxTree;

/// Parser collaborator used by the ingestion workers.
///
/// Implementations are shared across worker tasks, so `parse` takes `&self`
/// and must be callable concurrently.
pub trait SourceParser: Send + Sync {
    /// Human readable grammar name, used in error messages
    fn language_name(&self) -> &str;

    /// File extensions (without the dot) this parser accepts
    fn extensions(&self) -> &[&str];

    /// Parse raw source bytes into a syntax tree
    fn parse(&self, source: Vec<u8>) -> ParseResult<SyntaxTree>;
}

/// Validate UTF-8 without copying, reporting where decoding stopped
pub(crate) fn decode_source(source: Vec<u8>) -> ParseResult<String> {
    String::from_utf8(source).map_err(|e| crate::error::ParseError::InvalidUtf8 {
        valid_up_to: e.utf8_error().valid_up_to(),
    })
}
