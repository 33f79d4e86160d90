//! Go parser implementation
//!
//! Uses tree-sitter-go crate’s LANGUAGE constant (converted via .into()).
//! A fresh `tree_sitter::Parser` is created per call: parsers are not `Sync`,
//! while the `Language` handle is cheap to clone and shared by every worker.

use crate::error::{ParseError, ParseResult};
use crate::parsing::parser::decode_source;
use crate::parsing::{SourceParser, SyntaxTree};
use tree_sitter::{Language, Parser};

const GO_EXTENSIONS: &[&str] = &["go"];

/// Go source parser backed by tree-sitter
#[derive(Clone)]
pub struct GoSourceParser {
    language: Language,
    reject_syntax_errors: bool,
}

impl std::fmt::Debug for GoSourceParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoSourceParser")
            .field("abi_version", &self.language.abi_version())
            .field("reject_syntax_errors", &self.reject_syntax_errors)
            .finish()
    }
}

impl GoSourceParser {
    /// Create a new Go parser.
    ///
    /// Fails early if the grammar's ABI is incompatible with the linked
    /// tree-sitter runtime.
    pub fn new() -> ParseResult<Self> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        Parser::new()
            .set_language(&language)
            .map_err(|e| ParseError::ParserInit {
                language: "Go".to_string(),
                reason: format!("Failed to set Go language: {e}"),
            })?;

        Ok(Self {
            language,
            reject_syntax_errors: false,
        })
    }

    /// Treat trees containing ERROR or MISSING nodes as parse failures
    pub fn with_reject_syntax_errors(mut self, reject: bool) -> Self {
        self.reject_syntax_errors = reject;
        self
    }

    /// Named node kinds of the grammar, in kind-id order, without duplicates.
    ///
    /// This is the natural starting point for a vocabulary file.
    pub fn named_node_kinds(&self) -> Vec<&'static str> {
        let mut seen = std::collections::HashSet::new();
        (0..self.language.node_kind_count())
            .filter_map(|id| u16::try_from(id).ok())
            .filter(|&id| {
                self.language.node_kind_is_named(id) && self.language.node_kind_is_visible(id)
            })
            .filter_map(|id| self.language.node_kind_for_id(id))
            .filter(|kind| seen.insert(*kind))
            .collect()
    }
}

impl SourceParser for GoSourceParser {
    fn language_name(&self) -> &str {
        "Go"
    }

    fn extensions(&self) -> &[&str] {
        GO_EXTENSIONS
    }

    fn parse(&self, source: Vec<u8>) -> ParseResult<SyntaxTree> {
        let source = decode_source(source)?;

        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| ParseError::ParserInit {
                language: "Go".to_string(),
                reason: e.to_string(),
            })?;

        let ts_tree = parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::ParseFailed {
                language: "Go".to_string(),
            })?;
        let tree = SyntaxTree::from_tree_sitter(&ts_tree, source);

        if self.reject_syntax_errors {
            if let Some((line, column)) = tree.first_error() {
                return Err(ParseError::SyntaxError { line, column });
            }
        }
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_file() {
        let parser = GoSourceParser::new().unwrap();
        let tree = parser
            .parse(b"package main\n\ntype Foo struct{}\n".to_vec())
            .unwrap();
        assert_eq!(tree.node(tree.root()).kind(), "source_file");
        assert!(
            tree.post_order()
                .any(|id| tree.node(id).kind() == "type_declaration")
        );
    }

    #[test]
    fn test_empty_file_is_single_root() {
        let parser = GoSourceParser::new().unwrap();
        let tree = parser.parse(Vec::new()).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.node(tree.root()).kind(), "source_file");
    }

    #[test]
    fn test_syntax_errors_accepted_unless_rejected() {
        let code = b"package main\n\nfunc broken( {\n".to_vec();
        let lenient = GoSourceParser::new().unwrap();
        assert!(lenient.parse(code.clone()).is_ok());

        let strict = GoSourceParser::new()
            .unwrap()
            .with_reject_syntax_errors(true);
        assert!(matches!(
            strict.parse(code),
            Err(ParseError::SyntaxError { .. })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let parser = GoSourceParser::new().unwrap();
        let result = parser.parse(vec![b'p', 0xc3, 0x28]);
        assert!(matches!(result, Err(ParseError::InvalidUtf8 { .. })));
    }

    #[test]
    fn test_named_node_kinds_cover_declarations() {
        let parser = GoSourceParser::new().unwrap();
        let kinds = parser.named_node_kinds();
        for expected in [
            "function_declaration",
            "method_declaration",
            "type_declaration",
            "type_identifier",
        ] {
            assert!(kinds.contains(&expected), "missing {expected}");
        }
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }
}
