//! Ordered vocabulary of node-kind terms.
//!
//! Line order of the vocabulary file fixes the axis order, and therefore the
//! dimension, of every embedding. The vocabulary is loaded once at start-up
//! and shared read-only between workers; changing the file invalidates
//! comparisons against embeddings that are already stored.

use super::frequency::DELIMITER;
use super::types::{VectorDimension, VectorError};
use std::collections::HashMap;
use std::path::Path;

/// Go vocabulary shipped with the crate
const BUNDLED_GO: &str = include_str!("../../data/node_types_go.txt");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    positions: HashMap<String, usize>,
    dimension: VectorDimension,
}

impl Vocabulary {
    /// Build from an ordered term list.
    ///
    /// Rejects an empty list, duplicate terms and terms containing the
    /// canonical delimiter.
    pub fn new<I, S>(terms: I) -> Result<Self, VectorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_numbered(
            terms
                .into_iter()
                .enumerate()
                .map(|(index, term)| (index + 1, term.into())),
        )
    }

    /// Parse newline-delimited content. Surrounding whitespace is trimmed and
    /// blank lines are skipped; errors report line numbers in `content`.
    pub fn parse(content: &str) -> Result<Self, VectorError> {
        Self::from_numbered(
            content
                .lines()
                .enumerate()
                .map(|(index, line)| (index + 1, line.trim()))
                .filter(|(_, line)| !line.is_empty())
                .map(|(line_no, line)| (line_no, line.to_string())),
        )
    }

    fn from_numbered(terms: impl Iterator<Item = (usize, String)>) -> Result<Self, VectorError> {
        let mut ordered = Vec::new();
        let mut positions = HashMap::new();
        let mut first_lines: HashMap<String, usize> = HashMap::new();

        for (line, term) in terms {
            if term.contains(DELIMITER) {
                return Err(VectorError::DelimiterInTerm {
                    term,
                    line,
                    delimiter: DELIMITER,
                });
            }
            if let Some(&first) = first_lines.get(&term) {
                return Err(VectorError::DuplicateTerm {
                    term,
                    first,
                    second: line,
                });
            }
            first_lines.insert(term.clone(), line);
            positions.insert(term.clone(), ordered.len());
            ordered.push(term);
        }

        let dimension = VectorDimension::new(ordered.len())?;

        Ok(Self {
            terms: ordered,
            positions,
            dimension,
        })
    }

    /// Load a vocabulary file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self, VectorError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|source| VectorError::VocabularyRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&content)
    }

    /// The Go vocabulary compiled into the binary, used when no vocabulary
    /// file is present
    pub fn bundled_go() -> Result<Self, VectorError> {
        Self::parse(BUNDLED_GO)
    }

    /// Number of terms, which is the embedding dimension
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Axis index of a term
    pub fn position(&self, term: &str) -> Option<usize> {
        self.positions.get(term).copied()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.positions.contains_key(term)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_preserves_line_order() {
        let vocab = Vocabulary::parse("identifier\ntype_identifier_Foo\r\n\nfunction_declaration\n")
            .unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.position("identifier"), Some(0));
        assert_eq!(vocab.position("type_identifier_Foo"), Some(1));
        assert_eq!(vocab.position("function_declaration"), Some(2));
        assert_eq!(vocab.dimension().get(), 3);
        assert!(!vocab.contains("block"));
    }

    #[test]
    fn test_rejects_duplicates_and_delimiters() {
        assert!(matches!(
            Vocabulary::parse("block\nidentifier\nblock\n"),
            Err(VectorError::DuplicateTerm {
                first: 1,
                second: 3,
                ..
            })
        ));
        assert!(matches!(
            Vocabulary::parse("block\nfunction_declaration:identifier\n"),
            Err(VectorError::DelimiterInTerm { line: 2, .. })
        ));
        assert!(Vocabulary::parse("\n\n").is_err());
    }

    #[test]
    fn test_errors_point_at_file_lines() {
        assert!(matches!(
            Vocabulary::parse("a\n\n\nb:c\n"),
            Err(VectorError::DelimiterInTerm { line: 4, .. })
        ));
        assert!(matches!(
            Vocabulary::parse("a\n\n\nb\na\n"),
            Err(VectorError::DuplicateTerm {
                first: 1,
                second: 5,
                ..
            })
        ));
        assert!(matches!(
            Vocabulary::new(["a", "b", "a"]),
            Err(VectorError::DuplicateTerm {
                first: 1,
                second: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("node_types.txt");
        fs::write(&path, "source_file\nidentifier\n").unwrap();

        let vocab = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab.terms(), &["source_file", "identifier"]);

        let missing = Vocabulary::load(temp_dir.path().join("absent.txt"));
        assert!(matches!(missing, Err(VectorError::VocabularyRead { .. })));
    }

    #[test]
    fn test_bundled_go_vocabulary_is_valid() {
        let vocab = Vocabulary::bundled_go().unwrap();
        for term in [
            "function_declaration",
            "method_declaration",
            "type_declaration",
            "identifier",
            "type_identifier_error",
        ] {
            assert!(vocab.contains(term), "missing {term}");
        }
    }
}
