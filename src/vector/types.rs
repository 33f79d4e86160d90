//! Type-safe wrappers and core types for structural embeddings.
//!
//! Embeddings here are term-frequency counts, so every component is a
//! finite, non-negative float. The wrappers enforce that at construction
//! time and keep dimension checks in one place.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type-safe wrapper for vector dimensions.
///
/// The dimension of every embedding equals the size of the vocabulary it
/// was projected onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a vector has the expected dimension.
    pub fn validate_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for VectorDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-length, non-negative frequency vector in vocabulary order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Embedding(Vec<f32>);

impl Embedding {
    /// Wraps raw components, rejecting negative or non-finite values.
    pub fn new(values: Vec<f32>) -> Result<Self, VectorError> {
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(VectorError::InvalidComponent { index, value });
        }
        Ok(Self(values))
    }

    /// All-zero embedding of the given dimension
    pub fn zeros(dimension: VectorDimension) -> Self {
        Self(vec![0.0; dimension.get()])
    }

    /// Counts are non-negative by construction.
    pub(crate) fn from_counts(values: Vec<f32>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    /// Euclidean length
    #[must_use]
    pub fn norm(&self) -> f32 {
        super::similarity::l2_norm(&self.0)
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&v| v == 0.0)
    }

    /// Number of non-zero components
    #[must_use]
    pub fn nonzero_count(&self) -> usize {
        self.0.iter().filter(|&&v| v != 0.0).count()
    }

    /// Unit-length copy; a zero vector stays zero.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut values = self.0.clone();
        super::similarity::normalize_vector(&mut values);
        Self(values)
    }

    /// Cosine similarity with dimension checking.
    pub fn cosine(&self, other: &Embedding) -> Result<Score, VectorError> {
        if self.dimension() != other.dimension() {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        Score::new(super::similarity::cosine_similarity(&self.0, &other.0))
    }
}

/// Type-safe wrapper for similarity scores.
///
/// Scores are normalized to the range [0.0, 1.0] where:
/// - 1.0 indicates identical term proportions
/// - 0.0 indicates no shared terms (or an empty operand)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score(f32);

impl Score {
    /// Creates a new `Score` with validation.
    ///
    /// Returns an error if the score is not in the range [0.0, 1.0] or is NaN.
    pub fn new(value: f32) -> Result<Self, VectorError> {
        if value.is_nan() {
            return Err(VectorError::InvalidScore {
                value,
                reason: "Score cannot be NaN",
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(VectorError::InvalidScore {
                value,
                reason: "Score must be in range [0.0, 1.0]",
            });
        }
        Ok(Self(value))
    }

    /// Creates a score of 0.0 (no similarity).
    #[must_use]
    pub const fn zero() -> Self {
        Self(0.0)
    }

    /// Creates a score of 1.0 (perfect similarity).
    #[must_use]
    pub const fn one() -> Self {
        Self(1.0)
    }

    /// Returns the underlying f32 value.
    #[must_use]
    pub fn get(&self) -> f32 {
        self.0
    }

    /// Cosine distance, `1 - similarity`
    #[must_use]
    pub fn distance(&self) -> f32 {
        1.0 - self.0
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Errors that can occur during vocabulary loading and vector operations.
///
/// Given a valid vocabulary, vectorization itself cannot fail; these errors
/// indicate a broken vocabulary or a mismatch between stored and computed
/// embeddings.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all embeddings were produced with the same vocabulary file"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },

    #[error("Invalid embedding component {value} at index {index}: counts must be finite and >= 0")]
    InvalidComponent { index: usize, value: f32 },

    #[error("Invalid score value: {value}\nReason: {reason}")]
    InvalidScore { value: f32, reason: &'static str },

    #[error("Failed to read vocabulary file '{path}': {source}")]
    VocabularyRead {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("Vocabulary term '{term}' appears more than once (lines {first} and {second})")]
    DuplicateTerm {
        term: String,
        first: usize,
        second: usize,
    },

    #[error(
        "Vocabulary term '{term}' on line {line} contains the canonical delimiter '{delimiter}'\nSuggestion: Such a term can never match a tallied frequency"
    )]
    DelimiterInTerm {
        term: String,
        line: usize,
        delimiter: char,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_validation() {
        let score = Score::new(0.5).unwrap();
        assert_eq!(score.get(), 0.5);
        assert_eq!(Score::zero().get(), 0.0);
        assert_eq!(Score::one().get(), 1.0);
        assert!((Score::new(0.25).unwrap().distance() - 0.75).abs() < f32::EPSILON);

        assert!(Score::new(-0.1).is_err());
        assert!(Score::new(1.1).is_err());
        assert!(Score::new(f32::NAN).is_err());
    }

    #[test]
    fn test_vector_dimension() {
        let dim = VectorDimension::new(219).unwrap();
        assert_eq!(dim.get(), 219);
        assert!(VectorDimension::new(0).is_err());

        assert!(dim.validate_vector(&vec![0.0; 219]).is_ok());
        assert!(matches!(
            dim.validate_vector(&vec![0.0; 3]),
            Err(VectorError::DimensionMismatch {
                expected: 219,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_embedding_rejects_negative_and_nan() {
        assert!(Embedding::new(vec![0.0, 1.0, 2.0]).is_ok());
        assert!(matches!(
            Embedding::new(vec![0.0, -1.0]),
            Err(VectorError::InvalidComponent { index: 1, .. })
        ));
        assert!(Embedding::new(vec![f32::NAN]).is_err());
    }

    #[test]
    fn test_embedding_norm_and_normalize() {
        let e = Embedding::new(vec![3.0, 4.0]).unwrap();
        assert!((e.norm() - 5.0).abs() < 1e-6);
        let n = e.normalized();
        assert!((n.norm() - 1.0).abs() < 1e-6);
        assert_eq!(e.nonzero_count(), 2);

        let zero = Embedding::zeros(VectorDimension::new(4).unwrap());
        assert!(zero.is_zero());
        assert!(zero.normalized().is_zero());
    }

    #[test]
    fn test_cosine_dimension_mismatch() {
        let a = Embedding::new(vec![1.0, 0.0]).unwrap();
        let b = Embedding::new(vec![1.0, 0.0, 0.0]).unwrap();
        assert!(a.cosine(&b).is_err());
    }
}
