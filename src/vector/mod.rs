//! Structural vectors for code fingerprints.
//!
//! A canonical string is tallied into a [`NodeFrequency`], projected onto a
//! fixed [`Vocabulary`] into an [`Embedding`], and compared with cosine
//! similarity. The vocabulary decides dimensionality and axis meaning; it is
//! loaded once per process and never mutated.

mod frequency;
mod similarity;
mod types;
mod vocabulary;

pub use frequency::{DELIMITER, NodeFrequency, vectorize};
pub use similarity::{
    cosine_distance, cosine_similarity, euclidean_distance, l2_norm, normalize_vector,
};
pub use types::{Embedding, Score, VectorDimension, VectorError};
pub use vocabulary::Vocabulary;
