//! Term-frequency maps and their projection onto a vocabulary.

use super::similarity::cosine_similarity;
use super::types::Embedding;
use super::vocabulary::Vocabulary;
use std::collections::HashMap;

/// Separator between terms of a canonical string.
///
/// Not escaped: a type name containing it would split into extra terms.
pub const DELIMITER: char = ':';

/// Count of each term in one canonical string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFrequency {
    counts: HashMap<String, u32>,
    total: u32,
}

impl NodeFrequency {
    /// Split a canonical string on the delimiter and tally every term.
    pub fn from_canonical(canonical: &str) -> Self {
        let mut counts: HashMap<String, u32> = HashMap::new();
        let mut total = 0;
        for term in canonical.split(DELIMITER) {
            *counts.entry(term.to_string()).or_default() += 1;
            total += 1;
        }
        Self { counts, total }
    }

    pub fn get(&self, term: &str) -> u32 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Number of terms tallied, duplicates included
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(term, &count)| (term.as_str(), count))
    }

    /// Terms sorted by descending count, then name; stable for display
    pub fn sorted(&self) -> Vec<(&str, u32)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Project onto the vocabulary's axis order. Terms outside the
    /// vocabulary are dropped, absent terms become 0.
    pub fn to_embedding(&self, vocabulary: &Vocabulary) -> Embedding {
        let values = vocabulary
            .terms()
            .iter()
            .map(|term| self.get(term) as f32)
            .collect();
        Embedding::from_counts(values)
    }

    /// Cosine similarity over the union of both term sets, independent of
    /// any vocabulary. Used for local diagnostics.
    pub fn cosine(&self, other: &NodeFrequency) -> f32 {
        let keys: Vec<&str> = self
            .counts
            .keys()
            .chain(other.counts.keys().filter(|k| !self.counts.contains_key(*k)))
            .map(String::as_str)
            .collect();
        let a: Vec<f32> = keys.iter().map(|k| self.get(k) as f32).collect();
        let b: Vec<f32> = keys.iter().map(|k| other.get(k) as f32).collect();
        cosine_similarity(&a, &b)
    }
}

/// Canonical string to embedding in one step
pub fn vectorize(canonical: &str, vocabulary: &Vocabulary) -> Embedding {
    NodeFrequency::from_canonical(canonical).to_embedding(vocabulary)
}
