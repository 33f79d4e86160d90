//! Persisted declaration records

use crate::fingerprint::DeclarationFingerprint;
use crate::vector::Embedding;
use serde::Serialize;
use std::path::Path;

/// One declaration root, ready to be handed to a store.
///
/// Immutable once built; ownership moves to the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeclarationRecord {
    pub source_file: String,
    /// 0-based row of the first line, stored in `start_line_number`
    pub start_row: u32,
    /// 0-based row of the last line, inclusive
    pub end_row: u32,
    pub canonical: String,
    pub raw_text: String,
    pub embedding: Embedding,
}

impl DeclarationRecord {
    pub fn from_fingerprint(source_file: &Path, fingerprint: &DeclarationFingerprint) -> Self {
        Self {
            source_file: source_file.display().to_string(),
            start_row: fingerprint.span.start_row,
            end_row: fingerprint.span.end_row,
            canonical: fingerprint.canonical.clone(),
            raw_text: fingerprint.raw_text.clone(),
            embedding: fingerprint.embedding.clone(),
        }
    }
}

/// A stored declaration returned by a nearest-neighbor query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestMatch {
    pub source_file: String,
    /// 0-based, as stored
    pub start_row: u32,
    pub end_row: u32,
    pub raw_text: String,
    /// Smaller is closer, under the store's distance metric
    pub distance: f32,
}
