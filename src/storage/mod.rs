//! Storage collaborator for declaration records.
//!
//! The core only needs four operations: create and drop the schema, insert
//! a record, and query the k nearest records to an embedding. Stores are
//! shared across ingestion workers, so every operation takes `&self` and
//! returns a `Send` future.
//!
//! There is no uniqueness constraint: ingesting the same file twice stores
//! its declarations twice.

mod memory;
mod postgres;
mod record;

pub use memory::MemoryDeclarationStore;
pub use postgres::{PgDeclarationStore, TableName};
pub use record::{DeclarationRecord, NearestMatch};

use crate::error::StorageResult;
use crate::vector::Embedding;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Ordering used by nearest-neighbor queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine similarity`; matches the local similarity evaluator exactly
    #[default]
    Cosine,
    /// Euclidean distance over raw counts; favors records of similar size
    L2,
}

impl DistanceMetric {
    /// pgvector operator implementing this metric
    pub fn pg_operator(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "<=>",
            DistanceMetric::L2 => "<->",
        }
    }

    pub fn distance(&self, a: &Embedding, b: &Embedding) -> f32 {
        match self {
            DistanceMetric::Cosine => crate::vector::cosine_distance(a.as_slice(), b.as_slice()),
            DistanceMetric::L2 => crate::vector::euclidean_distance(a.as_slice(), b.as_slice()),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Cosine => write!(f, "cosine"),
            DistanceMetric::L2 => write!(f, "l2"),
        }
    }
}

/// Persistence interface used by ingestion and search
pub trait DeclarationStore: Send + Sync {
    /// Ensure the record table and its vector column exist. Idempotent.
    fn create_schema(&self) -> impl Future<Output = StorageResult<()>> + Send;

    /// Remove the record table and everything in it
    fn drop_schema(&self) -> impl Future<Output = StorageResult<()>> + Send;

    fn insert(&self, record: DeclarationRecord) -> impl Future<Output = StorageResult<()>> + Send;

    /// Up to `k` stored records, nearest first
    fn query_nearest(
        &self,
        embedding: &Embedding,
        k: usize,
    ) -> impl Future<Output = StorageResult<Vec<NearestMatch>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_operators() {
        assert_eq!(DistanceMetric::Cosine.pg_operator(), "<=>");
        assert_eq!(DistanceMetric::L2.pg_operator(), "<->");
        assert_eq!(DistanceMetric::default(), DistanceMetric::Cosine);
    }

    #[test]
    fn test_metric_distances() {
        let a = Embedding::new(vec![1.0, 0.0]).unwrap();
        let b = Embedding::new(vec![2.0, 0.0]).unwrap();
        assert!(DistanceMetric::Cosine.distance(&a, &b).abs() < 1e-6);
        assert!((DistanceMetric::L2.distance(&a, &b) - 1.0).abs() < 1e-6);
    }
}
