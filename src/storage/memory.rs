//! In-process declaration store.
//!
//! Keeps every record in insertion order and answers nearest-neighbor
//! queries with a linear scan. Used by tests and for dry runs that should
//! not touch a database.

use super::{DeclarationRecord, DeclarationStore, DistanceMetric, NearestMatch};
use crate::error::{StorageError, StorageResult};
use crate::vector::Embedding;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryTable {
    created: bool,
    records: Vec<DeclarationRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDeclarationStore {
    inner: Arc<RwLock<MemoryTable>>,
    metric: DistanceMetric,
}

impl MemoryDeclarationStore {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryTable::default())),
            metric,
        }
    }

    /// A store whose schema already exists
    pub fn with_schema(metric: DistanceMetric) -> Self {
        let store = Self::new(metric);
        store.inner.write().created = true;
        store
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Snapshot of all stored records, in insertion order
    pub fn records(&self) -> Vec<DeclarationRecord> {
        self.inner.read().records.clone()
    }

    /// Stored records originating from one source file
    pub fn records_for(&self, source_file: &str) -> Vec<DeclarationRecord> {
        self.inner
            .read()
            .records
            .iter()
            .filter(|r| r.source_file == source_file)
            .cloned()
            .collect()
    }
}

impl DeclarationStore for MemoryDeclarationStore {
    async fn create_schema(&self) -> StorageResult<()> {
        self.inner.write().created = true;
        Ok(())
    }

    async fn drop_schema(&self) -> StorageResult<()> {
        let mut table = self.inner.write();
        table.created = false;
        table.records.clear();
        Ok(())
    }

    async fn insert(&self, record: DeclarationRecord) -> StorageResult<()> {
        let mut table = self.inner.write();
        if !table.created {
            return Err(StorageError::SchemaMissing);
        }
        if let Some(first) = table.records.first() {
            if first.embedding.dimension() != record.embedding.dimension() {
                return Err(StorageError::DimensionMismatch {
                    expected: first.embedding.dimension(),
                    actual: record.embedding.dimension(),
                });
            }
        }
        table.records.push(record);
        Ok(())
    }

    async fn query_nearest(
        &self,
        embedding: &Embedding,
        k: usize,
    ) -> StorageResult<Vec<NearestMatch>> {
        let table = self.inner.read();
        if !table.created {
            return Err(StorageError::SchemaMissing);
        }

        let mut scored = Vec::with_capacity(table.records.len());
        for record in &table.records {
            if record.embedding.dimension() != embedding.dimension() {
                return Err(StorageError::DimensionMismatch {
                    expected: record.embedding.dimension(),
                    actual: embedding.dimension(),
                });
            }
            scored.push((self.metric.distance(&record.embedding, embedding), record));
        }
        // Stable sort keeps insertion order among equal distances
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(distance, record)| NearestMatch {
                source_file: record.source_file.clone(),
                start_row: record.start_row,
                end_row: record.end_row,
                raw_text: record.raw_text.clone(),
                distance,
            })
            .collect())
    }
}
