//! Postgres + pgvector declaration store

use super::{DeclarationRecord, DeclarationStore, DistanceMetric, NearestMatch};
use crate::error::{StorageError, StorageResult};
use crate::vector::{Embedding, VectorDimension};
use pgvector::Vector;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};

/// Schema-qualified table identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    schema: String,
    table: String,
}

impl TableName {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> StorageResult<Self> {
        let schema = schema.into();
        let table = table.into();
        if schema.trim().is_empty() {
            return Err(StorageError::InvalidTableName(
                "schema name is required".to_string(),
            ));
        }
        if table.trim().is_empty() {
            return Err(StorageError::InvalidTableName(
                "table name is required".to_string(),
            ));
        }
        Ok(Self { schema, table })
    }

    /// Fully-qualified reference with quoted identifiers
    pub fn qualified(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// Quote a Postgres identifier, escaping embedded quotes
fn quote_ident(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\"\""))
}

/// Declaration store backed by a single pgvector table.
///
/// Columns: `id bigserial`, `source_file`, `start_line_number`,
/// `end_line_number`, `inorder_node_string`, `raw_subtree_string` and
/// `embedding vector(N)` where N is the vocabulary size.
pub struct PgDeclarationStore {
    client: Client,
    table: TableName,
    dimension: VectorDimension,
    metric: DistanceMetric,
}

impl PgDeclarationStore {
    /// Open a connection. The connection task runs on the current runtime
    /// until the store is dropped.
    pub async fn connect(
        url: &str,
        table: TableName,
        dimension: VectorDimension,
        metric: DistanceMetric,
    ) -> StorageResult<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(err) = connection.await {
                tracing::error!(target: "storage", "postgres connection error: {err}");
            }
        });

        tracing::debug!(
            target: "storage",
            "connected to postgres, table {table}, dimension {dimension}, metric {metric}"
        );

        Ok(Self {
            client,
            table,
            dimension,
            metric,
        })
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn check_dimension(&self, embedding: &Embedding) -> StorageResult<()> {
        if embedding.dimension() != self.dimension.get() {
            return Err(StorageError::DimensionMismatch {
                expected: self.dimension.get(),
                actual: embedding.dimension(),
            });
        }
        Ok(())
    }

    async fn execute_schema(&self, operation: &str, sql: &str) -> StorageResult<()> {
        self.client
            .execute(sql, &[])
            .await
            .map_err(|e| StorageError::Schema {
                operation: operation.to_string(),
                cause: e.to_string(),
            })?;
        Ok(())
    }
}

/// Cosine distance against a zero vector comes back as NaN or NULL
/// depending on the pgvector version; both mean "no similarity".
fn stored_distance(raw: Option<f64>) -> f32 {
    match raw {
        Some(d) if d.is_finite() => d as f32,
        _ => 1.0,
    }
}

fn is_undefined_table(err: &tokio_postgres::Error) -> bool {
    err.code() == Some(&SqlState::UNDEFINED_TABLE)
}

impl DeclarationStore for PgDeclarationStore {
    async fn create_schema(&self) -> StorageResult<()> {
        self.execute_schema("create extension", "CREATE EXTENSION IF NOT EXISTS vector")
            .await?;

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                source_file TEXT NOT NULL,
                start_line_number INTEGER NOT NULL,
                end_line_number INTEGER NOT NULL,
                inorder_node_string TEXT NOT NULL,
                raw_subtree_string TEXT NOT NULL,
                embedding VECTOR({}) NOT NULL
            )",
            self.table.qualified(),
            self.dimension
        );
        self.execute_schema("create table", &ddl).await?;

        tracing::info!(target: "storage", "ensured table {}", self.table);
        Ok(())
    }

    async fn drop_schema(&self) -> StorageResult<()> {
        let ddl = format!("DROP TABLE IF EXISTS {}", self.table.qualified());
        self.execute_schema("drop table", &ddl).await?;
        tracing::info!(target: "storage", "dropped table {}", self.table);
        Ok(())
    }

    async fn insert(&self, record: DeclarationRecord) -> StorageResult<()> {
        self.check_dimension(&record.embedding)?;

        let sql = format!(
            "INSERT INTO {} (source_file, start_line_number, end_line_number, \
             inorder_node_string, raw_subtree_string, embedding) \
             VALUES ($1, $2, $3, $4, $5, $6)",
            self.table.qualified()
        );
        let start_row = record.start_row as i32;
        let end_row = record.end_row as i32;
        let vector = Vector::from(record.embedding.into_inner());

        self.client
            .execute(
                &sql,
                &[
                    &record.source_file,
                    &start_row,
                    &end_row,
                    &record.canonical,
                    &record.raw_text,
                    &vector,
                ],
            )
            .await
            .map_err(|e| {
                if is_undefined_table(&e) {
                    StorageError::SchemaMissing
                } else {
                    StorageError::Insert {
                        source_file: record.source_file.clone(),
                        cause: e.to_string(),
                    }
                }
            })?;
        Ok(())
    }

    async fn query_nearest(
        &self,
        embedding: &Embedding,
        k: usize,
    ) -> StorageResult<Vec<NearestMatch>> {
        self.check_dimension(embedding)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT source_file, start_line_number, end_line_number, raw_subtree_string, \
             (embedding {op} $1)::float8 AS distance \
             FROM {table} ORDER BY embedding {op} $1 LIMIT $2",
            op = self.metric.pg_operator(),
            table = self.table.qualified()
        );
        let vector = Vector::from(embedding.as_slice().to_vec());
        let rows = self
            .client
            .query(&sql, &[&vector, &(k as i64)])
            .await
            .map_err(|e| {
                if is_undefined_table(&e) {
                    StorageError::SchemaMissing
                } else {
                    StorageError::Query(e.to_string())
                }
            })?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let start_row: i32 = row.get("start_line_number");
            let end_row: i32 = row.get("end_line_number");
            let distance: Option<f64> = row.get("distance");
            out.push(NearestMatch {
                source_file: row.get("source_file"),
                start_row: start_row.max(0) as u32,
                end_row: end_row.max(0) as u32,
                raw_text: row.get("raw_subtree_string"),
                distance: stored_distance(distance),
            });
        }
        Ok(out)
    }
}
