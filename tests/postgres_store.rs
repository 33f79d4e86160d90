//! Round trip against a live Postgres with pgvector.
//!
//! Run with:
//! `SUBTREESIM_TEST_DATABASE_URL=postgres://... cargo test -- --ignored`

use anyhow::Result;
use subtreesim::storage::TableName;
use subtreesim::vector::VectorDimension;
use subtreesim::{
    DeclarationRecord, DeclarationStore, DistanceMetric, Embedding, PgDeclarationStore,
    StorageError,
};

fn record(file: &str, values: Vec<f32>) -> DeclarationRecord {
    DeclarationRecord {
        source_file: file.to_string(),
        start_row: 0,
        end_row: 3,
        canonical: "function_declaration:identifier:block".to_string(),
        raw_text: format!("// {file}"),
        embedding: Embedding::new(values).unwrap(),
    }
}

#[tokio::test]
#[ignore = "needs SUBTREESIM_TEST_DATABASE_URL"]
async fn test_pgvector_round_trip() -> Result<()> {
    let Ok(url) = std::env::var("SUBTREESIM_TEST_DATABASE_URL") else {
        return Ok(());
    };
    let table = TableName::new("public", format!("subtreesim_test_{}", std::process::id()))?;
    let store = PgDeclarationStore::connect(
        &url,
        table,
        VectorDimension::new(3)?,
        DistanceMetric::Cosine,
    )
    .await?;

    store.create_schema().await?;
    store.create_schema().await?;

    store.insert(record("a.go", vec![3.0, 0.0, 1.0])).await?;
    store.insert(record("b.go", vec![1.0, 2.0, 2.0])).await?;
    store.insert(record("c.go", vec![0.0, 5.0, 0.0])).await?;

    let query = Embedding::new(vec![1.0, 2.0, 2.0])?;
    let results = store.query_nearest(&query, 2).await?;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source_file, "b.go");
    assert!(results[0].distance.abs() < 1e-5);

    let wrong = Embedding::new(vec![1.0])?;
    assert!(matches!(
        store.query_nearest(&wrong, 1).await,
        Err(StorageError::DimensionMismatch { .. })
    ));

    store.drop_schema().await?;
    assert!(matches!(
        store.query_nearest(&query, 1).await,
        Err(StorageError::SchemaMissing)
    ));
    Ok(())
}
