//! File discovery and concurrent ingestion

pub mod ingest;
pub mod progress;
pub mod walker;

pub use ingest::{
    AnalyzedFile, BatchReport, IngestOptions, Ingestor, RepoOutcome, RepoTarget, SearchHit,
};
pub use progress::{FileFailure, IngestStats};
pub use walker::FileWalker;
