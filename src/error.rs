//! Error types for the fingerprinting and ingestion pipeline
//!
//! Failures are scoped to the smallest unit of work: one file, one
//! repository, one record. Each unit reports its own error and the batch
//! keeps going, so these types are built to be collected rather than
//! propagated to the top.

use std::path::PathBuf;
use thiserror::Error;

pub use crate::vector::VectorError;

/// Errors produced while turning source bytes into a syntax tree
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read source file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid UTF-8 in source file at byte {valid_up_to}")]
    InvalidUtf8 { valid_up_to: usize },

    #[error("Failed to initialize {language} parser: {reason}")]
    ParserInit { language: String, reason: String },

    #[error("The {language} parser produced no tree")]
    ParseFailed { language: String },

    #[error("Syntax error at line {line}, column {column}")]
    SyntaxError { line: u32, column: u32 },
}

/// Errors from the storage collaborator
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to connect to the database: {0}")]
    Connection(String),

    #[error("Schema operation '{operation}' failed: {cause}")]
    Schema { operation: String, cause: String },

    #[error("Declaration table does not exist. Run schema creation first")]
    SchemaMissing,

    #[error("Failed to insert declaration from '{source_file}': {cause}")]
    Insert { source_file: String, cause: String },

    #[error("Nearest-neighbor query failed: {0}")]
    Query(String),

    #[error("Embedding has {actual} components but the table stores {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}

/// Errors from the repository fetch stage
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid repository URL '{url}': expected <host>/<org>/<name>")]
    InvalidRepoUrl { url: String },

    #[error("Failed to read repository list '{path}': {source}")]
    RepoList {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to clone {url}: {cause}")]
    Clone { url: String, cause: String },

    #[error("I/O error while preparing '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Fetch of {url} was cancelled")]
    Cancelled { url: String },
}

/// Error for one unit of ingestion work (a file or a repository)
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Failed to vectorize '{path}': {source}")]
    Vectorize {
        path: PathBuf,
        #[source]
        source: VectorError,
    },

    #[error("Storage failure for '{path}': {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("Repository directory '{path}' does not exist")]
    RepoNotFound { path: PathBuf },

    #[error("Repository '{label}' could not be resolved: {source}")]
    Fetch {
        label: String,
        #[source]
        source: FetchError,
    },

    #[error("Worker for '{path}' terminated abnormally: {reason}")]
    WorkerFailed { path: PathBuf, reason: String },

    #[error("Ingestion of '{path}' was cancelled")]
    Cancelled { path: PathBuf },
}

impl IngestError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "PARSE_ERROR",
            Self::Vectorize { .. } => "VECTORIZE_ERROR",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::RepoNotFound { .. } => "REPO_NOT_FOUND",
            Self::Fetch { .. } => "FETCH_ERROR",
            Self::WorkerFailed { .. } => "WORKER_FAILED",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }

    /// Whether this failure came from the parser collaborator
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::Parse { .. } => vec![
                "Check that the file is valid UTF-8 Go source",
                "Set ingest.reject_syntax_errors = false to accept partially valid files",
            ],
            Self::Vectorize { .. } => vec![
                "The vocabulary file may have changed; all embeddings must share one vocabulary",
            ],
            Self::Storage { .. } => vec![
                "Check that Postgres is running and the pgvector extension is installed",
                "Verify database.url in .subtreesim/settings.toml",
            ],
            Self::RepoNotFound { .. } => vec![
                "Run 'subtreesim fetch' first or check --repos-base-dir",
            ],
            Self::Fetch { .. } => vec!["Each line of the repository list must be a full URL"],
            _ => vec![],
        }
    }
}

/// Result type alias for parse operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type alias for ingestion of one unit
pub type IngestResult<T> = Result<T, IngestError>;
