//! Structural code fingerprinting.
//!
//! Source files are parsed into syntax trees, every subtree is reduced to a
//! canonical string of node kinds, and each declaration (function, method or
//! type) becomes a term-frequency vector over a fixed vocabulary. Vectors are
//! stored in Postgres with pgvector and searched by nearest neighbor to find
//! structurally similar code.

pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod fingerprint;
pub mod indexing;
pub mod io;
pub mod parsing;
pub mod storage;
pub mod vector;

pub use config::Settings;
pub use error::{
    FetchError, FetchResult, IngestError, IngestResult, ParseError, ParseResult, StorageError,
    StorageResult, VectorError,
};
pub use fingerprint::{DeclarationFingerprint, DeclarationSelector, FileFingerprint, Fingerprinter};
pub use indexing::{BatchReport, IngestOptions, IngestStats, Ingestor, RepoTarget};
pub use parsing::{GoSourceParser, SourceParser, SyntaxTree};
pub use storage::{
    DeclarationRecord, DeclarationStore, DistanceMetric, MemoryDeclarationStore, NearestMatch,
    PgDeclarationStore,
};
pub use vector::{Embedding, Vocabulary};
