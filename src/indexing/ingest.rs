//! Concurrent ingestion of files, repositories and repository batches.
//!
//! Two independent semaphores bound the work in flight: one for
//! parse-and-vectorize tasks, one for whole repositories. Permits are owned
//! by the task that uses them, so they are released on every exit path,
//! panics included.
//!
//! Failures are collected per unit of work and never abort sibling units.
//! Cancellation is checked between files and between repositories; a file
//! that has started is always finished.

use super::progress::{IngestStats, fill_slots, missing_report_reason};
use super::walker::FileWalker;
use crate::error::{IngestError, IngestResult, ParseError};
use crate::fingerprint::{DeclarationFingerprint, FileFingerprint, Fingerprinter};
use crate::parsing::{SourceParser, SyntaxTree};
use crate::storage::{DeclarationRecord, DeclarationStore, NearestMatch};
use crate::vector::Embedding;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Concurrency and discovery knobs for an [`Ingestor`]
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub file_concurrency: usize,
    pub repo_concurrency: usize,
    pub extensions: Vec<String>,
    /// Scale embeddings to unit length before storing and querying
    pub normalize_embeddings: bool,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            file_concurrency: num_cpus::get(),
            repo_concurrency: 16,
            extensions: vec!["go".to_string()],
            normalize_embeddings: false,
        }
    }
}

/// One parsed and fingerprinted source file
#[derive(Debug)]
pub struct AnalyzedFile {
    pub path: PathBuf,
    pub tree: SyntaxTree,
    pub fingerprint: FileFingerprint,
}

impl AnalyzedFile {
    pub fn declarations(&self) -> &[DeclarationFingerprint] {
        &self.fingerprint.declarations
    }

    /// Records in declaration order
    pub fn records(&self) -> impl Iterator<Item = DeclarationRecord> + '_ {
        self.fingerprint
            .declarations
            .iter()
            .map(|d| DeclarationRecord::from_fingerprint(&self.path, d))
    }
}

/// A local repository checkout to ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTarget {
    /// Name used in reports, e.g. `org/name`
    pub label: String,
    pub path: PathBuf,
}

impl RepoTarget {
    pub fn new(label: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
        }
    }
}

/// Outcome of one repository within a batch
#[derive(Debug)]
pub struct RepoOutcome {
    pub label: String,
    pub path: PathBuf,
    pub result: IngestResult<IngestStats>,
}

impl RepoOutcome {
    /// The repository was processed and every file in it succeeded
    pub fn is_success(&self) -> bool {
        matches!(&self.result, Ok(stats) if stats.is_success())
    }
}

/// Result of a repository batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub repos: Vec<RepoOutcome>,
}

impl BatchReport {
    /// Record a repository that failed before ingestion could start
    pub fn push_unresolved(&mut self, label: impl Into<String>, error: IngestError) {
        self.repos.push(RepoOutcome {
            label: label.into(),
            path: PathBuf::new(),
            result: Err(error),
        });
    }

    pub fn is_success(&self) -> bool {
        self.repos.iter().all(RepoOutcome::is_success)
    }

    pub fn failed_repos(&self) -> impl Iterator<Item = &RepoOutcome> {
        self.repos.iter().filter(|r| !r.is_success())
    }

    /// File-level totals across every repository that was processed
    pub fn totals(&self) -> IngestStats {
        let mut totals = IngestStats::default();
        for outcome in &self.repos {
            if let Ok(stats) = &outcome.result {
                totals.files_ingested += stats.files_ingested;
                totals.files_failed += stats.files_failed;
                totals.files_skipped += stats.files_skipped;
                totals.declarations_persisted += stats.declarations_persisted;
                totals.elapsed = totals.elapsed.max(stats.elapsed);
            }
        }
        totals
    }
}

/// Stored matches for one declaration of a query file
#[derive(Debug)]
pub struct SearchHit {
    pub declaration: DeclarationFingerprint,
    pub matches: Vec<NearestMatch>,
}

/// Drives parsing, fingerprinting and persistence with bounded concurrency
pub struct Ingestor<S> {
    parser: Arc<dyn SourceParser>,
    fingerprinter: Arc<Fingerprinter>,
    store: Arc<S>,
    walker: FileWalker,
    file_permits: Arc<Semaphore>,
    repo_permits: Arc<Semaphore>,
    cancel: CancellationToken,
    progress: Option<ProgressBar>,
    normalize_embeddings: bool,
}

impl<S> Clone for Ingestor<S> {
    fn clone(&self) -> Self {
        Self {
            parser: Arc::clone(&self.parser),
            fingerprinter: Arc::clone(&self.fingerprinter),
            store: Arc::clone(&self.store),
            walker: self.walker.clone(),
            file_permits: Arc::clone(&self.file_permits),
            repo_permits: Arc::clone(&self.repo_permits),
            cancel: self.cancel.clone(),
            progress: self.progress.clone(),
            normalize_embeddings: self.normalize_embeddings,
        }
    }
}

impl<S> Ingestor<S>
where
    S: DeclarationStore + 'static,
{
    pub fn new(
        parser: Arc<dyn SourceParser>,
        fingerprinter: Arc<Fingerprinter>,
        store: Arc<S>,
        options: IngestOptions,
    ) -> Self {
        Self {
            parser,
            fingerprinter,
            store,
            walker: FileWalker::new(&options.extensions),
            file_permits: Arc::new(Semaphore::new(options.file_concurrency.max(1))),
            repo_permits: Arc::new(Semaphore::new(options.repo_concurrency.max(1))),
            cancel: CancellationToken::new(),
            progress: None,
            normalize_embeddings: options.normalize_embeddings,
        }
    }

    /// Share an external cancellation signal
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Report per-file completion on a progress bar
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fingerprinter(&self) -> &Fingerprinter {
        &self.fingerprinter
    }

    pub fn walker(&self) -> &FileWalker {
        &self.walker
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Read, parse and fingerprint one file on the current thread
    pub fn analyze_file_blocking(&self, path: &Path) -> IngestResult<AnalyzedFile> {
        let source = std::fs::read(path).map_err(|source| IngestError::Parse {
            path: path.to_path_buf(),
            source: ParseError::FileRead {
                path: path.to_path_buf(),
                source,
            },
        })?;
        let tree = self
            .parser
            .parse(source)
            .map_err(|source| IngestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        let fingerprint = self.fingerprinter.fingerprint(&tree);

        tracing::debug!(
            target: "ingest",
            "{}: {} nodes, {} declarations",
            path.display(),
            tree.len(),
            fingerprint.declarations.len()
        );

        Ok(AnalyzedFile {
            path: path.to_path_buf(),
            tree,
            fingerprint,
        })
    }

    /// Parse and fingerprint one file on the blocking pool
    pub async fn analyze_file(&self, path: &Path) -> IngestResult<AnalyzedFile> {
        let this = self.clone();
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || this.analyze_file_blocking(&owned))
            .await
            .map_err(|e| IngestError::WorkerFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
    }

    /// Persist every declaration of an analyzed file, in declaration order.
    ///
    /// Stops at the first failed insert; records already written stay.
    pub async fn persist(&self, file: &AnalyzedFile) -> IngestResult<usize> {
        let mut written = 0;
        for mut record in file.records() {
            record.embedding = self.storage_embedding(&file.path, &record.embedding)?;
            self.store
                .insert(record)
                .await
                .map_err(|source| IngestError::Storage {
                    path: file.path.clone(),
                    source,
                })?;
            written += 1;
        }
        Ok(written)
    }

    /// Ingest a single file; returns the number of records persisted
    pub async fn ingest_file(&self, path: &Path) -> IngestResult<usize> {
        let _permit = self.acquire_file_permit(path).await?;
        self.ingest_file_unbounded(path).await
    }

    async fn ingest_file_unbounded(&self, path: &Path) -> IngestResult<usize> {
        let analyzed = self.analyze_file(path).await?;
        self.persist(&analyzed).await
    }

    async fn acquire_file_permit(&self, path: &Path) -> IngestResult<OwnedSemaphorePermit> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(IngestError::Cancelled { path: path.to_path_buf() }),
            permit = Arc::clone(&self.file_permits).acquire_owned() => {
                permit.map_err(|e| IngestError::WorkerFailed {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Ingest every matching file under `root` in parallel.
    ///
    /// Individual file failures are recorded in the returned stats; only a
    /// missing root fails the whole repository.
    pub async fn ingest_repo(&self, root: &Path) -> IngestResult<IngestStats> {
        if !root.is_dir() {
            return Err(IngestError::RepoNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut stats = IngestStats::new();
        let walk_root = root.to_path_buf();
        let walker = self.walker.clone();
        let files = tokio::task::spawn_blocking(move || walker.walk(&walk_root))
            .await
            .map_err(|e| IngestError::WorkerFailed {
                path: root.to_path_buf(),
                reason: e.to_string(),
            })?;

        tracing::info!(target: "ingest", "ingesting {} ({} files)", root.display(), files.len());
        if let Some(pb) = &self.progress {
            pb.inc_length(files.len() as u64);
        }

        let total = files.len();
        let mut tasks: JoinSet<(PathBuf, IngestResult<usize>)> = JoinSet::new();
        for (index, path) in files.into_iter().enumerate() {
            let permit = match self.acquire_file_permit(&path).await {
                Ok(permit) => permit,
                Err(IngestError::Cancelled { .. }) => {
                    stats.files_skipped += total - index;
                    tracing::warn!(
                        target: "ingest",
                        "cancelled, skipping {} remaining files in {}",
                        total - index,
                        root.display()
                    );
                    break;
                }
                Err(e) => {
                    stats.record_failure(path, e);
                    continue;
                }
            };

            let this = self.clone();
            tasks.spawn(async move {
                let result = this.ingest_file_unbounded(&path).await;
                drop(permit);
                (path, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((path, Ok(count))) => {
                    stats.record_success(count);
                    tracing::debug!(target: "ingest", "{}: persisted {count} declarations", path.display());
                }
                Ok((path, Err(e))) => {
                    tracing::warn!(target: "ingest", "{e}");
                    stats.record_failure(path, e);
                }
                Err(e) => {
                    let error = IngestError::WorkerFailed {
                        path: root.to_path_buf(),
                        reason: e.to_string(),
                    };
                    tracing::warn!(target: "ingest", "{error}");
                    stats.record_failure(root.to_path_buf(), error);
                }
            }
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        stats.stop_timing();
        tracing::info!(
            target: "ingest",
            "finished {}: {} ingested, {} failed, {} declarations",
            root.display(),
            stats.files_ingested,
            stats.files_failed,
            stats.declarations_persisted
        );
        Ok(stats)
    }

    /// Ingest many repositories with bounded concurrency.
    ///
    /// Runs to completion regardless of individual failures; outcomes are
    /// returned in input order.
    pub async fn ingest_repos(&self, targets: Vec<RepoTarget>) -> BatchReport {
        let mut slots: Vec<Option<RepoOutcome>> = Vec::with_capacity(targets.len());
        let mut pending: Vec<(String, PathBuf)> = Vec::with_capacity(targets.len());
        let mut tasks: JoinSet<(usize, RepoOutcome)> = JoinSet::new();

        for (index, target) in targets.into_iter().enumerate() {
            slots.push(None);
            pending.push((target.label.clone(), target.path.clone()));
            let this = self.clone();
            tasks.spawn(async move {
                let result = this.ingest_repo_bounded(&target.path).await;
                if let Err(e) = &result {
                    tracing::warn!(target: "ingest", "{}: {e}", target.label);
                }
                (
                    index,
                    RepoOutcome {
                        label: target.label,
                        path: target.path,
                        result,
                    },
                )
            });
        }

        let mut worker_errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => slots[index] = Some(outcome),
                Err(e) => {
                    tracing::error!(target: "ingest", "repository worker failed: {e}");
                    worker_errors.push(e.to_string());
                }
            }
        }

        let reason = missing_report_reason(&worker_errors);
        let repos = fill_slots(slots, |index| {
            let (label, path) = pending[index].clone();
            RepoOutcome {
                label,
                path: path.clone(),
                result: Err(IngestError::WorkerFailed {
                    path,
                    reason: reason.clone(),
                }),
            }
        });
        BatchReport { repos }
    }

    async fn ingest_repo_bounded(&self, root: &Path) -> IngestResult<IngestStats> {
        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return Err(IngestError::Cancelled { path: root.to_path_buf() });
            }
            permit = Arc::clone(&self.repo_permits).acquire_owned() => {
                permit.map_err(|e| IngestError::WorkerFailed {
                    path: root.to_path_buf(),
                    reason: e.to_string(),
                })?
            }
        };
        self.ingest_repo(root).await
    }

    /// Embedding as it goes to the store: checked against the vocabulary
    /// dimension, then scaled to unit length if configured
    fn storage_embedding(&self, path: &Path, embedding: &Embedding) -> IngestResult<Embedding> {
        self.fingerprinter
            .vocabulary()
            .dimension()
            .validate_vector(embedding.as_slice())
            .map_err(|source| IngestError::Vectorize {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(if self.normalize_embeddings {
            embedding.normalized()
        } else {
            embedding.clone()
        })
    }

    /// Fingerprint a file and look up the nearest stored declarations for
    /// each of its declaration roots
    pub async fn search_file(&self, path: &Path, k: usize) -> IngestResult<Vec<SearchHit>> {
        let analyzed = self.analyze_file(path).await?;
        self.search_analyzed(analyzed, k).await
    }

    /// Nearest stored declarations for an already analyzed file
    pub async fn search_analyzed(
        &self,
        analyzed: AnalyzedFile,
        k: usize,
    ) -> IngestResult<Vec<SearchHit>> {
        let path = analyzed.path;
        let mut hits = Vec::with_capacity(analyzed.fingerprint.declarations.len());
        for declaration in analyzed.fingerprint.declarations {
            let query = self.storage_embedding(&path, &declaration.embedding)?;
            let matches = self
                .store
                .query_nearest(&query, k)
                .await
                .map_err(|source| IngestError::Storage {
                    path: path.clone(),
                    source,
                })?;
            hits.push(SearchHit {
                declaration,
                matches,
            });
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::DeclarationSelector;
    use crate::storage::{DistanceMetric, MemoryDeclarationStore};
    use crate::vector::Vocabulary;
    use std::fs;
    use tempfile::TempDir;

    /// Treats each line as a declaration; fails on lines equal to "!".
    struct LineParser;

    impl SourceParser for LineParser {
        fn language_name(&self) -> &str {
            "lines"
        }

        fn extensions(&self) -> &[&str] {
            &["go"]
        }

        fn parse(&self, source: Vec<u8>) -> crate::error::ParseResult<SyntaxTree> {
            let text = String::from_utf8(source).map_err(|e| ParseError::InvalidUtf8 {
                valid_up_to: e.utf8_error().valid_up_to(),
            })?;
            let mut builder = SyntaxTree::builder(text.clone());
            let root = builder.root("source_file", 0..text.len());
            let mut offset = 0;
            for (line_no, line) in text.split_inclusive('\n').enumerate() {
                if line.trim() == "!" {
                    return Err(ParseError::SyntaxError {
                        line: line_no as u32 + 1,
                        column: 1,
                    });
                }
                if !line.trim().is_empty() {
                    let decl = builder.child(
                        root,
                        "function_declaration",
                        true,
                        offset..offset + line.trim_end().len(),
                    );
                    builder.child(decl, "identifier", true, offset..offset + 1);
                }
                offset += line.len();
            }
            Ok(builder.build())
        }
    }

    fn ingestor(store: Arc<MemoryDeclarationStore>) -> Ingestor<MemoryDeclarationStore> {
        ingestor_with(store, false)
    }

    fn ingestor_with(
        store: Arc<MemoryDeclarationStore>,
        normalize_embeddings: bool,
    ) -> Ingestor<MemoryDeclarationStore> {
        let vocab = Vocabulary::new(["function_declaration", "identifier"]).unwrap();
        Ingestor::new(
            Arc::new(LineParser),
            Arc::new(Fingerprinter::new(
                Arc::new(vocab),
                DeclarationSelector::go(),
            )),
            store,
            IngestOptions {
                file_concurrency: 2,
                repo_concurrency: 2,
                extensions: vec!["go".to_string()],
                normalize_embeddings,
            },
        )
    }

    #[tokio::test]
    async fn test_ingest_file_persists_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "first\nsecond\n").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let count = ingestor(Arc::clone(&store)).ingest_file(&path).await.unwrap();
        assert_eq!(count, 2);

        let records = store.records();
        assert_eq!(records[0].raw_text, "first");
        assert_eq!(records[0].start_row, 0);
        assert_eq!(records[1].raw_text, "second");
        assert_eq!(records[1].start_row, 1);
        assert_eq!(records[0].canonical, "function_declaration:identifier");
    }

    #[tokio::test]
    async fn test_repo_failures_do_not_abort_siblings() {
        let dir = TempDir::new().unwrap();
        for i in 0..4 {
            fs::write(dir.path().join(format!("ok{i}.go")), "decl\n").unwrap();
        }
        fs::write(dir.path().join("bad.go"), "!\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "decl\n").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let stats = ingestor(Arc::clone(&store))
            .ingest_repo(dir.path())
            .await
            .unwrap();

        assert_eq!(stats.files_ingested, 4);
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.declarations_persisted, 4);
        assert!(stats.failures[0].error.is_parse_error());
        assert!(!stats.is_success());
        assert_eq!(store.len(), 4);
    }

    #[tokio::test]
    async fn test_storage_failure_is_per_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "decl\n").unwrap();

        // No schema: every insert fails
        let store = Arc::new(MemoryDeclarationStore::new(DistanceMetric::Cosine));
        let stats = ingestor(store).ingest_repo(dir.path()).await.unwrap();
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.failures[0].error.status_code(), "STORAGE_ERROR");
    }

    #[tokio::test]
    async fn test_cancelled_repo_skips_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.go"), "decl\n").unwrap();
        fs::write(dir.path().join("b.go"), "decl\n").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let stats = ingestor(Arc::clone(&store))
            .with_cancellation(cancel)
            .ingest_repo(dir.path())
            .await
            .unwrap();
        assert_eq!(stats.files_skipped, 2);
        assert_eq!(stats.files_ingested, 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order_and_reports_missing_repo() {
        let dir = TempDir::new().unwrap();
        let repo = dir.path().join("org/repo");
        fs::create_dir_all(&repo).unwrap();
        fs::write(repo.join("a.go"), "decl\n").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let report = ingestor(store)
            .ingest_repos(vec![
                RepoTarget::new("org/missing", dir.path().join("org/missing")),
                RepoTarget::new("org/repo", &repo),
            ])
            .await;

        assert_eq!(report.repos.len(), 2);
        assert_eq!(report.repos[0].label, "org/missing");
        assert!(matches!(
            report.repos[0].result,
            Err(IngestError::RepoNotFound { .. })
        ));
        assert!(report.repos[1].is_success());
        assert!(!report.is_success());
        assert_eq!(report.failed_repos().count(), 1);
        assert_eq!(report.totals().declarations_persisted, 1);
    }

    #[tokio::test]
    async fn test_search_file_finds_ingested_declaration() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "decl\n").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let ingestor = ingestor(store);
        ingestor.ingest_file(&path).await.unwrap();

        let hits = ingestor.search_file(&path, 3).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matches.len(), 1);
        assert_eq!(hits[0].matches[0].raw_text, "decl");
        assert!(hits[0].matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_search_reuses_analyzed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "one
two
").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let ingestor = ingestor(store);
        ingestor.ingest_file(&path).await.unwrap();

        let analyzed = ingestor.analyze_file(&path).await.unwrap();
        // the file is gone, so only the analyzed copy can answer
        fs::remove_file(&path).unwrap();
        let hits = ingestor.search_analyzed(analyzed, 1).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[1].declaration.raw_text, "two");
        assert!(hits[1].matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_normalized_embeddings_are_stored_and_queried() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "one
").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::L2));
        let ingestor = ingestor_with(Arc::clone(&store), true);
        ingestor.ingest_file(&path).await.unwrap();

        let records = store.records();
        assert!((records[0].embedding.norm() - 1.0).abs() < 1e-6);

        let hits = ingestor.search_file(&path, 1).await.unwrap();
        assert!(hits[0].matches[0].distance.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_embedding_outside_vocabulary_dimension_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.go");
        fs::write(&path, "one
").unwrap();

        let store = Arc::new(MemoryDeclarationStore::with_schema(DistanceMetric::Cosine));
        let ingestor = ingestor(Arc::clone(&store));
        let mut analyzed = ingestor.analyze_file(&path).await.unwrap();
        analyzed.fingerprint.declarations[0].embedding = Embedding::new(vec![1.0]).unwrap();

        let err = ingestor.persist(&analyzed).await.unwrap_err();
        assert!(matches!(err, IngestError::Vectorize { .. }));
        assert!(store.is_empty());
    }
}
