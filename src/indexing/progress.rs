//! Outcome reporting for ingestion batches

use crate::error::IngestError;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// A unit of work that failed, with its error
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: IngestError,
}

/// Statistics collected while ingesting one repository or file set
#[derive(Debug, Default)]
pub struct IngestStats {
    pub files_ingested: usize,
    pub files_failed: usize,
    /// Files skipped because ingestion was cancelled before they started
    pub files_skipped: usize,
    pub declarations_persisted: usize,
    pub elapsed: Duration,
    /// Every failure, in completion order
    pub failures: Vec<FileFailure>,

    start_time: Option<Instant>,
}

impl IngestStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    pub fn record_success(&mut self, declarations: usize) {
        self.files_ingested += 1;
        self.declarations_persisted += declarations;
    }

    pub fn record_failure(&mut self, path: PathBuf, error: IngestError) {
        self.files_failed += 1;
        self.failures.push(FileFailure { path, error });
    }

    /// Fold another batch into this one; elapsed times are not summed
    pub fn merge(&mut self, other: IngestStats) {
        self.files_ingested += other.files_ingested;
        self.files_failed += other.files_failed;
        self.files_skipped += other.files_skipped;
        self.declarations_persisted += other.declarations_persisted;
        self.failures.extend(other.failures);
    }

    /// True only if every unit succeeded and nothing was skipped
    pub fn is_success(&self) -> bool {
        self.files_failed == 0 && self.files_skipped == 0
    }

    pub fn files_total(&self) -> usize {
        self.files_ingested + self.files_failed + self.files_skipped
    }

    /// Display the statistics in a human-readable format
    pub fn display(&self) {
        println!("\nIngestion Complete:");
        println!("  Files ingested: {}", self.files_ingested);
        println!("  Files failed: {}", self.files_failed);
        if self.files_skipped > 0 {
            println!("  Files skipped: {}", self.files_skipped);
        }
        println!("  Declarations persisted: {}", self.declarations_persisted);
        println!("  Time elapsed: {:.2}s", self.elapsed.as_secs_f64());

        if self.files_ingested > 0 && self.elapsed.as_secs_f64() > 0.0 {
            let files_per_sec = self.files_ingested as f64 / self.elapsed.as_secs_f64();
            println!("  Performance: {files_per_sec:.0} files/second");
        }

        if !self.failures.is_empty() {
            println!("\nErrors (showing first {}):", self.failures.len().min(5));
            for failure in self.failures.iter().take(5) {
                println!("  {}: {}", failure.path.display(), failure.error);
            }
            if self.failures.len() > 5 {
                println!("  ... and {} more errors", self.failures.len() - 5);
            }
        }
    }
}

/// Results of concurrent workers, back in input order.
///
/// A slot its worker never filled (the task panicked or was aborted) gets
/// `missing(index)`, so every input still appears in the report.
pub(crate) fn fill_slots<T>(slots: Vec<Option<T>>, mut missing: impl FnMut(usize) -> T) -> Vec<T> {
    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| missing(index)))
        .collect()
}

/// Reason attached to inputs whose worker died without reporting
pub(crate) fn missing_report_reason(join_errors: &[String]) -> String {
    if join_errors.is_empty() {
        "worker exited without reporting".to_string()
    } else {
        join_errors.join("; ")
    }
}
