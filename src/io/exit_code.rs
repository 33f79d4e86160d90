//! Exit codes for CLI operations.
//!
//! - `0`: every unit of work succeeded
//! - `1`: unspecified failure
//! - `2`: usage error (emitted by clap)
//! - `3`: partial failure, some units failed and the rest were kept
//! - `4`-`8`: the whole command failed for a specific reason

use crate::error::{FetchError, IngestError, StorageError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    UsageError = 2,
    PartialFailure = 3,
    ParseError = 4,
    IoError = 5,
    ConfigError = 6,
    StorageError = 7,
    FetchError = 8,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Exit code for a single unit of work that failed outright
    pub fn from_ingest_error(error: &IngestError) -> Self {
        match error {
            IngestError::Parse { source, .. } => match source {
                crate::error::ParseError::FileRead { .. } => ExitCode::IoError,
                _ => ExitCode::ParseError,
            },
            IngestError::Storage { source, .. } => Self::from_storage_error(source),
            IngestError::RepoNotFound { .. } => ExitCode::IoError,
            IngestError::Fetch { .. } => ExitCode::FetchError,
            IngestError::Vectorize { .. }
            | IngestError::WorkerFailed { .. }
            | IngestError::Cancelled { .. } => ExitCode::GeneralError,
        }
    }

    pub fn from_storage_error(_error: &StorageError) -> Self {
        ExitCode::StorageError
    }

    pub fn from_fetch_error(error: &FetchError) -> Self {
        match error {
            FetchError::RepoList { .. } | FetchError::Io { .. } => ExitCode::IoError,
            _ => ExitCode::FetchError,
        }
    }

    /// Exit code for a batch: success, or partial failure when any unit failed
    pub fn from_batch(all_succeeded: bool) -> Self {
        if all_succeeded {
            ExitCode::Success
        } else {
            ExitCode::PartialFailure
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn description(&self) -> &str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::GeneralError => "General error",
            ExitCode::UsageError => "Usage error",
            ExitCode::PartialFailure => "Some units of work failed",
            ExitCode::ParseError => "Parse error",
            ExitCode::IoError => "I/O error",
            ExitCode::ConfigError => "Configuration error",
            ExitCode::StorageError => "Storage error",
            ExitCode::FetchError => "Fetch error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;
    use std::path::PathBuf;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as u8, 0);
        assert_eq!(ExitCode::GeneralError as u8, 1);
        assert_eq!(ExitCode::UsageError as u8, 2);
        assert_eq!(ExitCode::PartialFailure as u8, 3);
        assert_eq!(i32::from(ExitCode::FetchError), 8);
    }

    #[test]
    fn test_from_ingest_error() {
        let parse = IngestError::Parse {
            path: PathBuf::from("a.go"),
            source: ParseError::SyntaxError { line: 1, column: 1 },
        };
        assert_eq!(ExitCode::from_ingest_error(&parse), ExitCode::ParseError);

        let read = IngestError::Parse {
            path: PathBuf::from("a.go"),
            source: ParseError::FileRead {
                path: PathBuf::from("a.go"),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
        };
        assert_eq!(ExitCode::from_ingest_error(&read), ExitCode::IoError);

        let storage = IngestError::Storage {
            path: PathBuf::from("a.go"),
            source: StorageError::SchemaMissing,
        };
        assert_eq!(ExitCode::from_ingest_error(&storage), ExitCode::StorageError);
    }

    #[test]
    fn test_from_batch() {
        assert!(ExitCode::from_batch(true).is_success());
        assert_eq!(ExitCode::from_batch(false), ExitCode::PartialFailure);
    }
}
