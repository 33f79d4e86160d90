//! Fetch stage: clone a list of repositories into `<dest>/<org>/<name>`.
//!
//! Clones run on the blocking pool, at most `concurrency` at a time. Every
//! URL gets an outcome; one failure never stops the others.

mod git;
mod repo;

pub use git::{CloneStatus, clone_repository};
pub use repo::{RepoUrl, parse_repo_list, read_repo_urls};

use crate::error::{FetchError, FetchResult};
use crate::indexing::progress::{fill_slots, missing_report_reason};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Outcome for one requested URL
#[derive(Debug)]
pub struct FetchOutcome {
    pub url: String,
    pub destination: Option<PathBuf>,
    pub result: FetchResult<CloneStatus>,
}

/// Outcomes in input order
#[derive(Debug, Default)]
pub struct FetchReport {
    pub outcomes: Vec<FetchOutcome>,
}

impl FetchReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &FetchError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.url.as_str(), e)))
    }

    pub fn cloned(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(CloneStatus::Cloned { .. })))
            .count()
    }

    pub fn already_present(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, Ok(CloneStatus::AlreadyPresent)))
            .count()
    }
}

pub struct Fetcher {
    dest: PathBuf,
    permits: Arc<Semaphore>,
    shallow: bool,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(dest: impl Into<PathBuf>, concurrency: usize, shallow: bool) -> Self {
        Self {
            dest: dest.into(),
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            shallow,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Clone every URL, bounded by the configured concurrency
    pub async fn fetch_all(&self, urls: Vec<String>) -> FetchReport {
        if let Err(source) = std::fs::create_dir_all(&self.dest) {
            let path = self.dest.clone();
            let outcomes = urls
                .into_iter()
                .map(|url| FetchOutcome {
                    url,
                    destination: None,
                    result: Err(FetchError::Io {
                        path: path.clone(),
                        source: std::io::Error::new(source.kind(), source.to_string()),
                    }),
                })
                .collect();
            return FetchReport { outcomes };
        }

        let mut slots: Vec<Option<FetchOutcome>> = Vec::with_capacity(urls.len());
        let requested = urls.clone();
        let mut tasks: JoinSet<(usize, FetchOutcome)> = JoinSet::new();

        for (index, url) in urls.into_iter().enumerate() {
            slots.push(None);

            let repo = match RepoUrl::parse(&url) {
                Ok(repo) => repo,
                Err(e) => {
                    tracing::warn!(target: "fetch", "{e}");
                    slots[index] = Some(FetchOutcome {
                        url,
                        destination: None,
                        result: Err(e),
                    });
                    continue;
                }
            };

            let permits = Arc::clone(&self.permits);
            let cancel = self.cancel.clone();
            let shallow = self.shallow;
            let destination = repo.local_path(&self.dest);
            tasks.spawn(async move {
                let result = clone_bounded(&repo, &destination, shallow, permits, cancel).await;
                match &result {
                    Ok(CloneStatus::Cloned { commit }) => {
                        tracing::info!(target: "fetch", "cloned {} at {commit}", repo.label())
                    }
                    Ok(CloneStatus::AlreadyPresent) => {
                        tracing::info!(target: "fetch", "{} already present", repo.label())
                    }
                    Err(e) => tracing::warn!(target: "fetch", "{e}"),
                }
                (
                    index,
                    FetchOutcome {
                        url,
                        destination: Some(destination),
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
                    tracing::error!(target: "fetch", "clone worker failed: {e}");
                    worker_errors.push(e.to_string());
                }
            }
        }

        let cause = missing_report_reason(&worker_errors);
        let outcomes = fill_slots(slots, |index| FetchOutcome {
            url: requested[index].clone(),
            destination: None,
            result: Err(FetchError::Clone {
                url: requested[index].clone(),
                cause: cause.clone(),
            }),
        });
        FetchReport { outcomes }
    }
}

async fn clone_bounded(
    repo: &RepoUrl,
    destination: &Path,
    shallow: bool,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
) -> FetchResult<CloneStatus> {
    let cancelled = || FetchError::Cancelled {
        url: repo.as_str().to_string(),
    };

    let permit = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(cancelled()),
        permit = permits.acquire_owned() => permit.map_err(|_| cancelled())?,
    };

    let url = repo.as_str().to_string();
    let target = destination.to_path_buf();
    tracing::info!(target: "fetch", "cloning {url} into {}", target.display());
    tokio::task::spawn_blocking(move || {
        let result = clone_repository(&url, &target, shallow, &cancel);
        drop(permit);
        result
    })
    .await
    .map_err(|e| FetchError::Clone {
        url: repo.as_str().to_string(),
        cause: e.to_string(),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fetch_collects_per_url_outcomes() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("upstream/acme/widgets");
        std::fs::create_dir_all(&source).unwrap();
        git::test_support::init_repo_with_commit(&source);

        let dest = temp.path().join("checkouts");
        let fetcher = Fetcher::new(&dest, 2, true);
        let report = fetcher
            .fetch_all(vec![
                "not-a-url".to_string(),
                source.to_str().unwrap().to_string(),
            ])
            .await;

        assert_eq!(report.outcomes.len(), 2);
        assert!(matches!(
            report.outcomes[0].result,
            Err(FetchError::InvalidRepoUrl { .. })
        ));
        assert_eq!(report.cloned(), 1);
        assert!(dest.join("acme/widgets/main.go").exists());
        assert!(!report.is_success());
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_clones_nothing() {
        let temp = TempDir::new().unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let fetcher = Fetcher::new(temp.path(), 1, true).with_cancellation(cancel);
        let report = fetcher
            .fetch_all(vec!["https://example.invalid/org/name".to_string()])
            .await;
        assert!(matches!(
            report.outcomes[0].result,
            Err(FetchError::Cancelled { .. })
        ));
    }
}
