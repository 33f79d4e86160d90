//! Git clone operations using libgit2

use crate::error::{FetchError, FetchResult};
use git2::{
    AutotagOption, Cred, CredentialType, FetchOptions, ProxyOptions, RemoteCallbacks, Repository,
    build::RepoBuilder,
};
use std::path::Path;
use tokio_util::sync::CancellationToken;

/// What a clone request ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneStatus {
    /// Fresh clone checked out at this commit
    Cloned { commit: String },
    /// The destination already held a git repository and was left alone
    AlreadyPresent,
}

/// Clone `repo_url` into `target_dir`.
///
/// Remote clones are shallow when `shallow` is set; local sources are always
/// cloned in full. An existing repository at the target is kept as is, and
/// any other existing non-empty directory is an error. The transfer aborts
/// once `cancel` fires.
pub fn clone_repository(
    repo_url: &str,
    target_dir: &Path,
    shallow: bool,
    cancel: &CancellationToken,
) -> FetchResult<CloneStatus> {
    if Repository::open(target_dir).is_ok() {
        return Ok(CloneStatus::AlreadyPresent);
    }
    if target_dir.exists() && !is_empty_dir(target_dir)? {
        return Err(FetchError::Clone {
            url: repo_url.to_string(),
            cause: format!(
                "destination {} exists and is not a git repository",
                target_dir.display()
            ),
        });
    }

    if let Some(parent) = target_dir.parent() {
        std::fs::create_dir_all(parent).map_err(|source| FetchError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let is_local = repo_url.starts_with("file://") || Path::new(repo_url).exists();

    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(credential_callback);
    callbacks.transfer_progress(|_| !cancel.is_cancelled());

    let mut fetch_opts = FetchOptions::new();
    if shallow && !is_local {
        fetch_opts.depth(1);
    }
    fetch_opts.download_tags(AutotagOption::None);
    fetch_opts.remote_callbacks(callbacks);

    let mut proxy_opts = ProxyOptions::new();
    proxy_opts.auto();
    fetch_opts.proxy_options(proxy_opts);

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_opts);

    let repo = builder.clone(repo_url, target_dir).map_err(|e| {
        if cancel.is_cancelled() {
            FetchError::Cancelled {
                url: repo_url.to_string(),
            }
        } else {
            FetchError::Clone {
                url: repo_url.to_string(),
                cause: e.message().to_string(),
            }
        }
    })?;

    let commit = head_commit(&repo).map_err(|e| FetchError::Clone {
        url: repo_url.to_string(),
        cause: format!("resolve HEAD: {}", e.message()),
    })?;
    Ok(CloneStatus::Cloned { commit })
}

fn is_empty_dir(path: &Path) -> FetchResult<bool> {
    let mut entries = std::fs::read_dir(path).map_err(|source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.next().is_none())
}

fn head_commit(repo: &Repository) -> Result<String, git2::Error> {
    Ok(repo.head()?.peel_to_commit()?.id().to_string())
}

/// Credential callback for git2 authentication
fn credential_callback(
    _url: &str,
    username_from_url: Option<&str>,
    allowed_types: CredentialType,
) -> Result<Cred, git2::Error> {
    if allowed_types.is_ssh_key() {
        if let Ok(cred) = Cred::ssh_key_from_agent(username_from_url.unwrap_or("git")) {
            return Ok(cred);
        }
    }

    if let Ok(cred) = Cred::default() {
        return Ok(cred);
    }

    if allowed_types.is_user_pass_plaintext() {
        if let (Ok(username), Ok(password)) =
            (std::env::var("GIT_USERNAME"), std::env::var("GIT_PASSWORD"))
        {
            return Cred::userpass_plaintext(&username, &password);
        }
    }

    Err(git2::Error::from_str("no credentials available"))
}
