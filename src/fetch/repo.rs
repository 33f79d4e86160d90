//! Repository identifiers and repository list files

use crate::error::{FetchError, FetchResult};
use std::path::{Path, PathBuf};

/// A repository URL with its organization and name.
///
/// Org and name are the last two segments of the URL, split on `/` or `:`
/// so both `https://host/org/name` and `git@host:org/name.git` resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoUrl {
    url: String,
    org: String,
    name: String,
}

impl RepoUrl {
    pub fn parse(url: &str) -> FetchResult<Self> {
        let url = url.trim();
        let invalid = || FetchError::InvalidRepoUrl {
            url: url.to_string(),
        };

        let trimmed = url.trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
        let mut segments = trimmed.rsplit(['/', ':']);
        let name = segments.next().ok_or_else(invalid)?;
        let org = segments.next().ok_or_else(invalid)?;

        if !is_path_segment(org) || !is_path_segment(name) {
            return Err(invalid());
        }

        Ok(Self {
            url: url.to_string(),
            org: org.to_string(),
            name: name.to_string(),
        })
    }

    /// The URL as given
    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn org(&self) -> &str {
        &self.org
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `org/name`
    pub fn label(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }

    /// Checkout location under a base directory: `<base>/<org>/<name>`
    pub fn local_path(&self, base: &Path) -> PathBuf {
        base.join(&self.org).join(&self.name)
    }
}

impl std::fmt::Display for RepoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

fn is_path_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('\\')
}

/// Read a newline-delimited repository list.
///
/// Blank lines and `#` comments are skipped. Entries are returned verbatim so
/// invalid URLs can be reported per item.
pub fn read_repo_urls(path: &Path) -> FetchResult<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|source| FetchError::RepoList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_repo_list(&content))
}

pub fn parse_repo_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
