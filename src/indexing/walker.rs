//! File system walker for discovering source files to ingest
//!
//! Honors `.gitignore` (with or without a git repository),
//! `.git/info/exclude` and `.subtreesimignore` files. Hidden files are
//! skipped and only configured extensions are returned.

use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Name of the project-specific ignore file
pub const IGNORE_FILE_NAME: &str = ".subtreesimignore";

#[derive(Debug, Clone)]
pub struct FileWalker {
    extensions: Vec<String>,
}

impl FileWalker {
    /// Extensions are matched without the leading dot
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
        }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether a path has one of the configured extensions
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    /// Walk a directory and return the matching files in a stable order
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);
        builder
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false);
        builder.add_custom_ignore_filename(IGNORE_FILE_NAME);

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(target: "walker", "skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| self.accepts(path))
            .collect();
        files.sort();
        files
    }

    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).len()
    }
}
