//! Layered configuration.
//!
//! Sources, lowest precedence first:
//! - Default values
//! - `.subtreesim/settings.toml`, found by walking up from the current
//!   directory, or an explicit file
//! - Environment variables
//! - CLI argument overrides (applied by the binary)
//!
//! # Environment Variables
//!
//! Environment variables are prefixed with `SUBTREESIM_` and use double
//! underscores to separate nested levels:
//! - `SUBTREESIM_DATABASE__URL=postgres://...` sets `database.url`
//! - `SUBTREESIM_INGEST__FILE_CONCURRENCY=8` sets `ingest.file_concurrency`

use crate::storage::DistanceMetric;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory holding the settings file
pub const CONFIG_DIR: &str = ".subtreesim";
const SETTINGS_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SUBTREESIM_";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Directory containing `.subtreesim`, detected when not set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VocabularyConfig {
    /// Newline-delimited node-kind list; relative paths resolve against the
    /// workspace root
    #[serde(default = "default_vocabulary_path")]
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    /// libpq-style connection string or postgres:// URL
    #[serde(default = "default_database_url")]
    pub url: String,

    #[serde(default = "default_schema")]
    pub schema: String,

    #[serde(default = "default_table")]
    pub table: String,

    /// Ordering used by nearest-neighbor queries
    #[serde(default)]
    pub distance: DistanceMetric,

    /// Store and query unit-length embeddings, so that `l2` ranks exactly
    /// like cosine
    #[serde(default)]
    pub normalize_embeddings: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestConfig {
    /// Simultaneous parse-and-vectorize tasks
    #[serde(default = "default_file_concurrency")]
    pub file_concurrency: usize,

    /// Simultaneous repositories in `ingest-repos`
    #[serde(default = "default_repo_concurrency")]
    pub repo_concurrency: usize,

    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Node kinds whose subtrees are fingerprinted and stored
    #[serde(default = "default_declaration_kinds")]
    pub declaration_kinds: Vec<String>,

    /// Fail files whose parse tree contains error nodes
    #[serde(default)]
    pub reject_syntax_errors: bool,

    /// Where `ingest-repos` expects `<org>/<name>` checkouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos_base_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FetchConfig {
    /// Simultaneous clone operations
    #[serde(default = "default_clone_concurrency")]
    pub clone_concurrency: usize,

    /// Clone remote repositories with depth 1
    #[serde(default = "default_true")]
    pub shallow: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    /// Stored matches reported per declaration
    #[serde(default = "default_num_results")]
    pub num_results: usize,
}

fn default_version() -> u32 {
    1
}
fn default_vocabulary_path() -> PathBuf {
    PathBuf::from("data/node_types_go.txt")
}
fn default_database_url() -> String {
    "host=localhost port=5432 user=postgres password=password dbname=postgres sslmode=disable"
        .to_string()
}
fn default_schema() -> String {
    "public".to_string()
}
fn default_table() -> String {
    "go_annotated_subtrees".to_string()
}
fn default_file_concurrency() -> usize {
    num_cpus::get()
}
fn default_repo_concurrency() -> usize {
    16
}
fn default_clone_concurrency() -> usize {
    16
}
fn default_extensions() -> Vec<String> {
    vec!["go".to_string()]
}
fn default_declaration_kinds() -> Vec<String> {
    crate::fingerprint::GO_DECLARATION_KINDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}
fn default_true() -> bool {
    true
}
fn default_num_results() -> usize {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            workspace_root: None,
            debug: false,
            vocabulary: VocabularyConfig::default(),
            database: DatabaseConfig::default(),
            ingest: IngestConfig::default(),
            fetch: FetchConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        Self {
            path: default_vocabulary_path(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            schema: default_schema(),
            table: default_table(),
            distance: DistanceMetric::default(),
            normalize_embeddings: false,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            file_concurrency: default_file_concurrency(),
            repo_concurrency: default_repo_concurrency(),
            extensions: default_extensions(),
            declaration_kinds: default_declaration_kinds(),
            reject_syntax_errors: false,
            repos_base_dir: None,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            clone_concurrency: default_clone_concurrency(),
            shallow: true,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            num_results: default_num_results(),
        }
    }
}

fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| key.as_str().to_lowercase().replace("__", ".").into())
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(SETTINGS_FILE));

        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file, still honoring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        let path = path.as_ref();
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(env_provider())
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = path
                        .parent()
                        .filter(|dir| dir.ends_with(CONFIG_DIR))
                        .and_then(Path::parent)
                        .map(Path::to_path_buf);
                }
                settings
            })
    }

    /// Search from the current directory upwards for `.subtreesim/`
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join(SETTINGS_FILE))
    }

    /// Directory that contains `.subtreesim/`
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Resolve a configured path against the workspace root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.workspace_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn vocabulary_path(&self) -> PathBuf {
        self.resolve_path(&self.vocabulary.path)
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Render as TOML, for `subtreesim config`
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Create `.subtreesim/settings.toml` in the current directory with a
    /// commented template
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        Self::init_config_file_in(Path::new("."), force)
    }

    pub fn init_config_file_in(
        dir: &Path,
        force: bool,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = dir.join(CONFIG_DIR).join(SETTINGS_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let defaults = Settings::default();
        let kinds = defaults
            .ingest
            .declaration_kinds
            .iter()
            .map(|k| format!("\"{k}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let template = format!(
            r#"# subtreesim configuration
#
# Every value can be overridden with SUBTREESIM_<SECTION>__<KEY>,
# e.g. SUBTREESIM_DATABASE__URL.

version = 1

# Debug logging
debug = false

[vocabulary]
# Ordered node-kind list. Line order fixes the embedding axes; changing it
# makes previously stored embeddings incomparable.
path = "{vocabulary}"

[database]
url = "{url}"
schema = "{schema}"
table = "{table}"
# "cosine" ranks by 1 - cosine similarity, "l2" by Euclidean distance
distance = "cosine"
# Unit-length embeddings make "l2" rank like cosine. Changing this after
# ingestion makes stored rows incomparable.
normalize_embeddings = false

[ingest]
# Parallel parse-and-vectorize tasks (defaults to CPU count)
# file_concurrency = {files}
repo_concurrency = {repos}
extensions = ["go"]
declaration_kinds = [{kinds}]
# Fail files whose parse tree contains syntax errors
reject_syntax_errors = false
# Directory holding <org>/<name> checkouts for ingest-repos
# repos_base_dir = "/tmp/repos"

[fetch]
clone_concurrency = {clones}
shallow = true

[search]
num_results = 1
"#,
            vocabulary = defaults.vocabulary.path.display(),
            url = defaults.database.url,
            schema = defaults.database.schema,
            table = defaults.database.table,
            files = defaults.ingest.file_concurrency,
            repos = defaults.ingest.repo_concurrency,
            clones = defaults.fetch.clone_concurrency,
        );

        std::fs::write(&config_path, template)?;
        Ok(config_path)
    }
}
