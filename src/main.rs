//! CLI entry point for structural code fingerprinting.
//!
//! Commands: ingest a file, a repository or a batch of repositories, search
//! stored declarations by structural similarity, fetch repositories, and
//! manage the schema, vocabulary and configuration.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use subtreesim::display::{self, THEME};
use subtreesim::error::{FetchError, IngestError};
use subtreesim::fetch::{Fetcher, RepoUrl, read_repo_urls};
use subtreesim::io::{ExitCode, OutputFormat};
use subtreesim::storage::TableName;
use subtreesim::{
    DeclarationSelector, DeclarationStore, Fingerprinter, GoSourceParser, IngestOptions, Ingestor,
    MemoryDeclarationStore, PgDeclarationStore, RepoTarget, Settings, Vocabulary,
};
use tokio_util::sync::CancellationToken;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Structural code fingerprinting and similarity search
#[derive(Parser)]
#[command(
    name = "subtreesim",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find structurally similar Go declarations",
    long_about = "Fingerprint Go declarations by the shape of their syntax trees, store the \
                  fingerprints in Postgres (pgvector) and search them by similarity.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print annotated trees and similarity tables; enables debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<tracing::Level>,

    /// Database connection string (overrides database.url)
    #[arg(long, global = true, env = "SUBTREESIM_DATABASE_URL")]
    database_url: Option<String>,

    /// Vocabulary file (overrides vocabulary.path)
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// Use an in-memory store instead of Postgres; nothing is persisted
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set up .subtreesim directory with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Fingerprint one source file and store its declarations
    #[command(name = "ingest-file")]
    IngestFile {
        /// Source file to ingest
        path: PathBuf,
    },

    /// Fingerprint every source file under a directory
    #[command(name = "ingest-repo")]
    IngestRepo {
        /// Repository checkout
        path: PathBuf,

        /// Parallel file tasks (overrides ingest.file_concurrency)
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Ingest previously fetched repositories listed in a file
    #[command(
        name = "ingest-repos",
        after_help = "Each URL is expected at <repos-base-dir>/<org>/<name>, as laid out by 'fetch'."
    )]
    IngestRepos {
        /// Newline-delimited repository URLs
        #[arg(long)]
        repo_url_file: PathBuf,

        /// Directory holding <org>/<name> checkouts (overrides ingest.repos_base_dir)
        #[arg(long)]
        repos_base_dir: Option<PathBuf>,

        /// Repositories ingested at once (overrides ingest.repo_concurrency)
        #[arg(long)]
        repo_concurrency: Option<usize>,
    },

    /// Report the stored declarations nearest to each declaration of a file
    #[command(name = "search-by-embedding")]
    SearchByEmbedding {
        /// Query source file
        path: PathBuf,

        /// Matches per declaration (overrides search.num_results)
        #[arg(short = 'n', long)]
        num_results: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Clone repositories listed in a file into <dest>/<org>/<name>
    Fetch {
        /// Destination base directory
        #[arg(long)]
        dest: PathBuf,

        /// Newline-delimited repository URLs
        #[arg(long)]
        repo_url_file: PathBuf,

        /// Clones at once (overrides fetch.clone_concurrency)
        #[arg(long)]
        concurrency: Option<usize>,

        /// Clone full history instead of depth 1
        #[arg(long)]
        full: bool,
    },

    /// Drop the declaration table and everything stored in it
    #[command(name = "drop-schema")]
    DropSchema,

    /// Write the grammar's named node kinds, a starting point for a vocabulary file
    Vocabulary {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Init { force } => return init(*force).into(),
        Commands::Config => {
            let settings = match load_settings(&cli) {
                Ok(settings) => settings,
                Err(code) => return code.into(),
            };
            return show_config(&settings).into();
        }
        _ => {}
    }

    let settings = match load_settings(&cli) {
        Ok(settings) => settings,
        Err(code) => return code.into(),
    };
    init_tracing(&cli, &settings);

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing in-flight work");
            signal_token.cancel();
        }
    });

    run(cli, settings, cancel).await.into()
}

fn load_settings(cli: &Cli) -> Result<Settings, ExitCode> {
    let loaded = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    let mut settings = loaded.map_err(|e| {
        eprintln!("{}", THEME.error_with_icon(&format!("Configuration error: {e}")));
        ExitCode::ConfigError
    })?;

    if let Some(url) = &cli.database_url {
        settings.database.url = url.clone();
    }
    if let Some(path) = &cli.vocabulary {
        settings.vocabulary.path = path.clone();
    }
    if cli.verbose {
        settings.debug = true;
    }
    Ok(settings)
}

fn init_tracing(cli: &Cli, settings: &Settings) {
    let level = cli.log_level.unwrap_or(if settings.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    });
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn init(force: bool) -> ExitCode {
    match Settings::init_config_file(force) {
        Ok(path) => {
            println!("Created configuration file at: {}", path.display());
            println!("Edit this file to customize your settings.");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            ExitCode::ConfigError
        }
    }
}

fn show_config(settings: &Settings) -> ExitCode {
    println!("Current Configuration:");
    println!("{}", "=".repeat(50));
    match settings.to_toml() {
        Ok(toml_str) => {
            println!("{toml_str}");
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("Error displaying config: {e}");
            ExitCode::ConfigError
        }
    }
}

async fn run(cli: Cli, settings: Settings, cancel: CancellationToken) -> ExitCode {
    let parser = match GoSourceParser::new() {
        Ok(parser) => parser.with_reject_syntax_errors(settings.ingest.reject_syntax_errors),
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            return ExitCode::GeneralError;
        }
    };

    match cli.command {
        Commands::Vocabulary { output } => return write_vocabulary(&parser, output.as_deref()),
        Commands::Fetch {
            dest,
            repo_url_file,
            concurrency,
            full,
        } => {
            let concurrency = concurrency.unwrap_or(settings.fetch.clone_concurrency);
            let shallow = settings.fetch.shallow && !full;
            return fetch(&dest, &repo_url_file, concurrency, shallow, cancel).await;
        }
        _ => {}
    }

    let vocabulary = match load_vocabulary(&settings) {
        Ok(vocabulary) => Arc::new(vocabulary),
        Err(code) => return code,
    };
    tracing::debug!("vocabulary has {} terms", vocabulary.len());

    let fingerprinter = Arc::new(Fingerprinter::new(
        Arc::clone(&vocabulary),
        DeclarationSelector::new(&settings.ingest.declaration_kinds),
    ));
    let mut options = IngestOptions {
        file_concurrency: settings.ingest.file_concurrency,
        repo_concurrency: settings.ingest.repo_concurrency,
        extensions: settings.ingest.extensions.clone(),
        normalize_embeddings: settings.database.normalize_embeddings,
    };
    match &cli.command {
        Commands::IngestRepo {
            threads: Some(t), ..
        } => options.file_concurrency = *t,
        Commands::IngestRepos {
            repo_concurrency: Some(r),
            ..
        } => options.repo_concurrency = *r,
        _ => {}
    }

    let ctx = CommandContext {
        verbose: cli.verbose,
        settings: &settings,
    };

    if cli.dry_run {
        tracing::info!("dry run: declarations are kept in memory only");
        let store = Arc::new(MemoryDeclarationStore::new(settings.database.distance));
        let ingestor = Ingestor::new(Arc::new(parser), fingerprinter, store, options)
            .with_cancellation(cancel);
        return execute(cli.command, &ingestor, &ctx).await;
    }

    let table = match TableName::new(&settings.database.schema, &settings.database.table) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            return ExitCode::ConfigError;
        }
    };
    let store = match PgDeclarationStore::connect(
        &settings.database.url,
        table,
        vocabulary.dimension(),
        settings.database.distance,
    )
    .await
    {
        Ok(store) => Arc::new(store),
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            return ExitCode::from_storage_error(&e);
        }
    };
    let ingestor =
        Ingestor::new(Arc::new(parser), fingerprinter, store, options).with_cancellation(cancel);
    execute(cli.command, &ingestor, &ctx).await
}

struct CommandContext<'a> {
    verbose: bool,
    settings: &'a Settings,
}

fn load_vocabulary(settings: &Settings) -> Result<Vocabulary, ExitCode> {
    let path = settings.vocabulary_path();
    let result = if !path.exists() && settings.vocabulary.path == Settings::default().vocabulary.path
    {
        tracing::debug!("{} not found, using the bundled Go vocabulary", path.display());
        Vocabulary::bundled_go()
    } else {
        Vocabulary::load(&path)
    };
    result.map_err(|e| {
        eprintln!("{}", THEME.error_with_icon(&e.to_string()));
        ExitCode::ConfigError
    })
}

async fn execute<S>(command: Commands, ingestor: &Ingestor<S>, ctx: &CommandContext<'_>) -> ExitCode
where
    S: DeclarationStore + 'static,
{
    if let Commands::DropSchema = command {
        return match ingestor.store().drop_schema().await {
            Ok(()) => {
                println!("{}", THEME.success_with_icon("Dropped declaration table"));
                ExitCode::Success
            }
            Err(e) => {
                eprintln!("{}", THEME.error_with_icon(&e.to_string()));
                ExitCode::from_storage_error(&e)
            }
        };
    }

    if let Err(e) = ingestor.store().create_schema().await {
        eprintln!("{}", THEME.error_with_icon(&e.to_string()));
        return ExitCode::from_storage_error(&e);
    }

    match command {
        Commands::IngestFile { path } => ingest_file(ingestor, &path, ctx.verbose).await,
        Commands::IngestRepo { path, .. } => ingest_repo(ingestor, &path).await,
        Commands::IngestRepos {
            repo_url_file,
            repos_base_dir,
            ..
        } => {
            let Some(base) = repos_base_dir.or_else(|| ctx.settings.ingest.repos_base_dir.clone())
            else {
                eprintln!(
                    "{}",
                    THEME.error_with_icon(
                        "ingest-repos needs --repos-base-dir or ingest.repos_base_dir"
                    )
                );
                return ExitCode::UsageError;
            };
            ingest_repos(ingestor, &repo_url_file, &base).await
        }
        Commands::SearchByEmbedding {
            path,
            num_results,
            json,
        } => {
            let k = num_results.unwrap_or(ctx.settings.search.num_results);
            search(ingestor, &path, k, OutputFormat::from_json_flag(json), ctx.verbose).await
        }
        Commands::Init { .. }
        | Commands::Config
        | Commands::Fetch { .. }
        | Commands::Vocabulary { .. }
        | Commands::DropSchema => ExitCode::Success,
    }
}

fn report_ingest_error(error: &IngestError) -> ExitCode {
    eprintln!("{}", THEME.error_with_icon(&error.to_string()));
    for suggestion in error.recovery_suggestions() {
        eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
    }
    ExitCode::from_ingest_error(error)
}

fn print_diagnostics(file: &subtreesim::indexing::AnalyzedFile) {
    println!("{}", THEME.apply(&THEME.header, "Annotated tree:"));
    print!("{}", display::render_annotated_tree(&file.tree, &file.fingerprint));
    if !file.declarations().is_empty() {
        println!("\n{}", THEME.apply(&THEME.header, "Declaration similarity:"));
        println!("{}", display::create_similarity_table(file.declarations()));
    }
}

async fn ingest_file<S>(ingestor: &Ingestor<S>, path: &Path, verbose: bool) -> ExitCode
where
    S: DeclarationStore + 'static,
{
    let result = if verbose {
        match ingestor.analyze_file(path).await {
            Ok(analyzed) => {
                print_diagnostics(&analyzed);
                ingestor.persist(&analyzed).await
            }
            Err(e) => Err(e),
        }
    } else {
        ingestor.ingest_file(path).await
    };

    match result {
        Ok(count) => {
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Persisted {count} declarations from {}",
                    path.display()
                ))
            );
            ExitCode::Success
        }
        Err(e) => report_ingest_error(&e),
    }
}

async fn ingest_repo<S>(ingestor: &Ingestor<S>, path: &Path) -> ExitCode
where
    S: DeclarationStore + 'static,
{
    let progress = display::create_progress_bar(0, "files");
    let tracked = ingestor.clone().with_progress(progress.clone());
    let result = tracked.ingest_repo(path).await;
    progress.finish_and_clear();

    match result {
        Ok(stats) => {
            stats.display();
            ExitCode::from_batch(stats.is_success())
        }
        Err(e) => report_ingest_error(&e),
    }
}

async fn ingest_repos<S>(ingestor: &Ingestor<S>, repo_url_file: &Path, base: &Path) -> ExitCode
where
    S: DeclarationStore + 'static,
{
    let urls = match read_repo_urls(repo_url_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            return ExitCode::from_fetch_error(&e);
        }
    };

    let mut targets = Vec::with_capacity(urls.len());
    let mut unresolved: Vec<(String, FetchError)> = Vec::new();
    for url in urls {
        match RepoUrl::parse(&url) {
            Ok(repo) => targets.push(RepoTarget::new(repo.label(), repo.local_path(base))),
            Err(e) => {
                tracing::warn!("{e}");
                unresolved.push((url, e));
            }
        }
    }

    let progress = display::create_progress_bar(0, "files");
    let tracked = ingestor.clone().with_progress(progress.clone());
    let mut report = tracked.ingest_repos(targets).await;
    progress.finish_and_clear();

    for (url, source) in unresolved {
        report.push_unresolved(
            url.clone(),
            IngestError::Fetch {
                label: url,
                source,
            },
        );
    }

    println!("{}", display::create_summary_table(&report));
    for outcome in report.failed_repos() {
        match &outcome.result {
            Ok(stats) => {
                for failure in &stats.failures {
                    eprintln!("{}", THEME.warning_with_icon(&failure.error.to_string()));
                }
            }
            Err(e) => eprintln!("{}", THEME.error_with_icon(&e.to_string())),
        }
    }

    if report.is_success() {
        println!("{}", THEME.success_with_icon("All repositories ingested"));
    } else {
        eprintln!("{}", THEME.warning_with_icon("Some repositories or files failed"));
    }
    ExitCode::from_batch(report.is_success())
}

async fn search<S>(
    ingestor: &Ingestor<S>,
    path: &Path,
    k: usize,
    format: OutputFormat,
    verbose: bool,
) -> ExitCode
where
    S: DeclarationStore + 'static,
{
    let searched = if verbose && !format.is_json() {
        match ingestor.analyze_file(path).await {
            Ok(analyzed) => {
                print_diagnostics(&analyzed);
                ingestor.search_analyzed(analyzed, k).await
            }
            Err(e) => Err(e),
        }
    } else {
        ingestor.search_file(path, k).await
    };

    let hits = match searched {
        Ok(hits) => hits,
        Err(e) => return report_ingest_error(&e),
    };

    if format.is_json() {
        let report = display::SearchReportJson::new(path, &hits);
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("{}", THEME.error_with_icon(&e.to_string()));
                return ExitCode::GeneralError;
            }
        }
    } else if hits.is_empty() {
        println!("No declarations found in {}", path.display());
    } else {
        print!("{}", display::render_search_results(&hits));
    }
    ExitCode::Success
}

async fn fetch(
    dest: &Path,
    repo_url_file: &Path,
    concurrency: usize,
    shallow: bool,
    cancel: CancellationToken,
) -> ExitCode {
    let urls = match read_repo_urls(repo_url_file) {
        Ok(urls) => urls,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&e.to_string()));
            return ExitCode::from_fetch_error(&e);
        }
    };

    let spinner = display::create_spinner(&format!("Cloning {} repositories", urls.len()));
    let report = Fetcher::new(dest, concurrency, shallow)
        .with_cancellation(cancel)
        .fetch_all(urls)
        .await;
    spinner.finish_and_clear();

    for (url, error) in report.failures() {
        eprintln!("{}", THEME.error_with_icon(&format!("{url}: {error}")));
    }

    println!(
        "Cloned {}, already present {}, failed {}",
        report.cloned(),
        report.already_present(),
        report.failures().count()
    );
    if report.is_success() {
        println!("{}", THEME.success_with_icon("All repositories cloned successfully"));
        ExitCode::Success
    } else {
        eprintln!("{}", THEME.warning_with_icon("Some repositories failed to clone"));
        ExitCode::FetchError
    }
}

fn write_vocabulary(parser: &GoSourceParser, output: Option<&Path>) -> ExitCode {
    let kinds = parser.named_node_kinds();
    let content = kinds.join("\n") + "\n";
    let Some(path) = output else {
        print!("{content}");
        return ExitCode::Success;
    };

    match write_file(path, &content) {
        Ok(()) => {
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Wrote {} node kinds to {}",
                    kinds.len(),
                    path.display()
                ))
            );
            ExitCode::Success
        }
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            ExitCode::IoError
        }
    }
}

fn write_file(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
