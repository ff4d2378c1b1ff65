//! # Sermon Library CLI (`sermon`)
//!
//! The `sermon` binary drives the indexing pipeline and exposes the query
//! layer on the command line. The interactive dashboard consumes the same
//! library API; this binary is the scriptable surface.
//!
//! ## Usage
//!
//! ```bash
//! sermon --config ./config/sermon.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `sermon init` | Create the SQLite database and run schema migrations |
//! | `sermon sync` | Scan the archive folder and index new/changed files |
//! | `sermon search "<query>"` | Search indexed sermons |
//! | `sermon list` | List every indexed sermon |
//! | `sermon stats` | Aggregate index statistics |
//! | `sermon text` | Dump all extracted content (word-cloud feed) |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sermon_library::progress::ProgressMode;
use sermon_library::{config, db, migrate, query, sync};

/// Sermon Library CLI: a local sermon archive indexer with scripture
/// tagging and incremental sync.
#[derive(Parser)]
#[command(
    name = "sermon",
    about = "Sermon Library — index a folder of sermon documents into a searchable local store",
    version,
    long_about = "Sermon Library extracts plain text from docx/hwp/hwpx/pdf/txt documents, \
    derives dates and scripture references, and keeps a SQLite index synchronized with the \
    archive folder across runs."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/sermon.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and the sermons table. Idempotent;
    /// running it multiple times is safe.
    Init,

    /// Scan the archive folder and index new or changed files.
    ///
    /// Unchanged files are skipped via their modification-time fingerprint;
    /// records for deleted files are removed. The pass always completes and
    /// reports counts.
    Sync {
        /// Extraction worker pool size (overrides `[sync] workers`).
        #[arg(long)]
        jobs: Option<usize>,

        /// Progress output on stderr: `off`, `human`, or `json`.
        /// Defaults to `human` when stderr is a TTY.
        #[arg(long)]
        progress: Option<String>,
    },

    /// Search indexed sermons.
    ///
    /// Matches the query against title and content substrings; `--book`
    /// filters to records tagged with any of the given canonical books.
    Search {
        /// Free-text query. May be empty when filtering by book only.
        #[arg(default_value = "")]
        query: String,

        /// Canonical book name filter; repeat for OR semantics.
        #[arg(long = "book")]
        books: Vec<String>,

        /// Sort by canonical scripture order (book, then chapter) instead of
        /// date descending.
        #[arg(long)]
        by_book: bool,

        /// Zero-based result page (fixed page size from `[search] per_page`).
        #[arg(long, default_value_t = 0)]
        page: usize,
    },

    /// List every indexed sermon.
    List {
        /// Sort oldest first instead of newest first.
        #[arg(long)]
        oldest_first: bool,
    },

    /// Aggregate index statistics: totals, untagged count, per-book
    /// frequencies split into Old/New Testament.
    Stats,

    /// Dump the concatenation of all extracted content to stdout, for
    /// downstream keyword extraction or word-cloud rendering.
    Text,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let pool = db::connect(&cfg).await?;
            migrate::run_migrations(&pool).await?;
            pool.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Sync { jobs, progress } => {
            if let Some(jobs) = jobs {
                cfg.sync.workers = jobs.max(1);
            }
            let mode = match progress.as_deref() {
                None => ProgressMode::default_for_tty(),
                Some("off") => ProgressMode::Off,
                Some("human") => ProgressMode::Human,
                Some("json") => ProgressMode::Json,
                Some(other) => {
                    anyhow::bail!("Unknown progress mode: '{}'. Use off, human, or json.", other)
                }
            };
            let reporter = mode.reporter();
            let report = sync::run_sync(&cfg, reporter.as_ref()).await?;
            println!("sync");
            println!("  files scanned: {}", report.total);
            println!("  updated: {}", report.updated);
            println!("  deleted: {}", report.deleted);
            println!("  {}", report.message);
            println!("ok");
        }
        Commands::Search {
            query,
            books,
            by_book,
            page,
        } => {
            let pool = db::connect(&cfg).await?;
            let rows = query::search(&pool, &query, &books, !by_book).await?;
            let paged = query::paginate(&rows, page, cfg.search.per_page);
            println!(
                "results: {} (page {} / {})",
                paged.total,
                paged.index + 1,
                paged.total_pages.max(1)
            );
            for record in paged.items {
                print_record_line(record);
            }
            pool.close().await;
        }
        Commands::List { oldest_first } => {
            let pool = db::connect(&cfg).await?;
            let rows = query::list_all(&pool, !oldest_first).await?;
            println!("records: {}", rows.len());
            for record in &rows {
                print_record_line(record);
            }
            pool.close().await;
        }
        Commands::Stats => {
            let pool = db::connect(&cfg).await?;
            let stats = query::stats(&pool).await?;
            println!("Sermon Library — Index Stats");
            println!("============================");
            println!();
            println!("  Sermons:       {}", stats.total);
            println!("  Untagged:      {}", stats.untagged);
            println!("  Old Testament: {}", stats.old_testament_total);
            println!("  New Testament: {}", stats.new_testament_total);
            let tagged: Vec<&(String, i64)> = stats
                .book_counts
                .iter()
                .filter(|(_, count)| *count > 0)
                .collect();
            if !tagged.is_empty() {
                println!();
                println!("  By book:");
                for (book, count) in tagged {
                    println!("    {:<12} {:>6}", book, count);
                }
            }
            pool.close().await;
        }
        Commands::Text => {
            let pool = db::connect(&cfg).await?;
            println!("{}", query::all_text(&pool).await?);
            pool.close().await;
        }
    }

    Ok(())
}

fn print_record_line(record: &sermon_library::models::SermonRecord) {
    let date = record.date.as_deref().unwrap_or("----------");
    let tags = if record.bible_tags.is_empty() {
        "-".to_string()
    } else {
        record.bible_tags.clone()
    };
    println!("  {}  [{}]  {}  ({})", date, tags, record.title, record.file_name);
}
