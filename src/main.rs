//! # ECLI Dashboard CLI (`ecli`)
//!
//! Command-line access to the corpus statistics and query engine, plus the
//! JSON API server used by the browser dashboard.
//!
//! ## Usage
//!
//! ```bash
//! ecli --config ./config/ecli.toml <command>
//! ecli --db ./ecli_test.db <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ecli init` | Create the SQLite database and schema |
//! | `ecli seed` | Insert sample documents into an empty corpus |
//! | `ecli stats` | Show corpus statistics (`--refresh` writes a new snapshot) |
//! | `ecli courts` | Document counts per court |
//! | `ecli years` | Document counts per year |
//! | `ecli metrics` | Page count and size per document |
//! | `ecli recent` | Most recently added documents |
//! | `ecli get <ECLI>` | Show one document |
//! | `ecli search` | Filter documents by court, year and page range |
//! | `ecli feedback` | Record user feedback |
//! | `ecli serve` | Start the JSON HTTP API |

use clap::{Parser, Subcommand};
use std::num::NonZeroU32;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ecli_dashboard::config::{self, Config};
use ecli_dashboard::models::FeedbackRecord;
use ecli_dashboard::search::SearchFilter;
use ecli_dashboard::{aggregate, feedback, get, migrate, recent, search, seed, server, stats};

/// ECLI Dashboard CLI: statistics and search over an ECLI document index.
#[derive(Parser)]
#[command(
    name = "ecli",
    about = "ECLI Dashboard: corpus statistics and search over an ECLI document metadata index",
    version
)]
struct Cli {
    /// Path to a configuration file (TOML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding `[db].path` from the configuration.
    #[arg(long, global = true, env = "ECLI_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database file and schema. Safe to run repeatedly.
    Init,

    /// Insert sample documents when the corpus is empty, then write a snapshot.
    Seed,

    /// Show corpus statistics.
    Stats {
        /// Recompute from the raw tables and store a new snapshot first.
        #[arg(long)]
        refresh: bool,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Document counts per court, most populous first.
    Courts,

    /// Document counts per year, ascending.
    Years,

    /// Page count and file size per document with metrics.
    Metrics,

    /// Most recently added documents.
    Recent {
        /// Maximum number of documents (defaults to `[dashboard].recent_limit`).
        #[arg(long)]
        limit: Option<NonZeroU32>,
    },

    /// Show a document by its ECLI identifier.
    Get {
        /// ECLI identifier.
        ecli_id: String,
    },

    /// Filter documents. Every given option must match.
    Search {
        /// Exact court code.
        #[arg(long)]
        court: Option<String>,

        /// Exact year.
        #[arg(long)]
        year: Option<String>,

        /// Minimum page count (inclusive).
        #[arg(long)]
        min_pages: Option<String>,

        /// Maximum page count (inclusive).
        #[arg(long)]
        max_pages: Option<String>,
    },

    /// Record user feedback.
    Feedback {
        /// Feedback category (e.g. `bug`, `suggestion`).
        #[arg(long = "type")]
        feedback_type: Option<String>,

        #[arg(long)]
        rating: Option<i64>,

        #[arg(long)]
        comment: Option<String>,

        /// ECLI identifier the feedback refers to.
        #[arg(long)]
        document: Option<String>,
    },

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ecli_dashboard=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => Config::default(),
    };

    Ok(match &cli.db {
        Some(path) => cfg.with_db_path(path),
        None => cfg,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let cfg = resolve_config(&cli)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Seed => {
            seed::run_seed(&cfg).await?;
        }
        Commands::Stats { refresh, json } => {
            stats::run_stats(&cfg, refresh, json).await?;
        }
        Commands::Courts => {
            aggregate::run_courts(&cfg).await?;
        }
        Commands::Years => {
            aggregate::run_years(&cfg).await?;
        }
        Commands::Metrics => {
            aggregate::run_metrics(&cfg).await?;
        }
        Commands::Recent { limit } => {
            let limit = match limit {
                Some(l) => l,
                None => NonZeroU32::new(cfg.dashboard.recent_limit)
                    .ok_or_else(|| anyhow::anyhow!("dashboard.recent_limit must be >= 1"))?,
            };
            recent::run_recent(&cfg, limit).await?;
        }
        Commands::Get { ecli_id } => {
            get::run_get(&cfg, &ecli_id).await?;
        }
        Commands::Search {
            court,
            year,
            min_pages,
            max_pages,
        } => {
            let filter = SearchFilter {
                court,
                year,
                min_pages,
                max_pages,
            };
            search::run_search(&cfg, &filter).await?;
        }
        Commands::Feedback {
            feedback_type,
            rating,
            comment,
            document,
        } => {
            let mut record = FeedbackRecord {
                feedback_type,
                rating,
                comment,
                document_id: document,
                user_agent: None,
            };
            if !record.is_empty() {
                record.user_agent = Some(format!("ecli/{}", env!("CARGO_PKG_VERSION")));
            }
            feedback::run_feedback(&cfg, &record).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
