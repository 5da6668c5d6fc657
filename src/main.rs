//! # Main — CLI Entry Point
//!
//! Routes CLI subcommands to the crawl engine and the read-side search
//! index. Handles shared concerns: `.env` loading, structured logging
//! setup, and config construction from flags/env.
//!
//! ## Subcommands
//!
//! - `crawl`: run a fleet (one coordinator, N workers, one indexer) over
//!   a seed list until the frontier drains or `--max-urls` is hit.
//! - `search`: query the inverted index a prior crawl produced.
//!
//! ## Global Options
//!
//! - `LOG_FORMAT=json` selects structured JSON logging (for container
//!   log collectors); anything else gets human-readable output to stderr.

mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "webreach", about = "Distributed web crawler and inverted-index builder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a seed list, dispatching URLs across a worker fleet and
    /// building a BM25F-searchable inverted index as pages are fetched.
    Crawl {
        /// Seed URL to start crawling from. Repeatable.
        #[arg(long = "seed")]
        seeds: Vec<String>,

        /// File containing one seed URL per line, merged with `--seed`.
        #[arg(long)]
        seeds_file: Option<PathBuf>,

        /// Number of crawler workers to run.
        #[arg(long, default_value_t = 4)]
        workers: usize,

        /// Stop once this many URLs have been processed (success or error).
        #[arg(long, default_value_t = 100)]
        max_urls: usize,

        /// Maximum number of newly discovered links enqueued per page.
        #[arg(long, default_value_t = 5)]
        new_urls_per_page: usize,

        /// Seconds a worker may hold an assigned task before it is requeued.
        #[arg(long, default_value_t = 30)]
        task_timeout_secs: u64,

        /// Seconds without a heartbeat before a worker is marked failed.
        #[arg(long, default_value_t = 10)]
        heartbeat_timeout_secs: u64,

        /// Directory the inverted index is committed to.
        #[arg(long, default_value = "search_index")]
        index_dir: PathBuf,

        /// Directory per-peer log files are written to.
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,

        /// Path the fleet status snapshot is written to.
        #[arg(long, default_value = "data/monitoring/monitoring_data.json")]
        metrics_path: PathBuf,

        /// JSON file with an `{"aws": {"bucket_name", "region"}}` section
        /// for artifact storage. Falls back to local-disk storage if unset.
        #[arg(long)]
        store_config: Option<PathBuf>,

        /// Directory artifacts are written to when S3 is unconfigured or
        /// unreachable.
        #[arg(long, default_value = "data/artifacts")]
        artifacts_dir: PathBuf,
    },
    /// Run a boolean/phrase/field-scoped query against a previously
    /// built inverted index.
    Search {
        /// Query string, e.g. `title:rust AND crab` or `"web crawler"`.
        query: String,

        /// Path to the committed index file.
        #[arg(long, default_value = "search_index/index.json")]
        index: PathBuf,

        /// Maximum number of hits to print.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt().json().with_target(false).init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();

    match &cli.command {
        Commands::Crawl { .. } => cli::run_crawl(&cli.command),
        Commands::Search { query, index, limit } => cli::run_search(query, index, *limit),
    }
}
