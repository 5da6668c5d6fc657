//! # CLI Execution Functions
//!
//! Extracted from `main.rs` to keep the entry point slim. Contains the
//! execution logic for each subcommand: crawl fleet startup and
//! index search.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use webreach::config::{CrawlConfig, StoreConfig};

use super::Commands;

/// Run the `crawl` subcommand: build a `CrawlConfig`/`StoreConfig` from
/// flags and env, then hand off to the crawl engine.
pub fn run_crawl(command: &Commands) -> Result<()> {
    let Commands::Crawl {
        seeds,
        seeds_file,
        workers,
        max_urls,
        new_urls_per_page,
        task_timeout_secs,
        heartbeat_timeout_secs,
        index_dir,
        log_dir,
        metrics_path,
        store_config,
        artifacts_dir,
    } = command
    else {
        unreachable!("run_crawl called with a non-Crawl command");
    };

    let mut seed_urls = seeds.clone();
    if let Some(path) = seeds_file {
        seed_urls.extend(read_seed_file(path)?);
    }
    if seed_urls.is_empty() {
        anyhow::bail!("at least one seed URL is required (--seed or --seeds-file)");
    }

    let config = CrawlConfig {
        seed_urls,
        max_urls: *max_urls,
        new_urls_per_page: *new_urls_per_page,
        task_timeout: std::time::Duration::from_secs(*task_timeout_secs),
        heartbeat_timeout: std::time::Duration::from_secs(*heartbeat_timeout_secs),
        metrics_path: metrics_path.clone(),
        worker_count: *workers,
        index_dir: index_dir.clone(),
        log_dir: log_dir.clone(),
    };

    let store = StoreConfig::load(store_config.as_deref(), artifacts_dir.clone());

    tracing::info!(
        workers = config.worker_count,
        seeds = config.seed_urls.len(),
        max_urls = config.max_urls,
        "webreach crawl starting"
    );

    webreach::crawl::run(config, store)
}

fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let mut contents = String::new();
    std::fs::File::open(path)
        .with_context(|| format!("failed to open seeds file {}", path.display()))?
        .read_to_string(&mut contents)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Run the `search` subcommand: load a committed index and print ranked
/// hits for a query.
pub fn run_search(query: &str, index_path: &Path, limit: usize) -> Result<()> {
    let index = webreach::index::InvertedIndex::load(index_path)
        .with_context(|| format!("failed to load index at {}", index_path.display()))?;

    let parsed = webreach::query::parse(query);
    let hits = webreach::query::search(&index, &parsed, limit);

    if hits.is_empty() {
        println!("No results for: {}", query);
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        println!("{}. {} (score {:.3})", rank + 1, hit.title, hit.score);
        println!("   {}", hit.url);
        println!("   {}", hit.summary);
    }

    Ok(())
}
