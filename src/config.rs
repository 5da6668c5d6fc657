//! # Config — Crawl Configuration
//!
//! `CrawlConfig` is the struct form of every coordinator/worker tunable;
//! `cli.rs` builds one from `clap` flags (with env-var overrides), and
//! tests construct one directly. Kept separate from the `clap::Parser`
//! struct itself so the crawl engine never depends on clap.

use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub seed_urls: Vec<String>,
    pub max_urls: usize,
    pub new_urls_per_page: usize,
    pub task_timeout: Duration,
    pub heartbeat_timeout: Duration,
    pub metrics_path: PathBuf,
    pub worker_count: usize,
    pub index_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        CrawlConfig {
            seed_urls: Vec::new(),
            max_urls: 100,
            new_urls_per_page: 5,
            task_timeout: Duration::from_secs(30),
            heartbeat_timeout: Duration::from_secs(10),
            metrics_path: PathBuf::from("data/monitoring/monitoring_data.json"),
            worker_count: 2,
            index_dir: PathBuf::from("search_index"),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl CrawlConfig {
    /// Total peer count: coordinator (rank 0) + workers + indexer (last rank).
    pub fn peer_count(&self) -> usize {
        self.worker_count + 2
    }

    /// Rank assigned to the indexer — always the last rank.
    pub fn indexer_rank(&self) -> usize {
        self.peer_count() - 1
    }

    /// Validate the `N >= 3` requirement (§6): at least one worker.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_count == 0 {
            anyhow::bail!("worker_count must be at least 1 (N >= 3 total peers required)");
        }
        Ok(())
    }
}

/// The `[aws]` section of `aws_config.json`, with environment overrides
/// `AWS_S3_BUCKET` / `AWS_DEFAULT_REGION` taking precedence over file
/// values (matching the reference `cloud_storage.py`'s precedence order).
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StoreConfigFile {
    pub aws: AwsSection,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AwsSection {
    pub bucket_name: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub bucket_name: Option<String>,
    pub region: String,
    pub local_fallback_dir: PathBuf,
}

impl StoreConfig {
    pub fn load(config_path: Option<&std::path::Path>, local_fallback_dir: PathBuf) -> Self {
        let from_file: Option<StoreConfigFile> = config_path
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|content| serde_json::from_str(&content).ok());

        let bucket_name = std::env::var("AWS_S3_BUCKET").ok().or_else(|| {
            from_file.as_ref().and_then(|f| f.aws.bucket_name.clone())
        });
        let region = std::env::var("AWS_DEFAULT_REGION")
            .ok()
            .or_else(|| from_file.as_ref().and_then(|f| f.aws.region.clone()))
            .unwrap_or_else(|| "us-east-1".to_string());

        StoreConfig {
            bucket_name,
            region,
            local_fallback_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_peer_count_includes_coordinator_and_indexer() {
        let cfg = CrawlConfig::default();
        assert_eq!(cfg.peer_count(), cfg.worker_count + 2);
        assert_eq!(cfg.indexer_rank(), cfg.peer_count() - 1);
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut cfg = CrawlConfig::default();
        cfg.worker_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn store_config_defaults_to_us_east_1_with_no_file_or_env() {
        let cfg = StoreConfig::load(None, PathBuf::from("data/artifacts"));
        assert_eq!(cfg.region, "us-east-1");
        assert!(cfg.bucket_name.is_none());
    }
}
