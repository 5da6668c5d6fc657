//! # Metrics — JSON Snapshot Export
//!
//! `Snapshot` mirrors the dashboard's `monitoring_data.json` contract
//! byte-for-byte. Written atomically (write-to-temp-then-rename), the
//! same pattern a resumable search checkpoint uses for its state file,
//! minus the checksum/generations: the dashboard only needs never to
//! observe a half-written file, not to recover from corruption.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const TASK_LOG_TAIL: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlerStatus {
    Active,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlerPerformance {
    pub assigned: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub url: String,
    pub crawler: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls_extracted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub start_time: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    pub urls_crawled: u64,
    pub urls_indexed: u64,
    pub urls_failed: u64,
    pub error_count: u64,
    pub crawler_status: HashMap<String, CrawlerStatus>,
    pub crawler_performance: HashMap<String, CrawlerPerformance>,
    pub task_assignments: Vec<TaskAssignment>,
}

impl Snapshot {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Snapshot {
            start_time,
            end_time: None,
            urls_crawled: 0,
            urls_indexed: 0,
            urls_failed: 0,
            error_count: 0,
            crawler_status: HashMap::new(),
            crawler_performance: HashMap::new(),
            task_assignments: Vec::new(),
        }
    }

    /// Append an assignment record, trimming the tail to `TASK_LOG_TAIL`
    /// entries. Logs once, at the moment trimming first occurs, so the
    /// cap isn't silent.
    pub fn push_task_log(&mut self, entry: TaskAssignment) {
        self.task_assignments.push(entry);
        if self.task_assignments.len() > TASK_LOG_TAIL {
            let dropped = self.task_assignments.len() - TASK_LOG_TAIL;
            self.task_assignments.drain(0..dropped);
            tracing::debug!(dropped, "trimmed metrics task log to {} entries", TASK_LOG_TAIL);
        }
    }

    /// Serialize and write atomically: write to `<path>.tmp`, then rename
    /// over `path`. A reader polling `path` never observes a partial file.
    pub fn write_atomic(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_produces_readable_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitoring_data.json");
        let mut snap = Snapshot::new(Utc::now());
        snap.urls_crawled = 3;
        snap.write_atomic(&path).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let read_back: Snapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(read_back.urls_crawled, 3);
    }

    #[test]
    fn push_task_log_trims_to_tail_length() {
        let mut snap = Snapshot::new(Utc::now());
        for i in 0..(TASK_LOG_TAIL + 50) {
            snap.push_task_log(TaskAssignment {
                time: Utc::now(),
                task_id: None,
                url: format!("http://example.com/{}", i),
                crawler: "1".into(),
                status: "completed".into(),
                urls_extracted: None,
                error_message: None,
            });
        }
        assert_eq!(snap.task_assignments.len(), TASK_LOG_TAIL);
        assert!(snap
            .task_assignments
            .last()
            .unwrap()
            .url
            .ends_with(&(TASK_LOG_TAIL + 49).to_string()));
    }

    #[test]
    fn no_tmp_file_left_behind_after_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("monitoring_data.json");
        Snapshot::new(Utc::now()).write_atomic(&path).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
    }
}
