//! # Coordinator — Frontier Owner and Dispatch Loop
//!
//! Owns the `Frontier`, assigns URLs to workers round-robin, tracks
//! per-worker task and heartbeat deadlines, and accumulates the
//! `Snapshot` written to `data/monitoring/monitoring_data.json`.
//! Grounded directly in `masterNode.py`'s main loop: the same
//! probe-then-dispatch-then-sleep shape, expressed as a `tokio::select!`
//! reactor instead of a polling `while` loop with `Iprobe`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::bus::PeerHandle;
use crate::config::CrawlConfig;
use crate::frontier::Frontier;
use crate::metrics::{CrawlerPerformance, CrawlerStatus, Snapshot, TaskAssignment};
use crate::protocol::{Envelope, Message, PeerId};

/// How often the dispatch loop wakes up to check timeouts and assign
/// work, matching the reference's `time.sleep(0.1)` busy-wait spacing.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

struct WorkerState {
    assignment: Option<String>,
    task_started: Option<Instant>,
    last_heartbeat: Instant,
    healthy: bool,
}

pub struct Coordinator {
    workers: Vec<PeerId>,
    indexer: PeerId,
    bus: PeerHandle,
    config: CrawlConfig,
    frontier: Frontier,
    worker_state: HashMap<PeerId, WorkerState>,
    next_worker_index: usize,
    processed_urls: usize,
    snapshot: Snapshot,
}

impl Coordinator {
    pub fn new(workers: Vec<PeerId>, indexer: PeerId, bus: PeerHandle, config: CrawlConfig) -> Self {
        let now = Instant::now();
        let worker_state = workers
            .iter()
            .map(|&id| {
                (
                    id,
                    WorkerState {
                        assignment: None,
                        task_started: None,
                        last_heartbeat: now,
                        healthy: true,
                    },
                )
            })
            .collect();

        let mut frontier = Frontier::new();
        for url in &config.seed_urls {
            frontier.enqueue(url.clone());
        }

        let mut snapshot = Snapshot::new(Utc::now());
        for &id in &workers {
            snapshot.crawler_status.insert(id.to_string(), CrawlerStatus::Active);
            snapshot
                .crawler_performance
                .insert(id.to_string(), CrawlerPerformance::default());
        }

        Coordinator {
            workers,
            indexer,
            bus,
            config,
            frontier,
            worker_state,
            next_worker_index: 0,
            processed_urls: 0,
            snapshot,
        }
    }

    /// Drive the coordinator to completion: dispatch work, absorb
    /// worker messages, enforce timeouts, and write metrics until the
    /// frontier is drained and every worker is idle or the URL cap is
    /// hit. Then sends the shutdown sentinel to every peer.
    pub async fn run(&mut self, mut inbox: tokio::sync::mpsc::Receiver<Envelope>) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            if self.is_done() {
                break;
            }

            tokio::select! {
                maybe_envelope = inbox.recv() => {
                    match maybe_envelope {
                        Some(envelope) => self.handle_message(envelope),
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    self.check_timeouts();
                    self.dispatch_available().await;
                    self.write_metrics();
                }
            }
        }

        self.finish().await;
    }

    fn is_done(&self) -> bool {
        let all_idle = self.worker_state.values().all(|w| w.assignment.is_none());
        (self.frontier.is_empty() && all_idle) || self.processed_urls >= self.config.max_urls
    }

    fn handle_message(&mut self, envelope: Envelope) {
        let sender = envelope.from;
        if let Some(state) = self.worker_state.get_mut(&sender) {
            state.last_heartbeat = Instant::now();
            if !state.healthy {
                state.healthy = true;
                self.snapshot
                    .crawler_status
                    .insert(sender.to_string(), CrawlerStatus::Active);
                tracing::info!(worker = sender, "crawler is back online");
            }
        }

        match envelope.payload {
            Message::Links(links) => self.handle_links(sender, links),
            Message::Status(status) => self.handle_status(sender, status),
            Message::Error(error) => self.handle_error(sender, error),
            Message::Task(_) | Message::Doc(_) => {
                tracing::warn!(from = sender, "coordinator received unexpected message kind");
            }
        }
    }

    fn handle_links(&mut self, sender: PeerId, links: Vec<String>) {
        let url = self.worker_state.get_mut(&sender).and_then(|w| w.assignment.take());
        if let Some(state) = self.worker_state.get_mut(&sender) {
            state.task_started = None;
        }
        let Some(url) = url else {
            tracing::warn!(worker = sender, "received links from worker with no assignment");
            return;
        };

        self.frontier.complete(&url);
        self.processed_urls += 1;
        self.snapshot.urls_crawled += 1;
        if let Some(perf) = self.snapshot.crawler_performance.get_mut(&sender.to_string()) {
            perf.completed += 1;
        }

        self.snapshot.push_task_log(TaskAssignment {
            time: Utc::now(),
            task_id: None,
            url: url.clone(),
            crawler: sender.to_string(),
            status: "completed".to_string(),
            urls_extracted: Some(links.len()),
            error_message: None,
        });

        if self.processed_urls < self.config.max_urls {
            for new_url in links.into_iter().take(self.config.new_urls_per_page) {
                self.frontier.enqueue(new_url);
            }
        }
    }

    fn handle_status(&mut self, sender: PeerId, status: String) {
        if status.contains("Indexed") {
            self.snapshot.urls_indexed += 1;
        }
        tracing::info!(worker = sender, %status, "status update");
    }

    fn handle_error(&mut self, sender: PeerId, error: String) {
        self.snapshot.error_count += 1;
        let url = self.worker_state.get_mut(&sender).and_then(|w| w.assignment.take());
        if let Some(state) = self.worker_state.get_mut(&sender) {
            state.task_started = None;
        }

        if let Some(url) = url {
            self.frontier.requeue(&url);
            self.snapshot.urls_failed += 1;
            if let Some(perf) = self.snapshot.crawler_performance.get_mut(&sender.to_string()) {
                perf.failed += 1;
            }
            self.snapshot.push_task_log(TaskAssignment {
                time: Utc::now(),
                task_id: None,
                url,
                crawler: sender.to_string(),
                status: "error".to_string(),
                urls_extracted: None,
                error_message: Some(error.clone()),
            });
            self.processed_urls += 1;
        }
        tracing::error!(worker = sender, %error, "worker reported error");
    }

    fn check_timeouts(&mut self) {
        let now = Instant::now();
        let mut to_requeue = Vec::new();

        for (&id, state) in self.worker_state.iter_mut() {
            if let (Some(url), Some(started)) = (&state.assignment, state.task_started) {
                if now.duration_since(started) > self.config.task_timeout {
                    tracing::warn!(worker = id, url, "task timeout");
                    to_requeue.push((id, url.clone(), "timeout"));
                    state.assignment = None;
                    state.task_started = None;
                }
            }

            if now.duration_since(state.last_heartbeat) > self.config.heartbeat_timeout && state.healthy {
                state.healthy = false;
                tracing::warn!(worker = id, "heartbeat timeout, marking crawler failed");
                if let Some(url) = state.assignment.take() {
                    to_requeue.push((id, url, "node_failed"));
                }
                state.task_started = None;
            }
        }

        for (id, url, reason) in to_requeue {
            self.frontier.requeue(&url);
            self.snapshot.urls_failed += 1;
            self.snapshot.error_count += 1;
            if let Some(perf) = self.snapshot.crawler_performance.get_mut(&id.to_string()) {
                perf.failed += 1;
            }
            self.snapshot.crawler_status.insert(
                id.to_string(),
                if reason == "node_failed" {
                    CrawlerStatus::Failed
                } else {
                    CrawlerStatus::Active
                },
            );
            self.snapshot.push_task_log(TaskAssignment {
                time: Utc::now(),
                task_id: None,
                url,
                crawler: id.to_string(),
                status: reason.to_string(),
                urls_extracted: None,
                error_message: None,
            });
        }
    }

    /// Round-robin dispatch: try each worker starting from
    /// `next_worker_index`, skipping busy or unhealthy ones, bounded to
    /// one full sweep per call so a fully-busy fleet doesn't spin.
    async fn dispatch_available(&mut self) {
        if self.processed_urls >= self.config.max_urls {
            return;
        }
        let worker_count = self.workers.len();
        if worker_count == 0 {
            return;
        }

        while !self.frontier.is_empty() {
            let mut assigned = false;
            for _ in 0..worker_count {
                let candidate = self.workers[self.next_worker_index];
                self.next_worker_index = (self.next_worker_index + 1) % worker_count;

                let available = self
                    .worker_state
                    .get(&candidate)
                    .is_some_and(|w| w.assignment.is_none() && w.healthy);
                if available {
                    self.assign(candidate).await;
                    assigned = true;
                    break;
                }
            }
            if !assigned {
                break;
            }
        }
    }

    async fn assign(&mut self, worker: PeerId) {
        let Some(url) = self.frontier.dispatch_next() else {
            return;
        };
        if self.bus.send(worker, Message::Task(Some(url.clone()))).await.is_err() {
            tracing::error!(worker, "failed to deliver task assignment");
        }

        if let Some(state) = self.worker_state.get_mut(&worker) {
            state.assignment = Some(url.clone());
            state.task_started = Some(Instant::now());
        }
        if let Some(perf) = self.snapshot.crawler_performance.get_mut(&worker.to_string()) {
            perf.assigned += 1;
        }
        self.snapshot.push_task_log(TaskAssignment {
            time: Utc::now(),
            task_id: None,
            url,
            crawler: worker.to_string(),
            status: "assigned".to_string(),
            urls_extracted: None,
            error_message: None,
        });
    }

    fn write_metrics(&self) {
        if let Err(err) = self.snapshot.write_atomic(&self.config.metrics_path) {
            tracing::warn!(%err, "failed to write monitoring snapshot");
        }
    }

    /// Send the shutdown sentinel to every worker and the indexer,
    /// isolating each send so one failed delivery doesn't block the
    /// rest — mirroring `masterNode.py`'s per-node `try/except` around
    /// its final shutdown sends.
    async fn finish(&mut self) {
        self.snapshot.end_time = Some(Utc::now());
        self.write_metrics();

        for &worker in &self.workers {
            if self.bus.send(worker, Message::Task(None)).await.is_err() {
                tracing::error!(worker, "failed to deliver shutdown signal to crawler");
            }
        }
        if self.bus.send(self.indexer, Message::Task(None)).await.is_err() {
            tracing::error!(indexer = self.indexer, "failed to deliver shutdown signal to indexer");
        }

        tracing::info!(
            processed = self.processed_urls,
            "crawling complete, shutdown signals sent"
        );
    }
}
