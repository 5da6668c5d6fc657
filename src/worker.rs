//! # Worker — Fetch / Parse / Extract / Forward Pipeline
//!
//! One main loop plus one independent heartbeat task, sharing only an
//! atomic shutdown flag and counters, the same shape as a `Progress`
//! struct's atomics shared between worker threads and a background
//! reporter. The heartbeat side only ever reads.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;

use crate::bus::PeerHandle;
use crate::errors::WorkerError;
use crate::fetcher::Fetcher;
use crate::link_extractor::{extract_links, extract_title};
use crate::protocol::{DocPayload, Message, PeerId};

/// Heartbeat jitter window, matching `crawlerNode.py`'s
/// `random.uniform(2, 5)` spacing to avoid synchronized heartbeats.
const HEARTBEAT_MIN: Duration = Duration::from_secs(2);
const HEARTBEAT_MAX: Duration = Duration::from_secs(5);

/// Pause between tasks, matching the reference's `time.sleep(0.1)`
/// politeness/stagger delay.
const INTER_TASK_PAUSE: Duration = Duration::from_millis(100);

#[derive(Default)]
struct WorkerStats {
    urls_processed: AtomicU64,
    urls_extracted: AtomicU64,
    errors: AtomicU64,
}

pub struct Worker {
    id: PeerId,
    coordinator: PeerId,
    indexer: PeerId,
    bus: PeerHandle,
    fetcher: Arc<dyn Fetcher>,
    stats: Arc<WorkerStats>,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(
        id: PeerId,
        coordinator: PeerId,
        indexer: PeerId,
        bus: PeerHandle,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Worker {
            id,
            coordinator,
            indexer,
            bus,
            fetcher,
            stats: Arc::new(WorkerStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run the worker to completion: spawns the heartbeat task, then
    /// drives the main receive loop until the shutdown sentinel arrives.
    pub async fn run(&self, mut inbox: tokio::sync::mpsc::Receiver<crate::protocol::Envelope>) {
        let heartbeat = tokio::spawn(Self::heartbeat_task(
            self.id,
            self.coordinator,
            self.bus.clone(),
            self.shutdown.clone(),
        ));

        while let Some(envelope) = inbox.recv().await {
            let Message::Task(task) = envelope.payload else {
                tracing::warn!(from = envelope.from, "worker received non-task message, discarding");
                continue;
            };
            let Some(url) = task else {
                tracing::info!(rank = self.id, "received shutdown signal, exiting");
                break;
            };
            self.process_url(&url).await;
            tokio::time::sleep(INTER_TASK_PAUSE).await;
        }

        self.shutdown.store(true, Ordering::Relaxed);
        let _ = heartbeat.await;
    }

    async fn process_url(&self, url: &str) {
        let start = Instant::now();
        match self.fetch_and_parse(url).await {
            Ok((links, content, title)) => {
                self.stats.urls_processed.fetch_add(1, Ordering::Relaxed);
                self.stats
                    .urls_extracted
                    .fetch_add(links.len() as u64, Ordering::Relaxed);

                let _ = self.bus.send(self.coordinator, Message::Links(links.clone())).await;
                let _ = self
                    .bus
                    .send(
                        self.indexer,
                        Message::Doc(DocPayload {
                            url: url.to_string(),
                            content,
                            title,
                        }),
                    )
                    .await;

                let status = format!(
                    "Crawler {} completed URL: {} (found {} URLs) in {:.2}s",
                    self.id,
                    url,
                    links.len(),
                    start.elapsed().as_secs_f64()
                );
                let _ = self.bus.send(self.coordinator, Message::Status(status)).await;
            }
            Err(err) => {
                self.stats.errors.fetch_add(1, Ordering::Relaxed);
                let _ = self
                    .bus
                    .send(self.coordinator, Message::Error(format!("{}", err)))
                    .await;
            }
        }
    }

    async fn fetch_and_parse(
        &self,
        url: &str,
    ) -> Result<(Vec<String>, String, Option<String>), WorkerError> {
        let page = self.fetcher.fetch(url).await?;
        let links = extract_links(url, &page.content);
        let title = extract_title(&page.content);
        Ok((links, page.content, title))
    }

    async fn heartbeat_task(
        id: PeerId,
        coordinator: PeerId,
        bus: PeerHandle,
        shutdown: Arc<AtomicBool>,
    ) {
        while !shutdown.load(Ordering::Relaxed) {
            let jitter = {
                let mut rng = rand::thread_rng();
                Duration::from_secs_f64(
                    rng.gen_range(HEARTBEAT_MIN.as_secs_f64()..=HEARTBEAT_MAX.as_secs_f64()),
                )
            };
            tokio::time::sleep(jitter).await;
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let msg = Message::Status(format!("Heartbeat from crawler {}: Active", id));
            let _ = bus.send(coordinator, msg).await;
        }
    }
}
