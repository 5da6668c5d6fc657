//! # Crawl — Fleet Entry Point
//!
//! Wires the bus and spawns one OS thread per peer (coordinator, each
//! worker, the indexer), each building its own single-threaded Tokio
//! runtime so `logging::init_peer_logging`'s thread-scoped subscriber
//! stays attached for that peer's whole lifetime. This generalizes the
//! reference implementation's MPI rank model — "independent OS-level
//! peers" — onto a single process.

use std::sync::Arc;
use std::time::Duration;

use crate::artifact_store::{ArtifactStore, LocalArtifactStore, S3ArtifactStore};
use crate::bus::Bus;
use crate::config::{CrawlConfig, StoreConfig};
use crate::coordinator::Coordinator;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::indexer::Indexer;
use crate::logging::{init_peer_logging, PeerRole};
use crate::worker::Worker;

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = "webreach/0.1";

/// Run one full crawl to completion: spawns the coordinator, every
/// worker, and the indexer, then blocks until all three kinds of peer
/// have exited.
pub fn run(config: CrawlConfig, store_config: StoreConfig) -> anyhow::Result<()> {
    config.validate()?;

    let peer_count = config.peer_count();
    let indexer_rank = config.indexer_rank();
    let worker_ranks: Vec<usize> = (1..indexer_rank).collect();

    let mut bus = Bus::new(peer_count);
    let coordinator_rx = bus.take_receiver(0);
    let coordinator_handle = bus.handle_for(0);

    let mut worker_threads = Vec::new();
    for &rank in &worker_ranks {
        let rx = bus.take_receiver(rank);
        let handle = bus.handle_for(rank);
        let log_dir = config.log_dir.clone();
        worker_threads.push(std::thread::spawn(move || {
            run_worker_thread(rank, 0, indexer_rank, handle, rx, log_dir);
        }));
    }

    let indexer_rx = bus.take_receiver(indexer_rank);
    let indexer_handle = bus.handle_for(indexer_rank);
    let indexer_config = config.clone();
    let indexer_thread = std::thread::spawn(move || {
        run_indexer_thread(indexer_config, store_config, indexer_handle, indexer_rx);
    });

    let coordinator_thread = std::thread::spawn(move || {
        run_coordinator_thread(worker_ranks, indexer_rank, coordinator_handle, coordinator_rx, config);
    });

    coordinator_thread
        .join()
        .map_err(|_| anyhow::anyhow!("coordinator thread panicked"))?;
    for thread in worker_threads {
        thread.join().map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
    }
    indexer_thread.join().map_err(|_| anyhow::anyhow!("indexer thread panicked"))?;

    Ok(())
}

fn single_threaded_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build per-peer tokio runtime")
}

fn run_coordinator_thread(
    worker_ranks: Vec<usize>,
    indexer_rank: usize,
    handle: crate::bus::PeerHandle,
    rx: tokio::sync::mpsc::Receiver<crate::protocol::Envelope>,
    config: CrawlConfig,
) {
    let _guards = init_peer_logging(&config.log_dir, PeerRole::Coordinator)
        .expect("failed to initialize coordinator logging");
    tracing::info!(workers = worker_ranks.len(), "coordinator starting");

    let runtime = single_threaded_runtime();
    runtime.block_on(async move {
        let mut coordinator = Coordinator::new(worker_ranks, indexer_rank, handle, config);
        coordinator.run(rx).await;
    });
}

fn run_worker_thread(
    rank: usize,
    coordinator: usize,
    indexer: usize,
    handle: crate::bus::PeerHandle,
    rx: tokio::sync::mpsc::Receiver<crate::protocol::Envelope>,
    log_dir: std::path::PathBuf,
) {
    let _guards = init_peer_logging(&log_dir, PeerRole::Worker(rank)).expect("failed to initialize worker logging");
    tracing::info!(rank, "crawler starting");

    let runtime = single_threaded_runtime();
    runtime.block_on(async move {
        let fetcher: Arc<dyn Fetcher> = match HttpFetcher::new(FETCH_TIMEOUT, USER_AGENT) {
            Ok(f) => Arc::new(f),
            Err(err) => {
                tracing::error!(%err, "failed to build http client, worker exiting immediately");
                return;
            }
        };
        let worker = Worker::new(rank, coordinator, indexer, handle, fetcher);
        worker.run(rx).await;
    });
}

fn run_indexer_thread(
    config: CrawlConfig,
    store_config: StoreConfig,
    handle: crate::bus::PeerHandle,
    rx: tokio::sync::mpsc::Receiver<crate::protocol::Envelope>,
) {
    let _guards =
        init_peer_logging(&config.log_dir, PeerRole::Indexer).expect("failed to initialize indexer logging");
    tracing::info!("indexer starting");

    let runtime = single_threaded_runtime();
    runtime.block_on(async move {
        let store: Arc<dyn ArtifactStore> = match store_config.bucket_name.clone() {
            Some(bucket) => Arc::new(
                S3ArtifactStore::new(bucket, store_config.region.clone(), store_config.local_fallback_dir.clone())
                    .await,
            ),
            None => Arc::new(LocalArtifactStore::new(store_config.local_fallback_dir.clone())),
        };

        let index_path = config.index_dir.join("index.json");
        let mut indexer = Indexer::new(index_path, store);
        indexer.run(rx, handle).await;
    });
}
