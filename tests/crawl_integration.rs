//! End-to-end fleet test: one coordinator, one worker, one indexer,
//! wired over a real `Bus`, crawling a two-page fixture site to
//! completion. Requires `--features test-fixtures` for `FixtureFetcher`.

#![cfg(feature = "test-fixtures")]

use std::sync::Arc;
use std::time::Duration;

use webreach::bus::Bus;
use webreach::config::CrawlConfig;
use webreach::coordinator::Coordinator;
use webreach::fetcher::FixtureFetcher;
use webreach::indexer::Indexer;
use webreach::worker::Worker;

const HOME: &str = r#"<html><head><title>Home</title></head>
<body><main><p>Welcome to the Rust programming language site.</p>
<a href="http://site.test/about">About</a></main></body></html>"#;

const ABOUT: &str = r#"<html><head><title>About</title></head>
<body><main><p>Rust is a systems programming language focused on safety.</p></main></body></html>"#;

#[tokio::test(flavor = "multi_thread")]
async fn crawls_seed_and_discovered_link_then_commits_searchable_index() {
    let dir = tempfile::tempdir().unwrap();
    let index_path = dir.path().join("index.json");

    let mut bus = Bus::new(3);
    let coordinator_rx = bus.take_receiver(0);
    let coordinator_handle = bus.handle_for(0);
    let worker_rx = bus.take_receiver(1);
    let worker_handle = bus.handle_for(1);
    let indexer_rx = bus.take_receiver(2);
    let indexer_handle = bus.handle_for(2);

    let fetcher = Arc::new(FixtureFetcher::new([
        ("http://site.test/".to_string(), HOME.to_string()),
        ("http://site.test/about".to_string(), ABOUT.to_string()),
    ]));
    let worker = Worker::new(1, 0, 2, worker_handle, fetcher);
    let worker_task = tokio::spawn(async move { worker.run(worker_rx).await });

    let store = Arc::new(webreach::artifact_store::LocalArtifactStore::new(
        dir.path().join("artifacts"),
    ));
    let mut indexer = Indexer::new(index_path.clone(), store);
    let indexer_task = tokio::spawn(async move { indexer.run(indexer_rx, indexer_handle).await });

    let config = CrawlConfig {
        seed_urls: vec!["http://site.test/".to_string()],
        max_urls: 5,
        new_urls_per_page: 5,
        task_timeout: Duration::from_secs(5),
        heartbeat_timeout: Duration::from_secs(5),
        metrics_path: dir.path().join("monitoring_data.json"),
        worker_count: 1,
        index_dir: dir.path().to_path_buf(),
        log_dir: dir.path().join("logs"),
    };
    let mut coordinator = Coordinator::new(vec![1], 2, coordinator_handle, config);
    coordinator.run(coordinator_rx).await;

    worker_task.await.unwrap();
    indexer_task.await.unwrap();

    let index = webreach::index::InvertedIndex::load(&index_path).expect("index should be committed");
    assert!(index.contains("http://site.test/"));
    assert!(index.contains("http://site.test/about"));

    let query = webreach::query::parse("rust");
    let hits = webreach::query::search(&index, &query, 10);
    assert_eq!(hits.len(), 2);
}
