//! # Webreach — Core Library
//!
//! A fleet-coordinated web crawler and BM25F inverted-index builder.
//! One coordinator owns a URL frontier and dispatches work round-robin
//! to a pool of crawler workers; each worker fetches and extracts links
//! and text, forwarding pages to a dedicated indexer that builds and
//! persists the search index.
//!
//! ## Module Organization
//!
//! **Wire and fleet plumbing**:
//! - [`protocol`] — the rank-addressed message envelope and tag contract
//! - [`bus`] — in-process `tokio::sync::mpsc` transport implementing it
//! - [`config`] — `CrawlConfig`/`StoreConfig`, the tunables every peer reads
//! - [`errors`] — one `thiserror` enum per failure domain
//! - [`logging`] — per-peer file logging via thread-scoped `tracing` subscribers
//! - [`metrics`] — the atomically-committed fleet status snapshot
//!
//! **Coordinator side**:
//! - [`frontier`] — the FIFO URL queue with enqueued/in-flight/completed dedup
//! - [`url_normalize`] — canonicalization used by the frontier's dedup key
//! - [`coordinator`] — dispatch loop, timeout enforcement, metrics snapshotting
//!
//! **Worker side**:
//! - [`fetcher`] — pluggable HTTP fetch (`reqwest` production, fixtures for tests)
//! - [`link_extractor`] — outbound link and title extraction from fetched HTML
//! - [`worker`] — the fetch/parse/extract/forward pipeline plus heartbeat
//!
//! **Indexer side**:
//! - [`text_extract`] — HTML-to-plain-text extraction
//! - [`tokenize`] — stemming, stopword removal, keyword and summary extraction
//! - [`index`] — the inverted index and BM25F scorer
//! - [`query`] — boolean/phrase/field-scoped query parsing and search
//! - [`artifact_store`] — durable raw-HTML/processed-text persistence (S3 or local)
//! - [`indexer`] — the ingestion pipeline tying the above together
//!
//! **Entry point**:
//! - [`crawl`] — spawns one OS thread per peer and runs a crawl to completion

pub mod artifact_store;
pub mod bus;
pub mod config;
pub mod coordinator;
pub mod crawl;
pub mod errors;
pub mod fetcher;
pub mod frontier;
pub mod index;
pub mod indexer;
pub mod link_extractor;
pub mod logging;
pub mod metrics;
pub mod protocol;
pub mod query;
pub mod text_extract;
pub mod tokenize;
pub mod url_normalize;
pub mod worker;
