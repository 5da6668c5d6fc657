//! # Errors — Domain Error Taxonomy
//!
//! One `thiserror` enum per failure domain, matching the error-kind table:
//! fetch/parse errors surface from the worker, index/artifact errors from
//! the indexer. `anyhow::Result` is used only at the CLI boundary in
//! `main.rs`; library code always returns one of these.

use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("parse error: {0}")]
    Malformed(String),
}

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("index write failed: {0}")]
    WriteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ArtifactError {
    #[error("object store put failed: {0}")]
    PutFailed(String),
    #[error("object store get failed: {0}")]
    GetFailed(String),
    #[error("local fallback also failed: {0}")]
    LocalFailed(#[from] std::io::Error),
}

/// Worker-side errors that cross the bus as a human-readable `ERROR`
/// message, per the wire contract — the coordinator never sees the typed
/// variant, only its `Display` rendering.
#[derive(thiserror::Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}
