//! # Indexer — Ingestion Pipeline
//!
//! Consumes `DOC` messages from workers, extracts and processes text,
//! updates the inverted index, and persists raw/processed artifacts.
//! Grounded in `indexerNode.py`'s `index_document` and the
//! `indexer_process` message loop (tag 2 = document, tag 0/None =
//! shutdown).

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::artifact_store::{ArtifactKind, ArtifactStore};
use crate::index::{Document, InvertedIndex};
use crate::protocol::{DocPayload, Envelope, Message};
use crate::text_extract::extract_text_from_html;
use crate::tokenize::{extract_keywords, extract_words, generate_summary, process_text};

const KEYWORD_COUNT: usize = 10;
const SUMMARY_SENTENCES: usize = 3;

pub struct Indexer {
    index: InvertedIndex,
    index_path: PathBuf,
    store: Arc<dyn ArtifactStore>,
    processed: std::collections::HashSet<String>,
}

impl Indexer {
    pub fn new(index_path: PathBuf, store: Arc<dyn ArtifactStore>) -> Self {
        let index = InvertedIndex::load(&index_path).unwrap_or_default();
        Indexer {
            index,
            index_path,
            store,
            processed: std::collections::HashSet::new(),
        }
    }

    pub async fn run(&mut self, mut inbox: tokio::sync::mpsc::Receiver<Envelope>, coordinator: crate::bus::PeerHandle) {
        while let Some(envelope) = inbox.recv().await {
            match envelope.payload {
                Message::Doc(doc) => self.handle_doc(doc, &coordinator).await,
                Message::Task(None) => {
                    tracing::info!(
                        documents = self.index.doc_count(),
                        unique_urls = self.processed.len(),
                        "indexer received shutdown signal, writing final index"
                    );
                    if let Err(err) = self.index.commit(&self.index_path) {
                        tracing::error!(%err, "failed to commit index on shutdown");
                    }
                    break;
                }
                _ => {
                    tracing::warn!(from = envelope.from, "indexer received unexpected message kind");
                }
            }
        }
    }

    async fn handle_doc(&mut self, payload: DocPayload, coordinator: &crate::bus::PeerHandle) {
        if self.processed.contains(&payload.url) {
            tracing::debug!(url = %payload.url, "url already indexed, skipping");
            return;
        }

        match self.index_document(&payload).await {
            Ok(keyword_count) => {
                self.processed.insert(payload.url.clone());
                let status = format!("Indexed {} with {} keywords", payload.url, keyword_count);
                let _ = coordinator.send(0, Message::Status(status)).await;
            }
            Err(err) => {
                tracing::error!(url = %payload.url, %err, "failed to index document");
                let _ = coordinator
                    .send(0, Message::Error(format!("Failed to index {}: {}", payload.url, err)))
                    .await;
            }
        }
    }

    async fn index_document(&mut self, payload: &DocPayload) -> Result<usize, crate::errors::IndexError> {
        let extracted = extract_text_from_html(&payload.content);
        let title = payload.title.clone().unwrap_or(extracted.title);

        let processed_title = process_text(&title);
        let processed_content = process_text(&extracted.text);
        let keywords = extract_keywords(&extract_words(&extracted.text), KEYWORD_COUNT);
        let summary = generate_summary(&extracted.text, SUMMARY_SENTENCES);

        let _ = self
            .store
            .put(&payload.url, ArtifactKind::RawHtml, &payload.content)
            .await;
        let _ = self
            .store
            .put(&payload.url, ArtifactKind::ProcessedText, &extracted.text)
            .await;

        let document = Document {
            url: payload.url.clone(),
            title,
            content: extracted.text,
            keywords: keywords.clone(),
            summary,
            last_updated: Utc::now(),
        };

        self.index.update_document(document, &processed_title, &processed_content);
        self.index.commit(&self.index_path)?;

        Ok(keywords.len())
    }

    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact_store::LocalArtifactStore;
    use crate::bus::Bus;

    #[tokio::test]
    async fn indexing_a_doc_populates_index_and_reports_success_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path().join("artifacts")));
        let mut indexer = Indexer::new(dir.path().join("index.json"), store);

        let mut bus = Bus::new(2);
        let coordinator = bus.handle_for(1);
        let mut coord_rx = bus.take_receiver(0);

        indexer
            .handle_doc(
                DocPayload {
                    url: "http://a.com/".to_string(),
                    content: "<html><head><title>Hello</title></head><body><p>Rust is great for systems programming.</p></body></html>".to_string(),
                    title: None,
                },
                &coordinator,
            )
            .await;

        assert!(indexer.index().contains("http://a.com/"));
        let status = coord_rx.recv().await.unwrap();
        assert!(matches!(status.payload, Message::Status(ref s) if s.contains("Indexed")));
    }

    #[tokio::test]
    async fn duplicate_url_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path().join("artifacts")));
        let mut indexer = Indexer::new(dir.path().join("index.json"), store);

        let mut bus = Bus::new(2);
        let coordinator = bus.handle_for(1);
        let mut coord_rx = bus.take_receiver(0);

        let payload = DocPayload {
            url: "http://a.com/".to_string(),
            content: "<html><body>content</body></html>".to_string(),
            title: None,
        };
        indexer.handle_doc(payload.clone(), &coordinator).await;
        let _ = coord_rx.recv().await.unwrap();

        indexer.handle_doc(payload, &coordinator).await;
        assert!(tokio::time::timeout(std::time::Duration::from_millis(50), coord_rx.recv())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn keywords_keep_surface_form_and_query_term_matches_stemmed_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalArtifactStore::new(dir.path().join("artifacts")));
        let mut indexer = Indexer::new(dir.path().join("index.json"), store);

        let mut bus = Bus::new(2);
        let coordinator = bus.handle_for(1);
        let mut coord_rx = bus.take_receiver(0);

        indexer
            .handle_doc(
                DocPayload {
                    url: "http://a.com/".to_string(),
                    content: "<html><body><p>Python python PYTHON programming</p></body></html>".to_string(),
                    title: None,
                },
                &coordinator,
            )
            .await;
        let _ = coord_rx.recv().await.unwrap();

        let doc = indexer.index().get("http://a.com/").unwrap();
        assert!(doc.keywords.contains(&"python".to_string()));
        assert!(doc.keywords.contains(&"programming".to_string()));

        let query = crate::query::parse("programming");
        let hits = crate::query::search(indexer.index(), &query, 10);
        assert_eq!(hits.len(), 1);
    }
}
