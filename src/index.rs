//! # Inverted Index — Storage and BM25F Scoring
//!
//! Replaces Whoosh's on-disk index with an in-process inverted index
//! over `title`/`content`/`keywords` fields, committed atomically via
//! write-to-temp-then-rename (same pattern as `metrics.rs`). Grounded
//! in `indexerNode.py`'s Whoosh `Schema` and `scoring.BM25F` use.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::IndexError;

/// BM25 term-frequency saturation parameter.
const K1: f64 = 1.2;
/// BM25 length-normalization parameter.
const B: f64 = 0.75;

/// Per-field boost weights, approximating Whoosh's default BM25F field
/// weighting: titles and keywords matter more than body text.
const TITLE_BOOST: f64 = 3.0;
const KEYWORDS_BOOST: f64 = 2.0;
const CONTENT_BOOST: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub url: String,
    pub title: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub summary: String,
    pub last_updated: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum Field {
    Title,
    Content,
    Keywords,
}

impl Field {
    fn boost(self) -> f64 {
        match self {
            Field::Title => TITLE_BOOST,
            Field::Content => CONTENT_BOOST,
            Field::Keywords => KEYWORDS_BOOST,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Posting {
    /// url -> (term frequency in field, field)
    entries: Vec<(String, usize, Field)>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct InvertedIndex {
    documents: HashMap<String, Document>,
    /// term -> postings across all fields
    postings: HashMap<String, Posting>,
    /// url -> total term count across title+content+keywords, for BM25 length norm
    doc_lengths: HashMap<String, usize>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex::default()
    }

    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.documents.contains_key(url)
    }

    /// Index or re-index a document: removes any prior postings for the
    /// same URL first (`update_document` semantics, matching Whoosh's
    /// `writer.update_document`), then adds fresh postings per field.
    pub fn update_document(
        &mut self,
        doc: Document,
        processed_title: &[String],
        processed_content: &[String],
    ) {
        self.remove_document(&doc.url);

        let mut length = 0usize;
        for (terms, field) in [
            (processed_title, Field::Title),
            (processed_content, Field::Content),
        ] {
            for term in terms {
                let posting = self.postings.entry(term.clone()).or_default();
                let existing = posting.entries.iter_mut().find(|(url, _, f)| {
                    url == &doc.url && std::mem::discriminant(f) == std::mem::discriminant(&field)
                });
                match existing {
                    Some(entry) => entry.1 += 1,
                    None => posting.entries.push((doc.url.clone(), 1, field)),
                }
                length += 1;
            }
        }
        for keyword in &doc.keywords {
            // Postings are keyed on the stemmed form so a stemmed query term
            // (see query.rs) matches regardless of field; `doc.keywords`
            // itself keeps the unstemmed surface form for display.
            let stemmed = crate::tokenize::stem_word(keyword);
            let posting = self.postings.entry(stemmed).or_default();
            posting.entries.push((doc.url.clone(), 1, Field::Keywords));
            length += 1;
        }

        self.doc_lengths.insert(doc.url.clone(), length);
        self.documents.insert(doc.url.clone(), doc);
    }

    fn remove_document(&mut self, url: &str) {
        if self.documents.remove(url).is_none() {
            return;
        }
        self.doc_lengths.remove(url);
        for posting in self.postings.values_mut() {
            posting.entries.retain(|(u, _, _)| u != url);
        }
        self.postings.retain(|_, p| !p.entries.is_empty());
    }

    fn average_doc_length(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        self.doc_lengths.values().sum::<usize>() as f64 / self.doc_lengths.len() as f64
    }

    /// BM25F-scored lookup of `term` across every field, ranked highest
    /// score first.
    pub fn score_term(&self, term: &str) -> Vec<(String, f64)> {
        self.score_term_in(term, None)
    }

    /// BM25F-scored lookup of `term`, restricted to postings in `field`
    /// — the engine behind `field:term` query clauses.
    pub fn score_term_in_field(&self, term: &str, field: Field) -> Vec<(String, f64)> {
        self.score_term_in(term, Some(field))
    }

    fn score_term_in(&self, term: &str, field_filter: Option<Field>) -> Vec<(String, f64)> {
        let Some(posting) = self.postings.get(term) else {
            return Vec::new();
        };
        let matching = || {
            posting.entries.iter().filter(|(_, _, field)| {
                field_filter
                    .map(|f| std::mem::discriminant(field) == std::mem::discriminant(&f))
                    .unwrap_or(true)
            })
        };

        let n = self.doc_count() as f64;
        let doc_freq = matching()
            .map(|(url, _, _)| url.clone())
            .collect::<std::collections::HashSet<_>>()
            .len() as f64;
        if doc_freq == 0.0 {
            return Vec::new();
        }
        let idf = ((n - doc_freq + 0.5) / (doc_freq + 0.5) + 1.0).ln();
        let avg_len = self.average_doc_length().max(1.0);

        let mut scores: HashMap<String, f64> = HashMap::new();
        for (url, tf, field) in matching() {
            let doc_len = *self.doc_lengths.get(url).unwrap_or(&0) as f64;
            let weighted_tf = *tf as f64 * field.boost();
            let numerator = weighted_tf * (K1 + 1.0);
            let denominator = weighted_tf + K1 * (1.0 - B + B * doc_len / avg_len);
            *scores.entry(url.clone()).or_insert(0.0) += idf * numerator / denominator;
        }

        let mut ranked: Vec<(String, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    pub fn get(&self, url: &str) -> Option<&Document> {
        self.documents.get(url)
    }

    /// Serialize and write atomically via write-to-temp-then-rename.
    pub fn commit(&self, path: &Path) -> Result<(), IndexError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let raw = fs::read_to_string(path)?;
        let index = serde_json::from_str(&raw)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn doc(url: &str, title: &str, keywords: &[&str]) -> Document {
        Document {
            url: url.to_string(),
            title: title.to_string(),
            content: String::new(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            summary: String::new(),
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn update_document_then_score_term_finds_it() {
        let mut index = InvertedIndex::new();
        index.update_document(
            doc("http://a/", "Rust Programming", &["rust", "programming"]),
            &["rust".to_string(), "program".to_string()],
            &["rust".to_string(), "crab".to_string()],
        );
        let scores = index.score_term("rust");
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].0, "http://a/");
    }

    #[test]
    fn reindexing_same_url_replaces_not_duplicates() {
        let mut index = InvertedIndex::new();
        index.update_document(doc("http://a/", "First", &["first"]), &[], &["first".to_string()]);
        index.update_document(doc("http://a/", "Second", &["second"]), &[], &["second".to_string()]);
        assert_eq!(index.doc_count(), 1);
        assert!(index.score_term("first").is_empty());
        assert_eq!(index.score_term("second").len(), 1);
    }

    #[test]
    fn score_term_ranks_higher_title_boost_first() {
        let mut index = InvertedIndex::new();
        index.update_document(
            doc("http://title-match/", "T", &[]),
            &["searchterm".to_string()],
            &[],
        );
        index.update_document(
            doc("http://content-match/", "T", &[]),
            &[],
            &["searchterm".to_string()],
        );
        let scores = index.score_term("searchterm");
        assert_eq!(scores[0].0, "http://title-match/");
    }

    #[test]
    fn commit_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        let mut index = InvertedIndex::new();
        index.update_document(doc("http://a/", "A", &["a"]), &["a".to_string()], &[]);
        index.commit(&path).unwrap();

        let loaded = InvertedIndex::load(&path).unwrap();
        assert_eq!(loaded.doc_count(), 1);
        assert!(loaded.contains("http://a/"));
    }
}
