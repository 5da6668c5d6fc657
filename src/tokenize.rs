//! # Tokenize — Word Processing, Keywords, Summarization
//!
//! Replaces the reference's NLTK `word_tokenize`/`sent_tokenize` +
//! WordNet lemmatizer with a regex-based segmenter and `rust_stemmers`
//! Porter stemmer (stemming, not lemmatization — the closest
//! dependency-light equivalent available in the Rust ecosystem).
//! Grounded in `indexerNode.py`'s `process_text`, `extract_keywords`,
//! and `generate_summary`.
//!
//! Two pipelines share the same lowercase/split/stopword-filter base:
//! `process_text` additionally stems, and is what the index's
//! title/content postings (and query terms, at lookup time) are built
//! from; `extract_words` stops short of stemming and feeds
//! `extract_keywords`, so a stored keyword stays a recognizable surface
//! form (`programming`, not `program`) the way the reference's
//! lemmatizer-backed, unstemmed `keywords` field does.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use once_cell::sync::Lazy;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

static SENTENCE_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:[.!?]+)(?:\s+|$)").unwrap());
static WORD_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

/// Fixed English stopword list, standing in for the reference's
/// downloaded NLTK corpus — no network fetch needed at runtime.
const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is", "it",
    "its", "of", "on", "that", "the", "to", "was", "were", "will", "with", "this", "but", "they",
    "have", "had", "what", "when", "where", "who", "which", "or", "not", "no", "so", "if", "than",
    "then", "their", "there", "these", "those", "i", "you", "we", "do", "does", "did", "can",
    "could", "should", "would", "about", "into", "over", "after", "before", "between",
];

fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Split `text` into sentences on `.`/`!`/`?` boundaries.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stem a single lowercase word. Runs behind `catch_unwind` since
/// `rust_stemmers` is a dependency boundary we don't control; on panic,
/// falls back to the word unchanged rather than losing it, mirroring
/// the reference's broad `except Exception` fallback in `process_text`.
pub fn stem_word(word: &str) -> String {
    let stemmer = Stemmer::create(Algorithm::English);
    catch_unwind(AssertUnwindSafe(|| stemmer.stem(word).into_owned())).unwrap_or_else(|_| {
        tracing::warn!(word, "stemmer panicked, falling back to raw token");
        word.to_string()
    })
}

/// Lowercase, tokenize into alphanumeric words, drop stopwords, and stem
/// each remaining word. This is the pipeline the inverted index's
/// title/content postings are built from, and the one query terms must
/// be run through before a lookup — the index never stores an
/// unstemmed token.
pub fn process_text(text: &str) -> Vec<String> {
    extract_words(text).into_iter().map(|w| stem_word(&w)).collect()
}

/// Lowercase, tokenize into alphanumeric words, and drop stopwords,
/// without stemming. Used where the surface form of the word matters
/// (keyword extraction), unlike `process_text`'s postings pipeline.
pub fn extract_words(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD_SPLIT
        .find_iter(&lower)
        .map(|m| m.as_str())
        .filter(|w| w.len() > 3 && !is_stopword(w))
        .map(str::to_string)
        .collect()
}

/// Extract the `top_n` most frequent words as keywords. Takes
/// unstemmed words (see `extract_words`) so keywords stay recognizable
/// surface forms rather than stems.
pub fn extract_keywords(processed_words: &[String], top_n: usize) -> Vec<String> {
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for word in processed_words {
        *freq.entry(word.as_str()).or_insert(0) += 1;
    }
    let mut counted: Vec<(&str, usize)> = freq.into_iter().collect();
    counted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counted
        .into_iter()
        .take(top_n)
        .map(|(word, _)| word.to_string())
        .collect()
}

/// Extractive summary: the first sentence plus the last `max_sentences
/// - 1` sentences, joined. Mirrors `generate_summary`'s heuristic that
/// the opening sentence is usually the most informative.
pub fn generate_summary(text: &str, max_sentences: usize) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return String::new();
    }
    if sentences.len() <= max_sentences {
        return sentences.join(" ");
    }

    let mut summary = vec![sentences[0].clone()];
    if max_sentences > 1 {
        let tail_start = sentences.len() - (max_sentences - 1);
        summary.extend(sentences[tail_start..].iter().cloned());
    }
    summary.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_sentences_on_punctuation() {
        let sentences = split_sentences("Hello world. How are you? Fine!");
        assert_eq!(sentences, vec!["Hello world", "How are you", "Fine"]);
    }

    #[test]
    fn process_text_drops_stopwords_and_stems() {
        let words = process_text("The runners are running quickly");
        assert!(!words.contains(&"the".to_string()));
        assert!(!words.contains(&"are".to_string()));
        assert!(words.contains(&"run".to_string()) || words.contains(&"runner".to_string()));
    }

    #[test]
    fn process_text_drops_tokens_of_length_three_or_less() {
        let words = process_text("api css cat programming");
        assert!(!words.contains(&"api".to_string()));
        assert!(!words.contains(&"css".to_string()));
        assert!(!words.contains(&"cat".to_string()));
        assert!(words.iter().any(|w| w.starts_with("program")));
    }

    #[test]
    fn extract_words_preserves_surface_form_unstemmed() {
        let words = extract_words("Python python PYTHON programming");
        assert!(words.contains(&"programming".to_string()));
        assert_eq!(words.iter().filter(|w| w.as_str() == "python").count(), 3);
    }

    #[test]
    fn stem_word_reduces_gerund_to_root() {
        assert_eq!(stem_word("programming"), "program");
    }

    #[test]
    fn extract_keywords_orders_by_frequency() {
        let words: Vec<String> = vec!["rust", "rust", "crab", "rust", "crab"]
            .into_iter()
            .map(String::from)
            .collect();
        let keywords = extract_keywords(&words, 2);
        assert_eq!(keywords, vec!["rust".to_string(), "crab".to_string()]);
    }

    #[test]
    fn generate_summary_short_text_returns_all_sentences() {
        let summary = generate_summary("One. Two. Three.", 3);
        assert_eq!(summary, "One Two Three");
    }

    #[test]
    fn generate_summary_long_text_uses_first_and_tail() {
        let summary = generate_summary("One. Two. Three. Four. Five.", 3);
        assert_eq!(summary, "One Four Five");
    }

    #[test]
    fn generate_summary_empty_text_returns_empty_string() {
        assert_eq!(generate_summary("", 3), "");
    }
}
