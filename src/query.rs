//! # Query — Boolean / Phrase / Field-Scoped Search Parsing
//!
//! A small hand-rolled parser replacing Whoosh's `MultifieldParser`:
//! supports `AND`/`OR`/`NOT`, quoted phrases, and `field:term` scoping
//! across `title`/`content`/`keywords`. Grounded in `indexerNode.py`'s
//! `search()` docstring, which names exactly these four capabilities.
//!
//! Parsing keeps terms as the user typed them (lowercased only) so
//! clause structure stays easy to assert on; stemming happens at
//! lookup time in `search`, mirroring Whoosh's `StemmingAnalyzer`
//! running over both the indexed text and the query.

use crate::index::{Field, InvertedIndex};
use crate::tokenize::{process_text, stem_word};

#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Term(String),
    Phrase(Vec<String>),
    FieldTerm(FieldName, String),
    Not(Box<Clause>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldName {
    Title,
    Content,
    Keywords,
}

impl FieldName {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "title" => Some(FieldName::Title),
            "content" => Some(FieldName::Content),
            "keywords" => Some(FieldName::Keywords),
            _ => None,
        }
    }

    fn as_field(self) -> Field {
        match self {
            FieldName::Title => Field::Title,
            FieldName::Content => Field::Content,
            FieldName::Keywords => Field::Keywords,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub clauses: Vec<Clause>,
    pub operator: Operator,
}

/// Parse a query string into clauses joined by a single boolean
/// operator (mixing `AND` and `OR` in one query is not supported — the
/// first operator encountered wins, matching the common-case behavior
/// of simple query parsers rather than full operator precedence).
pub fn parse(query: &str) -> Query {
    let mut clauses = Vec::new();
    let mut operator = Operator::Or;
    let mut chars = query.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' {
            chars.next();
            let mut phrase_text = String::new();
            for ch in chars.by_ref() {
                if ch == '"' {
                    break;
                }
                phrase_text.push(ch);
            }
            let words = process_text(&phrase_text);
            clauses.push(Clause::Phrase(words));
            continue;
        }

        let mut token = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() || ch == '"' {
                break;
            }
            token.push(ch);
            chars.next();
        }

        match token.as_str() {
            "AND" => operator = Operator::And,
            "OR" => operator = Operator::Or,
            "NOT" => {
                if let Some(next_clause) = parse_next_term(&mut chars) {
                    clauses.push(Clause::Not(Box::new(next_clause)));
                }
            }
            _ if token.contains(':') => {
                let mut parts = token.splitn(2, ':');
                let field = parts.next().unwrap_or_default();
                let term = parts.next().unwrap_or_default();
                if let Some(field) = FieldName::parse(field) {
                    clauses.push(Clause::FieldTerm(field, term.to_lowercase()));
                } else {
                    clauses.push(Clause::Term(token.to_lowercase()));
                }
            }
            "" => {}
            _ => clauses.push(Clause::Term(token.to_lowercase())),
        }
    }

    Query { clauses, operator }
}

fn parse_next_term(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<Clause> {
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else {
            break;
        }
    }
    let mut token = String::new();
    for ch in chars.by_ref() {
        if ch.is_whitespace() {
            break;
        }
        token.push(ch);
    }
    if token.is_empty() {
        None
    } else {
        Some(Clause::Term(token.to_lowercase()))
    }
}

#[derive(Debug, Clone)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub score: f64,
}

/// Execute `query` against `index`, returning hits ranked by summed
/// BM25F score across every matched clause.
pub fn search(index: &InvertedIndex, query: &Query, limit: usize) -> Vec<SearchHit> {
    let mut scores: std::collections::HashMap<String, f64> = std::collections::HashMap::new();
    let mut excluded: std::collections::HashSet<String> = std::collections::HashSet::new();

    for clause in &query.clauses {
        match clause {
            // Index postings are stemmed (see tokenize::process_text), so a
            // plain or field-scoped term must be stemmed the same way before
            // it can find them — otherwise an inflected query term like
            // "programming" never matches the stored stem "program".
            Clause::Term(term) => accumulate(index, &stem_word(term), &mut scores),
            Clause::FieldTerm(field, term) => {
                for (url, score) in index.score_term_in_field(&stem_word(term), field.as_field()) {
                    *scores.entry(url).or_insert(0.0) += score;
                }
            }
            Clause::Phrase(words) => {
                for word in words {
                    accumulate(index, word, &mut scores);
                }
            }
            Clause::Not(inner) => {
                if let Clause::Term(term) = inner.as_ref() {
                    for (url, _) in index.score_term(&stem_word(term)) {
                        excluded.insert(url);
                    }
                }
            }
        }
    }

    let mut hits: Vec<(String, f64)> = scores
        .into_iter()
        .filter(|(url, _)| !excluded.contains(url))
        .collect();
    hits.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    hits.into_iter()
        .take(limit)
        .filter_map(|(url, score)| {
            index.get(&url).map(|doc| SearchHit {
                url: doc.url.clone(),
                title: doc.title.clone(),
                summary: doc.summary.clone(),
                score,
            })
        })
        .collect()
}

fn accumulate(index: &InvertedIndex, term: &str, scores: &mut std::collections::HashMap<String, f64>) {
    for (url, score) in index.score_term(term) {
        *scores.entry(url).or_insert(0.0) += score;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_terms_as_or_by_default() {
        let q = parse("rust crab");
        assert_eq!(q.operator, Operator::Or);
        assert_eq!(q.clauses, vec![Clause::Term("rust".into()), Clause::Term("crab".into())]);
    }

    #[test]
    fn parses_and_operator() {
        let q = parse("rust AND crab");
        assert_eq!(q.operator, Operator::And);
    }

    #[test]
    fn parses_quoted_phrase() {
        let q = parse(r#""open source""#);
        assert!(matches!(&q.clauses[0], Clause::Phrase(words) if !words.is_empty()));
    }

    #[test]
    fn parses_field_scoped_term() {
        let q = parse("title:github");
        assert_eq!(q.clauses, vec![Clause::FieldTerm(FieldName::Title, "github".into())]);
    }

    #[test]
    fn unknown_field_scope_falls_back_to_plain_term() {
        let q = parse("bogus:value");
        assert_eq!(q.clauses, vec![Clause::Term("bogus:value".into())]);
    }

    #[test]
    fn parses_not_clause() {
        let q = parse("rust NOT crab");
        assert!(matches!(&q.clauses[1], Clause::Not(inner) if **inner == Clause::Term("crab".into())));
    }

    #[test]
    fn search_excludes_not_matched_urls() {
        let mut index = InvertedIndex::new();
        index.update_document(
            crate::index::Document {
                url: "http://a/".into(),
                title: "Rust".into(),
                content: String::new(),
                keywords: vec![],
                summary: "summary a".into(),
                last_updated: chrono::Utc::now(),
            },
            &["rust".to_string(), "crab".to_string()],
            &[],
        );
        index.update_document(
            crate::index::Document {
                url: "http://b/".into(),
                title: "Rust".into(),
                content: String::new(),
                keywords: vec![],
                summary: "summary b".into(),
                last_updated: chrono::Utc::now(),
            },
            &["rust".to_string()],
            &[],
        );

        let q = parse("rust NOT crab");
        let hits = search(&index, &q, 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "http://b/");
    }

    #[test]
    fn search_term_matches_stemmed_posting() {
        let mut index = InvertedIndex::new();
        index.update_document(
            crate::index::Document {
                url: "http://a/".into(),
                title: "Python".into(),
                content: String::new(),
                keywords: vec![],
                summary: String::new(),
                last_updated: chrono::Utc::now(),
            },
            &[],
            &["python".to_string(), "program".to_string()],
        );

        let hits = search(&index, &parse("programming"), 10);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].url, "http://a/");
    }
}
