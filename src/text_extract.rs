//! # Text Extraction — HTML to Plain Text
//!
//! Strips boilerplate elements, prefers a `<main>`/`<article>`/`<body>`
//! text root in that order, then strips URL-like tokens and collapses
//! whitespace and punctuation noise. Grounded directly in
//! `indexerNode.py`'s `extract_text_from_html`.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").unwrap());
static URL_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://\S+|www\.\S+").unwrap());

const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "header", "footer", "meta", "link"];

/// Extracted `(title, body_text)` pair ready for tokenization.
pub struct ExtractedText {
    pub title: String,
    pub text: String,
}

/// Parse `html`, drop boilerplate elements, pick the most specific text
/// root available (`main` > `article` > `body` > whole document), and
/// normalize whitespace/punctuation.
pub fn extract_text_from_html(html: &str) -> ExtractedText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default();

    let root = ["main", "article", "body"]
        .iter()
        .find_map(|tag| Selector::parse(tag).ok().and_then(|sel| document.select(&sel).next()))
        .unwrap_or_else(|| document.root_element());

    let mut raw_text = String::new();
    collect_text(*root, &mut raw_text);

    let collapsed = WHITESPACE.replace_all(raw_text.trim(), " ");
    let no_urls = URL_TOKEN.replace_all(&collapsed, " ");
    let cleaned = NON_WORD.replace_all(&no_urls, " ");
    let text = WHITESPACE.replace_all(cleaned.trim(), " ").trim().to_string();

    ExtractedText { title, text }
}

/// Depth-first text collection that skips excluded elements' entire
/// subtrees, rather than filtering individual text nodes after the fact.
fn collect_text(node: ego_tree::NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            out.push_str(text);
            out.push(' ');
        }
        Node::Element(el) if EXCLUDED_TAGS.contains(&el.name()) => {}
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}
