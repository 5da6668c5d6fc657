//! # Link Extractor — `<a href>` Collection
//!
//! Extracts, resolves, and dedups outbound links from a fetched page,
//! capping at 100 per page per the worker-side cap (distinct from the
//! coordinator-side `new_urls_per_page` merge cap in `coordinator.rs`).
//! Grounded in `crawlerNode.py`'s BeautifulSoup `find_all('a', href=True)`
//! pass, generalized through proper URL resolution instead of a bare
//! `href.startswith("http")` string check.

use std::collections::HashSet;

use scraper::{Html, Selector};

use crate::url_normalize;

const MAX_LINKS_PER_PAGE: usize = 100;

/// Parse `html` (fetched from `page_url`), extract `<a href>` targets,
/// resolve them against `page_url`, drop non-`http(s)` and duplicate
/// links, and cap the result at 100.
pub fn extract_links(page_url: &str, html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a[href]").expect("static selector is valid");

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        if links.len() >= MAX_LINKS_PER_PAGE {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(resolved) = url_normalize::resolve(page_url, href) else {
            continue;
        };
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}

/// Best-effort `<title>` extraction for the worker's `DOC` hint field.
/// Returns `None` on any parse miss rather than failing the whole page —
/// the indexer performs its own authoritative extraction regardless.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_and_resolves_absolute_and_relative_links() {
        let html = r#"<html><body>
            <a href="http://b.com/">b</a>
            <a href="/relative">rel</a>
            <a href="http://c.com/#frag">c</a>
        </body></html>"#;
        let links = extract_links("http://a.com/page", html);
        assert!(links.contains(&"http://b.com/".to_string()));
        assert!(links.contains(&"http://a.com/relative".to_string()));
        assert!(links.contains(&"http://c.com/".to_string()));
    }

    #[test]
    fn rejects_non_http_schemes() {
        let html = r#"<a href="ftp://x.com/">x</a><a href="mailto:a@b.com">m</a>"#;
        let links = extract_links("http://a.com/", html);
        assert!(links.is_empty());
    }

    #[test]
    fn dedups_links() {
        let html = r#"<a href="http://b.com/">1</a><a href="http://b.com/">2</a>"#;
        let links = extract_links("http://a.com/", html);
        assert_eq!(links.len(), 1);
    }

    #[test]
    fn caps_at_100_links() {
        let mut html = String::new();
        for i in 0..150 {
            html.push_str(&format!(r#"<a href="http://b.com/{}">x</a>"#, i));
        }
        let links = extract_links("http://a.com/", &html);
        assert_eq!(links.len(), 100);
    }

    #[test]
    fn extracts_title() {
        let html = "<html><head><title>  Hello World  </title></head><body></body></html>";
        assert_eq!(extract_title(html).unwrap(), "Hello World");
    }

    #[test]
    fn missing_title_returns_none() {
        assert!(extract_title("<html><body>no title</body></html>").is_none());
    }
}
