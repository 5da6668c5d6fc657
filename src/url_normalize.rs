//! # URL Normalization
//!
//! Resolves a discovered `href` against the page it was found on, strips
//! fragments, and rejects anything that is not `http(s)`. Normalization is
//! idempotent: `normalize(normalize(x)) == normalize(x)` (property 8).

use url::Url;

/// Resolve `href` against `base`, strip the fragment, and reject
/// non-`http(s)` schemes. Returns `None` for anything that cannot be
/// resolved to an absolute `http(s)` URL.
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let base_url = Url::parse(base).ok()?;
    let resolved = base_url.join(href).ok()?;
    normalize(resolved.as_str())
}

/// Normalize an already-absolute URL string: parse it, strip the
/// fragment, reject non-`http(s)` schemes, and re-serialize.
pub fn normalize(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    parsed.set_fragment(None);
    Some(parsed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_relative_href_against_base() {
        let resolved = resolve("http://example.com/page", "/other").unwrap();
        assert_eq!(resolved, "http://example.com/other");
    }

    #[test]
    fn strips_fragment() {
        let n = normalize("http://example.com/page#section").unwrap();
        assert_eq!(n, "http://example.com/page");
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(normalize("ftp://example.com/file").is_none());
        assert!(normalize("mailto:a@b.com").is_none());
        assert!(normalize("javascript:void(0)").is_none());
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("http://example.com/page#frag").unwrap();
        let twice = normalize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn resolve_rejects_non_http_target_scheme() {
        assert!(resolve("http://example.com/", "ftp://other.com/x").is_none());
    }

    #[test]
    fn resolve_handles_protocol_relative_links() {
        let resolved = resolve("https://example.com/", "//cdn.example.com/a.js").unwrap();
        assert_eq!(resolved, "https://cdn.example.com/a.js");
    }

    proptest::proptest! {
        #[test]
        fn normalize_is_idempotent_over_arbitrary_paths_and_fragments(
            path in "[a-zA-Z0-9/_-]{0,32}",
            fragment in proptest::option::of("[a-zA-Z0-9_-]{0,16}"),
        ) {
            let mut url = format!("http://example.com/{path}");
            if let Some(frag) = &fragment {
                url.push('#');
                url.push_str(frag);
            }
            if let Some(once) = normalize(&url) {
                let twice = normalize(&once).unwrap();
                proptest::prop_assert_eq!(once, twice);
            }
        }
    }
}
