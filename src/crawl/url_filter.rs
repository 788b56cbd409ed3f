// src/crawl/url_filter.rs
// =============================================================================
// Pure helpers that decide which links the crawler may follow.
//
// - resolve: turns a (possibly relative) link into an absolute URL
// - is_fetchable: rejects anchors and non-HTTP pseudo schemes
// - same_domain: keeps the crawl on the seed's host
//
// None of these fail loudly. A malformed link is simply dropped.
// =============================================================================

use url::Url;

// Links starting with one of these are never fetched
const BLOCKED_PREFIXES: [&str; 6] = ["#", "javascript:", "mailto:", "data:", "tel:", "ftp:"];

// Resolves a raw link against the page it was found on
//
// The fragment is removed so that "/a" and "/a#top" are the same page
// for the visited set.
//
// Examples:
//   base = "http://x.test/docs/"
//   "intro"           -> Some("http://x.test/docs/intro")
//   "/a#top"          -> Some("http://x.test/a")
//   "http://[broken"  -> None
pub fn resolve(raw_link: &str, base: &Url) -> Option<Url> {
    let raw_link = raw_link.trim();
    if raw_link.is_empty() {
        return None;
    }

    let mut absolute = base.join(raw_link).ok()?;
    absolute.set_fragment(None);
    Some(absolute)
}

pub fn is_fetchable(link: &str) -> bool {
    let link = link.trim();
    if link.is_empty() {
        return false;
    }

    // Scheme prefixes are compared case-insensitively ("JavaScript:" is still javascript)
    let lowered = link.to_ascii_lowercase();
    !BLOCKED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

// Only http and https documents are downloaded
pub fn is_http(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

// Compares host (and explicit port) only, scheme and path are ignored
//
// The url crate drops default ports while parsing, so
// "http://x.test:80/a" and "https://x.test/b" are the same domain.
pub fn same_domain(a: &str, b: &str) -> bool {
    let (Ok(a), Ok(b)) = (Url::parse(a), Url::parse(b)) else {
        return false;
    };

    same_host(&a, &b)
}

fn same_host(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(host_a), Some(host_b)) => {
            host_a.eq_ignore_ascii_case(host_b) && a.port() == b.port()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://x.test/docs/page.html").unwrap()
    }

    #[test]
    fn test_resolve_relative_link() {
        let resolved = resolve("intro.html", &base()).unwrap();
        assert_eq!(resolved.as_str(), "http://x.test/docs/intro.html");
    }

    #[test]
    fn test_resolve_root_relative_link() {
        let resolved = resolve("/a", &base()).unwrap();
        assert_eq!(resolved.as_str(), "http://x.test/a");
    }

    #[test]
    fn test_resolve_parent_directory() {
        let resolved = resolve("../b", &base()).unwrap();
        assert_eq!(resolved.as_str(), "http://x.test/b");
    }

    #[test]
    fn test_resolve_absolute_link_passes_through() {
        let resolved = resolve("https://other.test/x", &base()).unwrap();
        assert_eq!(resolved.as_str(), "https://other.test/x");
    }

    #[test]
    fn test_resolve_strips_fragment() {
        let resolved = resolve("/a#section", &base()).unwrap();
        assert_eq!(resolved.as_str(), "http://x.test/a");
    }

    #[test]
    fn test_resolve_malformed_link() {
        assert_eq!(resolve("http://[broken", &base()), None);
        assert_eq!(resolve("   ", &base()), None);
    }

    #[test]
    fn test_blocked_prefixes() {
        assert!(!is_fetchable("#frag"));
        assert!(!is_fetchable("javascript:void(0)"));
        assert!(!is_fetchable("JavaScript:alert(1)"));
        assert!(!is_fetchable("mailto:someone@x.test"));
        assert!(!is_fetchable("data:text/plain,hi"));
        assert!(!is_fetchable("tel:+123"));
        assert!(!is_fetchable("ftp://files.x.test"));
        assert!(!is_fetchable(""));
    }

    #[test]
    fn test_fetchable_links() {
        assert!(is_fetchable("/a"));
        assert!(is_fetchable("page.html"));
        assert!(is_fetchable("https://x.test/"));
    }

    #[test]
    fn test_same_domain_ignores_scheme_and_path() {
        assert!(same_domain("http://x.test/a", "https://x.test/b/c"));
        assert!(same_domain("http://x.test:80/", "http://x.test/"));
    }

    #[test]
    fn test_different_domains() {
        assert!(!same_domain("http://x.test/", "http://y.test/"));
        assert!(!same_domain("http://x.test/", "http://sub.x.test/"));
        assert!(!same_domain("http://x.test:8080/", "http://x.test/"));
    }

    #[test]
    fn test_unparsable_hosts_never_match() {
        assert!(!same_domain("not a url", "not a url"));
        assert!(!same_domain("mailto:a@x.test", "mailto:a@x.test"));
    }
}
