// src/extract/html.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, so broken markup still parses
//
// A mirror needs more than <a> tags: stylesheets, scripts, images and form
// targets are all part of the site. So we collect every `href`, `src` and
// `action` attribute, in that order.
// =============================================================================

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::crawl::url_filter::{is_fetchable, is_http, resolve};

// Attributes that point at another resource, scanned in this order
const LINK_ATTRIBUTES: [&str; 3] = ["href", "src", "action"];

// Extracts all fetchable links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   base_url: the URL of the page (for resolving relative links)
//
// Returns: absolute http(s) URLs, deduplicated, first occurrence wins
//
// Example:
//   html = "<a href='/docs'>Docs</a><a href='#top'>Top</a>"
//   base_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, base_url: &str) -> Vec<String> {
    let base = match Url::parse(base_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(base_url, error = %e, "cannot resolve links against an invalid base URL");
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for attribute in LINK_ATTRIBUTES {
        // "[href]" and friends are constant selectors, parsing cannot fail
        let css = format!("[{attribute}]");
        let Ok(selector) = Selector::parse(&css) else {
            continue;
        };

        for element in document.select(&selector) {
            let Some(raw) = element.value().attr(attribute) else {
                continue;
            };
            if !is_fetchable(raw) {
                continue;
            }

            let Some(absolute) = resolve(raw, &base) else {
                continue;
            };
            if !is_http(&absolute) {
                continue;
            }

            let absolute = String::from(absolute);
            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    links
}
