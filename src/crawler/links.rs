//! Outbound link extraction
//!
//! **Include:**
//! - `<a href="...">` anywhere in the document
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `rel="nofollow"` anchors, unless following them is enabled
//! - `javascript:`, `mailto:`, `tel:` links and data URIs
//! - Fragment-only links (same page anchors)
//! - Anything that is not http(s) after resolution

use scraper::{Html, Selector};
use url::Url;

/// Extracts absolute http(s) links from raw HTML
///
/// # Arguments
///
/// * `html` - The HTML content
/// * `page_url` - The URL of the page itself; hrefs are resolved against it
/// * `follow_nofollow` - Keep anchors carrying `rel="nofollow"`
///
/// # Example
///
/// ```
/// use site_audit::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a">A</a><a rel="nofollow" href="/b">B</a>"#;
/// let page = Url::parse("https://example.com/dir/page").unwrap();
/// assert_eq!(extract_links(html, &page, false), vec!["https://example.com/a"]);
/// ```
pub fn extract_links(html: &str, page_url: &Url, follow_nofollow: bool) -> Vec<String> {
    let document = Html::parse_document(html);
    extract_links_from_document(&document, page_url, follow_nofollow)
}

/// Extracts links from an already parsed document, in document order
pub fn extract_links_from_document(
    document: &Html,
    page_url: &Url,
    follow_nofollow: bool,
) -> Vec<String> {
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let attrs = element.value();

        if attrs.attr("download").is_some() {
            continue;
        }

        if !follow_nofollow && is_nofollow(attrs.attr("rel")) {
            continue;
        }

        if let Some(href) = attrs.attr("href") {
            if let Some(absolute_url) = resolve_link(href, page_url) {
                links.push(absolute_url);
            }
        }
    }

    links
}

fn is_nofollow(rel: Option<&str>) -> bool {
    rel.map(|r| {
        r.split_whitespace()
            .any(|token| token.eq_ignore_ascii_case("nofollow"))
    })
    .unwrap_or(false)
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, page_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match page_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
