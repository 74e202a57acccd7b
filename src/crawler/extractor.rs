//! Page signal extraction
//!
//! Turns a fetched HTML document into a `PageRecord`. Every field is best
//! effort: a missing element yields `None`, `0` or `false`.

use crate::url::same_site;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Elements whose text is not visible page content
const HIDDEN_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// One crawled page's extracted SEO signals
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// Normalized URL the page was fetched from
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    /// Text of the first `<h1>`
    pub h1: Option<String>,
    pub canonical_url: Option<String>,
    pub word_count: u32,
    pub status_code: u16,
    pub load_time_ms: u64,
    /// Size of the HTML, rounded to the nearest KB
    pub page_size_kb: u32,
    pub has_robots_meta: bool,
    pub is_indexable: bool,
    pub has_og_tags: bool,
    pub has_twitter_cards: bool,
    pub has_schema_markup: bool,
    pub total_images: u32,
    /// Images without an `alt` attribute
    pub images_without_alt: u32,
    pub internal_links: u32,
    pub external_links: u32,
    /// `None` when broken links were not checked
    pub broken_links: Option<u32>,
}

/// Response data the extractor needs besides the document
#[derive(Debug, Clone, Copy)]
pub struct ResponseInfo {
    pub status_code: u16,
    pub load_time_ms: u64,
    pub body_bytes: usize,
}

/// Parses raw HTML and extracts a page record
///
/// # Arguments
///
/// * `html` - The raw HTML body
/// * `url` - The page's normalized URL
/// * `base` - The crawl target's base URL (for internal/external link counts)
/// * `response` - Status, timing and size of the response
pub fn extract_page(html: &str, url: &str, base: &Url, response: ResponseInfo) -> PageRecord {
    let document = Html::parse_document(html);
    extract_from_document(&document, url, base, response)
}

/// Extracts a page record from an already parsed document
pub fn extract_from_document(
    document: &Html,
    url: &str,
    base: &Url,
    response: ResponseInfo,
) -> PageRecord {
    let (total_images, images_without_alt) = count_images(document);
    let (internal_links, external_links) = count_links(document, base);
    let robots_content = first_attr(document, r#"meta[name="robots"]"#, "content");

    PageRecord {
        url: url.to_string(),
        title: first_text(document, "title"),
        meta_description: first_attr(document, r#"meta[name="description"]"#, "content"),
        h1: first_text(document, "h1"),
        canonical_url: first_attr(document, r#"link[rel="canonical"]"#, "href"),
        word_count: count_words(document),
        status_code: response.status_code,
        load_time_ms: response.load_time_ms,
        page_size_kb: ((response.body_bytes + 512) / 1024) as u32,
        has_robots_meta: exists(document, r#"meta[name="robots"]"#),
        is_indexable: !robots_content
            .map(|c| c.to_lowercase().contains("noindex"))
            .unwrap_or(false),
        has_og_tags: exists(document, r#"meta[property^="og:"]"#),
        has_twitter_cards: exists(document, r#"meta[name^="twitter:"]"#),
        has_schema_markup: exists(document, r#"script[type="application/ld+json"]"#)
            || exists(document, "[itemscope]"),
        total_images,
        images_without_alt,
        internal_links,
        external_links,
        broken_links: None,
    }
}

fn exists(document: &Html, selector: &str) -> bool {
    Selector::parse(selector)
        .map(|sel| document.select(&sel).next().is_some())
        .unwrap_or(false)
}

/// Trimmed text of the first matching element, `None` when missing or blank
fn first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Trimmed attribute of the first matching element, `None` when missing or blank
fn first_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Whitespace-separated words of the visible body text
fn count_words(document: &Html) -> u32 {
    let Ok(body_selector) = Selector::parse("body") else {
        return 0;
    };
    let Some(body) = document.select(&body_selector).next() else {
        return 0;
    };

    let mut words = 0u32;
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ElementRef::wrap(ancestor)
                .map(|e| HIDDEN_TEXT_ELEMENTS.contains(&e.value().name()))
                .unwrap_or(false)
        });
        if !hidden {
            words += text.split_whitespace().count() as u32;
        }
    }
    words
}

fn count_images(document: &Html) -> (u32, u32) {
    let Ok(sel) = Selector::parse("img") else {
        return (0, 0);
    };

    let mut total = 0u32;
    let mut without_alt = 0u32;
    for img in document.select(&sel) {
        total += 1;
        if img.value().attr("alt").is_none() {
            without_alt += 1;
        }
    }
    (total, without_alt)
}

/// Counts anchors pointing inside and outside the target site
///
/// Relative hrefs and absolute http(s) hrefs on the target's host are
/// internal; other absolute http(s) hrefs are external. Fragment-only and
/// non-web hrefs are not counted.
fn count_links(document: &Html, base: &Url) -> (u32, u32) {
    let Ok(sel) = Selector::parse("a[href]") else {
        return (0, 0);
    };

    let mut internal = 0u32;
    let mut external = 0u32;
    for element in document.select(&sel) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match classify_href(href.trim(), base) {
            Some(true) => internal += 1,
            Some(false) => external += 1,
            None => {}
        }
    }
    (internal, external)
}

/// `Some(true)` for internal, `Some(false)` for external, `None` for neither
fn classify_href(href: &str, base: &Url) -> Option<bool> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//") {
        let resolved = base.join(href).ok()?;
        return Some(same_site(&resolved, base));
    }

    if has_scheme(&lower) {
        // mailto:, tel:, javascript:, data: ...
        return None;
    }

    Some(true)
}

/// True when the href starts with a URL scheme (`letter *( letter / digit / + / - / . ) :`)
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
