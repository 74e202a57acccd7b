//! Sitemap discovery
//!
//! Builds the initial frontier of an analysis. The sources are tried in
//! order and the first one yielding URLs wins:
//!
//! 1. `/sitemap.xml`
//! 2. `/sitemap_index.xml`, each listed sitemap resolved in turn
//! 3. `Sitemap:` lines of `/robots.txt`
//! 4. the base URL alone
//!
//! Every request has its own timeout, and fetch or parse errors only empty
//! the step they occur in.

use crate::crawler::Fetcher;
use crate::robots::{fetch_robots_txt, RobotsRules};
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::collections::{HashSet, VecDeque};
use std::io::Cursor;
use std::time::Duration;
use url::Url;

/// How deep nested sitemap indexes are followed
const MAX_SITEMAP_DEPTH: usize = 3;

/// Sitemap documents fetched per discovery step
const MAX_SITEMAPS_PER_STEP: usize = 50;

/// Candidate URLs kept from one discovery step
pub const MAX_DISCOVERED_URLS: usize = 50_000;

/// The source that produced the initial frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    Sitemap,
    SitemapIndex,
    RobotsSitemaps,
    Homepage,
}

impl DiscoverySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sitemap => "sitemap.xml",
            Self::SitemapIndex => "sitemap_index.xml",
            Self::RobotsSitemaps => "robots.txt sitemaps",
            Self::Homepage => "homepage",
        }
    }
}

/// Result of sitemap discovery
#[derive(Debug, Clone)]
pub struct Discovery {
    pub urls: Vec<String>,
    pub source: DiscoverySource,
}

/// Resolves the ordered list of candidate URLs for a target
///
/// # Arguments
///
/// * `fetcher` - The run's HTTP fetcher
/// * `base` - Base URL of the target
/// * `timeout` - Timeout applied to each request
///
/// # Returns
///
/// Never empty: falls back to `[base]`.
pub async fn discover_urls(fetcher: &Fetcher, base: &Url, timeout: Duration) -> Discovery {
    if let Ok(sitemap_url) = base.join("/sitemap.xml") {
        let urls = resolve_sitemaps(fetcher, vec![sitemap_url], timeout).await;
        if !urls.is_empty() {
            return found(urls, DiscoverySource::Sitemap);
        }
    }

    if let Ok(index_url) = base.join("/sitemap_index.xml") {
        let urls = resolve_sitemaps(fetcher, vec![index_url], timeout).await;
        if !urls.is_empty() {
            return found(urls, DiscoverySource::SitemapIndex);
        }
    }

    if let Some(content) = fetch_robots_txt(fetcher, base, timeout).await {
        let listed: Vec<Url> = RobotsRules::parse(&content, "*")
            .sitemaps()
            .iter()
            .filter_map(|s| base.join(s).ok())
            .collect();
        if !listed.is_empty() {
            tracing::debug!("robots.txt lists {} sitemap(s)", listed.len());
            let urls = resolve_sitemaps(fetcher, listed, timeout).await;
            if !urls.is_empty() {
                return found(urls, DiscoverySource::RobotsSitemaps);
            }
        }
    }

    tracing::info!("No sitemap found, seeding from {} only", base);
    Discovery {
        urls: vec![base.to_string()],
        source: DiscoverySource::Homepage,
    }
}

fn found(urls: Vec<String>, source: DiscoverySource) -> Discovery {
    tracing::info!("Discovered {} URLs from {}", urls.len(), source.as_str());
    Discovery { urls, source }
}

/// Fetches sitemaps breadth-first, following nested index entries
///
/// Page URLs are returned in document order without duplicates.
async fn resolve_sitemaps(fetcher: &Fetcher, roots: Vec<Url>, timeout: Duration) -> Vec<String> {
    let mut queue: VecDeque<(Url, usize)> = roots.into_iter().map(|u| (u, 0)).collect();
    let mut fetched: HashSet<Url> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut urls = Vec::new();

    while let Some((sitemap_url, depth)) = queue.pop_front() {
        if fetched.len() >= MAX_SITEMAPS_PER_STEP || urls.len() >= MAX_DISCOVERED_URLS {
            break;
        }
        if !fetched.insert(sitemap_url.clone()) {
            continue;
        }

        let xml = match fetcher.get_text(&sitemap_url, timeout).await {
            Ok(xml) => xml,
            Err(e) => {
                tracing::debug!("Sitemap {} unavailable: {}", sitemap_url, e);
                continue;
            }
        };

        let entries = parse_sitemap(&xml);
        tracing::debug!(
            "Sitemap {}: {} URLs, {} nested sitemaps",
            sitemap_url,
            entries.urls.len(),
            entries.sitemaps.len()
        );

        for url in entries.urls {
            if urls.len() >= MAX_DISCOVERED_URLS {
                break;
            }
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }

        if depth < MAX_SITEMAP_DEPTH {
            for nested in entries.sitemaps {
                queue.push_back((nested, depth + 1));
            }
        }
    }

    urls
}

/// Entries of one sitemap document
#[derive(Debug, Default, PartialEq)]
pub struct SitemapEntries {
    /// `<url><loc>` values
    pub urls: Vec<String>,
    /// `<sitemap><loc>` values of an index
    pub sitemaps: Vec<Url>,
}

/// Parses a sitemap or sitemap index document
///
/// Malformed documents yield whatever was read before the first error.
pub fn parse_sitemap(xml: &str) -> SitemapEntries {
    let mut entries = SitemapEntries::default();

    for entity in SiteMapReader::new(Cursor::new(xml.as_bytes())) {
        match entity {
            SiteMapEntity::Url(url_entry) => {
                if let Some(url) = url_entry.loc.get_url() {
                    entries.urls.push(url.to_string());
                }
            }
            SiteMapEntity::SiteMap(sitemap_entry) => {
                if let Some(url) = sitemap_entry.loc.get_url() {
                    entries.sitemaps.push(url);
                }
            }
            SiteMapEntity::Err(e) => {
                tracing::debug!("Sitemap parse error: {:?}", e);
                break;
            }
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserAgentConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(&UserAgentConfig::default(), Duration::from_secs(5), true).unwrap()
    }

    fn urlset(urls: &[String]) -> String {
        let body: String = urls
            .iter()
            .map(|u| format!("<url><loc>{}</loc></url>", u))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
            body
        )
    }

    fn index(sitemaps: &[String]) -> String {
        let body: String = sitemaps
            .iter()
            .map(|u| format!("<sitemap><loc>{}</loc></sitemap>", u))
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
            body
        )
    }

    async fn serve(server: &MockServer, at: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(at))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_urlset() {
        let xml = urlset(&[
            "https://example.com/".to_string(),
            "https://example.com/about".to_string(),
        ]);
        let entries = parse_sitemap(&xml);
        assert_eq!(
            entries.urls,
            vec!["https://example.com/", "https://example.com/about"]
        );
        assert!(entries.sitemaps.is_empty());
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert_eq!(parse_sitemap("not xml at all"), SitemapEntries::default());
    }

    #[tokio::test]
    async fn test_sitemap_xml_wins() {
        let server = MockServer::start().await;
        let page = format!("{}/a", server.uri());
        serve(&server, "/sitemap.xml", 200, urlset(&[page.clone()])).await;

        let base = Url::parse(&server.uri()).unwrap();
        let discovery = discover_urls(&fetcher(), &base, Duration::from_secs(2)).await;
        assert_eq!(discovery.source, DiscoverySource::Sitemap);
        assert_eq!(discovery.urls, vec![page]);
    }

    #[tokio::test]
    async fn test_index_resolved_recursively() {
        let server = MockServer::start().await;
        let uri = server.uri();
        serve(&server, "/sitemap.xml", 404, String::new()).await;
        serve(
            &server,
            "/sitemap_index.xml",
            200,
            index(&[format!("{}/posts.xml", uri), format!("{}/pages.xml", uri)]),
        )
        .await;
        serve(&server, "/posts.xml", 200, urlset(&[format!("{}/post-1", uri)])).await;
        serve(&server, "/pages.xml", 200, urlset(&[format!("{}/about", uri)])).await;

        let base = Url::parse(&uri).unwrap();
        let discovery = discover_urls(&fetcher(), &base, Duration::from_secs(2)).await;
        assert_eq!(discovery.source, DiscoverySource::SitemapIndex);
        assert_eq!(
            discovery.urls,
            vec![format!("{}/post-1", uri), format!("{}/about", uri)]
        );
    }

    #[tokio::test]
    async fn test_robots_sitemap_used_when_both_missing() {
        let server = MockServer::start().await;
        let uri = server.uri();
        serve(&server, "/sitemap.xml", 404, String::new()).await;
        serve(&server, "/sitemap_index.xml", 404, String::new()).await;
        serve(
            &server,
            "/robots.txt",
            200,
            format!("User-agent: *\nDisallow:\nSitemap: {}/listed.xml\n", uri),
        )
        .await;
        serve(&server, "/listed.xml", 200, urlset(&[format!("{}/from-robots", uri)])).await;

        let base = Url::parse(&uri).unwrap();
        let discovery = discover_urls(&fetcher(), &base, Duration::from_secs(2)).await;
        assert_eq!(discovery.source, DiscoverySource::RobotsSitemaps);
        assert_eq!(discovery.urls, vec![format!("{}/from-robots", uri)]);
    }

    #[tokio::test]
    async fn test_homepage_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let discovery = discover_urls(&fetcher(), &base, Duration::from_secs(2)).await;
        assert_eq!(discovery.source, DiscoverySource::Homepage);
        assert_eq!(discovery.urls, vec![base.to_string()]);
    }

    #[tokio::test]
    async fn test_guarded_fetcher_falls_back_to_homepage() {
        let guarded =
            Fetcher::new(&UserAgentConfig::default(), Duration::from_secs(5), false).unwrap();
        let base = Url::parse("http://127.0.0.1:9/").unwrap();
        let discovery = discover_urls(&guarded, &base, Duration::from_secs(1)).await;
        assert_eq!(discovery.source, DiscoverySource::Homepage);
    }
}
