use serde::Deserialize;

/// Default page budget per analysis
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Default per-page fetch timeout (milliseconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default delay between consecutive fetches (milliseconds)
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1_000;

/// Default timeout for robots.txt and sitemap fetches (milliseconds)
pub const DEFAULT_DISCOVERY_TIMEOUT_MS: u64 = 10_000;

/// Main configuration structure for Site-Audit
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub crawler: CrawlSettings,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// The site under analysis
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Root domain or URL; `https://` is assumed when no scheme is given
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Active exclusion patterns, in the order they are checked
    #[serde(default)]
    pub exclusions: Vec<String>,
}

/// Order in which discovered links are visited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStrategy {
    #[default]
    BreadthFirst,
    DepthFirst,
}

impl CrawlStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BreadthFirst => "breadth_first",
            Self::DepthFirst => "depth_first",
        }
    }
}

/// Per-target crawl settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Maximum number of pages recorded per run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Timeout for a single page fetch (milliseconds)
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Minimum time between two fetches (milliseconds); robots.txt
    /// `Crawl-delay` overrides it
    #[serde(rename = "rate-limit-ms")]
    pub rate_limit_ms: u64,

    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    #[serde(rename = "follow-nofollow-links")]
    pub follow_nofollow_links: bool,

    #[serde(rename = "crawl-strategy")]
    pub crawl_strategy: CrawlStrategy,

    /// Timeout for each robots.txt / sitemap request (milliseconds)
    #[serde(rename = "discovery-timeout-ms")]
    pub discovery_timeout_ms: u64,

    /// HEAD-check same-site links of every page
    #[serde(rename = "check-broken-links")]
    pub check_broken_links: bool,

    /// Disables the private-network guard. Only settable from code, used to
    /// crawl local test servers.
    #[serde(skip)]
    pub allow_private_hosts: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            rate_limit_ms: DEFAULT_RATE_LIMIT_MS,
            respect_robots_txt: true,
            follow_nofollow_links: false,
            crawl_strategy: CrawlStrategy::BreadthFirst,
            discovery_timeout_ms: DEFAULT_DISCOVERY_TIMEOUT_MS,
            check_broken_links: false,
            allow_private_hosts: false,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler, also used as its robots.txt token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the `User-Agent` header value
    pub fn header_value(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SiteAuditBot".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/bot".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Path to the markdown report, if one should be written
    #[serde(rename = "report-path", default)]
    pub report_path: Option<String>,
}
