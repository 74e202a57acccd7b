//! The site under analysis
//!
//! A `CrawlTarget` is built once per run and never changes afterwards.
//! Building it validates the settings and compiles the exclusion patterns,
//! so invalid input is rejected before any request is made.

use crate::config::{validate_crawl_settings, Config, CrawlSettings};
use crate::url::{normalize_url, parse_base_url, same_site, ExclusionPattern, ExclusionSet};
use crate::AuditError;
use std::time::Duration;
use url::Url;

/// Base URL, crawl settings and active exclusion patterns of one analysis
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    base_url: Url,
    settings: CrawlSettings,
    exclusions: ExclusionSet,
}

impl CrawlTarget {
    /// Builds a target
    ///
    /// # Arguments
    ///
    /// * `base_url` - Root domain or URL; `https://` is assumed without a scheme
    /// * `settings` - Crawl settings, validated here
    /// * `exclusions` - Active exclusion patterns, in check order
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlTarget)` - Ready to crawl
    /// * `Err(AuditError)` - Invalid URL, settings or pattern
    pub fn new<S: AsRef<str>>(
        base_url: &str,
        settings: CrawlSettings,
        exclusions: &[S],
    ) -> Result<Self, AuditError> {
        validate_crawl_settings(&settings)?;

        let parsed = parse_base_url(base_url)?;
        let base_url = Url::parse(&normalize_url(parsed.as_str(), &parsed)?)?;
        let exclusions = ExclusionSet::compile(exclusions)?;

        Ok(Self {
            base_url,
            settings,
            exclusions,
        })
    }

    /// Builds the target described by a loaded config file
    pub fn from_config(config: &Config) -> Result<Self, AuditError> {
        Self::new(
            &config.target.base_url,
            config.crawler.clone(),
            &config.target.exclusions,
        )
    }

    /// The normalized base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn settings(&self) -> &CrawlSettings {
        &self.settings
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Page fetch timeout
    pub fn page_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.timeout_ms)
    }

    /// Timeout of each robots.txt and sitemap request
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.discovery_timeout_ms)
    }

    /// Whether `url` belongs to the target's site
    pub fn is_same_site(&self, url: &Url) -> bool {
        same_site(url, &self.base_url)
    }

    /// The first active exclusion pattern matching `url`
    pub fn excluded_by(&self, url: &str) -> Option<&ExclusionPattern> {
        self.exclusions.first_match(url)
    }
}
