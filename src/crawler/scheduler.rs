//! Crawl scheduler
//!
//! This module drives one crawl over the frontier:
//! - Same-site, exclusion, robots.txt and private-network checks before any fetch
//! - A uniform delay between consecutive requests
//! - Page budget enforcement
//! - Link harvesting in breadth-first or depth-first order
//! - Optional broken-link checks
//!
//! Pages are processed strictly one at a time, so the delay holds between
//! every pair of requests and the frontier needs no synchronization.

use crate::crawler::extractor::{extract_from_document, PageRecord, ResponseInfo};
use crate::crawler::fetcher::{FetchError, Fetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::links::extract_links_from_document;
use crate::crawler::target::CrawlTarget;
use crate::output::ResultsSink;
use crate::robots::RobotsRules;
use crate::state::{SkipReason, UrlState};
use crate::url::normalize_url;
use crate::AuditError;
use scraper::Html;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use url::Url;

/// Most links HEAD-checked per page
pub const MAX_LINK_CHECKS_PER_PAGE: usize = 50;

/// Pages between two progress log lines
const PROGRESS_INTERVAL: usize = 10;

/// Enforces a minimum interval between consecutive requests
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the interval since the previous request has elapsed
    ///
    /// The first call never waits.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Delay between requests: robots.txt `Crawl-delay` if present, else the
/// configured rate limit
pub fn effective_interval(target: &CrawlTarget, robots: &RobotsRules) -> Duration {
    let ms = robots
        .crawl_delay_ms()
        .unwrap_or(target.settings().rate_limit_ms);
    Duration::from_millis(ms)
}

/// What a finished (or stopped) crawl produced
#[derive(Debug, Default)]
pub struct CrawlReport {
    /// Extracted pages, in visit order
    pub pages: Vec<PageRecord>,
    pub failed_urls: usize,
    pub skipped_urls: usize,
    /// The sink reported cancellation before the frontier was exhausted
    pub cancelled: bool,
}

/// Runs one crawl over a target
pub struct Scheduler<'a> {
    target: &'a CrawlTarget,
    fetcher: &'a Fetcher,
    robots: &'a RobotsRules,
    sink: &'a dyn ResultsSink,
    frontier: Frontier,
    limiter: RateLimiter,
    /// Broken-link verdicts by normalized URL, shared by all pages of the run
    link_status: HashMap<String, bool>,
    pages: Vec<PageRecord>,
    cancelled: bool,
}

impl<'a> Scheduler<'a> {
    /// Creates a scheduler
    ///
    /// # Arguments
    ///
    /// * `target` - The site under analysis
    /// * `fetcher` - The run's HTTP fetcher
    /// * `robots` - Rules applied when robots.txt is respected
    /// * `sink` - Receives each page as soon as it is extracted
    pub fn new(
        target: &'a CrawlTarget,
        fetcher: &'a Fetcher,
        robots: &'a RobotsRules,
        sink: &'a dyn ResultsSink,
    ) -> Self {
        let limiter = RateLimiter::new(effective_interval(target, robots));

        Self {
            target,
            fetcher,
            robots,
            sink,
            frontier: Frontier::new(),
            limiter,
            link_status: HashMap::new(),
            pages: Vec::new(),
            cancelled: false,
        }
    }

    /// Normalizes and enqueues the initial URLs
    ///
    /// # Returns
    ///
    /// The number of URLs enqueued
    pub fn seed(&mut self, urls: Vec<String>) -> usize {
        let base = self.target.base_url();
        let normalized: Vec<String> = urls
            .iter()
            .filter_map(|raw| match normalize_url(raw, base) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::debug!("Dropping seed {}: {}", raw, e);
                    None
                }
            })
            .collect();

        self.frontier
            .enqueue_all(normalized, self.target.settings().crawl_strategy)
    }

    /// Crawls until the frontier is empty, the budget is spent or the run
    /// is cancelled
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The crawl stopped normally (including cancellation)
    /// * `Err(AuditError)` - The sink failed to record a page
    pub async fn run(&mut self) -> Result<(), AuditError> {
        let max_pages = self.target.settings().max_pages as usize;

        while self.pages.len() < max_pages {
            if self.sink.is_cancelled() {
                tracing::info!("Analysis cancelled after {} pages", self.pages.len());
                self.cancelled = true;
                break;
            }

            let Some(url) = self.frontier.pop() else {
                break;
            };

            self.process(url).await?;
        }

        tracing::info!(
            "Crawl finished: {} pages, {} failed, {} skipped, {} still queued",
            self.pages.len(),
            self.frontier.failed_count(),
            self.frontier.skipped_count(),
            self.frontier.queued_len()
        );

        Ok(())
    }

    /// Handles one dequeued URL
    async fn process(&mut self, url_str: String) -> Result<(), AuditError> {
        let url = match Url::parse(&url_str) {
            Ok(url) => url,
            Err(e) => {
                tracing::debug!("Dropping unparseable URL {}: {}", url_str, e);
                self.frontier.mark_failed(&url_str);
                return Ok(());
            }
        };

        if let Some(reason) = self.policy_check(&url_str, &url) {
            self.frontier.mark_skipped(&url_str, reason);
            return Ok(());
        }

        if let Err(e) = self.fetcher.check(&url).await {
            tracing::debug!("Skipping {}: {}", url_str, e);
            self.frontier.mark_skipped(&url_str, SkipReason::Blocked);
            return Ok(());
        }

        self.limiter.wait().await;

        let fetched = match self.fetcher.fetch_page(&url).await {
            Ok(fetched) => fetched,
            Err(FetchError::Blocked(reason)) => {
                tracing::debug!("Skipping {}: redirect blocked ({})", url_str, reason);
                self.frontier.mark_skipped(&url_str, SkipReason::Blocked);
                return Ok(());
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url_str, e);
                self.frontier.mark_failed(&url_str);
                return Ok(());
            }
        };

        if !self.target.is_same_site(&fetched.final_url) {
            tracing::debug!(
                "Skipping {}: redirected off-site to {}",
                url_str,
                fetched.final_url
            );
            self.frontier.mark_skipped(&url_str, SkipReason::OffDomain);
            return Ok(());
        }

        let response = ResponseInfo {
            status_code: fetched.status_code,
            load_time_ms: fetched.load_time_ms,
            body_bytes: fetched.body.len(),
        };
        let (mut record, links) =
            self.parse_page(&fetched.body, &url_str, &fetched.final_url, response);

        let links: Vec<String> = links
            .iter()
            .filter_map(|link| normalize_url(link, &fetched.final_url).ok())
            .collect();

        if self.target.settings().check_broken_links {
            record.broken_links = Some(self.count_broken_links(&links).await);
        }

        self.sink.record_page(&record)?;
        self.pages.push(record);
        self.frontier.mark_visited(&url_str);

        let added = self
            .frontier
            .enqueue_all(links, self.target.settings().crawl_strategy);
        tracing::debug!("Visited {} ({} new links queued)", url_str, added);

        if self.pages.len() % PROGRESS_INTERVAL == 0 {
            tracing::info!(
                "Progress: {}/{} pages, {} queued",
                self.pages.len(),
                self.target.settings().max_pages,
                self.frontier.queued_len()
            );
        }

        Ok(())
    }

    /// Same-site, exclusion and robots.txt checks, in that order
    fn policy_check(&self, url_str: &str, url: &Url) -> Option<SkipReason> {
        if !self.target.is_same_site(url) {
            tracing::debug!("Skipping off-site URL {}", url_str);
            return Some(SkipReason::OffDomain);
        }

        if let Some(pattern) = self.target.excluded_by(url_str) {
            tracing::debug!("Skipping {}: matches exclusion '{}'", url_str, pattern.as_str());
            return Some(SkipReason::Excluded);
        }

        if self.target.settings().respect_robots_txt && !self.robots.is_allowed(&robots_path(url)) {
            tracing::debug!("Skipping {}: disallowed by robots.txt", url_str);
            return Some(SkipReason::RobotsDisallowed);
        }

        None
    }

    /// Parses the body once for both the page record and its links
    fn parse_page(
        &self,
        body: &str,
        url_str: &str,
        final_url: &Url,
        response: ResponseInfo,
    ) -> (PageRecord, Vec<String>) {
        let document = Html::parse_document(body);
        let record = extract_from_document(&document, url_str, self.target.base_url(), response);
        let links = extract_links_from_document(
            &document,
            final_url,
            self.target.settings().follow_nofollow_links,
        );
        (record, links)
    }

    /// HEAD-checks the page's same-site links
    ///
    /// A link counts as broken on a status >= 400 or a failed request. Pages
    /// already visited in this run are known to be fine; URLs refused by the
    /// guard are not counted.
    async fn count_broken_links(&mut self, links: &[String]) -> u32 {
        let mut seen = HashSet::new();
        let candidates: Vec<&String> = links
            .iter()
            .filter(|link| seen.insert(link.as_str()))
            .filter(|link| {
                Url::parse(link)
                    .map(|u| self.target.is_same_site(&u))
                    .unwrap_or(false)
            })
            .take(MAX_LINK_CHECKS_PER_PAGE)
            .collect();

        let timeout = self.target.discovery_timeout();
        let mut broken = 0;

        for link in candidates {
            if self.frontier.state(link) == Some(UrlState::Visited) {
                continue;
            }

            let cached = self.link_status.get(link.as_str()).copied();
            let is_broken = match cached {
                Some(verdict) => verdict,
                None => {
                    let Ok(url) = Url::parse(link) else {
                        continue;
                    };
                    self.limiter.wait().await;
                    let verdict = match self.fetcher.head_status(&url, timeout).await {
                        Ok(status) => status >= 400,
                        Err(FetchError::Blocked(_)) => false,
                        Err(e) => {
                            tracing::debug!("Link check failed for {}: {}", link, e);
                            true
                        }
                    };
                    self.link_status.insert(link.clone(), verdict);
                    verdict
                }
            };

            if is_broken {
                broken += 1;
            }
        }

        broken
    }

    /// Consumes the scheduler and returns what the crawl produced
    pub fn into_report(self) -> CrawlReport {
        CrawlReport {
            failed_urls: self.frontier.failed_count(),
            skipped_urls: self.frontier.skipped_count(),
            pages: self.pages,
            cancelled: self.cancelled,
        }
    }
}

/// Path plus query, as robots.txt rules see it
fn robots_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
