//! Robots.txt handling module
//!
//! This module fetches and parses a target's robots.txt. Fetching never
//! fails: any problem yields a permissive rule set.

mod parser;

pub use parser::RobotsRules;

use crate::crawler::Fetcher;
use std::time::Duration;
use url::Url;

/// Fetches the raw robots.txt of the site `base` belongs to
///
/// # Returns
///
/// * `Some(String)` - Body of a successful response
/// * `None` - Missing, non-2xx, blocked, timed out or unreadable
pub async fn fetch_robots_txt(fetcher: &Fetcher, base: &Url, timeout: Duration) -> Option<String> {
    let robots_url = base.join("/robots.txt").ok()?;

    match fetcher.get_text(&robots_url, timeout).await {
        Ok(body) => {
            tracing::debug!("Fetched {} ({} bytes)", robots_url, body.len());
            Some(body)
        }
        Err(e) => {
            tracing::debug!("No robots.txt at {}: {}", robots_url, e);
            None
        }
    }
}

/// Fetches and parses robots.txt for a target
///
/// # Arguments
///
/// * `fetcher` - The run's HTTP fetcher
/// * `base` - Base URL of the target
/// * `agent_token` - The crawler's robots.txt token
/// * `timeout` - Timeout for the robots.txt request
pub async fn fetch_robots(
    fetcher: &Fetcher,
    base: &Url,
    agent_token: &str,
    timeout: Duration,
) -> RobotsRules {
    match fetch_robots_txt(fetcher, base, timeout).await {
        Some(content) => {
            let rules = RobotsRules::parse(&content, agent_token);
            tracing::info!(
                "robots.txt: {} allow, {} disallow rules, crawl-delay {:?}ms",
                rules.allow_rules().len(),
                rules.disallow_rules().len(),
                rules.crawl_delay_ms()
            );
            rules
        }
        None => RobotsRules::permissive(),
    }
}
