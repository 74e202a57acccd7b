//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the identifying user agent
//! - Guarding every request, redirect hop and DNS answer against private hosts
//! - GET requests for pages, robots.txt and sitemaps
//! - HEAD requests for broken-link checks
//! - Error classification

use crate::config::UserAgentConfig;
use crate::url::{check_url, check_url_host, resolve_public, BlockReason, ResolveError};
use hyper::client::connect::dns::Name;
use reqwest::dns::{Addrs, Resolve, Resolving};
use reqwest::{redirect::Policy, Client, Response};
use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Maximum number of redirects followed for a single request
pub const MAX_REDIRECTS: usize = 10;

/// Errors for a single fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("blocked by private-network guard: {0}")]
    Blocked(BlockReason),

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("more than {0} redirects")]
    TooManyRedirects(usize),

    #[error("unexpected content type {0}")]
    NotHtml(String),

    #[error("failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    /// Returns true when the request was refused before leaving the process
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,
    /// HTTP status code
    pub status_code: u16,
    /// Content-Type header value
    pub content_type: Option<String>,
    /// Page body content
    pub body: String,
    /// Time from sending the request to the end of the body
    pub load_time_ms: u64,
}

/// Guarded HTTP client shared by one analysis run
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    guard_enabled: bool,
}

impl Fetcher {
    /// Builds a fetcher
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Identification sent with every request
    /// * `timeout` - Default timeout for page requests
    /// * `allow_private_hosts` - Disables the private-network guard
    ///
    /// # Returns
    ///
    /// * `Ok(Fetcher)` - Successfully built HTTP client
    /// * `Err(reqwest::Error)` - Failed to build client
    pub fn new(
        user_agent: &UserAgentConfig,
        timeout: Duration,
        allow_private_hosts: bool,
    ) -> Result<Self, reqwest::Error> {
        let guard_enabled = !allow_private_hosts;

        // `previous` holds every URL requested so far, the original included
        let redirect_policy = Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                return attempt.error(format!("more than {} redirects", MAX_REDIRECTS));
            }
            if guard_enabled {
                if let Err(reason) = check_url_host(attempt.url()) {
                    return attempt.error(reason);
                }
            }
            attempt.follow()
        });

        let mut builder = Client::builder()
            .user_agent(user_agent.header_value())
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .redirect(redirect_policy)
            .gzip(true)
            .brotli(true);
        if guard_enabled {
            builder = builder.dns_resolver(Arc::new(GuardedResolver));
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            guard_enabled,
        })
    }

    /// Whether the private-network guard is active
    pub fn guard_enabled(&self) -> bool {
        self.guard_enabled
    }

    /// Drops the up-front check while the client keeps guarding redirect
    /// hops and DNS answers, so those layers can be exercised on loopback
    #[cfg(test)]
    pub(crate) fn without_request_check(mut self) -> Self {
        self.guard_enabled = false;
        self
    }

    /// Runs the private-network guard for a URL
    pub async fn check(&self, url: &Url) -> Result<(), FetchError> {
        if !self.guard_enabled {
            return Ok(());
        }
        check_url(url).await.map_err(FetchError::Blocked)
    }

    /// Fetches an HTML page
    ///
    /// Non-2xx responses and non-HTML content types are failures. A missing
    /// Content-Type header is accepted.
    pub async fn fetch_page(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.check(url).await?;

        let started = Instant::now();
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = header_value(&response, reqwest::header::CONTENT_TYPE);
        if let Some(ct) = &content_type {
            let ct = ct.to_lowercase();
            if !ct.contains("html") && !ct.starts_with("text/plain") {
                return Err(FetchError::NotHtml(ct));
            }
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
            load_time_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Fetches a text resource (robots.txt, sitemap) with its own timeout
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Body of a 2xx response
    /// * `Err(FetchError)` - Anything else
    pub async fn get_text(&self, url: &Url, timeout: Duration) -> Result<String, FetchError> {
        self.check(url).await?;

        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })
    }

    /// Sends a HEAD request and returns the final status code
    pub async fn head_status(&self, url: &Url, timeout: Duration) -> Result<u16, FetchError> {
        self.check(url).await?;

        let response = self
            .client
            .head(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify_error)?;

        Ok(response.status().as_u16())
    }
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// DNS resolver that refuses names pointing at non-public addresses
///
/// reqwest calls it for every connection it opens, redirect hops included,
/// so the answer that is checked is the answer that is connected to.
struct GuardedResolver;

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let resolved: Result<Addrs, Box<dyn StdError + Send + Sync>> =
                match resolve_public(&host).await {
                    Ok(ips) => Ok(Box::new(
                        ips.into_iter().map(|ip| SocketAddr::new(ip, 0)),
                    )),
                    Err(ResolveError::Blocked(reason)) => Err(Box::new(reason)),
                    Err(e) => Err(Box::new(e)),
                };
            resolved
        })
    }
}

/// Maps a reqwest error to a fetch error
///
/// A redirect hop or DNS answer refused by the guard surfaces as `Blocked`.
fn classify_error(e: reqwest::Error) -> FetchError {
    if let Some(reason) = find_block_reason(&e) {
        return FetchError::Blocked(reason);
    }

    if e.is_timeout() {
        return FetchError::Timeout;
    }

    if e.is_redirect() {
        return FetchError::TooManyRedirects(MAX_REDIRECTS);
    }

    FetchError::Network(e.to_string())
}

fn find_block_reason(e: &reqwest::Error) -> Option<BlockReason> {
    let mut source: Option<&(dyn StdError + 'static)> = e.source();
    while let Some(err) = source {
        if let Some(reason) = err.downcast_ref::<BlockReason>() {
            return Some(reason.clone());
        }
        source = err.source();
    }
    None
}
