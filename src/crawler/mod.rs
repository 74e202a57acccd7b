//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - Guarded HTTP fetching
//! - Page signal extraction and link harvesting
//! - The frontier and the sequential crawl scheduler
//! - Overall analysis coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod links;
mod scheduler;
mod target;

pub use coordinator::{run_analysis, spawn_analysis, CANCELLED_MESSAGE};
pub use extractor::{extract_from_document, extract_page, PageRecord, ResponseInfo};
pub use fetcher::{FetchError, FetchedPage, Fetcher, MAX_REDIRECTS};
pub use frontier::Frontier;
pub use links::{extract_links, extract_links_from_document};
pub use scheduler::{
    effective_interval, CrawlReport, RateLimiter, Scheduler, MAX_LINK_CHECKS_PER_PAGE,
};
pub use target::CrawlTarget;
