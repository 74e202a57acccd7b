//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: Tracks the state of individual URLs (queued, visited, failed, skipped)
//! - `SkipReason`: Why a URL was dropped by policy

mod url_state;

// Re-export main types
pub use url_state::{SkipReason, UrlState};
