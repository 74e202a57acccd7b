//! Results sink trait and run summary types
//!
//! The crawler never persists anything itself; it reports pages, issues and
//! the final run summary to a `ResultsSink`, and asks the sink between page
//! fetches whether the run has been cancelled.

use crate::analysis::{AnalysisScores, SeoIssue};
use crate::crawler::PageRecord;
use crate::storage::RunStatus;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Run-level metadata reported once an analysis ends
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// `Completed` or `Failed`
    pub status: RunStatus,
    pub pages_crawled: u32,
    pub total_issues: u32,
    pub critical_issues: u32,
    pub warnings: u32,
    /// URLs whose fetch failed
    pub failed_urls: u32,
    /// URLs dropped by policy (exclusion, robots.txt, off-domain, guard)
    pub skipped_urls: u32,
    /// Present only for completed runs
    pub scores: Option<AnalysisScores>,
    pub completed_at: DateTime<Utc>,
    /// Present only for failed runs
    pub error_message: Option<String>,
}

impl RunSummary {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}

/// Trait for results sinks
///
/// Implementations must be thread-safe: an analysis may run on another task
/// than the one that created the sink.
pub trait ResultsSink: Send + Sync {
    /// Records one crawled page, as soon as it is extracted
    fn record_page(&self, page: &PageRecord) -> OutputResult<()>;

    /// Records the full issue list of a completed run
    fn record_issues(&self, issues: &[SeoIssue]) -> OutputResult<()>;

    /// Records the terminal status of the run
    fn finalize(&self, summary: &RunSummary) -> OutputResult<()>;

    /// Returns true once the run has been cancelled from outside
    ///
    /// Checked before every page fetch.
    fn is_cancelled(&self) -> bool;
}
