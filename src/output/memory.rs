//! In-memory results sink
//!
//! Collects everything a run reports; used by library callers that do their
//! own persistence, and by tests.

use crate::analysis::SeoIssue;
use crate::crawler::PageRecord;
use crate::output::traits::{OutputError, OutputResult, ResultsSink, RunSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Collected {
    pages: Vec<PageRecord>,
    issues: Vec<SeoIssue>,
    summary: Option<RunSummary>,
}

/// Sink that keeps pages, issues and the summary in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    collected: Mutex<Collected>,
    cancelled: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; the run stops before its next page fetch
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn pages(&self) -> Vec<PageRecord> {
        self.lock().map(|c| c.pages.clone()).unwrap_or_default()
    }

    pub fn issues(&self) -> Vec<SeoIssue> {
        self.lock().map(|c| c.issues.clone()).unwrap_or_default()
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.lock().ok().and_then(|c| c.summary.clone())
    }

    fn lock(&self) -> OutputResult<MutexGuard<'_, Collected>> {
        self.collected
            .lock()
            .map_err(|e| OutputError::Write(format!("Failed to lock sink: {}", e)))
    }
}

impl ResultsSink for MemorySink {
    fn record_page(&self, page: &PageRecord) -> OutputResult<()> {
        self.lock()?.pages.push(page.clone());
        Ok(())
    }

    fn record_issues(&self, issues: &[SeoIssue]) -> OutputResult<()> {
        self.lock()?.issues.extend_from_slice(issues);
        Ok(())
    }

    fn finalize(&self, summary: &RunSummary) -> OutputResult<()> {
        self.lock()?.summary = Some(summary.clone());
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
