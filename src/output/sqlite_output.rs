//! SQLite-backed results sink
//!
//! This module provides a sink that records analysis results directly to the
//! SQLite storage backend. Cancellation is signalled through the database:
//! any writer that sets the analysis status to `failed` stops the run before
//! its next page fetch.

use crate::analysis::{IssueCounts, SeoIssue};
use crate::crawler::PageRecord;
use crate::output::traits::{OutputError, OutputResult, ResultsSink, RunSummary};
use crate::storage::{RunStatus, Storage};
use std::sync::{Arc, Mutex, MutexGuard};

/// Shared handle to a storage backend
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// SQLite-based results sink for one analysis
pub struct SqliteSink {
    storage: SharedStorage,
    analysis_id: i64,
}

impl SqliteSink {
    /// Creates a sink for an analysis that already exists
    ///
    /// # Arguments
    ///
    /// * `storage` - The storage backend to use
    /// * `analysis_id` - The analysis to record into
    pub fn new(storage: SharedStorage, analysis_id: i64) -> Self {
        Self {
            storage,
            analysis_id,
        }
    }

    /// Creates a new `in_progress` analysis and a sink recording into it
    pub fn start(storage: SharedStorage, base_url: &str, config_hash: &str) -> OutputResult<Self> {
        let analysis_id = {
            let mut guard = lock(&storage)?;
            guard
                .create_analysis(base_url, config_hash)
                .map_err(|e| OutputError::Storage(e.to_string()))?
        };
        Ok(Self::new(storage, analysis_id))
    }

    pub fn analysis_id(&self) -> i64 {
        self.analysis_id
    }
}

fn lock(storage: &SharedStorage) -> OutputResult<MutexGuard<'_, dyn Storage + Send + 'static>> {
    storage
        .lock()
        .map_err(|e| OutputError::Storage(format!("Failed to lock storage: {}", e)))
}

impl ResultsSink for SqliteSink {
    fn record_page(&self, page: &PageRecord) -> OutputResult<()> {
        lock(&self.storage)?
            .insert_page(self.analysis_id, page)
            .map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn record_issues(&self, issues: &[SeoIssue]) -> OutputResult<()> {
        lock(&self.storage)?
            .insert_issues(self.analysis_id, issues)
            .map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn finalize(&self, summary: &RunSummary) -> OutputResult<()> {
        let mut storage = lock(&self.storage)?;

        let result = match (&summary.status, &summary.scores) {
            (RunStatus::Completed, Some(scores)) => {
                let counts = IssueCounts {
                    total: summary.total_issues,
                    critical: summary.critical_issues,
                    warnings: summary.warnings,
                };
                storage.complete_analysis(
                    self.analysis_id,
                    summary.pages_crawled,
                    &counts,
                    scores,
                    summary.completed_at,
                )
            }
            _ => storage.mark_failed(
                self.analysis_id,
                Some(summary.pages_crawled),
                summary.error_message.as_deref(),
            ),
        };

        result.map_err(|e| OutputError::Storage(e.to_string()))
    }

    fn is_cancelled(&self) -> bool {
        let status = lock(&self.storage).and_then(|storage| {
            storage
                .get_status(self.analysis_id)
                .map_err(|e| OutputError::Storage(e.to_string()))
        });

        match status {
            Ok(status) => status == RunStatus::Failed,
            Err(e) => {
                tracing::warn!("Could not read analysis status: {}", e);
                false
            }
        }
    }
}
