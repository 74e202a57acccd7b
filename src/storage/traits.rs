//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::analysis::{AnalysisScores, IssueCounts, SeoIssue};
use crate::crawler::PageRecord;
use crate::storage::{AnalysisRecord, RunStatus};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Analysis not found: {0}")]
    AnalysisNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Holds analyses, the pages crawled for each, and the issues of completed
/// analyses.
pub trait Storage {
    // ===== Analysis Management =====

    /// Creates a new analysis with status `in_progress`
    ///
    /// # Arguments
    ///
    /// * `base_url` - The normalized target URL
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created analysis
    fn create_analysis(&mut self, base_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Gets an analysis by ID
    fn get_analysis(&self, analysis_id: i64) -> StorageResult<AnalysisRecord>;

    /// Gets the most recent analysis
    fn get_latest_analysis(&self) -> StorageResult<Option<AnalysisRecord>>;

    /// Reads only the status of an analysis
    fn get_status(&self, analysis_id: i64) -> StorageResult<RunStatus>;

    /// Marks an analysis completed with its totals and scores
    fn complete_analysis(
        &mut self,
        analysis_id: i64,
        pages_crawled: u32,
        counts: &IssueCounts,
        scores: &AnalysisScores,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<()>;

    /// Marks an analysis failed
    ///
    /// An error message already stored (e.g. by whoever cancelled the run)
    /// is kept; `pages_crawled` is only updated when given.
    fn mark_failed(
        &mut self,
        analysis_id: i64,
        pages_crawled: Option<u32>,
        error_message: Option<&str>,
    ) -> StorageResult<()>;

    // ===== Results =====

    /// Inserts one crawled page; a URL already stored for the analysis is ignored
    fn insert_page(&mut self, analysis_id: i64, page: &PageRecord) -> StorageResult<()>;

    /// Inserts all issues of an analysis in one transaction
    fn insert_issues(&mut self, analysis_id: i64, issues: &[SeoIssue]) -> StorageResult<()>;

    /// Loads the pages of an analysis in crawl order
    fn load_pages(&self, analysis_id: i64) -> StorageResult<Vec<PageRecord>>;

    /// Loads the issues of an analysis in detection order
    fn load_issues(&self, analysis_id: i64) -> StorageResult<Vec<SeoIssue>>;
}
