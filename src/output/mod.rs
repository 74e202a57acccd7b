//! Output module for analysis results
//!
//! This module handles:
//! - The `ResultsSink` interface the crawler reports to
//! - In-memory and SQLite-backed sinks
//! - Markdown reports of stored analyses

mod markdown;
mod memory;
mod sqlite_output;
mod traits;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use memory::MemorySink;
pub use sqlite_output::{SharedStorage, SqliteSink};
pub use traits::{OutputError, OutputResult, ResultsSink, RunSummary};

pub use crate::storage::RunStatus;

use crate::storage::{AnalysisRecord, Storage, StorageError};
use crate::AuditError;
use std::path::Path;

/// Writes the markdown report of a stored analysis
///
/// # Arguments
///
/// * `storage` - The storage backend containing the analysis
/// * `analysis_id` - The analysis to report on
/// * `output_path` - Path where the markdown file should be written
pub fn write_report(
    storage: &dyn Storage,
    analysis_id: i64,
    output_path: &Path,
) -> Result<AnalysisRecord, AuditError> {
    let analysis = storage.get_analysis(analysis_id)?;
    let pages = storage.load_pages(analysis_id)?;
    let issues = storage.load_issues(analysis_id)?;

    generate_markdown_report(&analysis, &pages, &issues, output_path)?;
    tracing::info!("Report written to {}", output_path.display());

    Ok(analysis)
}

/// Writes the markdown report of the most recent analysis
pub fn write_latest_report(
    storage: &dyn Storage,
    output_path: &Path,
) -> Result<AnalysisRecord, AuditError> {
    let latest = storage
        .get_latest_analysis()?
        .ok_or_else(|| StorageError::Database("No analyses found in database".to_string()))?;
    write_report(storage, latest.id, output_path)
}
