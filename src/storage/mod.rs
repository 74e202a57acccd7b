//! Storage module for persisting analyses
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Analysis lifecycle (in progress, completed, failed)
//! - Crawled page and issue persistence

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::analysis::AnalysisScores;
use crate::AuditError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(AuditError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, AuditError> {
    SqliteStorage::new(path)
}

/// Represents an analysis in the database
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRecord {
    pub id: i64,
    pub base_url: String,
    pub config_hash: String,
    pub status: RunStatus,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub pages_crawled: u32,
    pub total_issues: u32,
    pub critical_issues: u32,
    pub warnings: u32,
    /// Only stored for completed analyses
    pub scores: Option<AnalysisScores>,
    pub error_message: Option<String>,
}

/// Status of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    InProgress,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_db_string())
    }
}
