//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::analysis::{AnalysisScores, IssueCategory, IssueCounts, SeoIssue, Severity};
use crate::crawler::PageRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{AnalysisRecord, RunStatus};
use crate::AuditError;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const ANALYSIS_COLUMNS: &str = "id, base_url, config_hash, status, started_at, completed_at, \
     pages_crawled, total_issues, critical_issues, warnings, overall_score, technical_score, \
     content_score, mobile_score, ai_chatbot_score, error_message";

const PAGE_COLUMNS: &str = "url, title, meta_description, h1, canonical_url, word_count, \
     status_code, load_time_ms, page_size_kb, has_robots_meta, is_indexable, has_og_tags, \
     has_twitter_cards, has_schema_markup, total_images, images_without_alt, internal_links, \
     external_links, broken_links";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(AuditError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        let conn = Connection::open(path)?;

        // WAL lets a second connection flip the status while a run writes
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> Result<Self, AuditError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn analysis_from_row(row: &Row<'_>) -> rusqlite::Result<AnalysisRecord> {
    let overall: Option<u32> = row.get(10)?;
    let scores = match overall {
        Some(overall) => Some(AnalysisScores {
            overall,
            technical: row.get::<_, Option<u32>>(11)?.unwrap_or_default(),
            content: row.get::<_, Option<u32>>(12)?.unwrap_or_default(),
            mobile: row.get::<_, Option<u32>>(13)?.unwrap_or_default(),
            ai_chatbot: row.get::<_, Option<u32>>(14)?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(AnalysisRecord {
        id: row.get(0)?,
        base_url: row.get(1)?,
        config_hash: row.get(2)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(3)?)
            .unwrap_or(RunStatus::Failed),
        started_at: row.get(4)?,
        completed_at: row.get(5)?,
        pages_crawled: row.get(6)?,
        total_issues: row.get(7)?,
        critical_issues: row.get(8)?,
        warnings: row.get(9)?,
        scores,
        error_message: row.get(15)?,
    })
}

fn page_from_row(row: &Row<'_>) -> rusqlite::Result<PageRecord> {
    Ok(PageRecord {
        url: row.get(0)?,
        title: row.get(1)?,
        meta_description: row.get(2)?,
        h1: row.get(3)?,
        canonical_url: row.get(4)?,
        word_count: row.get(5)?,
        status_code: row.get(6)?,
        load_time_ms: row.get::<_, i64>(7)?.max(0) as u64,
        page_size_kb: row.get(8)?,
        has_robots_meta: row.get(9)?,
        is_indexable: row.get(10)?,
        has_og_tags: row.get(11)?,
        has_twitter_cards: row.get(12)?,
        has_schema_markup: row.get(13)?,
        total_images: row.get(14)?,
        images_without_alt: row.get(15)?,
        internal_links: row.get(16)?,
        external_links: row.get(17)?,
        broken_links: row.get(18)?,
    })
}

impl Storage for SqliteStorage {
    // ===== Analysis Management =====

    fn create_analysis(&mut self, base_url: &str, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO analyses (base_url, config_hash, status, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![base_url, config_hash, RunStatus::InProgress.to_db_string(), now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_analysis(&self, analysis_id: i64) -> StorageResult<AnalysisRecord> {
        let sql = format!("SELECT {} FROM analyses WHERE id = ?1", ANALYSIS_COLUMNS);
        self.conn
            .query_row(&sql, params![analysis_id], analysis_from_row)
            .optional()?
            .ok_or(StorageError::AnalysisNotFound(analysis_id))
    }

    fn get_latest_analysis(&self) -> StorageResult<Option<AnalysisRecord>> {
        let sql = format!(
            "SELECT {} FROM analyses ORDER BY id DESC LIMIT 1",
            ANALYSIS_COLUMNS
        );
        Ok(self.conn.query_row(&sql, [], analysis_from_row).optional()?)
    }

    fn get_status(&self, analysis_id: i64) -> StorageResult<RunStatus> {
        let status: Option<String> = self
            .conn
            .query_row(
                "SELECT status FROM analyses WHERE id = ?1",
                params![analysis_id],
                |row| row.get(0),
            )
            .optional()?;

        let status = status.ok_or(StorageError::AnalysisNotFound(analysis_id))?;
        RunStatus::from_db_string(&status)
            .ok_or_else(|| StorageError::Database(format!("unknown analysis status '{}'", status)))
    }

    fn complete_analysis(
        &mut self,
        analysis_id: i64,
        pages_crawled: u32,
        counts: &IssueCounts,
        scores: &AnalysisScores,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let updated = self.conn.execute(
            "UPDATE analyses SET status = ?1, completed_at = ?2, pages_crawled = ?3,
                total_issues = ?4, critical_issues = ?5, warnings = ?6, overall_score = ?7,
                technical_score = ?8, content_score = ?9, mobile_score = ?10,
                ai_chatbot_score = ?11
             WHERE id = ?12",
            params![
                RunStatus::Completed.to_db_string(),
                completed_at.to_rfc3339(),
                pages_crawled,
                counts.total,
                counts.critical,
                counts.warnings,
                scores.overall,
                scores.technical,
                scores.content,
                scores.mobile,
                scores.ai_chatbot,
                analysis_id,
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::AnalysisNotFound(analysis_id));
        }
        Ok(())
    }

    fn mark_failed(
        &mut self,
        analysis_id: i64,
        pages_crawled: Option<u32>,
        error_message: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE analyses SET status = ?1,
                completed_at = COALESCE(completed_at, ?2),
                pages_crawled = COALESCE(?3, pages_crawled),
                error_message = COALESCE(error_message, ?4)
             WHERE id = ?5",
            params![
                RunStatus::Failed.to_db_string(),
                now,
                pages_crawled,
                error_message,
                analysis_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::AnalysisNotFound(analysis_id));
        }
        Ok(())
    }

    // ===== Results =====

    fn insert_page(&mut self, analysis_id: i64, page: &PageRecord) -> StorageResult<()> {
        let sql = format!(
            "INSERT INTO crawled_pages (analysis_id, {}) VALUES
                (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)
             ON CONFLICT(analysis_id, url) DO NOTHING",
            PAGE_COLUMNS
        );
        self.conn.execute(
            &sql,
            params![
                analysis_id,
                page.url,
                page.title,
                page.meta_description,
                page.h1,
                page.canonical_url,
                page.word_count,
                page.status_code,
                page.load_time_ms as i64,
                page.page_size_kb,
                page.has_robots_meta,
                page.is_indexable,
                page.has_og_tags,
                page.has_twitter_cards,
                page.has_schema_markup,
                page.total_images,
                page.images_without_alt,
                page.internal_links,
                page.external_links,
                page.broken_links,
            ],
        )?;
        Ok(())
    }

    fn insert_issues(&mut self, analysis_id: i64, issues: &[SeoIssue]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO seo_issues
                    (analysis_id, severity, category, issue_type, description, recommendation, page_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for issue in issues {
                stmt.execute(params![
                    analysis_id,
                    issue.severity.to_db_string(),
                    issue.category.to_db_string(),
                    issue.issue_type,
                    issue.description,
                    issue.recommendation,
                    issue.page_url,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn load_pages(&self, analysis_id: i64) -> StorageResult<Vec<PageRecord>> {
        let sql = format!(
            "SELECT {} FROM crawled_pages WHERE analysis_id = ?1 ORDER BY id",
            PAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let pages = stmt
            .query_map(params![analysis_id], page_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pages)
    }

    fn load_issues(&self, analysis_id: i64) -> StorageResult<Vec<SeoIssue>> {
        let mut stmt = self.conn.prepare(
            "SELECT severity, category, issue_type, description, recommendation, page_url
             FROM seo_issues WHERE analysis_id = ?1 ORDER BY id",
        )?;

        let rows = stmt
            .query_map(params![analysis_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(severity, category, issue_type, description, recommendation, page_url)| {
                    Ok(SeoIssue {
                        severity: Severity::from_db_string(&severity).ok_or_else(|| {
                            StorageError::Database(format!("unknown severity '{}'", severity))
                        })?,
                        category: IssueCategory::from_db_string(&category).ok_or_else(|| {
                            StorageError::Database(format!("unknown category '{}'", category))
                        })?,
                        issue_type,
                        description,
                        recommendation,
                        page_url,
                    })
                },
            )
            .collect()
    }
}
