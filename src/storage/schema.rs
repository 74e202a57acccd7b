//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Site-Audit database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per analysis run
CREATE TABLE IF NOT EXISTS analyses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    base_url TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    pages_crawled INTEGER NOT NULL DEFAULT 0,
    total_issues INTEGER NOT NULL DEFAULT 0,
    critical_issues INTEGER NOT NULL DEFAULT 0,
    warnings INTEGER NOT NULL DEFAULT 0,
    overall_score INTEGER,
    technical_score INTEGER,
    content_score INTEGER,
    mobile_score INTEGER,
    ai_chatbot_score INTEGER,
    error_message TEXT
);

CREATE INDEX IF NOT EXISTS idx_analyses_status ON analyses(status);

-- Pages extracted during an analysis
CREATE TABLE IF NOT EXISTS crawled_pages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id INTEGER NOT NULL REFERENCES analyses(id),
    url TEXT NOT NULL,
    title TEXT,
    meta_description TEXT,
    h1 TEXT,
    canonical_url TEXT,
    word_count INTEGER NOT NULL,
    status_code INTEGER NOT NULL,
    load_time_ms INTEGER NOT NULL,
    page_size_kb INTEGER NOT NULL,
    has_robots_meta INTEGER NOT NULL,
    is_indexable INTEGER NOT NULL,
    has_og_tags INTEGER NOT NULL,
    has_twitter_cards INTEGER NOT NULL,
    has_schema_markup INTEGER NOT NULL,
    total_images INTEGER NOT NULL,
    images_without_alt INTEGER NOT NULL,
    internal_links INTEGER NOT NULL,
    external_links INTEGER NOT NULL,
    broken_links INTEGER,
    UNIQUE(analysis_id, url)
);

CREATE INDEX IF NOT EXISTS idx_crawled_pages_analysis ON crawled_pages(analysis_id);

-- Issues of a completed analysis
CREATE TABLE IF NOT EXISTS seo_issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    analysis_id INTEGER NOT NULL REFERENCES analyses(id),
    severity TEXT NOT NULL,
    category TEXT NOT NULL,
    issue_type TEXT NOT NULL,
    description TEXT NOT NULL,
    recommendation TEXT,
    page_url TEXT
);

CREATE INDEX IF NOT EXISTS idx_seo_issues_analysis ON seo_issues(analysis_id);
CREATE INDEX IF NOT EXISTS idx_seo_issues_severity ON seo_issues(severity);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in ["analyses", "crawled_pages", "seo_issues"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_page_url_unique_per_analysis() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO analyses (base_url, config_hash, status, started_at)
             VALUES ('https://example.com/', 'h', 'in_progress', 'now')",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO crawled_pages (analysis_id, url, word_count, status_code,
            load_time_ms, page_size_kb, has_robots_meta, is_indexable, has_og_tags,
            has_twitter_cards, has_schema_markup, total_images, images_without_alt,
            internal_links, external_links)
            VALUES (1, 'https://example.com/', 0, 200, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0)";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
