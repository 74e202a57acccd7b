//! Site-Audit: a polite website crawler and SEO analysis engine
//!
//! This crate discovers a site's URL set, crawls it under a page budget while
//! respecting robots.txt, exclusion patterns and an SSRF guard, extracts SEO
//! signals from every page, classifies them into issues and aggregates
//! per-category scores.

pub mod analysis;
pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Site-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Exclusion pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid exclusion pattern: {0}")]
    InvalidPattern(#[from] PatternError),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Exclusion pattern errors, surfaced when a pattern is accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Pattern is empty")]
    Empty,

    #[error("Pattern is {len} characters long (max {max})")]
    TooLong { len: usize, max: usize },

    #[error("Pattern contains control characters")]
    ControlCharacters,

    #[error("Pattern too complex (compilation took {elapsed_ms}ms)")]
    TooComplex { elapsed_ms: u128 },

    #[error("Invalid pattern syntax: {0}")]
    InvalidSyntax(String),
}

/// Result type alias for Site-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use analysis::{AnalysisScores, IssueCategory, SeoIssue, Severity};
pub use config::{Config, CrawlSettings, CrawlStrategy};
pub use crawler::{run_analysis, spawn_analysis, CrawlTarget, PageRecord};
pub use output::{MemorySink, ResultsSink, RunStatus, RunSummary};
pub use url::{normalize_url, ExclusionPattern};
