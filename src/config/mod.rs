//! Configuration module for Site-Audit
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_audit::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("audit.toml")).unwrap();
//! println!("Crawler will visit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlSettings, CrawlStrategy, OutputConfig, TargetConfig, UserAgentConfig,
    DEFAULT_DISCOVERY_TIMEOUT_MS, DEFAULT_MAX_PAGES, DEFAULT_RATE_LIMIT_MS, DEFAULT_TIMEOUT_MS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate_crawl_settings;
