use crate::config::types::{Config, CrawlSettings, OutputConfig, TargetConfig, UserAgentConfig};
use crate::url::{parse_base_url, ExclusionPattern};
use crate::ConfigError;
use url::Url;

/// Largest page budget a single analysis may request
const MAX_PAGE_BUDGET: u32 = 10_000;

/// Longest configurable delay between fetches (milliseconds)
const MAX_RATE_LIMIT_MS: u64 = 60_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_crawl_settings(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl settings
///
/// Also called when a `CrawlTarget` is built from code, so settings that
/// never went through a config file are checked the same way.
pub fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    if settings.max_pages < 1 || settings.max_pages > MAX_PAGE_BUDGET {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGE_BUDGET, settings.max_pages
        )));
    }

    if settings.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "timeout_ms must be >= 100ms, got {}ms",
            settings.timeout_ms
        )));
    }

    if settings.rate_limit_ms > MAX_RATE_LIMIT_MS {
        return Err(ConfigError::Validation(format!(
            "rate_limit_ms must be <= {}ms, got {}ms",
            MAX_RATE_LIMIT_MS, settings.rate_limit_ms
        )));
    }

    if settings.discovery_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "discovery_timeout_ms must be >= 100ms, got {}ms",
            settings.discovery_timeout_ms
        )));
    }

    Ok(())
}

/// Validates the target URL and compiles every exclusion pattern
fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    parse_base_url(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    for pattern in &config.exclusions {
        ExclusionPattern::compile(pattern)?;
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if matches!(config.report_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "report_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
