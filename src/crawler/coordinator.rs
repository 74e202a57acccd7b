//! Analysis coordinator - one run from discovery to scores
//!
//! This module ties the pieces of a run together:
//! - Building the guarded HTTP fetcher
//! - Fetching robots.txt and discovering seed URLs
//! - Running the crawl scheduler
//! - Analyzing pages, scoring, and reporting to the results sink
//!
//! Any error inside the run is caught here: the run ends `failed` with the
//! error message and no scores, and pages already reported stay reported.

use crate::analysis::{analyze_page, calculate_scores, IssueCounts, SeoIssue};
use crate::config::UserAgentConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::scheduler::{CrawlReport, Scheduler};
use crate::crawler::target::CrawlTarget;
use crate::output::{ResultsSink, RunStatus, RunSummary};
use crate::robots::{fetch_robots, RobotsRules};
use crate::sitemap::discover_urls;
use crate::AuditError;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Error message of a run stopped through the sink
pub const CANCELLED_MESSAGE: &str = "Analysis cancelled";

/// Runs one complete analysis
///
/// This is the main entry point. It will:
/// 1. Build the HTTP client
/// 2. Fetch robots.txt (when respected)
/// 3. Discover seed URLs from sitemaps, falling back to the homepage
/// 4. Crawl, reporting each page to the sink
/// 5. Analyze every page and record the issues
/// 6. Compute scores and finalize the run
///
/// # Arguments
///
/// * `target` - The site under analysis
/// * `user_agent` - Identification sent with every request
/// * `sink` - Receives pages, issues and the final summary
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run ended, completed or failed; the summary says which
/// * `Err(AuditError)` - The sink could not record the final summary
///
/// # Example
///
/// ```no_run
/// use site_audit::{run_analysis, CrawlSettings, CrawlTarget, MemorySink};
/// use site_audit::config::UserAgentConfig;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let target = CrawlTarget::new("example.com", CrawlSettings::default(), &["*/listings/*"])?;
/// let sink = Arc::new(MemorySink::new());
/// let summary = run_analysis(target, UserAgentConfig::default(), sink.clone()).await?;
/// println!("{} pages, overall {:?}", summary.pages_crawled, summary.scores.map(|s| s.overall));
/// # Ok(())
/// # }
/// ```
pub async fn run_analysis(
    target: CrawlTarget,
    user_agent: UserAgentConfig,
    sink: Arc<dyn ResultsSink>,
) -> Result<RunSummary, AuditError> {
    let started = Instant::now();
    tracing::info!(
        "Starting analysis of {} (max {} pages, {})",
        target.base_url(),
        target.settings().max_pages,
        target.settings().crawl_strategy.as_str()
    );

    let summary = execute(&target, &user_agent, sink.as_ref()).await;

    match &summary.error_message {
        Some(message) => tracing::error!(
            "Analysis of {} failed after {} pages: {}",
            target.base_url(),
            summary.pages_crawled,
            message
        ),
        None => tracing::info!(
            "Analysis of {} completed in {:.1}s: {} pages, {} issues, overall score {}",
            target.base_url(),
            started.elapsed().as_secs_f64(),
            summary.pages_crawled,
            summary.total_issues,
            summary.scores.map(|s| s.overall).unwrap_or_default()
        ),
    }

    sink.finalize(&summary)?;
    Ok(summary)
}

/// Runs an analysis on its own tokio task
///
/// The caller learns the outcome through the sink, or by awaiting the handle.
pub fn spawn_analysis(
    target: CrawlTarget,
    user_agent: UserAgentConfig,
    sink: Arc<dyn ResultsSink>,
) -> JoinHandle<Result<RunSummary, AuditError>> {
    tokio::spawn(run_analysis(target, user_agent, sink))
}

async fn execute(
    target: &CrawlTarget,
    user_agent: &UserAgentConfig,
    sink: &dyn ResultsSink,
) -> RunSummary {
    let settings = target.settings();

    let fetcher = match Fetcher::new(user_agent, target.page_timeout(), settings.allow_private_hosts)
    {
        Ok(fetcher) => fetcher,
        Err(e) => {
            return failed_summary(
                &CrawlReport::default(),
                AuditError::Reqwest(e).to_string(),
            )
        }
    };

    let robots = if settings.respect_robots_txt {
        fetch_robots(
            &fetcher,
            target.base_url(),
            &user_agent.crawler_name,
            target.discovery_timeout(),
        )
        .await
    } else {
        RobotsRules::permissive()
    };

    let discovery = discover_urls(&fetcher, target.base_url(), target.discovery_timeout()).await;
    tracing::info!(
        "Seeding crawl with {} URLs from {}",
        discovery.urls.len(),
        discovery.source.as_str()
    );

    let mut scheduler = Scheduler::new(target, &fetcher, &robots, sink);
    scheduler.seed(discovery.urls);
    let crawl_result = scheduler.run().await;
    let report = scheduler.into_report();

    if let Err(e) = crawl_result {
        return failed_summary(&report, e.to_string());
    }
    if report.cancelled {
        return failed_summary(&report, CANCELLED_MESSAGE.to_string());
    }

    let issues: Vec<SeoIssue> = report.pages.iter().flat_map(analyze_page).collect();
    if let Err(e) = sink.record_issues(&issues) {
        return failed_summary(&report, AuditError::Output(e).to_string());
    }

    let counts = IssueCounts::from_issues(&issues);
    RunSummary {
        status: RunStatus::Completed,
        pages_crawled: report.pages.len() as u32,
        total_issues: counts.total,
        critical_issues: counts.critical,
        warnings: counts.warnings,
        failed_urls: report.failed_urls as u32,
        skipped_urls: report.skipped_urls as u32,
        scores: Some(calculate_scores(&issues)),
        completed_at: Utc::now(),
        error_message: None,
    }
}

fn failed_summary(report: &CrawlReport, message: String) -> RunSummary {
    RunSummary {
        status: RunStatus::Failed,
        pages_crawled: report.pages.len() as u32,
        total_issues: 0,
        critical_issues: 0,
        warnings: 0,
        failed_urls: report.failed_urls as u32,
        skipped_urls: report.skipped_urls as u32,
        scores: None,
        completed_at: Utc::now(),
        error_message: Some(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlSettings;
    use crate::output::MemorySink;

    #[test]
    fn test_failed_summary_has_no_scores() {
        let report = CrawlReport {
            failed_urls: 2,
            skipped_urls: 3,
            ..CrawlReport::default()
        };
        let summary = failed_summary(&report, "boom".to_string());

        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.scores, None);
        assert_eq!(summary.failed_urls, 2);
        assert_eq!(summary.skipped_urls, 3);
        assert_eq!(summary.error_message.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn test_private_target_is_never_fetched() {
        // Guard on: every seed is refused before a request is made
        let settings = CrawlSettings {
            rate_limit_ms: 0,
            discovery_timeout_ms: 500,
            ..CrawlSettings::default()
        };
        let target = CrawlTarget::new("http://127.0.0.1:9", settings, &[] as &[&str]).unwrap();
        let sink = Arc::new(MemorySink::new());

        let summary = run_analysis(target, UserAgentConfig::default(), sink.clone())
            .await
            .unwrap();

        assert_eq!(summary.status, RunStatus::Completed);
        assert_eq!(summary.pages_crawled, 0);
        assert_eq!(summary.skipped_urls, 1);
        assert!(sink.pages().is_empty());
        assert_eq!(sink.summary(), Some(summary));
    }

    #[tokio::test]
    async fn test_spawned_analysis_reports_cancellation() {
        let settings = CrawlSettings {
            discovery_timeout_ms: 500,
            ..CrawlSettings::default()
        };
        let target = CrawlTarget::new("http://127.0.0.1:9", settings, &[] as &[&str]).unwrap();
        let sink = Arc::new(MemorySink::new());
        sink.cancel();

        let summary = spawn_analysis(target, UserAgentConfig::default(), sink.clone())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(summary.status, RunStatus::Failed);
        assert_eq!(summary.error_message.as_deref(), Some(CANCELLED_MESSAGE));
        assert_eq!(summary.scores, None);
        assert!(sink.issues().is_empty());
    }
}
