//! Site-Audit main entry point
//!
//! This is the command-line interface for the Site-Audit crawler and SEO
//! analysis engine.

use anyhow::{bail, Context};
use clap::Parser;
use site_audit::config::{load_config_with_hash, Config};
use site_audit::output::{write_latest_report, write_report, SharedStorage, SqliteSink};
use site_audit::storage::{open_storage, Storage};
use site_audit::{run_analysis, CrawlTarget, IssueCategory, ResultsSink, RunSummary};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Site-Audit: a polite website crawler and SEO analyzer
///
/// Site-Audit discovers a site's pages from its sitemaps, crawls them while
/// respecting robots.txt and exclusion patterns, and scores the site on
/// technical, content, mobile and AI-chatbot readiness.
#[derive(Parser, Debug)]
#[command(name = "site-audit")]
#[command(version)]
#[command(about = "A polite website crawler and SEO analyzer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "export_report")]
    dry_run: bool,

    /// Regenerate the markdown report of the latest stored analysis and exit
    #[arg(long, conflicts_with = "dry_run")]
    export_report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.export_report {
        handle_export_report(&config)
    } else {
        handle_analysis(config, &config_hash).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_audit=info,warn"),
            1 => EnvFilter::new("site_audit=debug,info"),
            2 => EnvFilter::new("site_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the effective settings
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let target = CrawlTarget::from_config(config)?;
    let settings = target.settings();

    println!("=== Site-Audit Dry Run ===\n");

    println!("Target: {}", target.base_url());
    println!("\nCrawler Settings:");
    println!("  Max pages: {}", settings.max_pages);
    println!("  Page timeout: {}ms", settings.timeout_ms);
    println!("  Rate limit: {}ms", settings.rate_limit_ms);
    println!("  Respect robots.txt: {}", settings.respect_robots_txt);
    println!("  Follow nofollow links: {}", settings.follow_nofollow_links);
    println!("  Strategy: {}", settings.crawl_strategy.as_str());
    println!("  Discovery timeout: {}ms", settings.discovery_timeout_ms);
    println!("  Check broken links: {}", settings.check_broken_links);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nExclusion Patterns ({}):", target.exclusions().len());
    for pattern in target.exclusions().iter() {
        println!("  - {}", pattern.as_str());
    }

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    if let Some(report) = &config.output.report_path {
        println!("  Report: {}", report);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --export-report mode: writes the report of the latest analysis
fn handle_export_report(config: &Config) -> anyhow::Result<()> {
    let Some(report_path) = &config.output.report_path else {
        bail!("No report-path configured in [output]");
    };

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let analysis = write_latest_report(&storage, Path::new(report_path))?;

    println!(
        "✓ Report for analysis {} ({}) exported to: {}",
        analysis.id, analysis.base_url, report_path
    );

    Ok(())
}

/// Handles the main analysis run
async fn handle_analysis(config: Config, config_hash: &str) -> anyhow::Result<()> {
    let target = CrawlTarget::from_config(&config)?;

    let storage: SharedStorage = Arc::new(Mutex::new(open_storage(Path::new(
        &config.output.database_path,
    ))?));
    let sink = Arc::new(SqliteSink::start(
        storage.clone(),
        target.base_url().as_str(),
        config_hash,
    )?);
    let analysis_id = sink.analysis_id();
    tracing::info!("Created analysis {}", analysis_id);

    spawn_interrupt_handler(storage.clone(), analysis_id);

    let results: Arc<dyn ResultsSink> = sink;
    let summary = run_analysis(target, config.user_agent.clone(), results).await?;

    if let Some(report_path) = &config.output.report_path {
        let guard = storage
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to lock storage: {}", e))?;
        write_report(&*guard, analysis_id, Path::new(report_path))?;
    }

    print_summary(&summary);

    if let Some(message) = &summary.error_message {
        bail!("Analysis {} failed: {}", analysis_id, message);
    }
    Ok(())
}

/// Marks the analysis failed on Ctrl+C; the crawl stops before its next fetch
fn spawn_interrupt_handler(storage: SharedStorage, analysis_id: i64) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nReceived Ctrl+C, stopping after the current page...");
            match storage.lock() {
                Ok(mut guard) => {
                    if let Err(e) = guard.mark_failed(analysis_id, None, Some("Cancelled by user"))
                    {
                        tracing::error!("Failed to cancel analysis: {}", e);
                    }
                }
                Err(e) => tracing::error!("Failed to lock storage: {}", e),
            }
        }
    });
}

fn print_summary(summary: &RunSummary) {
    println!("\n=== Site-Audit Results ===\n");
    println!("Status: {}", summary.status);
    println!("Pages crawled: {}", summary.pages_crawled);
    println!(
        "Failed URLs: {}, skipped URLs: {}",
        summary.failed_urls, summary.skipped_urls
    );
    println!(
        "Issues: {} ({} critical, {} warnings)",
        summary.total_issues, summary.critical_issues, summary.warnings
    );

    if let Some(scores) = &summary.scores {
        println!("\nOverall score: {}", scores.overall);
        for category in IssueCategory::ALL {
            println!("  {:<12} {}", category.to_string(), scores.for_category(category));
        }
    }
}
