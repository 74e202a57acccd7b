//! Markdown report generation
//!
//! This module generates a human-readable markdown report of one analysis:
//! run metadata, scores, issue counts, crawled pages and issues grouped by
//! severity.

use crate::analysis::{IssueCategory, SeoIssue, Severity};
use crate::crawler::PageRecord;
use crate::output::traits::OutputResult;
use crate::storage::AnalysisRecord;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report of an analysis to a file
///
/// # Arguments
///
/// * `analysis` - The stored analysis
/// * `pages` - Pages crawled for the analysis
/// * `issues` - Issues of the analysis
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn generate_markdown_report(
    analysis: &AnalysisRecord,
    pages: &[PageRecord],
    issues: &[SeoIssue],
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_report(analysis, pages, issues);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats an analysis as markdown
pub fn format_markdown_report(
    analysis: &AnalysisRecord,
    pages: &[PageRecord],
    issues: &[SeoIssue],
) -> String {
    let mut md = String::new();

    md.push_str("# Site Audit Report\n\n");

    md.push_str("## Analysis\n\n");
    md.push_str(&format!("- **Site**: {}\n", analysis.base_url));
    md.push_str(&format!("- **Analysis ID**: {}\n", analysis.id));
    md.push_str(&format!("- **Started**: {}\n", analysis.started_at));
    if let Some(completed) = &analysis.completed_at {
        md.push_str(&format!("- **Finished**: {}\n", completed));
    }
    md.push_str(&format!("- **Status**: {}\n", analysis.status));
    if let Some(error) = &analysis.error_message {
        md.push_str(&format!("- **Error**: {}\n", error));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", analysis.config_hash));

    if let Some(scores) = &analysis.scores {
        md.push_str("## Scores\n\n");
        md.push_str("| Category | Score |\n");
        md.push_str("|----------|-------|\n");
        md.push_str(&format!("| **Overall** | **{}** |\n", scores.overall));
        for category in IssueCategory::ALL {
            md.push_str(&format!(
                "| {} | {} |\n",
                category_label(category),
                scores.for_category(category)
            ));
        }
        md.push('\n');
    }

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Pages Crawled**: {}\n", analysis.pages_crawled));
    md.push_str(&format!("- **Total Issues**: {}\n", analysis.total_issues));
    md.push_str(&format!("- **Critical**: {}\n", analysis.critical_issues));
    md.push_str(&format!("- **Warnings**: {}\n\n", analysis.warnings));

    for (severity, heading) in [
        (Severity::Critical, "Critical Issues"),
        (Severity::Warning, "Warnings"),
        (Severity::Info, "Notices"),
    ] {
        let group: Vec<&SeoIssue> = issues.iter().filter(|i| i.severity == severity).collect();
        if group.is_empty() {
            continue;
        }

        md.push_str(&format!("## {} ({})\n\n", heading, group.len()));
        for issue in group {
            md.push_str(&format!(
                "- **{}** [{}]: {}",
                issue.issue_type,
                category_label(issue.category),
                issue.description
            ));
            if let Some(url) = &issue.page_url {
                md.push_str(&format!(" ({})", url));
            }
            md.push('\n');
            if let Some(recommendation) = &issue.recommendation {
                md.push_str(&format!("  - {}\n", recommendation));
            }
        }
        md.push('\n');
    }

    if !pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Status | Words | Load (ms) | Size (KB) |\n");
        md.push_str("|-----|--------|-------|-----------|-----------|\n");
        for page in pages {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                page.url, page.status_code, page.word_count, page.load_time_ms, page.page_size_kb
            ));
        }
        md.push('\n');
    }

    md
}

fn category_label(category: IssueCategory) -> &'static str {
    match category {
        IssueCategory::Technical => "Technical",
        IssueCategory::Content => "Content",
        IssueCategory::Mobile => "Mobile",
        IssueCategory::AiChatbot => "AI Chatbot",
    }
}
