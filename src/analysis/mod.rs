//! SEO analysis of crawled pages
//!
//! This module provides:
//! - The issue model (`SeoIssue` with closed `Severity` / `IssueCategory` sets)
//! - `analyze_page`: the per-page rule checks
//! - `calculate_scores`: per-category and overall scores over a run's issues

mod issues;
mod scoring;

pub use issues::analyze_page;
pub use scoring::{calculate_scores, category_score};

use std::fmt;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    /// Converts the severity to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Parses a severity from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "warning" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Area of the site an issue affects; each category gets its own score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueCategory {
    Technical,
    Content,
    Mobile,
    AiChatbot,
}

impl IssueCategory {
    /// All categories, in score order
    pub const ALL: [IssueCategory; 4] = [
        IssueCategory::Technical,
        IssueCategory::Content,
        IssueCategory::Mobile,
        IssueCategory::AiChatbot,
    ];

    /// Converts the category to a database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Content => "content",
            Self::Mobile => "mobile",
            Self::AiChatbot => "ai_chatbot",
        }
    }

    /// Parses a category from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "technical" => Some(Self::Technical),
            "content" => Some(Self::Content),
            "mobile" => Some(Self::Mobile),
            "ai_chatbot" => Some(Self::AiChatbot),
            _ => None,
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// One detected problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeoIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    /// Short label, e.g. "Missing Title"
    pub issue_type: String,
    pub description: String,
    pub recommendation: Option<String>,
    /// Page the issue was found on
    pub page_url: Option<String>,
}

/// Scores of a completed analysis, each in `0..=100`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisScores {
    pub technical: u32,
    pub content: u32,
    pub mobile: u32,
    pub ai_chatbot: u32,
    /// Weighted: technical 30%, content 35%, mobile 20%, AI chatbot 15%
    pub overall: u32,
}

impl AnalysisScores {
    /// Score of a single category
    pub fn for_category(&self, category: IssueCategory) -> u32 {
        match category {
            IssueCategory::Technical => self.technical,
            IssueCategory::Content => self.content,
            IssueCategory::Mobile => self.mobile,
            IssueCategory::AiChatbot => self.ai_chatbot,
        }
    }
}

/// Issue totals reported with a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueCounts {
    pub total: u32,
    pub critical: u32,
    pub warnings: u32,
}

impl IssueCounts {
    pub fn from_issues(issues: &[SeoIssue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            counts.total += 1;
            match issue.severity {
                Severity::Critical => counts.critical += 1,
                Severity::Warning => counts.warnings += 1,
                Severity::Info => {}
            }
        }
        counts
    }
}
