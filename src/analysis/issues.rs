use crate::analysis::{IssueCategory, SeoIssue, Severity};
use crate::crawler::PageRecord;

const TITLE_MIN_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 60;
const META_MIN_CHARS: usize = 120;
const META_MAX_CHARS: usize = 160;
const THIN_CONTENT_WORDS: u32 = 300;
const SLOW_LOAD_MS: u64 = 3_000;

/// Runs every rule check against one page
///
/// # Rules (in check order)
///
/// | Condition | Severity | Category | Issue type |
/// |---|---|---|---|
/// | no title | critical | technical | Missing Title |
/// | title < 30 or > 60 chars | warning | technical | Title Length |
/// | no meta description | critical | technical | Missing Meta Description |
/// | meta description < 120 or > 160 chars | warning | technical | Meta Description Length |
/// | no H1 | critical | technical | Missing H1 |
/// | < 300 words | warning | content | Thin Content |
/// | images without alt | warning | technical | Images Without Alt Text |
/// | no Open Graph tags | info | technical | Missing Open Graph Tags |
/// | no schema markup | warning | ai_chatbot | Missing Schema Markup |
/// | load time > 3000ms | warning | mobile | Slow Load Time |
/// | broken links found | warning | technical | Broken Links |
///
/// Rules are independent; the result keeps this order.
pub fn analyze_page(page: &PageRecord) -> Vec<SeoIssue> {
    let mut issues = Vec::new();
    let mut push = |severity, category, issue_type: &str, description: String, recommendation: &str| {
        issues.push(SeoIssue {
            severity,
            category,
            issue_type: issue_type.to_string(),
            description,
            recommendation: Some(recommendation.to_string()),
            page_url: Some(page.url.clone()),
        });
    };

    match page.title.as_deref() {
        None | Some("") => push(
            Severity::Critical,
            IssueCategory::Technical,
            "Missing Title",
            "Page is missing a title tag".to_string(),
            "Add a descriptive title tag (50-60 characters)",
        ),
        Some(title) => {
            let len = title.chars().count();
            if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
                push(
                    Severity::Warning,
                    IssueCategory::Technical,
                    "Title Length",
                    format!("Title is {} characters (recommended: 50-60)", len),
                    "Adjust title length to 50-60 characters for better display in search results",
                );
            }
        }
    }

    match page.meta_description.as_deref() {
        None | Some("") => push(
            Severity::Critical,
            IssueCategory::Technical,
            "Missing Meta Description",
            "Page is missing a meta description".to_string(),
            "Add a compelling meta description (150-160 characters)",
        ),
        Some(meta) => {
            let len = meta.chars().count();
            if !(META_MIN_CHARS..=META_MAX_CHARS).contains(&len) {
                push(
                    Severity::Warning,
                    IssueCategory::Technical,
                    "Meta Description Length",
                    format!("Meta description is {} characters (recommended: 150-160)", len),
                    "Adjust meta description length to 150-160 characters",
                );
            }
        }
    }

    if page.h1.as_deref().map_or(true, str::is_empty) {
        push(
            Severity::Critical,
            IssueCategory::Technical,
            "Missing H1",
            "Page is missing an H1 heading".to_string(),
            "Add a single H1 heading that clearly describes the page content",
        );
    }

    if page.word_count < THIN_CONTENT_WORDS {
        push(
            Severity::Warning,
            IssueCategory::Content,
            "Thin Content",
            format!("Page has only {} words (recommended: 300+)", page.word_count),
            "Add more high-quality content to provide value to users and search engines",
        );
    }

    if page.images_without_alt > 0 {
        push(
            Severity::Warning,
            IssueCategory::Technical,
            "Images Without Alt Text",
            format!("{} images are missing alt text", page.images_without_alt),
            "Add descriptive alt text to all images for accessibility and SEO",
        );
    }

    if !page.has_og_tags {
        push(
            Severity::Info,
            IssueCategory::Technical,
            "Missing Open Graph Tags",
            "Page is missing Open Graph meta tags".to_string(),
            "Add Open Graph tags for better social media sharing (og:title, og:description, og:image)",
        );
    }

    if !page.has_schema_markup {
        push(
            Severity::Warning,
            IssueCategory::AiChatbot,
            "Missing Schema Markup",
            "Page is missing structured data (Schema.org markup)".to_string(),
            "Add JSON-LD structured data to help AI chatbots understand your content",
        );
    }

    if page.load_time_ms > SLOW_LOAD_MS {
        push(
            Severity::Warning,
            IssueCategory::Mobile,
            "Slow Load Time",
            format!(
                "Page load time is {}ms (recommended: <3000ms)",
                page.load_time_ms
            ),
            "Optimize images, minify CSS/JS, and leverage browser caching to improve load time",
        );
    }

    if let Some(broken) = page.broken_links.filter(|n| *n > 0) {
        push(
            Severity::Warning,
            IssueCategory::Technical,
            "Broken Links",
            format!("{} links on this page return errors", broken),
            "Fix or remove links that point to missing or failing pages",
        );
    }

    issues
}
