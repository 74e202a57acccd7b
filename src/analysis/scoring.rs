use crate::analysis::{AnalysisScores, IssueCategory, SeoIssue, Severity};

const CRITICAL_PENALTY: u32 = 10;
const WARNING_PENALTY: u32 = 5;

/// Overall score weights in percent, same order as `IssueCategory::ALL`
const WEIGHTS: [u32; 4] = [30, 35, 20, 15];

/// Score of one category: `max(0, 100 - 10 x critical - 5 x warning)`
///
/// Only issues of `category` count; info issues never do.
pub fn category_score(issues: &[SeoIssue], category: IssueCategory) -> u32 {
    let penalty: u32 = issues
        .iter()
        .filter(|issue| issue.category == category)
        .map(|issue| match issue.severity {
            Severity::Critical => CRITICAL_PENALTY,
            Severity::Warning => WARNING_PENALTY,
            Severity::Info => 0,
        })
        .sum();

    100u32.saturating_sub(penalty)
}

/// Converts a run's issues into category and overall scores
///
/// The overall score is the weighted mean of the four category scores,
/// rounded half up.
pub fn calculate_scores(issues: &[SeoIssue]) -> AnalysisScores {
    let [technical, content, mobile, ai_chatbot] =
        IssueCategory::ALL.map(|category| category_score(issues, category));

    let weighted: u32 = [technical, content, mobile, ai_chatbot]
        .iter()
        .zip(WEIGHTS)
        .map(|(score, weight)| score * weight)
        .sum();

    AnalysisScores {
        technical,
        content,
        mobile,
        ai_chatbot,
        overall: (weighted + 50) / 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: Severity, category: IssueCategory) -> SeoIssue {
        SeoIssue {
            severity,
            category,
            issue_type: "Test".to_string(),
            description: "test".to_string(),
            recommendation: None,
            page_url: None,
        }
    }

    #[test]
    fn test_no_issues_is_perfect() {
        let scores = calculate_scores(&[]);
        assert_eq!(
            scores,
            AnalysisScores {
                technical: 100,
                content: 100,
                mobile: 100,
                ai_chatbot: 100,
                overall: 100,
            }
        );
    }

    #[test]
    fn test_thin_untitled_page_scores() {
        let issues = vec![
            issue(Severity::Critical, IssueCategory::Technical),
            issue(Severity::Critical, IssueCategory::Technical),
            issue(Severity::Critical, IssueCategory::Technical),
            issue(Severity::Warning, IssueCategory::Content),
        ];
        let scores = calculate_scores(&issues);
        assert_eq!(scores.technical, 70);
        assert_eq!(scores.content, 95);
        assert_eq!(scores.mobile, 100);
        assert_eq!(scores.ai_chatbot, 100);
        // 0.30 * 70 + 0.35 * 95 + 0.20 * 100 + 0.15 * 100 = 89.25
        assert_eq!(scores.overall, 89);
    }

    #[test]
    fn test_info_issues_do_not_count() {
        let issues = vec![issue(Severity::Info, IssueCategory::Technical); 20];
        assert_eq!(calculate_scores(&issues).technical, 100);
    }

    #[test]
    fn test_score_floor_is_zero() {
        let issues = vec![issue(Severity::Critical, IssueCategory::Mobile); 15];
        let scores = calculate_scores(&issues);
        assert_eq!(scores.mobile, 0);
        assert_eq!(scores.overall, 80);
    }

    #[test]
    fn test_overall_rounds_half_up() {
        // technical 95, content 95: 28.5 + 33.25 + 20 + 15 = 96.75
        let issues = vec![
            issue(Severity::Warning, IssueCategory::Technical),
            issue(Severity::Warning, IssueCategory::Content),
        ];
        assert_eq!(calculate_scores(&issues).overall, 97);

        // ai_chatbot 90: 30 + 35 + 20 + 13.5 = 98.5
        let issues = vec![issue(Severity::Critical, IssueCategory::AiChatbot)];
        assert_eq!(calculate_scores(&issues).overall, 99);
    }

    #[test]
    fn test_deterministic() {
        let issues = vec![
            issue(Severity::Warning, IssueCategory::AiChatbot),
            issue(Severity::Critical, IssueCategory::Content),
            issue(Severity::Warning, IssueCategory::Mobile),
        ];
        let first = calculate_scores(&issues);
        for _ in 0..10 {
            assert_eq!(calculate_scores(&issues), first);
        }
    }
}
