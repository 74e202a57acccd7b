/// URL state definitions for tracking crawl progress
///
/// Every normalized URL the scheduler has seen holds exactly one of these
/// states for the rest of the run.
use std::fmt;

/// Why a URL was dropped by policy rather than fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// Matched an active exclusion pattern
    Excluded,

    /// Disallowed by robots.txt
    RobotsDisallowed,

    /// Host differs from the target's
    OffDomain,

    /// Refused by the private-network guard
    Blocked,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excluded => "excluded",
            Self::RobotsDisallowed => "robots_disallowed",
            Self::OffDomain => "off_domain",
            Self::Blocked => "blocked",
        }
    }
}

/// Represents the current state of a URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Waiting in the frontier queue
    Queued,

    /// Fetched and extracted
    Visited,

    /// Fetch failed (network error, timeout, non-2xx, non-HTML)
    Failed,

    /// Dropped by policy; never fetched
    Skipped(SkipReason),
}

impl UrlState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Queued)
    }

    /// Returns true if a page record exists for the URL
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Returns true if this represents a policy drop
    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Converts the state to its string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Visited => "visited",
            Self::Failed => "failed",
            Self::Skipped(SkipReason::Excluded) => "skipped_excluded",
            Self::Skipped(SkipReason::RobotsDisallowed) => "skipped_robots",
            Self::Skipped(SkipReason::OffDomain) => "skipped_off_domain",
            Self::Skipped(SkipReason::Blocked) => "skipped_blocked",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
