use crate::PatternError;
use regex::{Regex, RegexBuilder};
use std::time::{Duration, Instant};

/// Longest accepted exclusion pattern, in characters
pub const MAX_PATTERN_LEN: usize = 100;

/// Compilation budget for a single pattern
pub const COMPILE_BUDGET: Duration = Duration::from_millis(100);

/// Upper bound on the compiled program size
const COMPILED_SIZE_LIMIT: usize = 1 << 20;

/// A compiled wildcard exclusion pattern
///
/// Patterns support two wildcards:
/// 1. `*` matches any run of characters (including none)
/// 2. `?` matches exactly one character
///
/// Every other character matches itself, case-insensitively. Matching is
/// anchored on the whole URL, so a pattern only matches a substring when it
/// starts or ends with `*`.
///
/// # Examples
///
/// ```
/// use site_audit::url::ExclusionPattern;
///
/// let pattern = ExclusionPattern::compile("*/listings/*").unwrap();
/// assert!(pattern.matches("https://site.com/listings/123"));
/// assert!(!pattern.matches("https://site.com/about"));
/// ```
#[derive(Debug, Clone)]
pub struct ExclusionPattern {
    source: String,
    regex: Regex,
}

impl ExclusionPattern {
    /// Validates and compiles a pattern
    ///
    /// # Returns
    ///
    /// * `Ok(ExclusionPattern)` - The compiled matcher
    /// * `Err(PatternError)` - Empty, longer than 100 characters, containing
    ///   control characters, or too expensive to compile
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let len = pattern.chars().count();
        if len == 0 {
            return Err(PatternError::Empty);
        }
        if len > MAX_PATTERN_LEN {
            return Err(PatternError::TooLong {
                len,
                max: MAX_PATTERN_LEN,
            });
        }
        if pattern.chars().any(char::is_control) {
            return Err(PatternError::ControlCharacters);
        }

        let started = Instant::now();
        let regex = RegexBuilder::new(&wildcard_to_regex(pattern))
            .case_insensitive(true)
            .size_limit(COMPILED_SIZE_LIMIT)
            .build()
            .map_err(|e| match e {
                regex::Error::CompiledTooBig(_) => PatternError::TooComplex {
                    elapsed_ms: started.elapsed().as_millis(),
                },
                other => PatternError::InvalidSyntax(other.to_string()),
            })?;

        let elapsed = started.elapsed();
        if elapsed > COMPILE_BUDGET {
            return Err(PatternError::TooComplex {
                elapsed_ms: elapsed.as_millis(),
            });
        }

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Returns the pattern as it was written
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Checks the whole URL against the pattern
    pub fn matches(&self, url: &str) -> bool {
        self.regex.is_match(url)
    }
}

/// Translates a wildcard pattern into an anchored regular expression
fn wildcard_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut buf = [0u8; 4];
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }

    out.push('$');
    out
}

/// The ordered set of active exclusion patterns of a target
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    patterns: Vec<ExclusionPattern>,
}

impl ExclusionSet {
    /// Compiles every pattern, failing on the first invalid one
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let patterns = patterns
            .iter()
            .map(|p| ExclusionPattern::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns the first pattern matching the URL
    pub fn first_match(&self, url: &str) -> Option<&ExclusionPattern> {
        self.patterns.iter().find(|p| p.matches(url))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExclusionPattern> {
        self.patterns.iter()
    }
}
