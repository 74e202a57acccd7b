//! Robots.txt parser implementation
//!
//! Only the group addressed to the crawler's own token is used; when no group
//! names it, the `*` groups apply. `Allow` rules are checked before
//! `Disallow` rules, and an empty `Disallow:` line allows everything.

/// Parsed robots.txt policy for one target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsRules {
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay_ms: Option<u64>,
    sitemaps: Vec<String>,
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    allow: Vec<String>,
    disallow: Vec<String>,
    crawl_delay_ms: Option<u64>,
    has_rules: bool,
}

impl RobotsRules {
    /// Creates a permissive rule set that allows everything
    ///
    /// This is used when robots.txt is missing or cannot be fetched.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// Parses robots.txt content for the given crawler token
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    /// * `agent_token` - The crawler's product token (e.g. `SiteAuditBot`)
    pub fn parse(content: &str, agent_token: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();
        let mut sitemaps = Vec::new();

        for line in content.lines() {
            let line = match line.split_once('#') {
                Some((before, _)) => before,
                None => line,
            }
            .trim();

            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    let agent = value.to_lowercase();
                    match groups.last_mut() {
                        Some(group) if !group.has_rules => group.agents.push(agent),
                        _ => groups.push(Group {
                            agents: vec![agent],
                            ..Group::default()
                        }),
                    }
                }
                "allow" | "disallow" | "crawl-delay" => {
                    // Rules before the first User-agent line belong to no group
                    let Some(group) = groups.last_mut() else {
                        continue;
                    };
                    group.has_rules = true;

                    match key.as_str() {
                        "allow" if !value.is_empty() => group.allow.push(value.to_string()),
                        "disallow" if !value.is_empty() => group.disallow.push(value.to_string()),
                        "crawl-delay" => {
                            if let Some(ms) = parse_crawl_delay(value) {
                                group.crawl_delay_ms = Some(ms);
                            }
                        }
                        _ => {}
                    }
                }
                "sitemap" => {
                    if !value.is_empty() {
                        sitemaps.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        let token = agent_token.to_lowercase();
        let own: Vec<&Group> = groups
            .iter()
            .filter(|g| g.agents.iter().any(|a| *a == token))
            .collect();
        let selected = if own.is_empty() {
            groups
                .iter()
                .filter(|g| g.agents.iter().any(|a| a == "*"))
                .collect()
        } else {
            own
        };

        let mut rules = Self {
            sitemaps,
            ..Self::default()
        };
        for group in selected {
            rules.allow.extend(group.allow.iter().cloned());
            rules.disallow.extend(group.disallow.iter().cloned());
            if rules.crawl_delay_ms.is_none() {
                rules.crawl_delay_ms = group.crawl_delay_ms;
            }
        }

        rules
    }

    /// Checks if a path (with optional query) may be fetched
    ///
    /// # Returns
    ///
    /// * `true` - If an Allow rule matches, or no Disallow rule matches
    /// * `false` - If a Disallow rule matches and no Allow rule does
    pub fn is_allowed(&self, path: &str) -> bool {
        if self.allow.iter().any(|rule| rule_matches(rule, path)) {
            return true;
        }
        !self.disallow.iter().any(|rule| rule_matches(rule, path))
    }

    pub fn allow_rules(&self) -> &[String] {
        &self.allow
    }

    pub fn disallow_rules(&self) -> &[String] {
        &self.disallow
    }

    /// Crawl-delay in milliseconds, if the selected group sets one
    pub fn crawl_delay_ms(&self) -> Option<u64> {
        self.crawl_delay_ms
    }

    /// `Sitemap:` lines, in file order (these apply to every agent)
    pub fn sitemaps(&self) -> &[String] {
        &self.sitemaps
    }
}

/// Parses a `Crawl-delay` value given in (possibly fractional) seconds
fn parse_crawl_delay(value: &str) -> Option<u64> {
    let seconds: f64 = value.parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some((seconds * 1000.0).round() as u64)
}

/// Prefix match with `*` (any run) and a trailing `$` (end of path)
fn rule_matches(rule: &str, path: &str) -> bool {
    let (rule, anchored) = match rule.strip_suffix('$') {
        Some(stripped) => (stripped, true),
        None => (rule, false),
    };

    let mut parts = rule.split('*');
    let first = parts.next().unwrap_or_default();
    let Some(mut rest) = path.strip_prefix(first) else {
        return false;
    };

    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return !anchored || rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }

    if anchored {
        rest.ends_with(last)
    } else {
        rest.contains(last)
    }
}
