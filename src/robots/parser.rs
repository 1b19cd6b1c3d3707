//! Robots.txt parser implementation
//!
//! This module turns a robots.txt response into a rule set using the robotstxt crate.

use crate::HarvestError;
use robotstxt::DefaultMatcher;
use std::sync::Arc;
use url::Url;

const DISALLOW_ALL: &str = "User-agent: *\nDisallow: /";

/// Parsed robots.txt data for one host
///
/// A thin wrapper around the robotstxt crate's matcher. The raw content is kept
/// behind an `Arc` so cache lookups can hand out copies cheaply.
#[derive(Debug, Clone)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: Arc<str>,
}

impl ParsedRobots {
    /// Creates a rule set from raw robots.txt content
    pub fn from_content(content: &str) -> Self {
        Self {
            content: Arc::from(content),
        }
    }

    /// Creates a permissive rule set that allows everything
    pub fn allow_all() -> Self {
        Self::from_content("")
    }

    /// Creates a rule set that disallows everything for every agent
    pub fn disallow_all() -> Self {
        Self::from_content(DISALLOW_ALL)
    }

    /// Builds a rule set from the status and body of a robots.txt response
    ///
    /// | Status | Result |
    /// |--------|--------|
    /// | 2xx | body parsed as robots.txt |
    /// | 4xx | no robots.txt, allow all |
    /// | 5xx | server trouble, disallow all |
    /// | other | `RobotsStatus` error |
    ///
    /// A 2xx body that is not valid UTF-8 is reported as `RobotsMalformed`.
    pub fn from_response(url: &str, status: u16, body: &[u8]) -> Result<Self, HarvestError> {
        match status {
            200..=299 => {
                let text = std::str::from_utf8(body).map_err(|e| HarvestError::RobotsMalformed {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                Ok(Self::from_content(text))
            }
            400..=499 => Ok(Self::allow_all()),
            500..=599 => Ok(Self::disallow_all()),
            _ => Err(HarvestError::RobotsStatus {
                url: url.to_string(),
                status,
            }),
        }
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// Only the path is matched against the rules; the query string and
    /// fragment never take part.
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL (or bare path) to check
    /// * `user_agent` - The agent name to match groups against
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let path = path_portion(url);
        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, &path)
    }

    /// Gets the Crawl-delay for a specific user agent, in seconds
    ///
    /// A group naming the agent wins over the `*` group. The engine never
    /// sleeps on its own; this is exposed for hooks that want to pace themselves.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let agent = user_agent.to_lowercase();

        let mut group: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut for_agent: Option<f64> = None;
        let mut for_wildcard: Option<f64> = None;

        for line in self.content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        group.clear();
                        in_rules = false;
                    }
                    group.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Ok(delay) = value.parse::<f64>() else {
                        continue;
                    };
                    if group.iter().any(|ua| ua != "*" && agent.contains(ua.as_str())) {
                        for_agent = Some(delay);
                    } else if group.iter().any(|ua| ua == "*") {
                        for_wildcard = Some(delay);
                    }
                }
                _ => in_rules = true,
            }
        }

        for_agent.or(for_wildcard)
    }
}

/// Path of an absolute URL, or a bare path with its query and fragment cut off
fn path_portion(target: &str) -> String {
    match Url::parse(target) {
        Ok(url) => url.path().to_string(),
        Err(_) => target
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}
