//! URL handling module for the Harvester
//!
//! This module provides the URL policy gate (allow/deny prefixes and the depth
//! limit), prefix matching, host keys for per-host caches, and link resolution.

mod domain;
mod matcher;
mod resolve;

use crate::config::HarvesterConfig;
use crate::HarvestError;

// Re-export main functions
pub use domain::{host_key, robots_url};
pub use matcher::matches_any_prefix;
pub use resolve::resolve_link;

/// Allow/deny and depth gate evaluated before any network I/O
///
/// The two checks are independent: [`UrlPolicy::is_allowed`] looks only at the
/// URL, [`UrlPolicy::check_depth`] only at the request depth.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlPolicy {
    allowed: Vec<String>,
    disallowed: Vec<String>,
    depth_limit: usize,
}

impl UrlPolicy {
    /// Creates a policy from allow/deny prefix lists and a depth limit (0 = unlimited)
    pub fn new(allowed: Vec<String>, disallowed: Vec<String>, depth_limit: usize) -> Self {
        Self {
            allowed,
            disallowed,
            depth_limit,
        }
    }

    /// Builds the policy part of a Harvester configuration
    pub fn from_config(config: &HarvesterConfig) -> Self {
        Self::new(
            config.allowed_urls.clone(),
            config.disallowed_urls.clone(),
            config.depth_limit,
        )
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn disallowed(&self) -> &[String] {
        &self.disallowed
    }

    pub fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// Checks whether an absolute URL may be fetched
    ///
    /// Evaluation order:
    /// 1. Any disallow-prefix match rejects the URL, whatever the allow list says
    /// 2. An empty allow list allows everything else
    /// 3. Otherwise at least one allow-prefix must match
    pub fn is_allowed(&self, url: &str) -> bool {
        if matches_any_prefix(&self.disallowed, url) {
            return false;
        }

        self.allowed.is_empty() || matches_any_prefix(&self.allowed, url)
    }

    /// Fails when a depth limit is set and `depth` has reached it
    pub fn check_depth(&self, depth: usize) -> Result<(), HarvestError> {
        if self.depth_limit != 0 && depth >= self.depth_limit {
            return Err(HarvestError::DepthLimitExceeded {
                depth,
                limit: self.depth_limit,
            });
        }

        Ok(())
    }
}
