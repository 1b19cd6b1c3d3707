//! Robots.txt handling module
//!
//! This module provides the per-host robots.txt cache consulted before every
//! page fetch, plus parsing of robots.txt responses into rule sets.
//!
//! Lookups take a shared lock. On a miss the caller-supplied fetch runs with no
//! lock held, and only the map write takes the exclusive lock. Two threads that
//! miss on the same host may therefore both fetch; the last write wins, which is
//! harmless because entries are only ever replaced wholesale.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use crate::url::host_key;
use crate::HarvestError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use url::Url;

/// Host-keyed cache of robots.txt rule sets
#[derive(Debug)]
pub struct RobotsCache {
    entries: RwLock<HashMap<String, CachedRobots>>,
    agent: String,
    ttl: Option<chrono::Duration>,
    fetches: AtomicUsize,
}

impl RobotsCache {
    /// Creates an empty cache evaluating rules for `agent`
    ///
    /// # Arguments
    ///
    /// * `agent` - Agent name matched against `User-agent` groups
    /// * `ttl` - Optional lifetime of an entry; `None` keeps entries forever
    pub fn new(agent: impl Into<String>, ttl: Option<chrono::Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            agent: agent.into(),
            ttl,
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Returns the fresh rule set cached for a host, if any
    pub fn lookup(&self, host: &str) -> Option<ParsedRobots> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(host)
            .filter(|entry| !entry.is_stale(self.ttl))
            .map(|entry| entry.content.clone())
    }

    /// Stores (or replaces) the rule set for a host
    pub fn insert(&self, host: &str, robots: ParsedRobots) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(host.to_string(), CachedRobots::new(robots));
    }

    /// Checks `url` against its host's rules, fetching them on a cache miss
    ///
    /// `fetch` receives the robots.txt URL and is only called on a miss. Its
    /// error aborts the check and nothing is cached.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The URL may be fetched
    /// * `Err(HarvestError::RobotsDisallowed)` - The rules forbid it
    /// * `Err(_)` - Fetching or parsing robots.txt failed
    pub fn permitted<F>(&self, url: &Url, fetch: F) -> Result<(), HarvestError>
    where
        F: FnOnce(&Url) -> Result<ParsedRobots, HarvestError>,
    {
        let Some(host) = host_key(url) else {
            // Hostless URLs have no robots.txt to consult
            return Ok(());
        };

        let robots = match self.lookup(&host) {
            Some(robots) => {
                tracing::trace!("Using cached robots.txt for {}", host);
                robots
            }
            None => {
                let Some(location) = crate::url::robots_url(url) else {
                    return Ok(());
                };
                tracing::debug!("Fetching robots.txt for {}", host);
                self.fetches.fetch_add(1, Ordering::Relaxed);
                let robots = fetch(&location)?;
                self.insert(&host, robots.clone());
                robots
            }
        };

        if robots.is_allowed(url.path(), &self.agent) {
            Ok(())
        } else {
            Err(HarvestError::RobotsDisallowed {
                url: url.to_string(),
            })
        }
    }

    /// Number of robots.txt fetches attempted through this cache
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Number of hosts with a cached rule set
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached rule set
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
