//! The visit pipeline
//!
//! One call to `visit_at_depth` walks a URL through every stage in order,
//! stopping at the first failure:
//!
//! 1. Parse the URL
//! 2. robots.txt check (cached per host)
//! 3. Visited check, then allow/deny prefixes
//! 4. Depth limit
//! 5. Request hooks
//! 6. HTTP round trip
//! 7. Mark the URL visited
//! 8. Buffer the body
//! 9. Response hooks
//! 10. Element hooks, when any are registered
//!
//! Stages 2 to 4 never touch the page itself; a rejected URL costs at most one
//! robots.txt fetch for its host.

use crate::crawler::document::Document;
use crate::crawler::harvester::HarvesterInner;
use crate::crawler::{Element, Request, Response};
use crate::HarvestError;
use std::sync::Arc;
use url::Url;

impl HarvesterInner {
    pub(crate) fn visit_at_depth(self: &Arc<Self>, raw_url: &str, depth: usize) -> Result<(), HarvestError> {
        let url = Url::parse(raw_url)?;

        if let Err(e) = self.check_url(&url, depth) {
            tracing::debug!("Skipping {}: {}", url, e);
            return Err(e);
        }

        let mut request = Request::new(url, depth, Arc::downgrade(self));
        for hook in self.hooks.request_hooks() {
            hook(&mut request);
        }

        tracing::debug!("Fetching {} (depth {})", request.url(), depth);
        let shared = &self.shared;
        let response = shared.fetcher.send(&request)?;

        // The check-then-mark pair is not atomic: concurrent visits of one URL
        // may both pass the visited check.
        shared.store.mark_visited(request.url().as_str())?;

        let fetched = shared.fetcher.read_body(response)?;
        tracing::info!(
            "Fetched {} ({}, {} bytes)",
            request.url(),
            fetched.status,
            fetched.body.len()
        );

        let response = Response::new(fetched.status, fetched.headers, fetched.body, request);
        for hook in self.hooks.response_hooks() {
            hook(&response);
        }

        self.dispatch_elements(&response);

        Ok(())
    }

    /// Stages 2 to 4: robots.txt, visited and prefix filters, depth
    fn check_url(&self, url: &Url, depth: usize) -> Result<(), HarvestError> {
        let shared = &self.shared;

        if !shared.config.ignore_robots {
            shared
                .robots
                .permitted(url, |location| shared.fetcher.fetch_robots(location))?;
        }

        let key = url.as_str();
        if !shared.config.allow_revisit && shared.store.is_visited(key)? {
            return Err(HarvestError::AlreadyVisited {
                url: key.to_string(),
            });
        }

        if !shared.policy.is_allowed(key) {
            return Err(HarvestError::Forbidden {
                url: key.to_string(),
            });
        }

        shared.policy.check_depth(depth)
    }

    fn dispatch_elements(&self, response: &Response) {
        let hooks = self.hooks.element_hooks();
        if hooks.is_empty() {
            return;
        }

        let document = Document::parse(response.body());
        for hook in &hooks {
            for node in document.select(&hook.selector) {
                let element = Element::new(node, response);
                (hook.callback)(&element);
            }
        }
    }
}
