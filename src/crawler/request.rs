//! Outgoing request handed to request hooks

use crate::crawler::harvester::{Harvester, HarvesterInner};
use crate::url::resolve_link;
use crate::HarvestError;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::Method;
use std::sync::Weak;
use url::Url;

/// An HTTP request about to be sent by a Harvester
///
/// Request hooks receive it mutably and may change its headers. It also
/// carries the traversal context: [`Request::visit`] enqueues a discovered
/// link one level deeper than this request.
pub struct Request {
    url: Url,
    headers: HeaderMap,
    host: String,
    method: Method,
    body: Bytes,
    depth: usize,
    harvester: Weak<HarvesterInner>,
}

impl Request {
    pub(crate) fn new(url: Url, depth: usize, harvester: Weak<HarvesterInner>) -> Self {
        let host = url.host_str().unwrap_or_default().to_string();
        Self {
            url,
            headers: HeaderMap::new(),
            host,
            method: Method::GET,
            body: Bytes::new(),
            depth,
            harvester,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Headers sent with the request, on top of the client defaults
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Link distance from the top-level visit (0 for `Harvester::visit`)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Resolves `href` against this request's URL
    ///
    /// Returns `None` for empty or `#` references, unparseable input and
    /// non-HTTP(S) targets. Fragments on other links are kept.
    pub fn absolute_url(&self, href: &str) -> Option<String> {
        resolve_link(href, &self.url)
    }

    /// Visits `url` through the owning Harvester at `depth + 1`
    ///
    /// The visit runs synchronously through the whole pipeline, including the
    /// depth check, so traversal stops once the depth limit is reached.
    pub fn visit(&self, url: &str) -> Result<(), HarvestError> {
        let inner = self.harvester.upgrade().ok_or_else(|| HarvestError::Detached {
            url: url.to_string(),
        })?;
        inner.visit_at_depth(url, self.depth + 1)
    }

    /// Handle to the Harvester that issued this request
    ///
    /// Visiting through it starts again at depth 0. Prefer this to capturing a
    /// `Harvester` inside its own hooks, which keeps the Harvester alive forever.
    pub fn harvester(&self) -> Option<Harvester> {
        self.harvester.upgrade().map(Harvester::from_inner)
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("depth", &self.depth)
            .field("headers", &self.headers)
            .finish()
    }
}
