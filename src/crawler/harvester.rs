//! The Harvester facade and its builder
//!
//! A [`Harvester`] is a cheap handle: cloning it yields another handle to the
//! same instance, with the same hooks. [`Harvester::fork`] creates a distinct
//! instance that shares configuration, HTTP client, cancellation token,
//! visited store and robots cache, but starts with no hooks.

use crate::config::{validate, HarvesterConfig};
use crate::crawler::document::CompiledSelector;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::hooks::{ElementHook, HookRegistry};
use crate::crawler::{Element, Request, Response};
use crate::robots::RobotsCache;
use crate::storage::{InMemoryStore, VisitedStore};
use crate::url::UrlPolicy;
use crate::HarvestError;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// State shared by a Harvester and all of its forks
pub(crate) struct Shared {
    pub(crate) config: HarvesterConfig,
    pub(crate) policy: UrlPolicy,
    pub(crate) fetcher: Fetcher,
    pub(crate) store: Arc<dyn VisitedStore>,
    pub(crate) robots: Arc<RobotsCache>,
}

pub(crate) struct HarvesterInner {
    pub(crate) shared: Arc<Shared>,
    pub(crate) hooks: HookRegistry,
}

/// Policy-gated fetcher that hands each page to registered hooks
///
/// `visit` blocks until the page has been fetched and every hook has run,
/// including any nested visits the hooks start. It drives its own async
/// runtime internally, so it must not be called from inside an async task;
/// use `tokio::task::spawn_blocking` there. Creating and dropping a Harvester
/// inside an async task is fine: the runtime is shut down in the background.
///
/// Hooks should not capture a `Harvester` handle to themselves: the hook
/// would keep the Harvester alive forever. Use [`Request::visit`] or
/// [`Request::harvester`] from inside hooks instead.
#[derive(Clone)]
pub struct Harvester {
    inner: Arc<HarvesterInner>,
}

impl Harvester {
    /// Creates a Harvester with the default configuration
    pub fn new() -> Result<Self, HarvestError> {
        HarvesterBuilder::new().build()
    }

    pub fn builder() -> HarvesterBuilder {
        HarvesterBuilder::new()
    }

    /// Creates a Harvester from a loaded configuration
    pub fn from_config(config: HarvesterConfig) -> Result<Self, HarvestError> {
        HarvesterBuilder::from_config(config).build()
    }

    pub(crate) fn from_inner(inner: Arc<HarvesterInner>) -> Self {
        Self { inner }
    }

    /// Creates a new Harvester sharing everything but the hooks
    ///
    /// Visits through either instance update the same visited store and
    /// robots cache, and cancelling the shared token stops both.
    pub fn fork(&self) -> Harvester {
        Harvester {
            inner: Arc::new(HarvesterInner {
                shared: self.inner.shared.clone(),
                hooks: HookRegistry::new(),
            }),
        }
    }

    /// Fetches `url` at depth 0 and runs the hooks on the result
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The page was fetched and all hooks ran
    /// * `Err(HarvestError)` - The URL was rejected (see
    ///   [`HarvestError::is_policy_rejection`]) or the fetch failed
    pub fn visit(&self, url: &str) -> Result<(), HarvestError> {
        self.inner.visit_at_depth(url, 0)
    }

    /// Registers a hook run on every request before it is sent
    pub fn on_request<F>(&self, hook: F)
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        self.inner.hooks.add_request(Arc::new(hook));
    }

    /// Registers a hook run on every buffered response
    pub fn on_response<F>(&self, hook: F)
    where
        F: Fn(&Response) + Send + Sync + 'static,
    {
        self.inner.hooks.add_response(Arc::new(hook));
    }

    /// Registers a callback run for every element matching `selector`
    ///
    /// The selector is compiled here, so an invalid one is reported now
    /// rather than on every page.
    pub fn on_html<F>(&self, selector: &str, callback: F) -> Result<(), HarvestError>
    where
        F: Fn(&Element<'_>) + Send + Sync + 'static,
    {
        let selector = CompiledSelector::parse(selector)?;
        self.inner.hooks.add_element(ElementHook {
            selector,
            callback: Arc::new(callback),
        });
        Ok(())
    }

    pub fn config(&self) -> &HarvesterConfig {
        &self.inner.shared.config
    }

    /// The visited store shared with all forks
    pub fn store(&self) -> Arc<dyn VisitedStore> {
        self.inner.shared.store.clone()
    }

    pub fn robots(&self) -> &RobotsCache {
        &self.inner.shared.robots
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.shared.fetcher.cancellation_token().clone()
    }

    /// Number of registered (request, response, element) hooks
    pub fn hook_counts(&self) -> (usize, usize, usize) {
        self.inner.hooks.counts()
    }
}

impl std::fmt::Debug for Harvester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harvester")
            .field("config", &self.inner.shared.config)
            .field("hooks", &self.inner.hooks.counts())
            .finish()
    }
}

/// Builder for [`Harvester`]
///
/// Starts from [`HarvesterConfig::default`] (or a loaded configuration) and
/// applies each option on top. The configuration is validated in
/// [`HarvesterBuilder::build`].
pub struct HarvesterBuilder {
    config: HarvesterConfig,
    client: Option<Client>,
    cancel: Option<CancellationToken>,
    store: Option<Arc<dyn VisitedStore>>,
}

impl Default for HarvesterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl HarvesterBuilder {
    pub fn new() -> Self {
        Self::from_config(HarvesterConfig::default())
    }

    pub fn from_config(config: HarvesterConfig) -> Self {
        Self {
            config,
            client: None,
            cancel: None,
            store: None,
        }
    }

    /// Uses a caller-built HTTP client instead of one built from the
    /// `http` configuration section
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn allowed_urls(mut self, prefixes: Vec<String>) -> Self {
        self.config.allowed_urls = prefixes;
        self
    }

    pub fn disallowed_urls(mut self, prefixes: Vec<String>) -> Self {
        self.config.disallowed_urls = prefixes;
        self
    }

    /// Maximum request depth; 0 means unlimited
    pub fn depth_limit(mut self, limit: usize) -> Self {
        self.config.depth_limit = limit;
        self
    }

    pub fn allow_revisit(mut self, allow: bool) -> Self {
        self.config.allow_revisit = allow;
        self
    }

    pub fn ignore_robots(mut self, ignore: bool) -> Self {
        self.config.ignore_robots = ignore;
        self
    }

    pub fn robots_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.robots_agent = agent.into();
        self
    }

    /// Expires cached robots.txt entries after `ttl`
    pub fn robots_ttl(mut self, ttl: Duration) -> Self {
        self.config.robots_ttl_secs = Some(ttl.as_secs());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.http.user_agent = Some(user_agent.into());
        self
    }

    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.config.http.follow_redirects = follow;
        self
    }

    /// Token that aborts in-flight requests when cancelled
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Visited store to use instead of a fresh [`InMemoryStore`]
    pub fn store(mut self, store: Arc<dyn VisitedStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Validates the configuration and creates the Harvester
    pub fn build(self) -> Result<Harvester, HarvestError> {
        validate(&self.config)?;

        let client = match self.client {
            Some(client) => client,
            None => build_http_client(&self.config.http).map_err(HarvestError::Client)?,
        };
        let cancel = self.cancel.unwrap_or_default();
        let fetcher = Fetcher::new(client, cancel)?;

        let ttl = self
            .config
            .robots_ttl_secs
            .and_then(|secs| chrono::Duration::from_std(Duration::from_secs(secs)).ok());
        let robots = Arc::new(RobotsCache::new(self.config.robots_agent.clone(), ttl));

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));

        tracing::debug!(
            "Building harvester: depth limit {}, {} allowed / {} disallowed prefixes, robots {}",
            self.config.depth_limit,
            self.config.allowed_urls.len(),
            self.config.disallowed_urls.len(),
            if self.config.ignore_robots { "ignored" } else { "respected" },
        );

        let shared = Shared {
            policy: UrlPolicy::from_config(&self.config),
            config: self.config,
            fetcher,
            store,
            robots,
        };

        Ok(Harvester {
            inner: Arc::new(HarvesterInner {
                shared: Arc::new(shared),
                hooks: HookRegistry::new(),
            }),
        })
    }
}
