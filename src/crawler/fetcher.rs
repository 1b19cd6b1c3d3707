//! HTTP fetcher implementation
//!
//! This module owns the network side of the Harvester:
//! - Building the default HTTP client from [`HttpConfig`]
//! - Sending a [`Request`] and buffering the response body
//! - Fetching robots.txt for the robots cache
//!
//! The public API of the crate is blocking, while reqwest is async. The
//! fetcher therefore owns a small tokio runtime and drives each network step
//! through `block_on`. Hooks never run inside that runtime, so a hook that
//! re-enters `visit` starts a fresh `block_on` instead of nesting one.
//!
//! Every network step races the Harvester's cancellation token; cancelling it
//! aborts whatever call is in flight with [`HarvestError::Cancelled`].

use crate::config::HttpConfig;
use crate::crawler::Request;
use crate::robots::ParsedRobots;
use crate::HarvestError;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A fully buffered HTTP response
#[derive(Debug)]
pub struct FetchedBody {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Builds an HTTP client from the configuration
///
/// # Arguments
///
/// * `config` - The HTTP section of the Harvester configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use harvester::config::HttpConfig;
/// use harvester::crawler::build_http_client;
///
/// let config = HttpConfig {
///     user_agent: Some("Harvester/1.0 (+https://example.com/bot)".to_string()),
///     ..HttpConfig::default()
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let redirect = if config.follow_redirects {
        Policy::default()
    } else {
        Policy::none()
    };

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(redirect)
        .gzip(true)
        .brotli(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder.build()
}

/// Executes HTTP calls for a Harvester and all of its forks
///
/// Dropping the fetcher shuts its runtime down in the background, so the last
/// Harvester handle may be dropped from inside an async task.
pub struct Fetcher {
    client: Client,
    // Only `None` while dropping
    runtime: Option<Runtime>,
    cancel: CancellationToken,
}

impl Fetcher {
    /// Creates a fetcher with its own runtime
    ///
    /// Fails only if the runtime's worker threads cannot be spawned.
    pub fn new(client: Client, cancel: CancellationToken) -> Result<Self, HarvestError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("harvester-http")
            .enable_all()
            .build()
            .map_err(HarvestError::Runtime)?;

        Ok(Self {
            client,
            runtime: Some(runtime),
            cancel,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sends the request and returns once the response head has arrived
    ///
    /// Transport failures are returned as-is (wrapped with the URL); they are
    /// never retried.
    pub fn send(&self, request: &Request) -> Result<reqwest::Response, HarvestError> {
        let url = request.url().to_string();

        let mut builder = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone());
        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }

        let outgoing = builder.build().map_err(|source| HarvestError::Http {
            url: url.clone(),
            source,
        })?;

        let client = self.client.clone();
        self.run(&url, async move { client.execute(outgoing).await })
    }

    /// Reads the whole response body into memory
    pub fn read_body(&self, response: reqwest::Response) -> Result<FetchedBody, HarvestError> {
        let url = response.url().to_string();
        let status = response.status();
        let headers = response.headers().clone();

        let body = self.run(&url, async move { response.bytes().await })?;

        Ok(FetchedBody {
            status,
            headers,
            body,
        })
    }

    /// Fetches and parses robots.txt from `location`
    ///
    /// This request goes straight to the client: it is not subject to the URL
    /// policy, the robots check itself, or any hook.
    pub fn fetch_robots(&self, location: &Url) -> Result<ParsedRobots, HarvestError> {
        let url = location.to_string();
        let client = self.client.clone();
        let target = location.clone();

        let fetched = self.run(&url, async move {
            let response = client.get(target).send().await?;
            let status = response.status();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        })?;

        let (status, body) = fetched;
        tracing::debug!("robots.txt at {} answered {}", url, status);
        ParsedRobots::from_response(&url, status.as_u16(), &body)
    }

    /// Drives one network future to completion, racing the cancellation token
    fn run<T, F>(&self, url: &str, future: F) -> Result<T, HarvestError>
    where
        F: Future<Output = Result<T, reqwest::Error>>,
    {
        let Some(runtime) = &self.runtime else {
            return Err(HarvestError::Cancelled {
                url: url.to_string(),
            });
        };
        let cancel = self.cancel.clone();

        let outcome = runtime.block_on(async move {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = future => Some(result),
            }
        });

        match outcome {
            None => Err(HarvestError::Cancelled {
                url: url.to_string(),
            }),
            Some(result) => result.map_err(|source| HarvestError::Http {
                url: url.to_string(),
                source,
            }),
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("client", &self.client)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}
