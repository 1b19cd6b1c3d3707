//! Harvester: a policy-gated web fetch-and-traverse engine
//!
//! A [`Harvester`] fetches one page per [`Harvester::visit`] call after checking
//! robots.txt, the URL allow/deny lists, the visited store and the depth limit.
//! Registered hooks then see the outgoing request, the buffered response and
//! every HTML element matching a selector. Traversal happens when hook code
//! calls [`Request::visit`] (depth + 1) or [`Harvester::visit`] (depth 0) on
//! links it discovers.
//!
//! ```no_run
//! use harvester::Harvester;
//!
//! let harvester = Harvester::builder()
//!     .allowed_urls(vec!["https://example.com".to_string()])
//!     .depth_limit(2)
//!     .build()?;
//!
//! harvester.on_html("a[href]", |el| {
//!     if let Some(link) = el.attr("href").and_then(|h| el.request().absolute_url(h)) {
//!         if let Err(e) = el.request().visit(&link) {
//!             tracing::debug!("Not following {}: {}", link, e);
//!         }
//!     }
//! })?;
//!
//! harvester.visit("https://example.com/")?;
//! # Ok::<(), harvester::HarvestError>(())
//! ```

pub mod config;
pub mod crawler;
pub mod robots;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for harvesting operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("URL parse error: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("URL {url} is forbidden")]
    Forbidden { url: String },

    #[error("URL {url} is disallowed by robots.txt")]
    RobotsDisallowed { url: String },

    #[error("URL {url} has already been visited")]
    AlreadyVisited { url: String },

    #[error("depth limit exceeded: {depth} >= {limit}")]
    DepthLimitExceeded { depth: usize, limit: usize },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request for {url} was cancelled")]
    Cancelled { url: String },

    #[error("Unexpected robots.txt status {status} from {url}")]
    RobotsStatus { url: String, status: u16 },

    #[error("Malformed robots.txt at {url}: {message}")]
    RobotsMalformed { url: String, message: String },

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Storage error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to start HTTP runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("Harvester is gone; cannot visit {url}")]
    Detached { url: String },
}

impl HarvestError {
    /// True for the expected rejections of the URL policy gate
    /// (forbidden, already visited, too deep).
    pub fn is_policy_rejection(&self) -> bool {
        matches!(
            self,
            Self::Forbidden { .. } | Self::AlreadyVisited { .. } | Self::DepthLimitExceeded { .. }
        )
    }

    /// True when robots.txt disallowed the URL.
    pub fn is_robots_rejection(&self) -> bool {
        matches!(self, Self::RobotsDisallowed { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvesting operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::HarvesterConfig;
pub use crawler::{Element, Harvester, HarvesterBuilder, Request, Response};
pub use storage::{InMemoryStore, SqliteStore, VisitedStore};
