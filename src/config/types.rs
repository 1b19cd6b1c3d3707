use serde::Deserialize;

/// Agent name matched against robots.txt groups when none is configured
pub const DEFAULT_ROBOTS_AGENT: &str = "Harvester";

/// Main configuration structure for a Harvester
///
/// Every field has a default, so an empty TOML document is a valid
/// configuration: no URL restrictions, unlimited depth, robots.txt respected.
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    /// URL prefixes that may be fetched (empty = everything)
    #[serde(rename = "allowed-urls", default)]
    pub allowed_urls: Vec<String>,

    /// URL prefixes that must never be fetched, checked before the allow list
    #[serde(rename = "disallowed-urls", default)]
    pub disallowed_urls: Vec<String>,

    /// Maximum request depth (0 = unlimited)
    #[serde(rename = "depth-limit", default)]
    pub depth_limit: usize,

    /// Whether an already visited URL may be fetched again
    #[serde(rename = "allow-revisit", default)]
    pub allow_revisit: bool,

    /// Skip robots.txt entirely
    #[serde(rename = "ignore-robots", default)]
    pub ignore_robots: bool,

    /// Agent name used when evaluating robots.txt rules
    #[serde(rename = "robots-agent", default = "default_robots_agent")]
    pub robots_agent: String,

    /// Lifetime of a cached robots.txt in seconds (unset = never expires)
    #[serde(rename = "robots-ttl-secs", default)]
    pub robots_ttl_secs: Option<u64>,

    /// Settings for the default HTTP client
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            allowed_urls: Vec::new(),
            disallowed_urls: Vec::new(),
            depth_limit: 0,
            allow_revisit: false,
            ignore_robots: false,
            robots_agent: default_robots_agent(),
            robots_ttl_secs: None,
            http: HttpConfig::default(),
        }
    }
}

/// Settings for the HTTP client built when no custom client is supplied
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Whole-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Connect timeout in seconds
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Follow HTTP redirects (up to reqwest's default limit of 10)
    #[serde(rename = "follow-redirects", default = "default_follow_redirects")]
    pub follow_redirects: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: None,
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            follow_redirects: default_follow_redirects(),
        }
    }
}

fn default_robots_agent() -> String {
    DEFAULT_ROBOTS_AGENT.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_follow_redirects() -> bool {
    true
}
