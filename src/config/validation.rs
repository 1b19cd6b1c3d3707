use crate::config::types::{HarvesterConfig, HttpConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &HarvesterConfig) -> Result<(), ConfigError> {
    validate_prefixes("allowed-urls", &config.allowed_urls)?;
    validate_prefixes("disallowed-urls", &config.disallowed_urls)?;
    validate_robots_agent(&config.robots_agent)?;

    if config.robots_ttl_secs == Some(0) {
        return Err(ConfigError::Validation(
            "robots-ttl-secs must be >= 1 when set".to_string(),
        ));
    }

    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates a list of URL prefixes
///
/// Prefixes are compared against absolute URLs, so each one must itself
/// start like an absolute http(s) URL.
fn validate_prefixes(field: &str, prefixes: &[String]) -> Result<(), ConfigError> {
    for prefix in prefixes {
        if prefix.is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} cannot contain an empty prefix",
                field
            )));
        }

        let url = Url::parse(prefix).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid prefix '{}' in {}: {}", prefix, field, e))
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "Prefix '{}' in {} must use http or https",
                prefix, field
            )));
        }
    }

    Ok(())
}

/// Validates the robots.txt agent name: non-empty, `[A-Za-z_-]` only
fn validate_robots_agent(agent: &str) -> Result<(), ConfigError> {
    if agent.is_empty() {
        return Err(ConfigError::Validation(
            "robots-agent cannot be empty".to_string(),
        ));
    }

    if !agent
        .chars()
        .all(|c| c.is_ascii_alphabetic() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "robots-agent must contain only letters, '-' and '_', got '{}'",
            agent
        )));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.connect-timeout-secs must be >= 1".to_string(),
        ));
    }

    if let Some(user_agent) = &config.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "http.user-agent cannot be blank".to_string(),
            ));
        }
    }

    Ok(())
}
