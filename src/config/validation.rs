use crate::config::types::{Config, CrawlerConfig, PolicyConfig};
use crate::ConfigError;
use regex::Regex;

/// Lowest status code a warn-only pattern list may be keyed by
const MIN_WARN_ONLY_STATUS: u16 = 400;

/// Highest status code a warn-only pattern list may be keyed by
const MAX_WARN_ONLY_STATUS: u16 = 510;

/// Validates the entire configuration
///
/// Individual URL patterns are deliberately not checked here: a list pattern that
/// does not compile simply never matches.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_policy_config(&config.policy)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrency < 1 || config.max_concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrency must be between 1 and 100, got {}",
            config.max_concurrency
        )));
    }

    if config.timeout_ms < 1 {
        return Err(ConfigError::Validation(
            "timeout-ms must be >= 1".to_string(),
        ));
    }

    if config.max_resource_size < 1 {
        return Err(ConfigError::Validation(
            "max-resource-size must be >= 1".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates policy configuration
fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    for key in config.http_warn_only_patterns.keys() {
        validate_status_key(key)?;
    }

    if let Some(pattern) = &config.title_pattern {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("title-pattern '{}': {}", pattern, e))
        })?;
    }

    Ok(())
}

/// Validates a warn-only table key: a three-digit status code in 400..=510
fn validate_status_key(key: &str) -> Result<(), ConfigError> {
    let status = if key.len() == 3 && key.chars().all(|c| c.is_ascii_digit()) {
        key.parse::<u16>().ok()
    } else {
        None
    };

    match status {
        Some(code) if (MIN_WARN_ONLY_STATUS..=MAX_WARN_ONLY_STATUS).contains(&code) => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "http-warn-only-patterns key '{}' must be a status code between {} and {}",
            key, MIN_WARN_ONLY_STATUS, MAX_WARN_ONLY_STATUS
        ))),
    }
}
