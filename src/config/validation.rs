use crate::config::types::{Config, HttpConfig, ScheduleConfig, SiteConfig, SitemapConfig};
use crate::url::Domain;
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_schedule_config(&config.schedule)?;
    validate_http_config(&config.http)?;
    validate_sitemap_config(&config.sitemap)?;
    Ok(())
}

/// Validates the crawled site
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    Domain::parse(&config.domain)?;

    validate_starting_url(&config.starting_url)?;

    if let Some(attributes) = &config.link_attributes {
        validate_link_attributes(attributes)?;
    }

    Ok(())
}

/// Validates the crawl seed: a relative path such as "/" or "/docs"
pub(crate) fn validate_starting_url(path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') || path.starts_with("//") {
        return Err(ConfigError::InvalidUrl(format!(
            "invalid starting URL '{}': must be a relative path starting with '/'",
            path
        )));
    }

    if Url::parse(path).is_ok() {
        return Err(ConfigError::InvalidUrl(format!(
            "invalid starting URL '{}': must not be absolute",
            path
        )));
    }

    Ok(())
}

/// Validates an explicitly configured link attribute list
pub(crate) fn validate_link_attributes(attributes: &[String]) -> Result<(), ConfigError> {
    if attributes.is_empty() {
        return Err(ConfigError::Validation(
            "link_attributes must contain at least one attribute when set".to_string(),
        ));
    }

    for attribute in attributes {
        let name = attribute.trim();
        if name.is_empty() {
            return Err(ConfigError::Validation(
                "link_attributes cannot contain an empty name".to_string(),
            ));
        }

        if name.chars().any(|c| c.is_whitespace() || c == '=' || c == '"') {
            return Err(ConfigError::Validation(format!(
                "link attribute '{}' is not a valid HTML attribute name",
                attribute
            )));
        }
    }

    Ok(())
}

/// Validates crawl timing
fn validate_schedule_config(config: &ScheduleConfig) -> Result<(), ConfigError> {
    if config.startup_delay_ms < 0 {
        return Err(ConfigError::Validation(format!(
            "startup_delay_ms cannot be negative, got {}",
            config.startup_delay_ms
        )));
    }

    if config.crawl_interval_ms < 0 {
        return Err(ConfigError::Validation(format!(
            "crawl_interval_ms cannot be negative, got {}",
            config.crawl_interval_ms
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates sitemap output configuration
fn validate_sitemap_config(config: &SitemapConfig) -> Result<(), ConfigError> {
    if let Some(output_domain) = &config.output_domain {
        Domain::parse(output_domain)?;
    }

    if let Some(pattern) = &config.exclude_pattern {
        Regex::new(pattern).map_err(|e| {
            ConfigError::InvalidPattern(format!("exclude_pattern '{}': {}", pattern, e))
        })?;
    }

    if let Some(path) = &config.output_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
