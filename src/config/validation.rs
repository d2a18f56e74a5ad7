use crate::config::types::{
    Config, CrawlerConfig, DelayRange, IdentityConfig, OutputConfig, QueryConfig,
};
use crate::record::{MAX_YEAR, MIN_YEAR};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_query_config(&config.query)?;
    validate_crawler_config(&config.crawler)?;
    validate_identity_config(&config.identity)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the search query table
fn validate_query_config(config: &QueryConfig) -> Result<(), ConfigError> {
    if config.term.trim().is_empty() {
        return Err(ConfigError::Validation("term cannot be empty".to_string()));
    }

    for (name, bound) in [("year-low", config.year_low), ("year-high", config.year_high)] {
        if let Some(year) = bound {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(ConfigError::Validation(format!(
                    "{} must be between {} and {}, got {}",
                    name, MIN_YEAR, MAX_YEAR, year
                )));
            }
        }
    }

    if let (Some(low), Some(high)) = (config.year_low, config.year_high) {
        if low > high {
            return Err(ConfigError::Validation(format!(
                "year-low ({}) cannot be after year-high ({})",
                low, high
            )));
        }
    }

    if config.language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "language cannot be empty".to_string(),
        ));
    }

    validate_http_url("base-url", &config.base_url)?;

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.target_count < 1 {
        return Err(ConfigError::Validation(format!(
            "target-count must be >= 1, got {}",
            config.target_count
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    validate_delay_range("request-delay", &config.request_delay)?;
    validate_delay_range("page-delay", &config.page_delay)?;

    if let Some(proxy) = &config.proxy {
        validate_http_url("proxy", proxy)?;
    }

    Ok(())
}

/// Validates a jitter range
fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min > range.max {
        return Err(ConfigError::Validation(format!(
            "{} min ({}ms) cannot exceed max ({}ms)",
            name, range.min, range.max
        )));
    }

    Ok(())
}

/// Validates the identity pool
fn validate_identity_config(config: &IdentityConfig) -> Result<(), ConfigError> {
    if config.pool.is_empty() {
        return Err(ConfigError::Validation(
            "identity pool must contain at least one entry".to_string(),
        ));
    }

    // Header values cannot carry control characters
    for identity in &config.pool {
        if identity.trim().is_empty() {
            return Err(ConfigError::Validation(
                "identity pool entries cannot be empty".to_string(),
            ));
        }
        if identity.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "identity '{}' contains control characters",
                identity.escape_debug()
            )));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if let Some(path) = &config.csv_path {
        if path.trim().is_empty() {
            return Err(ConfigError::Validation(
                "csv-path cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates that a value parses as an HTTP(S) URL
fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}
