use crate::config::types::{Config, CrawlerConfig, OutputConfig, RequestConfig, RetryConfig};
use crate::ConfigError;
use url::Url;

/// Largest page size the comment API honours
const MAX_PAGE_SIZE: u32 = 100;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_request_config(&config.request)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and {}, got {}",
            MAX_PAGE_SIZE, config.page_size
        )));
    }

    if config.pacing_interval < 1 {
        return Err(ConfigError::Validation(
            "pacing_interval must be >= 1".to_string(),
        ));
    }

    validate_range(
        "pacing delay",
        config.pacing_min_delay_ms,
        config.pacing_max_delay_ms,
    )?;
    validate_range(
        "post pause",
        config.post_pause_min_ms,
        config.post_pause_max_ms,
    )?;

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max_attempts must be >= 1".to_string(),
        ));
    }

    if !config.backoff_factor.is_finite() || config.backoff_factor < 1.0 {
        return Err(ConfigError::Validation(format!(
            "backoff_factor must be >= 1.0, got {}",
            config.backoff_factor
        )));
    }

    validate_range("retry delay", config.initial_delay_ms, config.max_delay_ms)
}

/// Validates request configuration
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    let csv = config.csv_path.as_deref().filter(|p| !p.is_empty());
    let db = config.database_path.as_deref().filter(|p| !p.is_empty());

    if csv.is_none() && db.is_none() {
        return Err(ConfigError::Validation(
            "at least one of csv_path or database_path must be set".to_string(),
        ));
    }

    if config.posts_csv_path.is_some() && csv.is_none() {
        return Err(ConfigError::Validation(
            "posts_csv_path needs csv_path to be set".to_string(),
        ));
    }

    if config.posts_csv_path.is_some() && config.posts_csv_path == config.csv_path {
        return Err(ConfigError::Validation(
            "posts_csv_path must differ from csv_path".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a min/max millisecond pair is ordered
fn validate_range(name: &str, min_ms: u64, max_ms: u64) -> Result<(), ConfigError> {
    if min_ms > max_ms {
        return Err(ConfigError::Validation(format!(
            "{} minimum ({}ms) exceeds maximum ({}ms)",
            name, min_ms, max_ms
        )));
    }
    Ok(())
}
