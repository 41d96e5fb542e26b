use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is stored with every crawl run so runs made with different
/// settings can be told apart.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Loads request headers from a JSON object file
///
/// The file holds the headers a logged-in browser sends, e.g.
/// `{"cookie": "SUB=...", "x-xsrf-token": "..."}`.
pub fn load_headers(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let headers: BTreeMap<String, String> = serde_json::from_str(&content)?;
    Ok(headers)
}

/// Reads post URLs from a list file
///
/// One URL per line; blank lines and lines starting with `#` are skipped.
pub fn load_url_list(path: &Path) -> Result<Vec<String>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Collects every post URL the configuration names
///
/// Inline URLs come first, followed by the contents of the URL list file.
pub fn collect_post_urls(config: &Config) -> Result<Vec<String>, ConfigError> {
    let mut urls = config.input.urls.clone();
    if let Some(path) = &config.input.urls_file {
        urls.extend(load_url_list(Path::new(path))?);
    }
    Ok(urls)
}
